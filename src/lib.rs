//! A single-pass assembler for a small subset of the x86-64 instruction set.
//!
//! [`Assembler::assemble`] turns mnemonic source text into a machine-code
//! byte stream, resolving intra-stream symbolic labels to signed 32-bit
//! relative displacements along the way. The pipeline is strictly
//! sequential and single-threaded: bytes become tokens ([`lexer`]), tokens
//! become a typed instruction list ([`parser`]), and the instruction list
//! becomes bytes ([`assembler`]), with label definitions and pending jump
//! fixups scoped to that one call.
//!
//! Source file I/O, the command-line entry point, and a formatted hex-dump
//! pretty printer are deliberately not part of this crate; see
//! `src/bin/myass.rs` for a minimal example of wiring them up.

pub mod assembler;
pub mod ast;
pub mod emit;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod registers;
pub mod token;

pub use assembler::{Assembled, Assembler, EncodedInstruction};
pub use error::AssemblerError;
pub use registers::Register;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_assembles_a_small_program() {
        let assembler = Assembler::new();
        let assembled = assembler
            .assemble("mov rax, 1\nadd rax, rbx\nret")
            .expect("assembly should succeed");

        assert_eq!(assembled.code.len(), 7 + 3 + 1);
        assert_eq!(assembled.instructions.len(), 3);
    }

    #[test]
    fn lexical_errors_surface_through_the_public_error_type() {
        let assembler = Assembler::new();
        let err = assembler.assemble("@").unwrap_err();
        assert!(matches!(err, AssemblerError::Lexical(_)));
    }
}
