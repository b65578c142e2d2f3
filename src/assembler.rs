//! Assembler driver: walks the instruction list, dispatches to the byte
//! emitters, and resolves label fixups.
//!
//! Label definitions and branch/call fixups are scoped to a single call of
//! [`Assembler::assemble`]: both tables start and end empty, so nothing about
//! one assembly pass leaks into the next.

use crate::ast::{BinaryOperands, Instruction, Location};
use crate::emit::{self, ByteBuffer};
use crate::error::{AssemblerError, DuplicateSymbolError, UndefinedSymbolError};
use crate::lexer::{KeywordTables, Lexer};
use crate::parser::Parser;
use crate::registers::Register;
use crate::token::Token;
use std::collections::HashMap;

/// The `(offset, length)` of one encoded instruction in the output buffer,
/// in parse order. Consumed by things like a hex-dump pretty printer; not
/// part of the emitted bytes themselves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncodedInstruction {
    pub offset: usize,
    pub len: usize,
}

/// The result of one successful assembly pass.
pub struct Assembled {
    pub code: Vec<u8>,
    pub instructions: Vec<EncodedInstruction>,
}

struct PendingJump {
    post_offset: usize,
    target: Token,
}

/// Holds the two keyword lookup tables, built once and read-only afterwards.
/// Cheap to construct; keep one per thread if assembling concurrently.
pub struct Assembler {
    keywords: KeywordTables,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler {
            keywords: KeywordTables::new(),
        }
    }

    /// Lexes, parses, and encodes `source`, returning the machine-code byte
    /// stream with every intra-stream label resolved to a signed 32-bit
    /// relative displacement.
    ///
    /// Re-assembling identical input through the same `Assembler` always
    /// produces byte-identical output: nothing here depends on process state
    /// beyond the read-only keyword tables.
    pub fn assemble(&self, source: &str) -> Result<Assembled, AssemblerError> {
        let tokens = Lexer::new(source, &self.keywords).lex()?;
        let instructions = Parser::new(tokens).parse()?;
        Self::drive(&instructions)
    }

    fn drive(instructions: &[Instruction]) -> Result<Assembled, AssemblerError> {
        let mut buf = ByteBuffer::new();
        let mut symbols: HashMap<String, u32> = HashMap::new();
        let mut pending: Vec<PendingJump> = Vec::new();
        let mut encoded = Vec::with_capacity(instructions.len());

        for instruction in instructions {
            if let Instruction::Label(token) = instruction {
                if symbols.contains_key(&token.lexeme) {
                    return Err(DuplicateSymbolError {
                        span: token.span,
                        name: token.lexeme.clone(),
                    }
                    .into());
                }
                symbols.insert(token.lexeme.clone(), buf.len() as u32);
                continue;
            }

            let offset_before = buf.len();
            encode(&mut buf, instruction, &mut pending);
            let offset_after = buf.len();

            encoded.push(EncodedInstruction {
                offset: offset_before,
                len: offset_after - offset_before,
            });
        }

        // LIFO order is fine: fixups target disjoint offsets, so resolution
        // order is irrelevant.
        while let Some(fixup) = pending.pop() {
            let target_offset = *symbols
                .get(&fixup.target.lexeme)
                .ok_or_else(|| UndefinedSymbolError {
                    span: fixup.target.span,
                    name: fixup.target.lexeme.clone(),
                })?;

            let displacement = (target_offset as i32).wrapping_sub(fixup.post_offset as i32);
            buf.overwrite_u32_le(fixup.post_offset - 4, displacement as u32);
        }

        Ok(Assembled {
            code: buf.into_vec(),
            instructions: encoded,
        })
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler::new()
    }
}

fn expect_register(loc: &Location) -> Register {
    match loc {
        Location::Register(r) => *r,
        _ => unreachable!("internal invariant violated: expected a register operand"),
    }
}

fn encode(buf: &mut ByteBuffer, instruction: &Instruction, pending: &mut Vec<PendingJump>) {
    let mut relative = |buf: &mut ByteBuffer, opcode: &[u8], target: &Token| {
        let post_offset = emit::emit_relative_placeholder(buf, opcode);
        pending.push(PendingJump {
            post_offset,
            target: target.clone(),
        });
    };

    match instruction {
        Instruction::Label(_) => unreachable!("labels are resolved before encoding"),

        Instruction::Add(_, ops) => emit_binary(buf, ops, 0x03, 0x81, 0),
        Instruction::Sub(_, ops) => emit_binary(buf, ops, 0x2B, 0x81, 5),
        Instruction::Cmp(_, ops) => emit_binary(buf, ops, 0x3B, 0x81, 7),
        Instruction::Xor(_, ops) => emit_binary(buf, ops, 0x33, 0x81, 6),
        Instruction::Mov(_, ops) => emit_binary(buf, ops, 0x8B, 0xC7, 0),

        Instruction::Imul(_, dst, src) => emit::emit_reg_reg_2byte(buf, [0x0F, 0xAF], *dst, *src),
        Instruction::Idiv(_, src) => emit::emit_idiv(buf, *src),
        Instruction::Push(_, src) => emit::emit_push(buf, *src),
        Instruction::Pop(_, dst) => emit::emit_pop(buf, *dst),

        Instruction::Call(_, target) => relative(buf, &[0xE8], target),
        Instruction::Jmp(_, target) => relative(buf, &[0xE9], target),
        Instruction::Je(_, target) => relative(buf, &[0x0F, 0x84], target),
        Instruction::Jg(_, target) => relative(buf, &[0x0F, 0x8F], target),
        Instruction::Jl(_, target) => relative(buf, &[0x0F, 0x8C], target),
        Instruction::Jge(_, target) => relative(buf, &[0x0F, 0x8D], target),
        Instruction::Jle(_, target) => relative(buf, &[0x0F, 0x8E], target),

        Instruction::Ret(_) => emit::emit_ret(buf),
    }
}

fn emit_binary(buf: &mut ByteBuffer, ops: &BinaryOperands, reg_reg_opcode: u8, reg_imm_opcode: u8, digit: u8) {
    let dst = expect_register(&ops.dst);

    match &ops.src {
        Location::Register(src) => emit::emit_reg_reg(buf, reg_reg_opcode, dst, *src),
        Location::Literal(imm) => emit::emit_reg_imm32(buf, reg_imm_opcode, digit, dst, *imm),
        Location::Label(_) => unreachable!("internal invariant violated: expected a register or literal operand"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble_hex(src: &str) -> String {
        let assembler = Assembler::new();
        let assembled = assembler.assemble(src).expect("assembly should succeed");
        assembled.code.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn ret_encodes_to_single_byte() {
        assert_eq!(assemble_hex("ret"), "c3");
    }

    #[test]
    fn mov_immediate_matches_reference_encoding() {
        assert_eq!(assemble_hex("mov rax, 1"), "48c7c001000000");
    }

    #[test]
    fn add_register_form_matches_reference_encoding() {
        assert_eq!(assemble_hex("add rax, rbx"), "4803c3");
    }

    #[test]
    fn extended_register_destination_sets_rex_r() {
        assert_eq!(assemble_hex("mov r8, rax"), "4c8bc0");
    }

    #[test]
    fn push_pop_ret_sequence() {
        assert_eq!(assemble_hex("push rax\npop rdi\nret"), "585fc3");
    }

    #[test]
    fn self_referencing_jump_encodes_zero_displacement() {
        assert_eq!(assemble_hex("L:\njmp L\nret"), "e9fbffffffc3");
    }

    #[test]
    fn forward_conditional_jump_resolves_positive_displacement() {
        assert_eq!(
            assemble_hex("xor rax, rax\ncmp rax, 0\nje E\nret\nE:\nret"),
            "4833c04881f8000000000f8401000000c3c3"
        );
    }

    #[test]
    fn reassembling_identical_input_is_byte_identical() {
        let assembler = Assembler::new();
        let src = "mov rax, 1\nadd rax, rbx\nret";
        let first = assembler.assemble(src).unwrap().code;
        let second = assembler.assemble(src).unwrap().code;
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_label_definition_is_an_error() {
        let assembler = Assembler::new();
        let err = assembler.assemble("L:\nL:\nret").unwrap_err();
        assert!(matches!(err, AssemblerError::DuplicateSymbol(_)));
    }

    #[test]
    fn undefined_jump_target_is_an_error() {
        let assembler = Assembler::new();
        let err = assembler.assemble("jmp nowhere").unwrap_err();
        assert!(matches!(err, AssemblerError::UndefinedSymbol(_)));
    }

    #[test]
    fn backward_jump_encodes_negative_displacement() {
        let assembled = Assembler::new().assemble("L:\nret\njmp L").unwrap();
        // `ret` (1 byte) then `jmp rel32` (5 bytes) whose placeholder ends at
        // offset 6; displacement = 0 - 6 = -6.
        let displacement = i32::from_le_bytes(assembled.code[2..6].try_into().unwrap());
        assert_eq!(displacement, -6);
    }

    #[test]
    fn tracks_per_instruction_offsets_and_lengths() {
        let assembled = Assembler::new().assemble("ret\nret").unwrap();
        assert_eq!(
            assembled.instructions,
            vec![
                EncodedInstruction { offset: 0, len: 1 },
                EncodedInstruction { offset: 1, len: 1 },
            ]
        );
    }
}
