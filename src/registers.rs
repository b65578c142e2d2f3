//! The sixteen general-purpose 64-bit registers addressable by this assembler.

use std::fmt;

/// One of the sixteen general-purpose 64-bit registers.
///
/// The discriminant is the register's 4-bit encoding index, exactly as it
/// appears (truncated to 3 bits) in a ModR/M byte or REX prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    Rax = 0,
    Rcx = 1,
    Rdx = 2,
    Rbx = 3,
    Rsp = 4,
    Rbp = 5,
    Rsi = 6,
    Rdi = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
}

impl Register {
    pub const ALL: [Register; 16] = [
        Register::Rax,
        Register::Rcx,
        Register::Rdx,
        Register::Rbx,
        Register::Rsp,
        Register::Rbp,
        Register::Rsi,
        Register::Rdi,
        Register::R8,
        Register::R9,
        Register::R10,
        Register::R11,
        Register::R12,
        Register::R13,
        Register::R14,
        Register::R15,
    ];

    /// The register's encoding index, `0..=15`.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Whether encoding this register requires a REX extension bit.
    pub fn needs_rex_extension(self) -> bool {
        self.index() > 7
    }

    /// The low 3 bits used directly in a ModR/M `reg` or `r/m` field.
    pub fn low_bits(self) -> u8 {
        self.index() & 0x7
    }

    pub fn name(self) -> &'static str {
        match self {
            Register::Rax => "rax",
            Register::Rcx => "rcx",
            Register::Rdx => "rdx",
            Register::Rbx => "rbx",
            Register::Rsp => "rsp",
            Register::Rbp => "rbp",
            Register::Rsi => "rsi",
            Register::Rdi => "rdi",
            Register::R8 => "r8",
            Register::R9 => "r9",
            Register::R10 => "r10",
            Register::R11 => "r11",
            Register::R12 => "r12",
            Register::R13 => "r13",
            Register::R14 => "r14",
            Register::R15 => "r15",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_all_registers() {
        for (i, reg) in Register::ALL.iter().enumerate() {
            assert_eq!(reg.index() as usize, i);
        }
    }

    #[test]
    fn extended_registers_start_at_r8() {
        assert!(!Register::Rdi.needs_rex_extension());
        assert!(Register::R8.needs_rex_extension());
        assert!(Register::R15.needs_rex_extension());
    }
}
