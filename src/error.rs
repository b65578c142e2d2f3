//! Located diagnostics for the three failure phases of an assembly pass.
//!
//! Every error carries the source span of the token (or cursor position, for
//! lexical errors) that triggered it, so the caller can print a precise
//! `<PHASE> ERROR - from line(col: ..): .., to line(col: ..): ..` message
//! without re-deriving locations from the original buffer.

use std::error::Error;
use std::fmt;

/// A source span: start/end line and column, both 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Span {
        Span {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "from line(col: {}): {}, to line(col: {}): {}",
            self.start_col, self.start_line, self.end_col, self.end_line
        )
    }
}

/// A lexical failure: an unknown character, or a numeric literal outside
/// `i32`'s range.
#[derive(Debug)]
pub struct LexicalError {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LEXER ERROR - {}:\n\t{}", self.span, self.message)
    }
}

impl Error for LexicalError {}

/// A grammar failure: an unexpected token, or a missing comma/colon.
#[derive(Debug)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PARSER ERROR - {}:\n\t{}", self.span, self.message)
    }
}

impl Error for ParseError {}

/// A label name appears in more than one definition.
#[derive(Debug)]
pub struct DuplicateSymbolError {
    pub span: Span,
    pub name: String,
}

impl fmt::Display for DuplicateSymbolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "LINKER ERROR - {}:\n\tlabel \"{}\" is already defined",
            self.span, self.name
        )
    }
}

impl Error for DuplicateSymbolError {}

/// A branch or call target label is never defined.
#[derive(Debug)]
pub struct UndefinedSymbolError {
    pub span: Span,
    pub name: String,
}

impl fmt::Display for UndefinedSymbolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "LINKER ERROR - {}:\n\tlabel \"{}\" is never defined",
            self.span, self.name
        )
    }
}

impl Error for UndefinedSymbolError {}

/// The bump-allocated IR for this pass could not be grown further.
///
/// The reference implementation's arena can refuse to grow and reports this
/// as a recoverable error. Rust's global allocator aborts the process on
/// allocation failure instead of returning one, so this variant can never
/// actually be constructed here; it is kept so [`AssemblerError`] stays a
/// faithful enumeration of every failure kind the original tool reports.
#[derive(Debug)]
pub struct OutOfMemoryError {
    pub span: Span,
}

impl fmt::Display for OutOfMemoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ALLOCATOR ERROR - {}:\n\tout of memory", self.span)
    }
}

impl Error for OutOfMemoryError {}

/// The single error type returned by [`crate::Assembler::assemble`].
///
/// The first error encountered aborts the pass; there is no recovery or
/// multi-error reporting within one call.
#[derive(Debug)]
pub enum AssemblerError {
    Lexical(LexicalError),
    Parse(ParseError),
    DuplicateSymbol(DuplicateSymbolError),
    UndefinedSymbol(UndefinedSymbolError),
    OutOfMemory(OutOfMemoryError),
}

impl AssemblerError {
    pub fn span(&self) -> Span {
        match self {
            AssemblerError::Lexical(e) => e.span,
            AssemblerError::Parse(e) => e.span,
            AssemblerError::DuplicateSymbol(e) => e.span,
            AssemblerError::UndefinedSymbol(e) => e.span,
            AssemblerError::OutOfMemory(e) => e.span,
        }
    }
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssemblerError::Lexical(e) => write!(f, "{}", e),
            AssemblerError::Parse(e) => write!(f, "{}", e),
            AssemblerError::DuplicateSymbol(e) => write!(f, "{}", e),
            AssemblerError::UndefinedSymbol(e) => write!(f, "{}", e),
            AssemblerError::OutOfMemory(e) => write!(f, "{}", e),
        }
    }
}

impl Error for AssemblerError {}

impl From<LexicalError> for AssemblerError {
    fn from(err: LexicalError) -> Self {
        AssemblerError::Lexical(err)
    }
}

impl From<ParseError> for AssemblerError {
    fn from(err: ParseError) -> Self {
        AssemblerError::Parse(err)
    }
}

impl From<DuplicateSymbolError> for AssemblerError {
    fn from(err: DuplicateSymbolError) -> Self {
        AssemblerError::DuplicateSymbol(err)
    }
}

impl From<UndefinedSymbolError> for AssemblerError {
    fn from(err: UndefinedSymbolError) -> Self {
        AssemblerError::UndefinedSymbol(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_error_message_matches_phase_prefixed_format() {
        let err = LexicalError {
            span: Span::new(1, 3, 1, 3),
            message: "Unknown token: '@'".to_string(),
        };

        let rendered = format!("{}", err);
        assert!(rendered.starts_with("LEXER ERROR - from line(col: 3): 1, to line(col: 3): 1:"));
    }
}
