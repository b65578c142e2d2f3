//! Byte stream to token list.
//!
//! A single forward scan over the source bytes. `start`/`current` bracket the
//! lexeme under construction; `start_line`/`end_line` and the matching
//! `*_offset` fields track line/column bookkeeping without re-scanning the
//! buffer for every token.

use crate::error::{LexicalError, Span};
use crate::registers::Register;
use crate::token::{Mnemonic, Token, TokenKind};
use std::collections::HashMap;

/// The two keyword lookup tables shared by every `Lexer` built from an
/// [`crate::Assembler`]. Built once, read only afterwards.
pub struct KeywordTables {
    registers: HashMap<&'static str, Register>,
    mnemonics: HashMap<&'static str, Mnemonic>,
}

impl KeywordTables {
    pub fn new() -> KeywordTables {
        let mut registers = HashMap::new();
        for reg in Register::ALL {
            registers.insert(reg.name(), reg);
        }

        let mut mnemonics = HashMap::new();
        for mnemonic in [
            Mnemonic::Add,
            Mnemonic::Sub,
            Mnemonic::Cmp,
            Mnemonic::Xor,
            Mnemonic::Mov,
            Mnemonic::Imul,
            Mnemonic::Idiv,
            Mnemonic::Push,
            Mnemonic::Pop,
            Mnemonic::Call,
            Mnemonic::Jmp,
            Mnemonic::Je,
            Mnemonic::Jg,
            Mnemonic::Jl,
            Mnemonic::Jge,
            Mnemonic::Jle,
            Mnemonic::Ret,
        ] {
            mnemonics.insert(mnemonic.lexeme(), mnemonic);
        }

        KeywordTables { registers, mnemonics }
    }

    fn lookup(&self, lexeme: &str) -> Option<TokenKind> {
        if let Some(reg) = self.registers.get(lexeme) {
            return Some(TokenKind::Register(*reg));
        }

        if let Some(mnemonic) = self.mnemonics.get(lexeme) {
            return Some(TokenKind::Mnemonic(*mnemonic));
        }

        None
    }
}

impl Default for KeywordTables {
    fn default() -> Self {
        KeywordTables::new()
    }
}

pub struct Lexer<'a, 'k> {
    source: &'a [u8],
    keywords: &'k KeywordTables,

    start: usize,
    current: usize,

    start_line: u32,
    end_line: u32,
    start_line_offset: usize,
    end_line_offset: usize,
}

impl<'a, 'k> Lexer<'a, 'k> {
    pub fn new(source: &'a str, keywords: &'k KeywordTables) -> Lexer<'a, 'k> {
        Lexer {
            source: source.as_bytes(),
            keywords,
            start: 0,
            current: 0,
            start_line: 1,
            end_line: 1,
            start_line_offset: 0,
            end_line_offset: 0,
        }
    }

    /// Scans the whole source and returns the token list, terminated by an
    /// `EOF` sentinel. Returns the first [`LexicalError`] encountered.
    pub fn lex(mut self) -> Result<Vec<Token>, LexicalError> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            if let Some(token) = self.scan_token()? {
                tokens.push(token);
            }

            self.start_line_offset = self.end_line_offset;
            self.start_line = self.end_line;
            self.start = self.current;
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            "EOF".to_string(),
            self.token_span(),
            self.current,
            self.current,
        ));

        Ok(tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned()
    }

    fn token_span(&self) -> Span {
        Span::new(
            self.start_line,
            (self.start - self.start_line_offset + 1) as u32,
            self.end_line,
            (self.current - self.end_line_offset) as u32,
        )
    }

    fn emit(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.token_span(), self.start, self.current)
    }

    fn scan_token(&mut self) -> Result<Option<Token>, LexicalError> {
        let c = self.advance();

        match c {
            b' ' | b'\t' => Ok(None),
            b'\n' => {
                self.end_line_offset = self.current;
                self.end_line += 1;
                Ok(None)
            }
            b',' => Ok(Some(self.emit(TokenKind::Comma))),
            b':' => Ok(Some(self.emit(TokenKind::Colon))),
            b'-' => self.number().map(Some),
            c if c.is_ascii_digit() => self.number().map(Some),
            b'.' => self.identifier().map(Some),
            c if c.is_ascii_alphabetic() => self.identifier().map(Some),
            c => Err(LexicalError {
                span: self.token_span(),
                message: format!("Unknown token: '{}' ({})", c as char, c),
            }),
        }
    }

    fn number(&mut self) -> Result<Token, LexicalError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let digits_start = if self.source[self.start] == b'-' {
            self.start + 1
        } else {
            self.start
        };
        let is_negative = digits_start != self.start;

        let mut value: i64 = 0;
        for &b in &self.source[digits_start..self.current] {
            value = value * 10 + (b - b'0') as i64;
        }
        if is_negative {
            value = -value;
        }

        if value < i32::MIN as i64 {
            return Err(LexicalError {
                span: self.token_span(),
                message: format!(
                    "Literal value out of range, must be bigger or equal to {}, but got: {}",
                    i32::MIN,
                    value
                ),
            });
        }

        if value > i32::MAX as i64 {
            return Err(LexicalError {
                span: self.token_span(),
                message: format!(
                    "Literal value out of range, must be less or equal to {}, but got: {}",
                    i32::MAX,
                    value
                ),
            });
        }

        Ok(self.emit(TokenKind::DwordLiteral(value as i32)))
    }

    fn identifier(&mut self) -> Result<Token, LexicalError> {
        while is_identifier_continue(self.peek()) {
            self.advance();
        }

        let lexeme = self.lexeme();
        let kind = self.keywords.lookup(&lexeme).unwrap_or(TokenKind::Identifier);
        Ok(self.emit(kind))
    }
}

fn is_identifier_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let keywords = KeywordTables::new();
        Lexer::new(src, &keywords).lex().expect("lex should succeed")
    }

    #[test]
    fn emits_eof_sentinel_for_empty_input() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn recognizes_registers_mnemonics_and_punctuation() {
        let tokens = lex("mov rax, 1");
        let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenKind::Mnemonic(Mnemonic::Mov),
                &TokenKind::Register(Register::Rax),
                &TokenKind::Comma,
                &TokenKind::DwordLiteral(1),
                &TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unknown_identifier_becomes_label_candidate() {
        let tokens = lex("loop:");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "loop");
        assert_eq!(tokens[1].kind, TokenKind::Colon);
    }

    #[test]
    fn accepts_int32_boundary_literals() {
        assert!(matches!(lex("2147483647")[0].kind, TokenKind::DwordLiteral(2147483647)));
        assert!(matches!(lex("-2147483648")[0].kind, TokenKind::DwordLiteral(-2147483648)));
    }

    #[test]
    fn rejects_literal_above_i32_max() {
        let keywords = KeywordTables::new();
        let err = Lexer::new("2147483648", &keywords).lex().unwrap_err();
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn rejects_literal_below_i32_min() {
        let keywords = KeywordTables::new();
        let err = Lexer::new("-2147483649", &keywords).lex().unwrap_err();
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn rejects_unknown_character() {
        let keywords = KeywordTables::new();
        let err = Lexer::new("@", &keywords).lex().unwrap_err();
        assert!(err.message.contains("Unknown token"));
    }

    #[test]
    fn columns_track_newlines() {
        let tokens = lex("mov rax, 1\nret");
        let ret_token = &tokens[4];
        assert_eq!(ret_token.kind, TokenKind::Mnemonic(Mnemonic::Ret));
        assert_eq!(ret_token.span.start_line, 2);
        assert_eq!(ret_token.span.start_col, 1);
    }
}
