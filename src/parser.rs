//! Token list to instruction list. Recursive-descent, single-token lookahead;
//! the first token of each statement selects its production.

use crate::ast::{BinaryOperands, Instruction, Location};
use crate::error::ParseError;
use crate::registers::Register;
use crate::token::{Mnemonic, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, current: 0 }
    }

    pub fn parse(mut self) -> Result<Vec<Instruction>, ParseError> {
        let mut instructions = Vec::new();

        while !self.is_at_end() {
            instructions.push(self.statement()?);
        }

        Ok(instructions)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let found = self.peek().clone();
            Err(ParseError {
                span: found.span,
                message: format!("Expected {}, but got: '{}'", expected, found.lexeme),
            })
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<Token, ParseError> {
        self.consume(TokenKind::Identifier, expected)
    }

    fn consume_register(&mut self, expected: &str) -> Result<(Token, Register), ParseError> {
        let found = self.peek().clone();
        if let TokenKind::Register(reg) = found.kind {
            self.advance();
            Ok((found, reg))
        } else {
            Err(ParseError {
                span: found.span,
                message: format!("Expected {}, but got: '{}'", expected, found.lexeme),
            })
        }
    }

    fn statement(&mut self) -> Result<Instruction, ParseError> {
        let token = self.peek().clone();

        if matches!(token.kind, TokenKind::Identifier) {
            return self.label();
        }

        let mnemonic = match token.kind {
            TokenKind::Mnemonic(m) => m,
            _ => {
                return Err(ParseError {
                    span: token.span,
                    message: format!("Expected a label or an instruction, but got: '{}'", token.lexeme),
                })
            }
        };
        self.advance();

        match mnemonic {
            Mnemonic::Add => self.binary_instruction(token, Instruction::Add),
            Mnemonic::Sub => self.binary_instruction(token, Instruction::Sub),
            Mnemonic::Cmp => self.binary_instruction(token, Instruction::Cmp),
            Mnemonic::Xor => self.binary_instruction(token, Instruction::Xor),
            Mnemonic::Mov => self.binary_instruction(token, Instruction::Mov),
            Mnemonic::Imul => self.imul_instruction(token),
            Mnemonic::Idiv => self.unary_register_instruction(token, Instruction::Idiv),
            Mnemonic::Push => self.unary_register_instruction(token, Instruction::Push),
            Mnemonic::Pop => self.unary_register_instruction(token, Instruction::Pop),
            Mnemonic::Call => self.label_target_instruction(token, Instruction::Call),
            Mnemonic::Jmp => self.label_target_instruction(token, Instruction::Jmp),
            Mnemonic::Je => self.label_target_instruction(token, Instruction::Je),
            Mnemonic::Jg => self.label_target_instruction(token, Instruction::Jg),
            Mnemonic::Jl => self.label_target_instruction(token, Instruction::Jl),
            Mnemonic::Jge => self.label_target_instruction(token, Instruction::Jge),
            Mnemonic::Jle => self.label_target_instruction(token, Instruction::Jle),
            Mnemonic::Ret => Ok(Instruction::Ret(token)),
        }
    }

    fn label(&mut self) -> Result<Instruction, ParseError> {
        let name = self.consume_identifier("a label name")?;
        self.consume(TokenKind::Colon, "':'")?;
        Ok(Instruction::Label(name))
    }

    fn binary_instruction(
        &mut self,
        mnemonic_token: Token,
        make: fn(Token, BinaryOperands) -> Instruction,
    ) -> Result<Instruction, ParseError> {
        let (_, dst_reg) = self.consume_register("a register")?;
        self.consume(TokenKind::Comma, "','")?;
        let src = self.register_or_literal()?;

        Ok(make(
            mnemonic_token,
            BinaryOperands {
                dst: Location::Register(dst_reg),
                src,
            },
        ))
    }

    fn register_or_literal(&mut self) -> Result<Location, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Register(reg) => {
                self.advance();
                Ok(Location::Register(reg))
            }
            TokenKind::DwordLiteral(value) => {
                self.advance();
                Ok(Location::Literal(value))
            }
            _ => Err(ParseError {
                span: token.span,
                message: format!("Expected a register or an integer literal, but got: '{}'", token.lexeme),
            }),
        }
    }

    fn imul_instruction(&mut self, mnemonic_token: Token) -> Result<Instruction, ParseError> {
        let (_, dst) = self.consume_register("a register")?;
        self.consume(TokenKind::Comma, "','")?;
        let (_, src) = self.consume_register("a register")?;
        Ok(Instruction::Imul(mnemonic_token, dst, src))
    }

    fn unary_register_instruction(
        &mut self,
        mnemonic_token: Token,
        make: fn(Token, Register) -> Instruction,
    ) -> Result<Instruction, ParseError> {
        let (_, reg) = self.consume_register("a register")?;
        Ok(make(mnemonic_token, reg))
    }

    fn label_target_instruction(
        &mut self,
        mnemonic_token: Token,
        make: fn(Token, Token) -> Instruction,
    ) -> Result<Instruction, ParseError> {
        let target = self.consume_identifier("a label")?;
        Ok(make(mnemonic_token, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{KeywordTables, Lexer};

    fn parse(src: &str) -> Result<Vec<Instruction>, ParseError> {
        let keywords = KeywordTables::new();
        let tokens = Lexer::new(src, &keywords).lex().expect("lex should succeed");
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_label_definition() {
        let instrs = parse("loop:").unwrap();
        assert!(matches!(&instrs[0], Instruction::Label(t) if t.lexeme == "loop"));
    }

    #[test]
    fn parses_binary_register_form() {
        let instrs = parse("add rax, rbx").unwrap();
        assert!(matches!(
            &instrs[0],
            Instruction::Add(_, BinaryOperands { dst: Location::Register(Register::Rax), src: Location::Register(Register::Rbx) })
        ));
    }

    #[test]
    fn parses_binary_immediate_form() {
        let instrs = parse("mov rax, 1").unwrap();
        assert!(matches!(
            &instrs[0],
            Instruction::Mov(_, BinaryOperands { dst: Location::Register(Register::Rax), src: Location::Literal(1) })
        ));
    }

    #[test]
    fn rejects_imul_with_immediate_operand() {
        let err = parse("imul rax, 1").unwrap_err();
        assert!(err.message.contains("Expected a register"));
    }

    #[test]
    fn rejects_missing_comma() {
        let err = parse("add rax rbx").unwrap_err();
        assert!(err.message.contains("','"));
    }

    #[test]
    fn parses_jump_to_label() {
        let instrs = parse("jmp there").unwrap();
        assert!(matches!(&instrs[0], Instruction::Jmp(_, t) if t.lexeme == "there"));
    }

    #[test]
    fn parses_ret_and_push_pop() {
        let instrs = parse("push rax\npop rdi\nret").unwrap();
        assert_eq!(instrs.len(), 3);
        assert!(matches!(&instrs[0], Instruction::Push(_, Register::Rax)));
        assert!(matches!(&instrs[1], Instruction::Pop(_, Register::Rdi)));
        assert!(matches!(&instrs[2], Instruction::Ret(_)));
    }
}
