//! Recursive-descent parser for the Void language.
//!
//! The parser owns the materialized token vector and a cursor. It also keeps
//! the per-function type scope used by `:=` inference: a map from variable
//! name to type string, and a map from function name to return type.

mod expr;
mod stmt;

use std::collections::HashMap;

use crate::CompileError;
use crate::ast::{Function, Import, Param, Program};
use crate::frontend::lexer::{Token, TokenKind};
use crate::types;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,

    // Parser scope, rebuilt per function.
    variable_types: HashMap<String, String>,
    function_return_types: HashMap<String, String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            variable_types: HashMap::new(),
            function_return_types: HashMap::new(),
        }
    }

    pub fn parse(mut self) -> Result<Program, CompileError> {
        let mut imports = Vec::new();
        let mut functions = Vec::new();

        while !self.check(TokenKind::EndOfFile) {
            match self.peek().kind {
                TokenKind::Import => imports.push(self.parse_import()?),
                TokenKind::Const => functions.push(self.parse_function()?),
                _ => {
                    return Err(self.error_here(format!(
                        "Expected 'import' or 'const' at top level, got {}",
                        self.describe_current()
                    )));
                }
            }
        }

        Ok(Program { imports, functions })
    }

    // ── Token primitives ─────────────────────────────────────────────────

    pub(crate) fn peek(&self) -> &Token {
        // The vector always ends in EndOfFile, so the cursor never runs past
        // a real token.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> TokenKind {
        let idx = (self.current + n).min(self.tokens.len() - 1);
        self.tokens[idx].kind
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    pub(crate) fn consume(&mut self, expected: TokenKind) -> Result<Token, CompileError> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "Expected {}, got {}",
                expected,
                self.describe_current()
            )))
        }
    }

    pub(crate) fn error_here(&self, message: String) -> CompileError {
        let token = self.peek();
        CompileError::Parse {
            message,
            line: token.line,
            column: token.column,
        }
    }

    fn describe_current(&self) -> String {
        let token = self.peek();
        if token.kind == TokenKind::EndOfFile {
            token.kind.to_string()
        } else {
            format!("'{}'", token.lexeme)
        }
    }

    /// True if `kind` can begin a new statement (or close the current block).
    /// This is the follow set consulted by the bare-`return` lookahead.
    pub(crate) fn is_statement_start(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::EndOfFile
                | TokenKind::RBrace
                | TokenKind::If
                | TokenKind::Loop
                | TokenKind::Return
                | TokenKind::Const
        )
    }

    // ── Declarations ─────────────────────────────────────────────────────

    fn parse_import(&mut self) -> Result<Import, CompileError> {
        self.consume(TokenKind::Import)?;
        let module_name = self.consume(TokenKind::Identifier)?.lexeme;
        Ok(Import { module_name })
    }

    fn parse_function(&mut self) -> Result<Function, CompileError> {
        self.consume(TokenKind::Const)?;
        let name = self.consume(TokenKind::Identifier)?.lexeme;
        self.consume(TokenKind::Equals)?;
        self.consume(TokenKind::Fn)?;

        self.consume(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.consume(TokenKind::RParen)?;

        let return_type = if self.check(TokenKind::Arrow) {
            self.advance();
            self.parse_type()?
        } else {
            types::NIL.to_string()
        };

        // Registered before the body so calls to the function being parsed
        // (recursion) infer correctly.
        self.function_return_types
            .insert(name.clone(), return_type.clone());

        self.variable_types.clear();
        for param in &params {
            self.variable_types
                .insert(param.name.clone(), param.ty.clone());
        }

        let body = self.parse_body()?;
        Ok(Function {
            name,
            params,
            return_type,
            body,
        })
    }

    pub(crate) fn parse_params(&mut self) -> Result<Vec<Param>, CompileError> {
        let mut params = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            let name = self.consume(TokenKind::Identifier)?.lexeme;
            self.consume(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param { name, ty });
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                return Ok(params);
            }
        }
    }

    /// Parse a surface type and return its canonical string form.
    pub(crate) fn parse_type(&mut self) -> Result<String, CompileError> {
        match self.peek().kind {
            TokenKind::I8
            | TokenKind::I16
            | TokenKind::I32
            | TokenKind::I64
            | TokenKind::U8
            | TokenKind::U16
            | TokenKind::U32
            | TokenKind::U64
            | TokenKind::Bool
            | TokenKind::Nil
            | TokenKind::Void
            | TokenKind::String => Ok(self.advance().lexeme),
            TokenKind::Const => {
                self.advance();
                self.consume(TokenKind::String)?;
                Ok("const string".to_string())
            }
            TokenKind::Asterisk => {
                self.advance();
                Ok(format!("*{}", self.parse_type()?))
            }
            TokenKind::Fn => {
                self.advance();
                self.consume(TokenKind::LParen)?;
                let mut param_types = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        param_types.push(self.parse_type()?);
                        if self.check(TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RParen)?;
                self.consume(TokenKind::Arrow)?;
                let return_type = self.parse_type()?;
                Ok(types::canonical_fn_type(&param_types, &return_type))
            }
            _ => Err(self.error_here(format!("Expected type, got {}", self.describe_current()))),
        }
    }

    /// A statement body: `{ Statement* }` or `do Statement`.
    pub(crate) fn parse_body(&mut self) -> Result<Vec<crate::ast::Stmt>, CompileError> {
        if self.check(TokenKind::LBrace) {
            self.advance();
            let mut body = Vec::new();
            while !self.check(TokenKind::RBrace) {
                if self.check(TokenKind::EndOfFile) {
                    return Err(self.error_here("Unexpected end of file in block".to_string()));
                }
                body.push(self.parse_statement()?);
            }
            self.consume(TokenKind::RBrace)?;
            Ok(body)
        } else if self.check(TokenKind::Do) {
            self.advance();
            Ok(vec![self.parse_statement()?])
        } else {
            Err(self.error_here(format!(
                "Expected '{{' or 'do', got {}",
                self.describe_current()
            )))
        }
    }
}
