//! Statement parsing.

use super::Parser;
use crate::CompileError;
use crate::ast::Stmt;
use crate::frontend::lexer::TokenKind;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, CompileError> {
        match self.peek().kind {
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Loop => self.parse_loop_statement(),
            TokenKind::Identifier => match self.peek_ahead(1) {
                TokenKind::Colon => self.parse_typed_declaration(),
                TokenKind::ColonEquals => self.parse_inferred_declaration(),
                TokenKind::Equals => self.parse_assignment(),
                TokenKind::Dot | TokenKind::LParen => {
                    let expr = self.parse_expression()?;
                    Ok(Stmt::Expr(expr))
                }
                _ => Err(self.error_here(format!(
                    "Unexpected token after identifier '{}'",
                    self.peek().lexeme
                ))),
            },
            _ => Err(self.error_here(format!("Expected statement, got {}", self.peek().kind))),
        }
    }

    fn parse_return(&mut self) -> Result<Stmt, CompileError> {
        self.consume(TokenKind::Return)?;
        // `return` with no expression is only legal when the next token
        // already begins a new statement or closes the block.
        if Self::is_statement_start(self.peek().kind) {
            Ok(Stmt::Return { value: None })
        } else {
            let value = self.parse_expression()?;
            Ok(Stmt::Return { value: Some(value) })
        }
    }

    fn parse_typed_declaration(&mut self) -> Result<Stmt, CompileError> {
        let name = self.consume(TokenKind::Identifier)?.lexeme;
        self.consume(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        self.consume(TokenKind::Equals)?;
        let value = self.parse_expression()?;

        self.record_variable(&name, &ty);
        Ok(Stmt::VarDecl { name, ty, value })
    }

    fn parse_inferred_declaration(&mut self) -> Result<Stmt, CompileError> {
        let name = self.consume(TokenKind::Identifier)?.lexeme;
        self.consume(TokenKind::ColonEquals)?;
        let value = self.parse_expression()?;
        let ty = self.infer_type(&value)?;

        self.record_variable(&name, &ty);
        Ok(Stmt::VarDecl { name, ty, value })
    }

    fn parse_assignment(&mut self) -> Result<Stmt, CompileError> {
        let name = self.consume(TokenKind::Identifier)?.lexeme;
        self.consume(TokenKind::Equals)?;
        let value = self.parse_expression()?;
        Ok(Stmt::Assign { name, value })
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, CompileError> {
        self.consume(TokenKind::If)?;
        let condition = self.parse_expression()?;
        let then_body = self.parse_body()?;

        let else_body = if self.check(TokenKind::Else) {
            self.advance();
            if self.check(TokenKind::If) {
                // `else if` chains nest to the right: the else body is the
                // nested if statement itself.
                vec![self.parse_if_statement()?]
            } else {
                self.parse_body()?
            }
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            condition,
            then_body,
            else_body,
        })
    }

    fn parse_loop_statement(&mut self) -> Result<Stmt, CompileError> {
        self.consume(TokenKind::Loop)?;

        if self.check(TokenKind::If) {
            self.advance();
            let condition = self.parse_expression()?;
            let body = self.parse_body()?;
            return Ok(Stmt::WhileLoop { condition, body });
        }

        let var = self.consume(TokenKind::Identifier)?.lexeme;
        self.consume(TokenKind::In)?;
        let range = self.parse_range_expression()?;

        // The loop variable is visible to inference inside the body.
        self.record_variable(&var, "i32");
        let body = self.parse_body()?;
        Ok(Stmt::RangeLoop { var, range, body })
    }

    pub(crate) fn record_variable(&mut self, name: &str, ty: &str) {
        self.variable_types.insert(name.to_string(), ty.to_string());
    }
}
