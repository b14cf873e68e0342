//! Expression parsing (precedence climbing) and `:=` type inference.

use super::Parser;
use crate::CompileError;
use crate::ast::{BinOp, Expr, Stmt, UnOp};
use crate::frontend::lexer::TokenKind;
use crate::types;

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_logical_and()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_comparison()?;
        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        // `not` binds at the comparison level and recurses to the right, so
        // `not a > 10` negates the whole comparison.
        if self.check(TokenKind::Not) {
            self.advance();
            let operand = self.parse_comparison()?;
            return Ok(Expr::Unary {
                op: UnOp::Not,
                operand: Box::new(operand),
            });
        }

        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::GreaterThan => BinOp::Gt,
                TokenKind::LessThan => BinOp::Lt,
                TokenKind::GreaterEqual => BinOp::Ge,
                TokenKind::LessEqual => BinOp::Le,
                TokenKind::EqualEqual => BinOp::Eq,
                TokenKind::NotEqual => BinOp::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    pub(crate) fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Asterisk => BinOp::Mul,
                TokenKind::Divide => BinOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        if self.check(TokenKind::Minus) {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;
        while self.check(TokenKind::DotStar) {
            self.advance();
            expr = Expr::Unary {
                op: UnOp::Deref,
                operand: Box::new(expr),
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        match self.peek().kind {
            TokenKind::Number => {
                let token = self.advance();
                let value: i32 = token.lexeme.parse().map_err(|_| CompileError::Parse {
                    message: format!("Invalid integer literal '{}'", token.lexeme),
                    line: token.line,
                    column: token.column,
                })?;
                Ok(Expr::Number(value))
            }
            TokenKind::StringLiteral => Ok(Expr::Str(self.advance().lexeme)),
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Fn => self.parse_anonymous_function(),
            TokenKind::Borrow => {
                self.advance();
                let operand = self.parse_primary()?;
                Ok(Expr::Unary {
                    op: UnOp::AddrOf,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Identifier => {
                let name = self.advance().lexeme;
                if self.check(TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    Ok(Expr::Call { name, args })
                } else if self.check(TokenKind::Dot) {
                    self.advance();
                    let member = self.consume(TokenKind::Identifier)?.lexeme;
                    let args = self.parse_call_args()?;
                    Ok(Expr::MemberCall {
                        object: name,
                        member,
                        args,
                    })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            _ => Err(self.error_here(format!("Expected expression, got {}", self.peek().kind))),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, CompileError> {
        self.consume(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_anonymous_function(&mut self) -> Result<Expr, CompileError> {
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

        // The anonymous body gets the outer scope plus its own parameters;
        // the outer scope is restored afterwards (no capture).
        let saved_scope = self.variable_types.clone();
        for param in &params {
            self.record_variable(&param.name, &param.ty);
        }
        let body: Vec<Stmt> = self.parse_body()?;
        self.variable_types = saved_scope;

        Ok(Expr::AnonFunction {
            params,
            return_type,
            body,
        })
    }

    pub(crate) fn parse_range_expression(&mut self) -> Result<Expr, CompileError> {
        let start = self.parse_additive()?;
        self.consume(TokenKind::DotDot)?;
        let end = self.parse_additive()?;
        Ok(Expr::Range {
            start: Box::new(start),
            end: Box::new(end),
        })
    }

    // ── Type inference ───────────────────────────────────────────────────

    /// Syntactic type inference for the right-hand side of `:=`.
    pub(crate) fn infer_type(&self, expr: &Expr) -> Result<String, CompileError> {
        match expr {
            Expr::Number(_) => Ok("i32".to_string()),
            Expr::Bool(_) => Ok("bool".to_string()),
            Expr::Str(_) => Ok("const string".to_string()),
            Expr::Var(name) => self.variable_types.get(name).cloned().ok_or_else(|| {
                self.error_here(format!("Cannot infer type of undeclared variable '{name}'"))
            }),
            Expr::Binary { op, left, right } => {
                let lt = self.infer_type(left)?;
                let rt = self.infer_type(right)?;
                if op.is_arithmetic() {
                    if lt == "i32" && rt == "i32" {
                        Ok("i32".to_string())
                    } else if lt == "const string" && rt == "const string" && *op == BinOp::Add {
                        // Reserved for string concatenation.
                        Ok("const string".to_string())
                    } else {
                        Err(self.error_here(format!(
                            "Type mismatch in arithmetic expression: {lt} {op} {rt}"
                        )))
                    }
                } else if op.is_comparison() {
                    if lt == rt {
                        Ok("bool".to_string())
                    } else {
                        Err(self
                            .error_here(format!("Cannot compare values of types {lt} and {rt}")))
                    }
                } else {
                    // and / or
                    if lt == "bool" && rt == "bool" {
                        Ok("bool".to_string())
                    } else {
                        Err(self.error_here(format!(
                            "Logical '{op}' requires bool operands, got {lt} and {rt}"
                        )))
                    }
                }
            }
            Expr::Call { name, .. } => {
                if let Some(ret) = self.function_return_types.get(name) {
                    return Ok(ret.clone());
                }
                // A call through a function-pointer variable yields the
                // return component of its type.
                if let Some(var_ty) = self.variable_types.get(name) {
                    if let Some((_, ret)) = types::parse_fn_type(var_ty) {
                        return Ok(ret);
                    }
                }
                Err(self.error_here(format!("Unknown function '{name}'")))
            }
            Expr::MemberCall { object, member, .. } => {
                if object == "fmt" && member == "println" {
                    Ok(types::NIL.to_string())
                } else {
                    Err(self.error_here(format!("Unknown member access {object}.{member}")))
                }
            }
            Expr::AnonFunction {
                params,
                return_type,
                ..
            } => {
                let param_types: Vec<String> = params.iter().map(|p| p.ty.clone()).collect();
                Ok(types::canonical_fn_type(&param_types, return_type))
            }
            _ => Err(self.error_here(
                "Cannot infer type of expression; use an explicit type annotation".to_string(),
            )),
        }
    }
}
