//! Statement lowering.

use inkwell::IntPredicate;

use super::CodeGenerator;
use crate::ast::{Expr, Stmt};
use crate::types;
use crate::{CompileError, SemanticErrorKind};

impl<'ctx> CodeGenerator<'ctx> {
    pub(crate) fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Return { value } => self.gen_return(value.as_ref()),
            Stmt::VarDecl { name, ty, value } => self.gen_var_decl(name, ty, value),
            Stmt::Assign { name, value } => self.gen_assign(name, value),
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => self.gen_if(condition, then_body, else_body),
            Stmt::RangeLoop { var, range, body } => self.gen_range_loop(var, range, body),
            Stmt::WhileLoop { condition, body } => self.gen_while_loop(condition, body),
            Stmt::Expr(expr) => {
                // The value, if any, is discarded.
                match expr {
                    Expr::Call { name, args } => {
                        self.gen_call(name, args)?;
                    }
                    _ => {
                        self.gen_expr(expr)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn gen_return(&mut self, value: Option<&Expr>) -> Result<(), CompileError> {
        let return_type = self.current_return_type.clone();
        let is_nil = types::is_void(&return_type);

        match value {
            Some(_) if is_nil => Err(CompileError::semantic(
                SemanticErrorKind::ReturnValueInNilFunction,
                "Cannot return a value from a nil function",
            )),
            None if !is_nil => Err(CompileError::semantic(
                SemanticErrorKind::MissingReturnValue,
                "Cannot use return without value in non-nil function",
            )),
            Some(expr) => {
                let v = self.gen_expr(expr)?;
                let v = self.adapt_to_surface_type(v, &return_type)?;
                self.builder.build_return(Some(&v))?;
                Ok(())
            }
            None => {
                self.builder.build_return(None)?;
                Ok(())
            }
        }
    }

    fn gen_var_decl(&mut self, name: &str, ty: &str, value: &Expr) -> Result<(), CompileError> {
        if self.locals.contains_key(name) || self.params.contains_key(name) {
            return Err(CompileError::semantic(
                SemanticErrorKind::Redeclaration,
                format!("Variable '{name}' is already declared"),
            ));
        }

        let value = self.gen_expr(value)?;
        // The slot carries the declared width; the initializer is adapted to
        // it rather than the other way around.
        let value = self.adapt_to_surface_type(value, ty)?;
        let llvm_ty = self.llvm_basic_type(ty)?;
        let slot = self.builder.build_alloca(llvm_ty, name)?;
        self.builder.build_store(slot, value)?;

        self.locals.insert(name.to_string(), slot);
        self.variable_types.insert(name.to_string(), ty.to_string());
        Ok(())
    }

    fn gen_assign(&mut self, name: &str, value: &Expr) -> Result<(), CompileError> {
        let slot = self
            .locals
            .get(name)
            .or_else(|| self.params.get(name))
            .copied()
            .ok_or_else(|| {
                CompileError::semantic(
                    SemanticErrorKind::UnknownVariable,
                    format!("Unknown variable '{name}'"),
                )
            })?;
        let ty = self.variable_types.get(name).cloned().ok_or_else(|| {
            CompileError::semantic(
                SemanticErrorKind::UnknownVariable,
                format!("Unknown variable '{name}'"),
            )
        })?;

        let v = self.gen_expr(value)?;
        let v = self.adapt_to_surface_type(v, &ty)?;
        self.builder.build_store(slot, v)?;
        Ok(())
    }

    fn gen_if(
        &mut self,
        condition: &Expr,
        then_body: &[Stmt],
        else_body: &[Stmt],
    ) -> Result<(), CompileError> {
        let cond = {
            let v = self.gen_expr(condition)?;
            self.expect_int(v, "the if condition")?
        };
        let function = self.current_function()?;

        let then_block = self.context.append_basic_block(function, "then");
        let else_block = self.context.append_basic_block(function, "else");
        let merge_block = self.context.append_basic_block(function, "merge");

        self.builder
            .build_conditional_branch(cond, then_block, else_block)?;

        self.builder.position_at_end(then_block);
        for stmt in then_body {
            self.gen_stmt(stmt)?;
        }
        if !self.block_has_terminator() {
            self.builder.build_unconditional_branch(merge_block)?;
        }

        self.builder.position_at_end(else_block);
        for stmt in else_body {
            self.gen_stmt(stmt)?;
        }
        if !self.block_has_terminator() {
            self.builder.build_unconditional_branch(merge_block)?;
        }

        self.builder.position_at_end(merge_block);
        Ok(())
    }

    // loop i in a..b — half-open, step 1, signed i32 arithmetic.
    fn gen_range_loop(
        &mut self,
        var: &str,
        range: &Expr,
        body: &[Stmt],
    ) -> Result<(), CompileError> {
        let Expr::Range { start, end } = range else {
            return Err(CompileError::semantic(
                SemanticErrorKind::TypeMismatch,
                "Loop range must be a range expression",
            ));
        };

        let i32_type = self.context.i32_type();
        let start_value = {
            let v = self.gen_expr(start)?;
            self.expect_int(v, "the range start")?
        };

        let slot = self.builder.build_alloca(i32_type, var)?;
        self.builder.build_store(slot, start_value)?;

        // The loop variable shadows any same-named binding for the duration
        // of the loop.
        let shadowed_slot = self.locals.insert(var.to_string(), slot);
        let shadowed_type = self
            .variable_types
            .insert(var.to_string(), "i32".to_string());

        let function = self.current_function()?;
        let cond_block = self.context.append_basic_block(function, "loop.cond");
        let body_block = self.context.append_basic_block(function, "loop.body");
        let end_block = self.context.append_basic_block(function, "loop.end");

        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(cond_block);
        let current = {
            let v = self.builder.build_load(i32_type, slot, var)?;
            self.expect_int(v, "the loop variable")?
        };
        let end_value = {
            let v = self.gen_expr(end)?;
            self.expect_int(v, "the range end")?
        };
        let keep_going =
            self.builder
                .build_int_compare(IntPredicate::SLT, current, end_value, "loopcond")?;
        self.builder
            .build_conditional_branch(keep_going, body_block, end_block)?;

        self.builder.position_at_end(body_block);
        for stmt in body {
            self.gen_stmt(stmt)?;
        }
        if !self.block_has_terminator() {
            let v = self.builder.build_load(i32_type, slot, var)?;
            let current = self.expect_int(v, "the loop variable")?;
            let next =
                self.builder
                    .build_int_add(current, i32_type.const_int(1, false), "loopinc")?;
            self.builder.build_store(slot, next)?;
            self.builder.build_unconditional_branch(cond_block)?;
        }

        self.builder.position_at_end(end_block);

        // Drop the loop variable, restoring whatever it shadowed.
        match shadowed_slot {
            Some(prev) => self.locals.insert(var.to_string(), prev),
            None => self.locals.remove(var),
        };
        match shadowed_type {
            Some(prev) => self.variable_types.insert(var.to_string(), prev),
            None => self.variable_types.remove(var),
        };
        Ok(())
    }

    // loop if cond — condition re-evaluated before every iteration.
    fn gen_while_loop(&mut self, condition: &Expr, body: &[Stmt]) -> Result<(), CompileError> {
        let function = self.current_function()?;
        let cond_block = self.context.append_basic_block(function, "loop.cond");
        let body_block = self.context.append_basic_block(function, "loop.body");
        let end_block = self.context.append_basic_block(function, "loop.end");

        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(cond_block);
        let cond = {
            let v = self.gen_expr(condition)?;
            self.expect_int(v, "the loop condition")?
        };
        self.builder
            .build_conditional_branch(cond, body_block, end_block)?;

        self.builder.position_at_end(body_block);
        for stmt in body {
            self.gen_stmt(stmt)?;
        }
        if !self.block_has_terminator() {
            self.builder.build_unconditional_branch(cond_block)?;
        }

        self.builder.position_at_end(end_block);
        Ok(())
    }
}
