//! Expression lowering.

use inkwell::AddressSpace;
use inkwell::IntPredicate;
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue};

use super::CodeGenerator;
use crate::ast::{BinOp, Expr, Param, Stmt, UnOp};
use crate::types;
use crate::{CompileError, SemanticErrorKind};

impl<'ctx> CodeGenerator<'ctx> {
    pub(crate) fn gen_expr(&mut self, expr: &Expr) -> Result<BasicValueEnum<'ctx>, CompileError> {
        match expr {
            Expr::Number(n) => Ok(self.context.i32_type().const_int(*n as u64, true).into()),
            Expr::Bool(b) => Ok(self
                .context
                .bool_type()
                .const_int(u64::from(*b), false)
                .into()),
            Expr::Str(s) => {
                let global = self.builder.build_global_string_ptr(s, ".str")?;
                Ok(global.as_pointer_value().into())
            }
            Expr::Var(name) => self.gen_variable(name),
            Expr::Binary { op, left, right } => self.gen_binary(*op, left, right),
            Expr::Unary { op, operand } => self.gen_unary(*op, operand),
            Expr::Call { name, args } => {
                self.gen_call(name, args)?.ok_or_else(|| {
                    CompileError::semantic(
                        SemanticErrorKind::TypeMismatch,
                        format!("Function '{name}' returns nil and produces no value"),
                    )
                })
            }
            Expr::MemberCall {
                object,
                member,
                args,
            } => self.gen_member_call(object, member, args),
            Expr::Range { .. } => Err(CompileError::semantic(
                SemanticErrorKind::TypeMismatch,
                "Range expression is only valid in a loop header",
            )),
            Expr::AnonFunction {
                params,
                return_type,
                body,
            } => {
                let function = self.gen_anonymous_function(params, return_type, body)?;
                Ok(function.as_global_value().as_pointer_value().into())
            }
        }
    }

    // Parameter slots first, then locals, then the module's function table,
    // so a named function can be used as a plain value.
    fn gen_variable(&mut self, name: &str) -> Result<BasicValueEnum<'ctx>, CompileError> {
        if let Some(slot) = self
            .params
            .get(name)
            .or_else(|| self.locals.get(name))
            .copied()
        {
            let ty_str = self.variable_types.get(name).cloned().ok_or_else(|| {
                CompileError::semantic(
                    SemanticErrorKind::UnknownVariable,
                    format!("Unknown variable '{name}'"),
                )
            })?;
            let ty = self.llvm_basic_type(&ty_str)?;
            return Ok(self.builder.build_load(ty, slot, name)?);
        }

        if let Some(function) = self.module.get_function(name) {
            return Ok(function.as_global_value().as_pointer_value().into());
        }

        Err(CompileError::semantic(
            SemanticErrorKind::UnknownVariable,
            format!("Unknown variable '{name}'"),
        ))
    }

    fn gen_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        if op.is_logical() {
            return self.gen_short_circuit(op, left, right);
        }

        let lhs_ty = self.static_expr_type(left);
        let rhs_ty = self.static_expr_type(right);
        let lhs = {
            let v = self.gen_expr(left)?;
            self.expect_int(v, "the left operand")?
        };
        let rhs = {
            let v = self.gen_expr(right)?;
            self.expect_int(v, "the right operand")?
        };
        let (lhs, rhs) =
            self.unify_int_widths(lhs, lhs_ty.as_deref(), rhs, rhs_ty.as_deref())?;

        let value = match op {
            BinOp::Add => self.builder.build_int_add(lhs, rhs, "addtmp")?,
            BinOp::Sub => self.builder.build_int_sub(lhs, rhs, "subtmp")?,
            BinOp::Mul => self.builder.build_int_mul(lhs, rhs, "multmp")?,
            BinOp::Div => self.builder.build_int_signed_div(lhs, rhs, "divtmp")?,
            BinOp::Gt => self
                .builder
                .build_int_compare(IntPredicate::SGT, lhs, rhs, "gttmp")?,
            BinOp::Lt => self
                .builder
                .build_int_compare(IntPredicate::SLT, lhs, rhs, "lttmp")?,
            BinOp::Ge => self
                .builder
                .build_int_compare(IntPredicate::SGE, lhs, rhs, "getmp")?,
            BinOp::Le => self
                .builder
                .build_int_compare(IntPredicate::SLE, lhs, rhs, "letmp")?,
            BinOp::Eq => self
                .builder
                .build_int_compare(IntPredicate::EQ, lhs, rhs, "eqtmp")?,
            BinOp::Ne => self
                .builder
                .build_int_compare(IntPredicate::NE, lhs, rhs, "netmp")?,
            BinOp::And | BinOp::Or => unreachable!("logical ops handled above"),
        };
        Ok(value.into())
    }

    // `and`/`or` evaluate the right operand only when the left one does not
    // already determine the result.
    fn gen_short_circuit(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        let lhs = {
            let v = self.gen_expr(left)?;
            self.expect_int(v, "the left operand")?
        };
        let lhs_block = self.current_block()?;
        let function = self.current_function()?;

        let (rhs_name, end_name, result_name) = match op {
            BinOp::And => ("and.rhs", "and.end", "andtmp"),
            _ => ("or.rhs", "or.end", "ortmp"),
        };
        let rhs_block = self.context.append_basic_block(function, rhs_name);
        let end_block = self.context.append_basic_block(function, end_name);

        match op {
            BinOp::And => self
                .builder
                .build_conditional_branch(lhs, rhs_block, end_block)?,
            _ => self
                .builder
                .build_conditional_branch(lhs, end_block, rhs_block)?,
        };

        self.builder.position_at_end(rhs_block);
        let rhs = {
            let v = self.gen_expr(right)?;
            self.expect_int(v, "the right operand")?
        };
        let rhs_end = self.current_block()?;
        self.builder.build_unconditional_branch(end_block)?;

        self.builder.position_at_end(end_block);
        let phi = self.builder.build_phi(self.context.bool_type(), result_name)?;
        phi.add_incoming(&[(&lhs, lhs_block), (&rhs, rhs_end)]);
        Ok(phi.as_basic_value())
    }

    fn gen_unary(
        &mut self,
        op: UnOp,
        operand: &Expr,
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        match op {
            UnOp::Not => {
                let v = {
                    let v = self.gen_expr(operand)?;
                    self.expect_int(v, "'not'")?
                };
                Ok(self.builder.build_not(v, "nottmp")?.into())
            }
            UnOp::Neg => {
                let v = {
                    let v = self.gen_expr(operand)?;
                    self.expect_int(v, "unary '-'")?
                };
                let zero = v.get_type().const_zero();
                Ok(self.builder.build_int_sub(zero, v, "negtmp")?.into())
            }
            UnOp::AddrOf => {
                // Only the storage slot of a variable has an address.
                let Expr::Var(name) = operand else {
                    return Err(CompileError::semantic(
                        SemanticErrorKind::TypeMismatch,
                        "Can only take the address of a variable",
                    ));
                };
                self.params
                    .get(name)
                    .or_else(|| self.locals.get(name))
                    .copied()
                    .map(Into::into)
                    .ok_or_else(|| {
                        CompileError::semantic(
                            SemanticErrorKind::UnknownVariable,
                            format!("Unknown variable '{name}'"),
                        )
                    })
            }
            UnOp::Deref => {
                let pointer_ty = self.static_expr_type(operand).ok_or_else(|| {
                    CompileError::semantic(
                        SemanticErrorKind::TypeMismatch,
                        "Cannot determine the pointed-to type of this dereference",
                    )
                })?;
                let pointee = types::pointee_type(&pointer_ty).ok_or_else(|| {
                    CompileError::semantic(
                        SemanticErrorKind::TypeMismatch,
                        format!("Cannot dereference a value of type '{pointer_ty}'"),
                    )
                })?;
                let pointee_llvm = self.llvm_basic_type(pointee)?;

                let value = self.gen_expr(operand)?;
                let BasicValueEnum::PointerValue(ptr) = value else {
                    return Err(CompileError::semantic(
                        SemanticErrorKind::TypeMismatch,
                        "Cannot dereference a non-pointer value",
                    ));
                };
                Ok(self.builder.build_load(pointee_llvm, ptr, "deref")?)
            }
        }
    }

    // Static surface type of an expression, from declared variable and
    // function types. Used to pick signedness when widening and to find the
    // pointed-to type of a dereference; `None` when the type is not
    // statically known.
    pub(crate) fn static_expr_type(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Number(_) => Some("i32".to_string()),
            Expr::Bool(_) => Some("bool".to_string()),
            Expr::Str(_) => Some("const string".to_string()),
            Expr::Var(name) => self.variable_types.get(name).cloned(),
            Expr::Unary {
                op: UnOp::Not | UnOp::Neg,
                operand,
            } => self.static_expr_type(operand),
            Expr::Unary {
                op: UnOp::AddrOf,
                operand,
            } => match operand.as_ref() {
                Expr::Var(name) => {
                    let inner = self.variable_types.get(name)?;
                    Some(format!("*{inner}"))
                }
                _ => None,
            },
            Expr::Unary {
                op: UnOp::Deref,
                operand,
            } => {
                let outer = self.static_expr_type(operand)?;
                types::pointee_type(&outer).map(str::to_string)
            }
            Expr::Binary { op, left, right } => {
                if op.is_comparison() || op.is_logical() {
                    return Some("bool".to_string());
                }
                // Arithmetic takes the wider operand's type.
                let lt = self.static_expr_type(left)?;
                let rt = self.static_expr_type(right)?;
                match (types::integer_bit_width(&lt), types::integer_bit_width(&rt)) {
                    (Some(lw), Some(rw)) => Some(if lw >= rw { lt } else { rt }),
                    _ => Some(lt),
                }
            }
            Expr::Call { name, .. } => {
                if let Some(var_ty) = self.variable_types.get(name) {
                    if let Some((_, ret)) = types::parse_fn_type(var_ty) {
                        return Some(ret);
                    }
                }
                self.function_signatures
                    .get(name)
                    .map(|(_, ret)| ret.clone())
            }
            // printf result
            Expr::MemberCall { .. } => Some("i32".to_string()),
            Expr::AnonFunction {
                params,
                return_type,
                ..
            } => {
                let param_types: Vec<String> = params.iter().map(|p| p.ty.clone()).collect();
                Some(types::canonical_fn_type(&param_types, return_type))
            }
            Expr::Range { .. } => None,
        }
    }

    /// Lower a call. Returns `None` for calls to nil functions.
    pub(crate) fn gen_call(
        &mut self,
        name: &str,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>, CompileError> {
        // A local or parameter of function-pointer type shadows any module
        // function of the same name; the call goes through the loaded
        // pointer.
        if let Some(var_ty) = self.variable_types.get(name).cloned() {
            if types::is_function_type(&var_ty) {
                return self.gen_indirect_call(name, &var_ty, args);
            }
        }

        let function = self.module.get_function(name).ok_or_else(|| {
            CompileError::semantic(
                SemanticErrorKind::UndefinedFunction,
                format!("Unknown function '{name}'"),
            )
        })?;

        let expected = function.count_params() as usize;
        if args.len() != expected {
            return Err(CompileError::semantic(
                SemanticErrorKind::ArgumentCountMismatch,
                format!(
                    "Function '{name}' expects {expected} argument(s), got {}",
                    args.len()
                ),
            ));
        }

        let signature = self.function_signatures.get(name).cloned();
        let llvm_param_types = function.get_type().get_param_types();
        let mut call_args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let mut value = self.gen_expr(arg)?;
            // Arguments adapt to the callee's declared parameter types, the
            // same as indirect calls; a function without a recorded
            // signature (an external declaration) only has its LLVM
            // parameter types, which widen signed.
            if let Some(param_ty) = signature.as_ref().and_then(|(params, _)| params.get(i)) {
                value = self.adapt_to_surface_type(value, param_ty)?;
            } else if let Some(target) = llvm_param_types
                .get(i)
                .copied()
                .and_then(|ty| inkwell::types::BasicTypeEnum::try_from(ty).ok())
            {
                value = self.adapt_int(value, target, true, "argcast")?;
            }
            call_args.push(value.into());
        }

        let call = self.builder.build_call(function, &call_args, "calltmp")?;
        Ok(call.try_as_basic_value().left())
    }

    fn gen_indirect_call(
        &mut self,
        name: &str,
        var_ty: &str,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>, CompileError> {
        let (param_types, return_type) = types::parse_fn_type(var_ty).ok_or_else(|| {
            CompileError::semantic(
                SemanticErrorKind::TypeMismatch,
                format!("Malformed function type '{var_ty}'"),
            )
        })?;

        if args.len() != param_types.len() {
            return Err(CompileError::semantic(
                SemanticErrorKind::ArgumentCountMismatch,
                format!(
                    "Function '{name}' expects {} argument(s), got {}",
                    param_types.len(),
                    args.len()
                ),
            ));
        }

        let fn_type = self.fn_type_for(&param_types, &return_type)?;
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

        let loaded = self.builder.build_load(
            self.context.ptr_type(AddressSpace::default()),
            slot,
            name,
        )?;
        let BasicValueEnum::PointerValue(callee) = loaded else {
            return Err(CompileError::semantic(
                SemanticErrorKind::TypeMismatch,
                format!("Variable '{name}' does not hold a function pointer"),
            ));
        };

        let mut call_args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for (arg, param_ty) in args.iter().zip(&param_types) {
            let value = self.gen_expr(arg)?;
            let value = self.adapt_to_surface_type(value, param_ty)?;
            call_args.push(value.into());
        }

        let call = self
            .builder
            .build_indirect_call(fn_type, callee, &call_args, "calltmp")?;
        Ok(call.try_as_basic_value().left())
    }

    // `fmt.println` is the one supported member call; it lowers to the
    // variadic C `printf` with `{:d}`/`{:s}` rewritten and '\n' appended.
    fn gen_member_call(
        &mut self,
        object: &str,
        member: &str,
        args: &[Expr],
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        if object != "fmt" || member != "println" {
            return Err(CompileError::semantic(
                SemanticErrorKind::UnsupportedMemberAccess,
                format!("Unsupported member access: {object}.{member}"),
            ));
        }

        let Some((first, rest)) = args.split_first() else {
            return Err(CompileError::semantic(
                SemanticErrorKind::ArgumentCountMismatch,
                "fmt.println expects at least a format string",
            ));
        };

        let printf = self.printf_declaration();

        let mut call_args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        match first {
            Expr::Str(s) => {
                let translated = translate_format_string(s);
                let global = self.builder.build_global_string_ptr(&translated, "fmt")?;
                call_args.push(global.as_pointer_value().into());
            }
            // A non-literal format string is passed through untouched.
            other => call_args.push(self.gen_expr(other)?.into()),
        }
        for arg in rest {
            call_args.push(self.gen_expr(arg)?.into());
        }

        let call = self.builder.build_call(printf, &call_args, "printf")?;
        call.try_as_basic_value()
            .left()
            .ok_or_else(|| CompileError::Backend("printf returned no value".to_string()))
    }

    fn printf_declaration(&mut self) -> FunctionValue<'ctx> {
        if let Some(function) = self.module.get_function("printf") {
            return function;
        }
        let char_ptr = self.context.ptr_type(AddressSpace::default());
        let printf_type = self.context.i32_type().fn_type(&[char_ptr.into()], true);
        self.module.add_function("printf", printf_type, None)
    }

    // A fresh internal function; the builder and the surrounding function's
    // scope are restored afterwards, so anonymous functions cannot capture.
    fn gen_anonymous_function(
        &mut self,
        params: &[Param],
        return_type: &str,
        body: &[Stmt],
    ) -> Result<FunctionValue<'ctx>, CompileError> {
        let name = self.next_anon_name();
        let param_types: Vec<String> = params.iter().map(|p| p.ty.clone()).collect();
        let fn_type = self.fn_type_for(&param_types, return_type)?;
        let function = self.add_internal_function(&name, fn_type);

        let saved_block = self.current_block()?;
        let saved_params = std::mem::take(&mut self.params);
        let saved_locals = std::mem::take(&mut self.locals);
        let saved_types = std::mem::take(&mut self.variable_types);
        let saved_return = self.current_return_type.clone();

        let result = self.compile_function_body(function, params, return_type, body);

        self.params = saved_params;
        self.locals = saved_locals;
        self.variable_types = saved_types;
        self.current_return_type = saved_return;
        self.builder.position_at_end(saved_block);

        result?;
        Ok(function)
    }
}

fn translate_format_string(s: &str) -> String {
    let mut out = s.replace("{:d}", "%d").replace("{:s}", "%s");
    out.push('\n');
    out
}
