//! LLVM IR generation.
//!
//! The generator walks the AST once per function and emits instructions
//! through a single mutable builder. Parameters and locals are backed by
//! entry-block style `alloca` slots so assignment is a plain store; loads go
//! through the recorded surface type of each variable.

mod expr;
mod stmt;

use std::collections::HashMap;

use inkwell::AddressSpace;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};
use inkwell::values::{BasicValue, BasicValueEnum, FunctionValue, IntValue, PointerValue};
use tracing::debug;

use crate::ast::{Function, Param, Program, Stmt};
use crate::types;
use crate::{CompileError, SemanticErrorKind};

pub struct CodeGenerator<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,

    // Emitter scope, reset on entry to each function.
    params: HashMap<String, PointerValue<'ctx>>,
    locals: HashMap<String, PointerValue<'ctx>>,
    variable_types: HashMap<String, String>,

    // Declared surface signature of every named function, keyed by name:
    // parameter type strings and return type. LLVM parameter types lose
    // signedness, so argument adaptation reads the surface types from here.
    function_signatures: HashMap<String, (Vec<String>, String)>,

    current_return_type: String,
    anon_counter: usize,
}

impl<'ctx> CodeGenerator<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        let module = context.create_module("void_module");
        let builder = context.create_builder();
        Self {
            context,
            module,
            builder,
            params: HashMap::new(),
            locals: HashMap::new(),
            variable_types: HashMap::new(),
            function_signatures: HashMap::new(),
            current_return_type: types::NIL.to_string(),
            anon_counter: 0,
        }
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Consume the generator and hand the finished module to a backend.
    pub fn into_module(self) -> Module<'ctx> {
        self.module
    }

    pub fn compile_program(&mut self, program: &Program) -> Result<(), CompileError> {
        // Functions are emitted in declaration order; a call site only
        // resolves names already in the module table.
        for function in &program.functions {
            self.compile_function(function)?;
        }
        Ok(())
    }

    pub fn compile_function(
        &mut self,
        func: &Function,
    ) -> Result<FunctionValue<'ctx>, CompileError> {
        debug!(name = %func.name, return_type = %func.return_type, "compiling function");

        let param_types: Vec<String> = func.params.iter().map(|p| p.ty.clone()).collect();
        let fn_type = self.fn_type_for(&param_types, &func.return_type)?;
        let function = self.module.add_function(&func.name, fn_type, None);

        // Registered before the body so recursive calls resolve their own
        // signature.
        self.function_signatures.insert(
            func.name.clone(),
            (param_types, func.return_type.clone()),
        );

        self.compile_function_body(function, &func.params, &func.return_type, &func.body)?;
        Ok(function)
    }

    /// Shared lowering for named and anonymous functions: entry block,
    /// parameter slots, body, implicit return.
    pub(crate) fn compile_function_body(
        &mut self,
        function: FunctionValue<'ctx>,
        params: &[Param],
        return_type: &str,
        body: &[Stmt],
    ) -> Result<(), CompileError> {
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        self.params.clear();
        self.locals.clear();
        self.variable_types.clear();
        self.current_return_type = return_type.to_string();

        for (i, param) in params.iter().enumerate() {
            let value = function.get_nth_param(i as u32).ok_or_else(|| {
                CompileError::Backend(format!("Missing LLVM parameter {i} in function body"))
            })?;
            value.set_name(&param.name);

            let ty = self.llvm_basic_type(&param.ty)?;
            let slot = self.builder.build_alloca(ty, &param.name)?;
            self.builder.build_store(slot, value)?;

            self.params.insert(param.name.clone(), slot);
            self.variable_types
                .insert(param.name.clone(), param.ty.clone());
        }

        for stmt in body {
            self.gen_stmt(stmt)?;
        }

        if !self.block_has_terminator() {
            if types::is_void(return_type) {
                self.builder.build_return(None)?;
            } else {
                // Falling off the end of a value-returning function is not
                // rejected; the terminator keeps the IR well-formed and the
                // behavior undefined at runtime.
                self.builder.build_unreachable()?;
            }
        }
        Ok(())
    }

    // ── Type mapping ─────────────────────────────────────────────────────

    /// Map a surface type string to its LLVM representation.
    pub(crate) fn llvm_basic_type(&self, ty: &str) -> Result<BasicTypeEnum<'ctx>, CompileError> {
        if let Some(width) = types::integer_bit_width(ty) {
            return Ok(match width {
                8 => self.context.i8_type().into(),
                16 => self.context.i16_type().into(),
                32 => self.context.i32_type().into(),
                _ => self.context.i64_type().into(),
            });
        }
        if ty == "bool" {
            return Ok(self.context.bool_type().into());
        }
        if types::is_string_type(ty) || types::is_pointer_type(ty) || types::is_function_type(ty) {
            return Ok(self.context.ptr_type(AddressSpace::default()).into());
        }
        Err(CompileError::semantic(
            SemanticErrorKind::TypeMismatch,
            format!("Type '{ty}' is not valid here"),
        ))
    }

    pub(crate) fn fn_type_for(
        &self,
        param_types: &[String],
        return_type: &str,
    ) -> Result<FunctionType<'ctx>, CompileError> {
        let params: Vec<BasicMetadataTypeEnum> = param_types
            .iter()
            .map(|ty| self.llvm_basic_type(ty).map(Into::into))
            .collect::<Result<_, _>>()?;

        if types::is_void(return_type) {
            Ok(self.context.void_type().fn_type(&params, false))
        } else {
            Ok(self.llvm_basic_type(return_type)?.fn_type(&params, false))
        }
    }

    // ── Builder helpers ──────────────────────────────────────────────────

    pub(crate) fn current_block(&self) -> Result<inkwell::basic_block::BasicBlock<'ctx>, CompileError> {
        self.builder
            .get_insert_block()
            .ok_or_else(|| CompileError::Backend("Builder has no insertion point".to_string()))
    }

    pub(crate) fn current_function(&self) -> Result<FunctionValue<'ctx>, CompileError> {
        self.current_block()?
            .get_parent()
            .ok_or_else(|| CompileError::Backend("Insertion block has no parent".to_string()))
    }

    pub(crate) fn block_has_terminator(&self) -> bool {
        self.builder
            .get_insert_block()
            .is_some_and(|block| block.get_terminator().is_some())
    }

    pub(crate) fn expect_int(
        &self,
        value: BasicValueEnum<'ctx>,
        what: &str,
    ) -> Result<IntValue<'ctx>, CompileError> {
        match value {
            BasicValueEnum::IntValue(v) => Ok(v),
            _ => Err(CompileError::semantic(
                SemanticErrorKind::TypeMismatch,
                format!("Expected an integer value for {what}"),
            )),
        }
    }

    /// Widen or narrow an integer value to the LLVM type of `target`,
    /// sign-extending when `signed`. Non-integer values pass through.
    pub(crate) fn adapt_int(
        &self,
        value: BasicValueEnum<'ctx>,
        target: BasicTypeEnum<'ctx>,
        signed: bool,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        let (BasicValueEnum::IntValue(v), BasicTypeEnum::IntType(t)) = (value, target) else {
            return Ok(value);
        };
        let from = v.get_type().get_bit_width();
        let to = t.get_bit_width();
        if from == to {
            return Ok(value);
        }
        let adapted = if from < to {
            if signed {
                self.builder.build_int_s_extend(v, t, name)?
            } else {
                self.builder.build_int_z_extend(v, t, name)?
            }
        } else {
            self.builder.build_int_truncate(v, t, name)?
        };
        Ok(adapted.into())
    }

    /// Adapt a value to a surface type, honoring the declared integer width
    /// and signedness at the destination.
    pub(crate) fn adapt_to_surface_type(
        &self,
        value: BasicValueEnum<'ctx>,
        ty: &str,
    ) -> Result<BasicValueEnum<'ctx>, CompileError> {
        if !types::is_integer_type(ty) {
            return Ok(value);
        }
        let target = self.llvm_basic_type(ty)?;
        self.adapt_int(value, target, types::is_signed_integer(ty), "cast")
    }

    /// Bring two integer operands to a common width (the wider of the two).
    /// The narrower operand widens according to its own declared surface
    /// type: sign-extended for `i8`..`i64`, zero-extended for `u8`..`u64`.
    pub(crate) fn unify_int_widths(
        &self,
        lhs: IntValue<'ctx>,
        lhs_ty: Option<&str>,
        rhs: IntValue<'ctx>,
        rhs_ty: Option<&str>,
    ) -> Result<(IntValue<'ctx>, IntValue<'ctx>), CompileError> {
        let lw = lhs.get_type().get_bit_width();
        let rw = rhs.get_type().get_bit_width();
        if lw == rw {
            return Ok((lhs, rhs));
        }
        if lw < rw {
            let widened = if widens_signed(lhs_ty) {
                self.builder.build_int_s_extend(lhs, rhs.get_type(), "widen")?
            } else {
                self.builder.build_int_z_extend(lhs, rhs.get_type(), "widen")?
            };
            Ok((widened, rhs))
        } else {
            let widened = if widens_signed(rhs_ty) {
                self.builder.build_int_s_extend(rhs, lhs.get_type(), "widen")?
            } else {
                self.builder.build_int_z_extend(rhs, lhs.get_type(), "widen")?
            };
            Ok((lhs, widened))
        }
    }

    /// Fresh internal name for an anonymous function.
    pub(crate) fn next_anon_name(&mut self) -> String {
        let name = format!("anon_{}", self.anon_counter);
        self.anon_counter += 1;
        name
    }

    pub(crate) fn add_internal_function(
        &mut self,
        name: &str,
        fn_type: FunctionType<'ctx>,
    ) -> FunctionValue<'ctx> {
        self.module
            .add_function(name, fn_type, Some(Linkage::Internal))
    }
}

// Operands with no known surface type (literals, temporaries) widen signed,
// matching the i32 default for integer literals.
fn widens_signed(ty: Option<&str>) -> bool {
    ty.map_or(true, |t| {
        !types::is_integer_type(t) || types::is_signed_integer(t)
    })
}
