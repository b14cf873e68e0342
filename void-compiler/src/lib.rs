pub mod ast;
pub mod backend;
pub mod codegen;
pub mod frontend;
pub mod runtime;
pub mod types;

use thiserror::Error;
use tracing::debug;

use crate::ast::Program;
use crate::frontend::lexer::LexicalError;

/// Category of an error raised during code generation.
///
/// Kept as a separate enum so tests can assert on the kind without matching
/// message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    UnknownVariable,
    UndefinedFunction,
    ArgumentCountMismatch,
    ReturnValueInNilFunction,
    MissingReturnValue,
    UnsupportedMemberAccess,
    Redeclaration,
    TypeMismatch,
}

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{0}")]
    Lexical(#[from] LexicalError),

    #[error("{message} at line: {line}, column: {column}")]
    Parse {
        message: String,
        line: u32,
        column: u32,
    },

    #[error("{message}")]
    Semantic {
        kind: SemanticErrorKind,
        message: String,
    },

    #[error("{0}")]
    Backend(String),
}

impl CompileError {
    pub fn semantic(kind: SemanticErrorKind, message: impl Into<String>) -> Self {
        CompileError::Semantic {
            kind,
            message: message.into(),
        }
    }
}

impl From<inkwell::builder::BuilderError> for CompileError {
    fn from(err: inkwell::builder::BuilderError) -> Self {
        CompileError::Backend(format!("LLVM builder error: {err}"))
    }
}

/// Lex and parse a source buffer into its AST.
pub fn compile_to_ast(source: &str) -> Result<Program, CompileError> {
    let tokens = frontend::lexer::tokenize(source)?;
    debug!(tokens = tokens.len(), "lexed source");

    let program = frontend::parser::Parser::new(tokens).parse()?;
    debug!(functions = program.functions.len(), "parsed program");
    Ok(program)
}

/// Compile source text all the way to textual LLVM IR.
pub fn compile_to_ir_text(source: &str) -> Result<String, CompileError> {
    let program = compile_to_ast(source)?;

    let context = inkwell::context::Context::create();
    let mut codegen = codegen::CodeGenerator::new(&context);
    codegen.compile_program(&program)?;
    Ok(backend::print_ir(codegen.module()))
}

/// Compile source text and JIT-execute its `main` function.
pub fn jit_main(source: &str) -> Result<i32, CompileError> {
    let program = compile_to_ast(source)?;

    let context = inkwell::context::Context::create();
    let mut codegen = codegen::CodeGenerator::new(&context);
    codegen.compile_program(&program)?;
    backend::jit_run(codegen.into_module())
}
