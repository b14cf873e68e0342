use clap::{Parser, Subcommand};
use inkwell::context::Context;
use std::fs;
use std::path::{Path, PathBuf};

use void_compiler::codegen::CodeGenerator;
use void_compiler::frontend::lexer;
use void_compiler::{backend, compile_to_ast};

#[derive(Parser)]
#[command(name = "voidc")]
#[command(about = "A compiler for the Void language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source file to ./a.out
    Build {
        file: PathBuf,

        /// Print the generated LLVM IR before emitting the object file
        #[arg(long)]
        emit_ir: bool,
    },
    /// Print the token stream of a source file, one token per line
    Tokenise { file: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Command::Build { file, emit_ir }) => build(&file, emit_ir),
        Some(Command::Tokenise { file }) => tokenise(&file),
        None => dev_demo(),
    };

    if let Err(message) = result {
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}

fn read_source(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Cannot read file '{}': {e}", path.display()))
}

fn build(file: &Path, emit_ir: bool) -> Result<(), String> {
    let source = read_source(file)?;
    let program = compile_to_ast(&source).map_err(|e| e.to_string())?;

    let context = Context::create();
    let mut codegen = CodeGenerator::new(&context);
    codegen
        .compile_program(&program)
        .map_err(|e| e.to_string())?;

    if emit_ir {
        println!("{}", backend::print_ir(codegen.module()));
    }

    let object = Path::new("a.o");
    backend::emit_object(codegen.module(), object).map_err(|e| e.to_string())?;
    backend::link_executable(object, Path::new("a.out")).map_err(|e| e.to_string())?;
    let _ = fs::remove_file(object);

    println!("Executable created: a.out");
    Ok(())
}

fn tokenise(file: &Path) -> Result<(), String> {
    let source = read_source(file)?;
    let tokens = lexer::tokenize(&source).map_err(|e| e.to_string())?;
    for token in tokens {
        println!(
            "{}:{}\t{:?}\t{}",
            token.line, token.column, token.kind, token.lexeme
        );
    }
    Ok(())
}

// Built-in demo program, compiled and run through the JIT when no
// subcommand is given.
const DEV_SAMPLE: &str = r#"
const calculate = fn(x: i32, y: i32, z: i32) -> i32 {
  return x + y * z - x / y
}

const main = fn() -> i32 {
  return calculate(10, 5, 3)
}
"#;

fn dev_demo() -> Result<(), String> {
    let program = compile_to_ast(DEV_SAMPLE).map_err(|e| e.to_string())?;

    let context = Context::create();
    let mut codegen = CodeGenerator::new(&context);
    codegen
        .compile_program(&program)
        .map_err(|e| e.to_string())?;

    println!("Generated LLVM IR:");
    println!("{}", backend::print_ir(codegen.module()));

    let result = backend::jit_run(codegen.into_module()).map_err(|e| e.to_string())?;
    println!("Program returned: {result}");
    Ok(())
}
