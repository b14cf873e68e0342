//! Backend façade: IR printing, object emission, JIT execution, linking.
//!
//! Everything here consumes a finished module; nothing reaches back into the
//! front-end.

use std::path::Path;
use std::process::Command;
use std::sync::Once;

use inkwell::OptimizationLevel;
use inkwell::module::Module;
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine,
};
use tracing::debug;

use crate::CompileError;

static NATIVE_TARGET_INIT: Once = Once::new();

// LLVM native-target registration is global process state; it must run
// exactly once before the first target machine or execution engine exists.
fn initialize_native_target() {
    NATIVE_TARGET_INIT.call_once(|| {
        Target::initialize_native(&InitializationConfig::default())
            .expect("Failed to initialize native target");
    });
}

/// Stable textual rendering of the module.
pub fn print_ir(module: &Module) -> String {
    module.print_to_string().to_string()
}

/// Write a relocatable object file for the native target.
pub fn emit_object(module: &Module, path: &Path) -> Result<(), CompileError> {
    initialize_native_target();
    debug!(path = %path.display(), "emitting object file");

    let triple = TargetMachine::get_default_triple();
    let target =
        Target::from_triple(&triple).map_err(|e| CompileError::Backend(e.to_string()))?;
    let machine = target
        .create_target_machine(
            &triple,
            "generic",
            "",
            OptimizationLevel::Default,
            RelocMode::PIC,
            CodeModel::Default,
        )
        .ok_or_else(|| CompileError::Backend("Could not create target machine".to_string()))?;

    module.set_triple(&triple);
    module.set_data_layout(&machine.get_target_data().get_data_layout());

    machine
        .write_to_file(module, FileType::Object, path)
        .map_err(|e| CompileError::Backend(e.to_string()))
}

/// JIT-execute the module's `main` function and return its result.
///
/// The execution engine takes ownership of the module.
pub fn jit_run(module: Module) -> Result<i32, CompileError> {
    initialize_native_target();

    let engine = module
        .create_jit_execution_engine(OptimizationLevel::None)
        .map_err(|e| {
            CompileError::Backend(format!("Failed to create execution engine: {e}"))
        })?;

    let main = unsafe { engine.get_function::<unsafe extern "C" fn() -> i32>("main") }
        .map_err(|_| CompileError::Backend("Main function not found".to_string()))?;

    Ok(unsafe { main.call() })
}

/// Link an object file into an executable with the system C compiler.
pub fn link_executable(object: &Path, output: &Path) -> Result<(), CompileError> {
    let status = Command::new("cc")
        .arg(object)
        .arg("-o")
        .arg(output)
        .status()
        .map_err(|e| CompileError::Backend(format!("Failed to run linker: {e}")))?;

    if !status.success() {
        return Err(CompileError::Backend("Linking failed".to_string()));
    }
    Ok(())
}
