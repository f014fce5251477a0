//! Target-assembly emission.
//!
//! The back-end assembler/linker that turns a `.asm` file into a linked
//! executable is an external collaborator invoked outside this crate.
//! Producing the `.asm` text itself is this module's job, via
//! `inkwell::targets`, the same crate family the rest of `codegen`
//! already depends on.

use inkwell::module::Module;
use inkwell::targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::OptimizationLevel;

use super::error::CodegenError;

/// Renders `module` as target assembly text for the host triple, via an
/// in-memory object-emission buffer (no temporary files).
pub fn assembly_for_module(module: &Module) -> Result<String, CodegenError> {
    Target::initialize_native(&InitializationConfig::default())
        .map_err(CodegenError::new)?;

    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple)
        .map_err(|e| CodegenError::new(format!("no target for '{triple}': {e}")))?;
    let cpu = TargetMachine::get_host_cpu_name();
    let features = TargetMachine::get_host_cpu_features();
    let machine = target
        .create_target_machine(
            &triple,
            cpu.to_str().unwrap_or("generic"),
            features.to_str().unwrap_or(""),
            OptimizationLevel::Default,
            RelocMode::Default,
            CodeModel::Default,
        )
        .ok_or_else(|| CodegenError::new(format!("could not create a target machine for '{triple}'")))?;

    module.set_triple(&triple);
    module.set_data_layout(&machine.get_target_data().get_data_layout());

    let buffer = machine
        .write_to_memory_buffer(module, FileType::Assembly)
        .map_err(|e| CodegenError::new(e.to_string()))?;
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}
