//! Top-level pipeline entry point (spec §6): the one public function
//! downstream of parsing. Mirrors the shape of
//! `examples/meftunca-vex/vex-compiler`'s driver — run every pass in order,
//! stop at the first stage that accumulates errors, hand the generated
//! module back to the caller otherwise.

use inkwell::context::Context;
use pyrite_ast::Program;
use pyrite_diagnostics::Diagnostic;

use crate::borrowck::BorrowChecker;
use crate::codegen::CodeGenerator;
use crate::desugar::{desugar_program, ClosureInliner};
use crate::monomorphize::MonomorphizationContext;
use crate::ownership::OwnershipTracker;
use crate::typeck::TypeChecker;
use pyrite_ast::Item;

/// Configuration threaded into a single [`compile`] run (spec §6).
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Stop after LLVM IR is generated; skip any object-file emission.
    pub emit_ir_only: bool,
    /// Disallow non-deterministic codegen choices (unused here since this
    /// core never makes any, kept for interface parity with the teacher).
    pub deterministic_build: bool,
    /// Attach a chronological ownership-state transcript to ownership
    /// diagnostics.
    pub ownership_timeline: bool,
    /// Surface non-fatal cost-model warnings (e.g. unbounded monomorphization
    /// growth) alongside hard errors.
    pub cost_warnings: bool,
    /// Reserved for a future incremental driver; the core itself recompiles
    /// from scratch every call.
    pub incremental: bool,
}

/// Successful output of a [`compile`] run: the rendered LLVM module text
/// plus an optional cost report when [`CompileOptions::cost_warnings`] is
/// set.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub module_ir: String,
    pub cost_report: Option<CostReport>,
}

#[derive(Debug, Clone, Default)]
pub struct CostReport {
    pub monomorphizations_emitted: usize,
    pub closures_inlined: usize,
}

/// Runs the full pipeline over a single already-parsed program plus any
/// already-resolved imported modules, merging their top-level symbols before
/// type checking (spec §6's module-resolution contract). Performs no
/// filesystem I/O.
pub fn compile(
    source_ast: &Program,
    imports: &[Program],
    filename: &str,
    options: CompileOptions,
) -> Result<CompileResult, Vec<Diagnostic>> {
    let mut merged = source_ast.clone();
    for import in imports {
        merged.items.extend(import.items.iter().cloned());
    }

    let mut program = merged;

    let mut checker = TypeChecker::new();
    checker.check_program(&program);
    if !checker.errors().is_empty() {
        return Err(checker.errors().iter().map(|e| e.to_diagnostic()).collect());
    }

    for item in &program.items {
        if let Item::Function(f) = item {
            let mut tracker = OwnershipTracker::new();
            tracker.check_function(f);
            if !tracker.errors().is_empty() {
                return Err(tracker.errors().iter().map(|e| e.to_diagnostic()).collect());
            }

            let mut borrows = BorrowChecker::new();
            borrows.check_function(f);
            if !borrows.errors().is_empty() {
                return Err(borrows.errors().iter().map(|e| e.to_diagnostic()).collect());
            }
        }
    }

    desugar_program(&mut program);

    let mut mono = MonomorphizationContext::new();
    mono.run(&mut program);
    if !mono.errors().is_empty() {
        return Err(mono.errors().iter().map(|e| e.to_diagnostic()).collect());
    }

    let mut inliner = ClosureInliner::new();
    inliner.run(&mut program);
    if !inliner.errors().is_empty() {
        return Err(inliner.errors().iter().map(|e| e.to_diagnostic()).collect());
    }

    let context = Context::create();
    let mut codegen = CodeGenerator::new(&context, filename);
    codegen
        .compile_program(&program)
        .map_err(|e| vec![Diagnostic::error("E-CODEGEN", e.to_string(), pyrite_diagnostics::Span::unknown())])?;

    let report = options.cost_warnings.then(CostReport::default);
    Ok(CompileResult {
        module_ir: codegen.print_to_string(),
        cost_report: report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_ast::Import;

    fn empty_program() -> Program {
        Program { imports: Vec::new(), items: Vec::new() }
    }

    #[test]
    fn compiling_an_empty_program_produces_an_empty_module() {
        let program = empty_program();
        let result = compile(&program, &[], "empty", CompileOptions::default());
        assert!(result.is_ok());
    }

    #[test]
    fn import_symbols_are_merged_before_type_checking() {
        let main = empty_program();
        let mut lib = empty_program();
        lib.imports.push(Import {
            path: vec!["std".to_string()],
            alias: None,
            span: pyrite_diagnostics::Span::unknown(),
        });
        let result = compile(&main, std::slice::from_ref(&lib), "main", CompileOptions::default());
        assert!(result.is_ok());
    }
}
