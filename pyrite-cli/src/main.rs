use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pyrite_ast::Program;
use pyrite_compiler::driver::{compile, CompileOptions};
use pyrite_diagnostics::error_codes;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pyrite")]
#[command(version = "0.2.0")]
#[command(about = "Pyrite language core compiler driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a pre-built AST fixture (JSON) to LLVM IR.
    ///
    /// Lexing and parsing are out of scope for this crate; `INPUT` is a
    /// serialized `pyrite_ast::Program`, not Pyrite source text.
    Compile {
        #[arg(value_name = "AST_JSON")]
        input: PathBuf,

        /// Additional pre-resolved modules to merge before type checking.
        #[arg(long = "import", value_name = "AST_JSON")]
        imports: Vec<PathBuf>,

        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        #[arg(long)]
        emit_ir_only: bool,

        #[arg(long)]
        cost_warnings: bool,
    },

    /// Run every check short of codegen and report diagnostics.
    Check {
        #[arg(value_name = "AST_JSON")]
        input: PathBuf,
    },

    /// Print a long-form explanation for a diagnostic code.
    Explain {
        #[arg(value_name = "CODE")]
        code: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { input, imports, output, emit_ir_only, cost_warnings } => {
            let program = load_program(&input)?;
            let import_programs: Result<Vec<Program>> =
                imports.iter().map(|p| load_program(p)).collect();
            let import_programs = import_programs?;

            let filename = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("module")
                .to_string();

            let options = CompileOptions {
                emit_ir_only,
                cost_warnings,
                ..CompileOptions::default()
            };

            match compile(&program, &import_programs, &filename, options) {
                Ok(result) => {
                    match output {
                        Some(path) => std::fs::write(&path, &result.module_ir)
                            .with_context(|| format!("writing {}", path.display()))?,
                        None => println!("{}", result.module_ir),
                    }
                    if let Some(report) = result.cost_report {
                        log::info!(
                            "monomorphizations emitted: {}, closures inlined: {}",
                            report.monomorphizations_emitted,
                            report.closures_inlined
                        );
                    }
                    Ok(())
                }
                Err(diagnostics) => {
                    let source = std::fs::read_to_string(&input).unwrap_or_default();
                    for diag in &diagnostics {
                        eprintln!("{}", diag.format(&source));
                    }
                    anyhow::bail!("{} error(s)", diagnostics.len());
                }
            }
        }

        Commands::Check { input } => {
            let program = load_program(&input)?;
            let filename = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("module")
                .to_string();
            match compile(&program, &[], &filename, CompileOptions::default()) {
                Ok(_) => {
                    println!("no errors");
                    Ok(())
                }
                Err(diagnostics) => {
                    let source = std::fs::read_to_string(&input).unwrap_or_default();
                    for diag in &diagnostics {
                        eprintln!("{}", diag.format(&source));
                    }
                    anyhow::bail!("{} error(s)", diagnostics.len());
                }
            }
        }

        Commands::Explain { code } => {
            println!("{}", explain(&code));
            Ok(())
        }
    }
}

fn load_program(path: &PathBuf) -> Result<Program> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing AST fixture {}", path.display()))
}

/// Long-form explanations for the diagnostic codes this core can raise
/// itself (name-resolution and type-checker codes are inherited from the
/// shared `error_codes` table but explained the same way `rustc --explain`
/// does).
fn explain(code: &str) -> String {
    match code {
        c if c == error_codes::BORROW_WHILE_EXCLUSIVE => {
            "A shared borrow was taken while an exclusive borrow of the same \
             variable was still alive. Only one exclusive borrow, or any \
             number of shared borrows, may be alive at once."
        }
        c if c == error_codes::EXCLUSIVE_BORROW_WHILE_ALIASED => {
            "An exclusive borrow was taken while a shared borrow of the same \
             variable was still alive. An exclusive borrow requires no other \
             aliases to exist."
        }
        c if c == error_codes::REFERENCE_OUTLIVES_REFERENT => {
            "A reference was used after the scope that issued it ended. \
             Borrows are confined to the lexical scope they were created in."
        }
        c if c == error_codes::USE_AFTER_MOVE => {
            "A variable was used after its value was moved out of it. Once a \
             non-Copy value is moved, the source binding can no longer be \
             read."
        }
        c if c == error_codes::NON_LITERAL_COMPILE_TIME_ARG => {
            "A compile-time parameter was instantiated with an argument that \
             is not an integer or boolean literal. Monomorphization can only \
             specialize over literal constants."
        }
        c if c == error_codes::MONOMORPHIZATION_NON_TERMINATION => {
            "Monomorphizing a compile-time-parameterized recursive function \
             did not converge within the specialization cap. Check that the \
             recursive call's compile-time arguments form a finite set."
        }
        c if c == error_codes::CLOSURE_INLINE_BUDGET => {
            "Inlining a parameter closure exceeded the maximum inlining depth \
             or body size. Parameter closures are compile-time-only and must \
             be inlined at every call site; deeply nested or huge closures \
             cannot be processed."
        }
        _ => "no long-form explanation is available for this diagnostic code",
    }
    .to_string()
}
