use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use thiserror::Error;

use relic_lang::compiler::{CompilationResult, Compiler, CompilerInput};
use relic_lang::runtime::Evaluator;

#[derive(Debug, Error)]
enum RunError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Compilation failed with {0} error(s)")]
    Compile(usize),

    #[error("Runtime error")]
    Runtime,
}

#[derive(Parser)]
#[command(name = "relic")]
#[command(about = "Relic - an interpreter for a structs-and-scalars subset of C")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a source file and print the value returned by main
    Run {
        /// Path to the source file to run
        #[arg(short, long)]
        path: PathBuf,
    },
}

fn main() -> Result<(), RunError> {
    // Logs go to stderr so stdout stays reserved for the program result.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { path } => run(path),
    }
}

fn run(path: PathBuf) -> Result<(), RunError> {
    let started = Instant::now();
    tracing::debug!(path = %path.display(), "compiling");

    let compiler = Compiler::new();
    let result = compiler.compile(CompilerInput::File(path));

    let program = match result.program {
        Some(ref program) if result.errors.is_empty() => program,
        _ => {
            eprint_reports(&result)?;
            return Err(RunError::Compile(result.errors.len()));
        }
    };

    let mut evaluator = Evaluator::new(program, &result.interner);
    match evaluator.run_main() {
        Ok(code) => {
            tracing::debug!(
                exit = code,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "run finished"
            );
            println!("{code}");
            Ok(())
        }
        Err(error) => {
            let mut cache = ariadne::sources(vec![(0usize, result.source.clone())]);
            error.report(&result.interner).eprint(&mut cache)?;
            Err(RunError::Runtime)
        }
    }
}

fn eprint_reports(result: &CompilationResult) -> std::io::Result<()> {
    let mut cache = ariadne::sources(vec![(0usize, result.source.clone())]);
    for report in result.reports() {
        report.eprint(&mut cache)?;
    }
    Ok(())
}
