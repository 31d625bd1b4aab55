/// Revl CLI (revl)
/// Orchestrates the run and parse commands.

use clap::{Parser as ClapParser, Subcommand};
use revl::diagnostics::DiagnosticEngine;
use revl::{Interp, InterpConfig, InterpError, Parser, DEFAULT_OBJECT_LIMIT};
use std::io::Read;
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(
    name = "revl",
    version = "0.1.0",
    about = "The Revl Language Toolchain",
    long_about = "revl — evaluate and inspect Revl (.rvl) expression programs."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a Revl program (standard input when no path is given)
    Run {
        path: Option<PathBuf>,
        /// Live-object count that triggers a collection
        #[arg(long, default_value_t = DEFAULT_OBJECT_LIMIT)]
        heap_limit: usize,
        /// Trace collection phases to stderr
        #[arg(long)]
        gc_debug: bool,
        /// Print collector statistics after the program finishes
        #[arg(long)]
        gc_stats: bool,
    },
    /// Parse a program and print its expression trees without evaluating
    Parse {
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => {}
        Err(report) => {
            // Fatal-error contract: one diagnostic on standard output,
            // non-zero exit.
            println!("{:?}", report);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<(), miette::Report> {
    match cli.command {
        // ----------------------------------------------------------------
        // revl run [file.rvl]
        // ----------------------------------------------------------------
        Commands::Run { path, heap_limit, gc_debug, gc_stats } => {
            let (source_name, source) = read_source(path.as_deref())?;

            let mut interp = Interp::with_config(InterpConfig { heap_limit, gc_debug });
            match interp.run_program(&source) {
                Ok(()) => {}
                Err(InterpError::Parser(e)) => {
                    let engine = DiagnosticEngine::new(source_name, &source);
                    return Err(miette::Report::new(engine.from_parser(&e)));
                }
                Err(InterpError::Runtime(e)) => {
                    return Err(miette::miette!("{}", e));
                }
            }

            if gc_stats {
                interp.heap.stats.print();
            }
        }

        // ----------------------------------------------------------------
        // revl parse [file.rvl]
        // ----------------------------------------------------------------
        Commands::Parse { path } => {
            let (source_name, source) = read_source(path.as_deref())?;

            let mut interp = Interp::new();
            let mut parser = Parser::new(&source, 0);
            loop {
                match parser.parse_next(&mut interp) {
                    Ok(None) => break,
                    Ok(Some(expr)) => {
                        println!("{}", revl::printer::render(&interp.heap, expr));
                        // Trees already printed may be reclaimed; nothing
                        // is rooted between top-level expressions.
                    }
                    Err(InterpError::Parser(e)) => {
                        let engine = DiagnosticEngine::new(source_name, &source);
                        return Err(miette::Report::new(engine.from_parser(&e)));
                    }
                    Err(InterpError::Runtime(e)) => {
                        return Err(miette::miette!("{}", e));
                    }
                }
            }
        }
    }
    Ok(())
}

fn read_source(path: Option<&std::path::Path>) -> Result<(String, String), miette::Report> {
    match path {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .map_err(|e| miette::miette!("Cannot read '{}': {}", path.display(), e))?;
            Ok((path.display().to_string(), source))
        }
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|e| miette::miette!("Cannot read standard input: {}", e))?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}
