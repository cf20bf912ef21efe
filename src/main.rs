//! deadwood CLI - dead-store reports for a minimal imperative language.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use deadwood::cfg::{build_cfg, render as cfg_render};
use deadwood::dfg::{build_dfg, render as dfg_render};
use deadwood::{analyze_liveness, parse_program, program_live_out};

/// Dead-store detection for a minimal imperative language.
///
/// Analyzes programs built from assignments, `if`, and `while`, and
/// reports assignments whose written value is never read.
#[derive(Parser)]
#[command(
    name = "deadwood",
    version,
    about = "Dead-store detection for a minimal imperative language",
    long_about = r#"
Dead-store detection for a minimal imperative language.

Examples:
    deadwood analyze program.dw          # report unused assignments
    deadwood analyze --source 'a = 1'    # analyze an inline literal
    deadwood analyze program.dw --format json
    deadwood cfg program.dw              # dump the control flow graph
    deadwood dfg program.dw              # dump the data flow graph
"#
)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Report assignments whose value is never read
    Analyze {
        /// Source file to analyze
        file: Option<PathBuf>,
        /// Inline source text instead of a file
        #[arg(long, conflicts_with = "file")]
        source: Option<String>,
    },
    /// Dump the control flow graph as indented pseudo-code
    Cfg {
        /// Source file to analyze
        file: Option<PathBuf>,
        /// Inline source text instead of a file
        #[arg(long, conflicts_with = "file")]
        source: Option<String>,
    },
    /// Dump the data flow graph with per-node edge lists
    Dfg {
        /// Source file to analyze
        file: Option<PathBuf>,
        /// Inline source text instead of a file
        #[arg(long, conflicts_with = "file")]
        source: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Analyze { file, source } => {
            let source = load_source(file, source)?;
            cmd_analyze(&source, cli.format)
        }
        Commands::Cfg { file, source } => {
            let source = load_source(file, source)?;
            cmd_cfg(&source)
        }
        Commands::Dfg { file, source } => {
            let source = load_source(file, source)?;
            cmd_dfg(&source)
        }
    }
}

fn load_source(file: Option<PathBuf>, source: Option<String>) -> Result<String> {
    if let Some(text) = source {
        return Ok(text);
    }
    let Some(path) = file else {
        bail!("provide a source file or --source");
    };
    std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

fn cmd_analyze(source: &str, format: OutputFormat) -> Result<()> {
    let program = parse_program(source)?;
    let cfg = build_cfg(&program);
    let dfg = build_dfg(&cfg)?;
    let outputs = program_live_out(&program)?;
    let info = analyze_liveness(&cfg, &dfg, &outputs)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info.to_json())?),
        OutputFormat::Text => {
            for dead in &info.dead_stores {
                println!(
                    "Unused assignment to {} at {}..{}",
                    dead.variable, dead.span.start, dead.span.end
                );
                println!("{}", dead.span.slice(source));
            }
        }
    }
    Ok(())
}

fn cmd_cfg(source: &str) -> Result<()> {
    let program = parse_program(source)?;
    let cfg = build_cfg(&program);
    print!("{}", cfg_render::to_ascii(&cfg));
    Ok(())
}

fn cmd_dfg(source: &str) -> Result<()> {
    let program = parse_program(source)?;
    let cfg = build_cfg(&program);
    let dfg = build_dfg(&cfg)?;
    print!("{}", dfg_render::to_ascii(&cfg, &dfg));
    Ok(())
}
