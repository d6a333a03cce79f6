//! NeuralDSL CLI - The `neuraldsl` command.
//!
//! Validates NeuralDSL model files from the command line and serves the
//! language server over stdio.
//!
//! # Architecture
//!
//! - **neuraldsl-core**: Scanner, rule-based validator and diagnostic cache
//! - **neuraldsl-lsp**: tower-lsp backend, debounce scheduler and quick fixes

mod check;
mod config;
mod error;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::check::{check_files, EXIT_UNREADABLE};
use crate::config::Config;
use crate::report::{emit, render, OutputFormat};

/// Where and how the `check` report is written.
struct ReportSettings {
    format: OutputFormat,
    output: Option<PathBuf>,
    show_suggestions: bool,
}

/// NeuralDSL - neural network model definitions
#[derive(Parser, Debug)]
#[command(name = "neuraldsl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validator and language server for the NeuralDSL model language", long_about = None)]
struct Args {
    /// Config file path (default: platform config dir, neuraldsl/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate .neural files and print the diagnostics
    Check {
        /// Files to validate
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Enable style rules and treat parameter warnings as errors
        #[arg(long)]
        strict: bool,

        /// Maximum number of diagnostics reported per file
        #[arg(long, value_name = "N")]
        max_problems: Option<usize>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Leave fix suggestions out of the report
        #[arg(long)]
        no_suggestions: bool,
    },

    /// Run the language server over stdio
    Lsp,

    /// Create a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    ConfigPath,

    /// Print the effective configuration as TOML
    ShowConfig,

    /// Show version information
    Version,
}

fn init_logger(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Check {
            files,
            format,
            strict,
            max_problems,
            output,
            no_suggestions,
        } => {
            init_logger("warn");
            let report = ReportSettings {
                format,
                output,
                show_suggestions: !no_suggestions,
            };
            let code = run_check(args.config, &files, &report, strict, max_problems)?;
            std::process::exit(code);
        }
        Commands::Lsp => {
            init_logger("info");
            let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            log::info!("Starting NeuralDSL language server");
            runtime.block_on(neuraldsl_lsp::run_lsp_server(config.validation))
        }
        Commands::InitConfig { force } => {
            init_logger("warn");
            let path = Config::create_default_config_file(args.config.as_deref(), force)?;
            println!("Created default config at: {}", path.display());
            Ok(())
        }
        Commands::ConfigPath => {
            let path = Config::config_path()?;
            println!("{}", path.display());
            Ok(())
        }
        Commands::ShowConfig => {
            init_logger("warn");
            let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Version => {
            println!("neuraldsl {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Validator and language server for the NeuralDSL model language");
            Ok(())
        }
    }
}

fn run_check(
    config_path: Option<PathBuf>,
    files: &[PathBuf],
    report: &ReportSettings,
    strict: bool,
    max_problems: Option<usize>,
) -> Result<i32> {
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    let mut options = config.validation;
    if strict {
        options.strict = true;
    }
    if let Some(max) = max_problems {
        options.max_number_of_problems = max;
    }
    log::debug!("Effective options: {:?}", options);

    let outcome = check_files(files, &options);
    for (path, e) in &outcome.unreadable {
        eprintln!("{}: cannot read file: {}", path.display(), e);
    }

    let output = render(&outcome.reports, report.format, report.show_suggestions)
        .context("Failed to render report")?;
    emit(&output, report.output.as_deref()).with_context(|| match &report.output {
        Some(path) => format!("Failed to write report to {}", path.display()),
        None => "Failed to write report".to_string(),
    })?;

    let code = outcome.exit_code();
    if code == EXIT_UNREADABLE {
        log::warn!("{} file(s) could not be read", outcome.unreadable.len());
    }
    Ok(code)
}
