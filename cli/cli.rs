mod cli_args;
mod metrics;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::process;

use cli_args::Cli;
use ctx_core::{AppError, Config};

const MANUAL_TEXT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/manual.txt"));

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);
    log::debug!("CLI args parsed: {:?}", cli_args);

    if cli_args.doc {
        println!("{}", MANUAL_TEXT);
        process::exit(0);
    }

    let quiet = cli_args.quiet;
    let exit_code = match run_app(&cli_args) {
        Ok(()) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::InvalidArgument(_)) => 1,
                Some(AppError::Io(_)) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::WalkDir(_)) => 2,
                Some(AppError::Ignore(_)) => 2,
                Some(AppError::JsonSerialize(_)) => 6,
                Some(AppError::TikToken(_)) => 8,
                Some(_) => 1, // non_exhaustive
                None => 1,
            };

            if !quiet || exit_code == 1 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: &Cli) -> Result<()> {
    let root = ctx_core::resolve_root(&cli.inputs).context("Failed to determine project root")?;
    log::info!("Project root determined: {}", root.display());

    let config = load_config(&root, cli)?;
    log::debug!("Effective configuration: {:?}", config);

    let discovery = ctx_core::discover_project(&root, &cli.inputs, &config.discovery)
        .context("Failed to discover project files")?;
    output::report_warnings(&discovery.warnings, cli.quiet);

    output::print_report(&discovery, &cli.format)?;

    let audit_metrics = metrics::calculate_metrics(
        &discovery.files,
        cli.exact_tokens || config.metrics.exact_tokens,
    )?;
    metrics::print_metrics(&audit_metrics, &config.metrics, cli.quiet);
    Ok(())
}

fn load_config(root: &std::path::Path, cli: &Cli) -> Result<Config> {
    let mut config = Config::load(root, cli.config.as_ref(), cli.no_config)
        .context("Failed to load configuration")?;

    log::trace!("Applying CLI overrides to config...");
    if cli.deep {
        config.discovery.deep = true;
    }
    if cli.no_builtin_ignore {
        config.discovery.builtin_ignore = false;
    }
    Ok(config)
}
