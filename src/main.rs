use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use crcs::cli::{Cli, Commands};
use crcs::output::{self, Verbosity};
use crcs::{CrcsContext, commands};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            1
        }
    };
    process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    output::set_verbosity(verbosity);
    init_tracing(cli.verbose);

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(0);
    }

    let ctx = CrcsContext::new(cli.dir)?;
    tracing::debug!(config = ?ctx.config_path, "loaded configuration");
    output::verbose(&format!(
        "Tracking {} with manifest {}",
        ctx.root.display(),
        ctx.config.core.manifest_name
    ));

    let code = match cli.command {
        Commands::Calc { file } => match commands::calc::execute(&ctx, &file) {
            Ok(()) => 0,
            Err(e) => {
                output::error(&format!("{e:#}"));
                1
            }
        },
        // Update is best effort and always exits 0
        Commands::Update => {
            if let Err(e) = commands::update::execute(&ctx) {
                output::error(&format!("{e:#}"));
            }
            0
        }
        Commands::Check => commands::check::execute(&ctx).exit_code(),
        Commands::Completion { .. } => 0,
    };

    Ok(code)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "crcs=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("CRCS_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
