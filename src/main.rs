use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use docdiff::cli::Cli;
use docdiff::errors::{self, EXIT_FAILURE, EXIT_SUCCESS};
use docdiff::output::{self, ColorChoice, ColorScope, Verbosity};
use docdiff::{CompareContext, compare, resolve};
use std::io::{self, Write};
use std::process;
use tracing_subscriber::EnvFilter;

/// Variable holding a tracing filter directive (e.g. `docdiff=trace`)
const LOG_ENV: &str = "DOCDIFF_LOG";

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => exit_on_parse_error(&e),
    };
    init_tracing(cli.verbose);

    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    let scope = ColorScope::acquire(if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    });

    let code = match run(&cli, scope.enabled()) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            errors::exit_code_for(&e)
        }
    };

    // process::exit skips destructors
    drop(scope);
    process::exit(code);
}

fn run(cli: &Cli, color: bool) -> Result<()> {
    if let Some(shell) = cli.completions {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let resolved = resolve::resolve(cli)?;
    for warning in &resolved.warnings {
        output::warning(warning);
    }

    let ctx = CompareContext::new()?;
    output::verbose(&format!("Configuration: {}", ctx.config_path.display()));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    compare::run(&ctx, &resolved, color, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Help and version exit 0 as clap decides; every other parse error is a usage error
fn exit_on_parse_error(e: &clap::Error) -> ! {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => {
            let _ = e.print();
            process::exit(EXIT_FAILURE);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docdiff=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
