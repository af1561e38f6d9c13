#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! escli: administer a search cluster from the command line.

mod cli;
mod client;
mod commands;
mod config;
mod errors;
mod format;
mod types;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use cli::logging::init_logging;
use cli::{Cli, OutputCtx, OutputFormat, write_error, write_outcome};
use client::HttpCluster;
use commands::{Invocation, Registry, Session};
use config::Config;
use errors::CliError;
use types::{ErrorOutput, Outcome};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Held until exit so the log file is flushed.
    let _guard = match init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => return report(&CliError::Config(err), OutputFormat::Table),
    };

    // Resolution and argument parsing happen before any connection is made.
    let invocation = match Registry::builtin().parse(&cli.command) {
        Ok(invocation) => invocation,
        Err(err) => return report(&err, OutputFormat::Table),
    };
    let ctx = OutputCtx::new(&invocation.output);
    if !ctx.colors() {
        // Markers are painted into cell text; keep escape codes out of machine output.
        colored::control::set_override(false);
    }

    match run(&cli, &invocation, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, ctx.format),
    }
}

/// Execute the command once and print its outcome.
fn run(cli: &Cli, invocation: &Invocation, ctx: &OutputCtx) -> Result<(), CliError> {
    // Help and the command overview print without reading config or connecting.
    let outcome = match invocation.offline() {
        Some(outcome) => outcome,
        None => connect_and_execute(cli, invocation)?,
    };

    if let Err(err) = write_outcome(&outcome, ctx, &mut io::stdout().lock()) {
        debug!(error = %err, "stdout closed before output was written");
    }
    Ok(())
}

/// Load config, resolve the connection and run `invocation` against the cluster.
fn connect_and_execute(cli: &Cli, invocation: &Invocation) -> Result<Outcome, CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let connection = config.resolve(&cli.connection)?;
    debug!(
        context = %connection.context,
        endpoint = %connection.endpoint,
        verify_certs = connection.verify_certs,
        "connection resolved"
    );
    let cluster = HttpCluster::new(
        &connection.endpoint,
        connection.credentials,
        connection.verify_certs,
        connection.timeout,
    )?;
    debug!(base_url = cluster.base_url(), "client ready");

    let session = Session {
        cluster: &cluster,
        config: &config,
    };
    invocation.execute(&session)
}

/// Print `err` once and map it to the process exit status.
fn report(err: &CliError, format: OutputFormat) -> ExitCode {
    write_error(&ErrorOutput::from_cli_error(err), format, &mut io::stderr());
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}
