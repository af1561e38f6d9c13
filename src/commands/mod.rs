/// Command contract and the static command table.
///
/// Every command is a clap-derived struct (its argument schema) implementing
/// [`Execute`] (its cluster operation) and [`CommandSpec`] (its name tokens).
/// [`builtin`] lists them all; [`Registry`] resolves tokens against that list.
pub mod alias;
pub mod backup;
pub mod cat;
pub mod cluster;
pub mod config;
pub mod index;
pub mod logging;
pub mod node;
pub mod query;
pub mod registry;
pub mod settings;

use clap::error::ErrorKind;
use clap::{Args, FromArgMatches, Parser};
use serde_json::Value;

use crate::cli::OutputArgs;
use crate::client::{Cluster, Request};
use crate::config::Config;
use crate::errors::CliError;
use crate::types::Outcome;

pub use registry::Registry;

/// What a command runs against: the cluster client and the loaded configuration.
pub struct Session<'a> {
    pub cluster: &'a dyn Cluster,
    pub config: &'a Config,
}

/// The execution step of a command.
pub trait Execute {
    /// Perform the command's cluster operation(s) and produce an outcome.
    ///
    /// # Errors
    ///
    /// Returns `CliError` on any failure; only the allocation-explain
    /// "nothing to explain" case is downgraded to a warning.
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError>;

    /// Outcome available without configuration or a cluster, such as help text.
    fn offline(&self) -> Option<Outcome> {
        None
    }
}

/// A registrable command: argument schema (via clap) plus identity.
pub trait CommandSpec: Execute + Parser + 'static {
    /// Name tokens, e.g. `["snapshot", "show"]`.
    const NAME: &'static [&'static str];
    /// One-line summary shown in `escli help`.
    const ABOUT: &'static str;
}

/// Parser entry point stored in the registry.
pub type ParseFn = fn(&[String]) -> Result<Invocation, CliError>;

/// A registered command: immutable for the life of the process.
pub struct CommandDescriptor {
    pub name: &'static [&'static str],
    pub about: &'static str,
    parse: ParseFn,
}

impl CommandDescriptor {
    /// Name tokens joined by spaces.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.join(" ")
    }

    /// Apply this command's argument schema to the remaining tokens.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Usage` on any schema violation.
    pub fn parse(&self, args: &[String]) -> Result<Invocation, CliError> {
        (self.parse)(args)
    }
}

/// A parsed command ready to run once, with its output flags.
pub struct Invocation {
    pub command: Box<dyn Execute>,
    pub output: OutputArgs,
}

impl Invocation {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Propagates the command's error.
    pub fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        self.command.execute(session)
    }

    /// The outcome when the command needs no session; see [`Execute::offline`].
    #[must_use]
    pub fn offline(&self) -> Option<Outcome> {
        self.command.offline()
    }
}

/// Help or version text requested through clap; printing it is the outcome.
struct HelpText(String);

impl Execute for HelpText {
    fn execute(&self, _session: &Session<'_>) -> Result<Outcome, CliError> {
        Ok(Outcome::Text(self.0.clone()))
    }

    fn offline(&self) -> Option<Outcome> {
        Some(Outcome::Text(self.0.clone()))
    }
}

/// Describe `C` for the registry.
#[must_use]
pub fn describe<C: CommandSpec>() -> CommandDescriptor {
    CommandDescriptor {
        name: C::NAME,
        about: C::ABOUT,
        parse: parse_as::<C>,
    }
}

/// The command's clap schema with the shared output flags merged in.
#[must_use]
pub fn schema<C: CommandSpec>() -> clap::Command {
    OutputArgs::augment_args(C::command())
        .no_binary_name(true)
        .bin_name(format!("escli {}", C::NAME.join(" ")))
        .about(C::ABOUT)
}

fn parse_as<C: CommandSpec>(args: &[String]) -> Result<Invocation, CliError> {
    let matches = match schema::<C>().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Ok(Invocation {
                    command: Box::new(HelpText(err.to_string())),
                    output: OutputArgs::default(),
                }),
                _ => Err(CliError::Usage(err.to_string().trim_end().to_owned())),
            };
        }
    };
    let usage = |e: clap::Error| CliError::Usage(e.to_string().trim_end().to_owned());
    let command = C::from_arg_matches(&matches).map_err(usage)?;
    let output = OutputArgs::from_arg_matches(&matches).map_err(usage)?;
    Ok(Invocation {
        command: Box::new(command),
        output,
    })
}

/// Every built-in command, in help order.
#[must_use]
pub fn builtin() -> Vec<CommandDescriptor> {
    vec![
        describe::<alias::AliasCreate>(),
        describe::<alias::AliasDelete>(),
        describe::<alias::AliasList>(),
        describe::<cat::CatAllocation>(),
        describe::<cat::CatShards>(),
        describe::<cluster::ClusterAllocationExplain>(),
        describe::<cluster::ClusterHealth>(),
        describe::<cluster::ClusterRerouteRetry>(),
        describe::<cluster::ClusterRoutingAllocationEnable>(),
        describe::<cluster::ClusterStats>(),
        describe::<cluster::ClusterSettingsGet>(),
        describe::<cluster::ClusterSettingsReset>(),
        describe::<cluster::ClusterSettingsSet>(),
        describe::<config::ConfigContextList>(),
        describe::<index::IndexClose>(),
        describe::<index::IndexCreate>(),
        describe::<index::IndexDelete>(),
        describe::<index::IndexList>(),
        describe::<index::IndexOpen>(),
        describe::<index::IndexSettingsGet>(),
        describe::<index::IndexSettingsReset>(),
        describe::<index::IndexSettingsSet>(),
        describe::<index::IndexSlowlogThreshold>(),
        describe::<logging::LoggingGet>(),
        describe::<logging::LoggingReset>(),
        describe::<logging::LoggingSet>(),
        describe::<node::NodeDecommission>(),
        describe::<node::NodeHotThreads>(),
        describe::<node::NodeList>(),
        describe::<node::NodeRecommission>(),
        describe::<query::QuerySearch>(),
        describe::<backup::RepositoryList>(),
        describe::<backup::RepositoryShow>(),
        describe::<backup::RepositoryVerify>(),
        describe::<backup::SnapshotCreate>(),
        describe::<backup::SnapshotDelete>(),
        describe::<backup::SnapshotList>(),
        describe::<backup::SnapshotRestore>(),
        describe::<backup::SnapshotShow>(),
    ]
}

/// GET a `_cat` endpoint as JSON rows.
///
/// # Errors
///
/// Returns `CliError::Transport` on client failure.
pub fn cat_rows(session: &Session<'_>, path: &str) -> Result<Vec<Value>, CliError> {
    let body = session.cluster.send(&Request::get(path).json_format())?;
    Ok(into_items(body))
}

/// Treat a response as a list: arrays as-is, null as empty, anything else as one item.
#[must_use]
pub fn into_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// `true` when the response body carries `"acknowledged": true` or `"accepted": true`.
#[must_use]
pub fn acknowledged(body: &Value) -> bool {
    ["acknowledged", "accepted"]
        .iter()
        .any(|k| body.get(k).and_then(Value::as_bool) == Some(true))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers to run a command end to end against a stub cluster.
    use std::sync::Once;

    use serde_json::{Value, json};

    use super::{Registry, Session};
    use crate::cli::{OutputCtx, OutputFormat, write_outcome};
    use crate::client::stub::StubCluster;
    use crate::config::Config;
    use crate::errors::CliError;
    use crate::format::Marker;
    use crate::types::Outcome;

    static COLORS: Once = Once::new();

    /// Paint markers even when the test runner's stdout is not a terminal.
    pub fn force_colors() {
        COLORS.call_once(|| colored::control::set_override(true));
    }

    /// `cell` is `raw` painted with `marker`, and differs from the plain value.
    pub fn assert_marked(cell: &Value, marker: Marker, raw: &str) {
        force_colors();
        assert_ne!(cell, &json!(raw), "{raw} is not marked");
        assert_eq!(cell, &json!(marker.paint(raw)));
    }

    /// Resolve, parse and execute `line` (space separated tokens).
    pub fn run(cluster: &StubCluster, line: &str) -> Result<Outcome, CliError> {
        run_with_config(cluster, &Config::default(), line)
    }

    pub fn run_with_config(
        cluster: &StubCluster,
        config: &Config,
        line: &str,
    ) -> Result<Outcome, CliError> {
        force_colors();
        let tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
        let invocation = Registry::builtin().parse(&tokens)?;
        invocation.execute(&Session { cluster, config })
    }

    /// Render an outcome as a table.
    pub fn render(outcome: &Outcome) -> String {
        let mut buf = Vec::new();
        write_outcome(outcome, &OutputCtx::with_format(OutputFormat::Table), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }
}
