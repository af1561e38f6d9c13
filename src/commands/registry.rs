/// Command resolution: map leading tokens to a registered command.
///
/// Resolution strategy:
///
/// 1. **Longest prefix**: among registered names that are a prefix of the
///    input tokens, pick the longest. The rest of the tokens are the
///    command's arguments.
/// 2. **Candidates**: when nothing matches, report the commands that share
///    the longest leading run of words with the input.
use clap::Parser;
use tracing::debug;

use super::{CommandDescriptor, Execute, Invocation, Session, builtin};
use crate::cli::OutputArgs;
use crate::errors::CliError;
use crate::format::{ColumnSpec, TableResult};
use crate::types::Outcome;

/// Word that lists the registered commands.
const HELP: &str = "help";

/// Static table of commands, built once at startup.
pub struct Registry {
    commands: Vec<CommandDescriptor>,
}

impl Registry {
    /// Build a registry. Names must be unique.
    #[must_use]
    pub fn new(commands: Vec<CommandDescriptor>) -> Self {
        debug_assert!(
            commands.iter().enumerate().all(|(i, a)| commands[..i]
                .iter()
                .all(|b| a.name != b.name)),
            "duplicate command registration"
        );
        Self { commands }
    }

    /// The registry of every built-in command.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(builtin())
    }

    /// Find the command named by the longest matching prefix of `tokens`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::UnknownCommand` when no registered name is a prefix.
    pub fn resolve<'t>(
        &self,
        tokens: &'t [String],
    ) -> Result<(&CommandDescriptor, &'t [String]), CliError> {
        let best = self
            .commands
            .iter()
            .filter(|c| is_prefix(c.name, tokens))
            .max_by_key(|c| c.name.len());

        match best {
            Some(descriptor) => Ok((descriptor, &tokens[descriptor.name.len()..])),
            None => Err(self.unknown(tokens)),
        }
    }

    /// Resolve the command and apply its argument schema. Makes no cluster call.
    ///
    /// Empty input and `help [words...]` resolve to the command overview.
    ///
    /// # Errors
    ///
    /// Returns `CliError::UnknownCommand` or `CliError::Usage`.
    pub fn parse(&self, tokens: &[String]) -> Result<Invocation, CliError> {
        if tokens.is_empty() || tokens[0] == HELP {
            return self.parse_help(tokens.get(1..).unwrap_or_default());
        }
        let (descriptor, rest) = self.resolve(tokens)?;
        debug!(command = %descriptor.display_name(), args = ?rest, "resolved command");
        descriptor.parse(rest)
    }

    /// Registered commands whose names start with `words`, as a table.
    #[must_use]
    pub fn overview(&self, words: &[String]) -> TableResult {
        let rows = self
            .commands
            .iter()
            .filter(|c| is_prefix_of_name(words, c.name))
            .map(|c| vec![c.display_name().into(), c.about.into()])
            .collect();
        TableResult {
            headers: vec![ColumnSpec::new("command"), ColumnSpec::new("description")],
            rows,
        }
    }

    fn parse_help(&self, rest: &[String]) -> Result<Invocation, CliError> {
        let argv = std::iter::once(HELP).chain(rest.iter().map(String::as_str));
        let args = HelpArgs::try_parse_from(argv)
            .map_err(|e| CliError::Usage(e.to_string().trim_end().to_owned()))?;
        Ok(Invocation {
            command: Box::new(Overview(self.overview(&args.topic))),
            output: args.output,
        })
    }

    fn unknown(&self, tokens: &[String]) -> CliError {
        let words: Vec<&String> = tokens.iter().take_while(|t| !t.starts_with('-')).collect();
        let mut candidates = Vec::new();
        for depth in (1..=words.len()).rev() {
            candidates = self
                .commands
                .iter()
                .filter(|c| {
                    c.name.len() >= depth
                        && c.name[..depth].iter().zip(&words).all(|(a, b)| *a == b.as_str())
                })
                .map(CommandDescriptor::display_name)
                .collect();
            if !candidates.is_empty() {
                break;
            }
        }
        CliError::UnknownCommand {
            input: words
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            candidates,
        }
    }
}

/// Arguments of `escli help`.
#[derive(Debug, Parser)]
#[command(name = "help")]
struct HelpArgs {
    /// Only list commands starting with these words.
    topic: Vec<String>,

    #[command(flatten)]
    output: OutputArgs,
}

/// Prints the command overview.
struct Overview(TableResult);

impl Execute for Overview {
    fn execute(&self, _session: &Session<'_>) -> Result<Outcome, CliError> {
        Ok(Outcome::Table(self.0.clone()))
    }

    fn offline(&self) -> Option<Outcome> {
        Some(Outcome::Table(self.0.clone()))
    }
}

/// Whether `name` is a prefix of `tokens`.
fn is_prefix(name: &[&str], tokens: &[String]) -> bool {
    name.len() <= tokens.len() && name.iter().zip(tokens).all(|(n, t)| n == t)
}

/// Whether `words` is a prefix of `name`.
fn is_prefix_of_name(words: &[String], name: &[&str]) -> bool {
    words.len() <= name.len() && words.iter().zip(name).all(|(w, n)| w == n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{render, run};
    use crate::commands::{CommandSpec, describe};
    use crate::client::stub::StubCluster;
    use clap::Parser;
    use reqwest::Method;
    use serde_json::json;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_owned).collect()
    }

    #[derive(Debug, Parser)]
    struct Health;

    impl Execute for Health {
        fn execute(&self, _session: &Session<'_>) -> Result<Outcome, CliError> {
            Ok(Outcome::Text("health".to_owned()))
        }
    }

    impl CommandSpec for Health {
        const NAME: &'static [&'static str] = &["cluster", "health"];
        const ABOUT: &'static str = "Health";
    }

    #[derive(Debug, Parser)]
    struct SettingsGet {
        setting: String,
    }

    impl Execute for SettingsGet {
        fn execute(&self, _session: &Session<'_>) -> Result<Outcome, CliError> {
            Ok(Outcome::Text(self.setting.clone()))
        }
    }

    impl CommandSpec for SettingsGet {
        const NAME: &'static [&'static str] = &["cluster", "settings", "get"];
        const ABOUT: &'static str = "Get";
    }

    fn small() -> Registry {
        Registry::new(vec![describe::<Health>(), describe::<SettingsGet>()])
    }

    #[test]
    fn test_longest_prefix_wins() {
        let registry = small();
        let input = tokens("cluster settings get foo.bar");
        let (descriptor, rest) = registry.resolve(&input).unwrap();
        assert_eq!(descriptor.name, &["cluster", "settings", "get"]);
        assert_eq!(rest, &["foo.bar".to_owned()]);
    }

    #[test]
    fn test_parse_passes_remaining_positional() {
        let registry = small();
        let invocation = registry.parse(&tokens("cluster settings get foo.bar")).unwrap();
        let cluster = StubCluster::new();
        let config = crate::config::Config::default();
        let outcome = invocation
            .execute(&Session { cluster: &cluster, config: &config })
            .unwrap();
        assert_eq!(outcome, Outcome::Text("foo.bar".to_owned()));
    }

    #[test]
    fn test_unknown_command_lists_candidates() {
        let registry = small();
        let err = registry.parse(&tokens("cluster settings")).err().unwrap();
        match err {
            CliError::UnknownCommand { input, candidates } => {
                assert_eq!(input, "cluster settings");
                assert_eq!(candidates, vec!["cluster settings get"]);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let err = registry.parse(&tokens("clustre health")).err().unwrap();
        assert!(matches!(err, CliError::UnknownCommand { ref candidates, .. } if candidates.is_empty()));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_schema_violation_is_usage_error() {
        let registry = small();
        let err = registry.parse(&tokens("cluster settings get")).err().unwrap();
        assert!(matches!(err, CliError::Usage(_)));
        let err = registry.parse(&tokens("cluster health --bogus")).err().unwrap();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_output_flags_follow_command() {
        let registry = small();
        let invocation = registry
            .parse(&tokens("cluster health --json --fields a,b"))
            .unwrap();
        assert!(invocation.output.json);
        assert_eq!(invocation.output.fields.as_deref(), Some("a,b"));
    }

    #[test]
    fn test_help_flag_is_not_an_error() {
        let registry = small();
        let invocation = registry.parse(&tokens("cluster settings get --help")).unwrap();
        let cluster = StubCluster::new();
        let config = crate::config::Config::default();
        match invocation.execute(&Session { cluster: &cluster, config: &config }).unwrap() {
            Outcome::Text(help) => assert!(help.contains("escli cluster settings get")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_overview_filters_by_topic() {
        let registry = Registry::builtin();
        let all = registry.overview(&[]);
        assert!(all.rows.len() > 30);
        let snapshots = registry.overview(&tokens("snapshot"));
        assert_eq!(snapshots.rows.len(), 5);
        assert_eq!(snapshots.labels(), vec!["Command", "Description"]);
    }

    #[test]
    fn test_help_and_empty_input() {
        let cluster = StubCluster::new();
        let outcome = run(&cluster, "help cluster settings").unwrap();
        let text = render(&outcome);
        assert!(text.contains("cluster settings get"));
        assert!(!text.contains("index list"));
        assert!(Registry::builtin().parse(&[]).is_ok());
        assert!(cluster.calls().is_empty());
    }

    #[test]
    fn test_usage_error_makes_no_cluster_call() {
        let cluster = StubCluster::new().on(Method::GET, "/_cluster/health", json!({}));
        assert!(run(&cluster, "index settings get onlyindex").is_err());
        assert!(run(&cluster, "cluster settings set a b --transient --persistent").is_err());
        assert!(cluster.calls().is_empty());
    }
}
