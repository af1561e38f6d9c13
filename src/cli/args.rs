/// Global CLI argument definitions via clap derive.
///
/// Per-command arguments live next to each command; the dispatcher merges
/// [`OutputArgs`] into every command's schema.
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, ValueEnum};

/// escli: administer a search cluster from the command line.
#[derive(Debug, Parser)]
#[command(
    name = "escli",
    about = "Administer search and indexing clusters from the command line",
    version,
    after_help = "Run `escli help` to list commands, `escli <command> --help` for command usage."
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Configuration file (default: ~/.escli.toml, or $ESCLI_CONFIG).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity. Can be repeated.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Suppress log output except warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Also write logs to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Command name tokens followed by the command's own arguments,
    /// e.g. `cluster settings get cluster.routing.allocation.enable --persistent`.
    #[arg(value_name = "COMMAND", trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// Where to connect and as whom.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Cluster endpoint used when no context applies.
    #[arg(
        short,
        long,
        value_name = "URL",
        default_value = "http://localhost:9200"
    )]
    pub elasticsearch: String,

    /// Username (takes precedence over contexts when given with --password).
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password.
    #[arg(short, long)]
    pub password: Option<String>,

    /// Named context from the configuration file.
    #[arg(long, value_name = "NAME")]
    pub context: Option<String>,

    /// Disable TLS certificate verification.
    #[arg(long)]
    pub no_check_certificate: bool,
}

/// Output flags accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Output format. Auto-detects: table when TTY, json when piped.
    #[arg(long, value_name = "FORMAT", default_value = "auto")]
    pub output: OutputFormat,

    /// Shorthand for --output json.
    #[arg(long, conflicts_with = "output")]
    pub json: bool,

    /// Comma-separated columns or fields to include (source key or display name).
    #[arg(long, value_name = "FIELDS")]
    pub fields: Option<String>,

    /// Omit table headers (useful for awk/cut processing).
    #[arg(long)]
    pub no_header: bool,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Auto-detect: table when stdout is a TTY, json when piped.
    #[default]
    Auto,
    /// Aligned table with headers (human-readable).
    Table,
    /// JSON array or object (pretty-printed).
    Json,
    /// Compact single-line JSON.
    Compact,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
    /// Bare values, space separated, one row per line.
    Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_before_command() {
        let cli = Cli::try_parse_from([
            "escli", "-e", "http://es:9200", "-vv", "--context", "prod", "cluster", "health",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.connection.elasticsearch, "http://es:9200");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.connection.context.as_deref(), Some("prod"));
        assert_eq!(cli.command, vec!["cluster", "health", "--json"]);
    }

    #[test]
    fn test_command_flags_stay_with_command() {
        let cli = Cli::try_parse_from(["escli", "cat", "shards", "-i", "logs", "-v"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.command, vec!["cat", "shards", "-i", "logs", "-v"]);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["escli", "-v", "-q", "cluster", "health"]).is_err());
    }

    #[test]
    fn test_no_command() {
        let cli = Cli::try_parse_from(["escli"]).unwrap();
        assert!(cli.command.is_empty());
    }
}
