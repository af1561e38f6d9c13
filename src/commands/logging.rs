/// `logging` commands: read and change cluster logger levels.
use clap::Parser;
use serde_json::json;
use tracing::{debug, info};

use super::settings::{PersistencyArgs, Settings};
use super::{CommandSpec, Execute, Session};
use crate::errors::CliError;
use crate::format::{ColumnSpec, to_record};
use crate::types::Outcome;

/// Logger settings live under this prefix.
const LOGGER_PREFIX: &str = "logger.";

/// `org.elasticsearch.discovery` becomes `logger.org.elasticsearch.discovery`.
fn logger_key(logger: &str) -> String {
    if logger.starts_with("logger") {
        logger.to_owned()
    } else {
        format!("{LOGGER_PREFIX}{logger}")
    }
}

/// Show a logger level.
#[derive(Debug, Parser)]
pub struct LoggingGet {
    /// Logger name, with or without the `logger.` prefix
    logger: String,

    #[command(flatten)]
    persistency: PersistencyArgs,
}

impl CommandSpec for LoggingGet {
    const NAME: &'static [&'static str] = &["logging", "get"];
    const ABOUT: &'static str = "Get a logger level";
}

impl Execute for LoggingGet {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let persistency = self.persistency.persistency();
        debug!(persistency = persistency.as_str(), "logger lookup");
        let key = logger_key(&self.logger);
        let level = Settings::Cluster(persistency).value(session.cluster, &key)?;
        let item = json!({"logger": key, "level": level});
        let columns = [ColumnSpec::new("logger"), ColumnSpec::new("level")];
        Ok(Outcome::Record(to_record(&item, &columns)))
    }
}

/// Change a logger level.
#[derive(Debug, Parser)]
pub struct LoggingSet {
    /// Logger name, with or without the `logger.` prefix
    logger: String,

    /// Log level
    #[arg(value_parser = ["TRACE", "DEBUG", "INFO", "WARN"])]
    level: String,

    #[command(flatten)]
    persistency: PersistencyArgs,
}

impl CommandSpec for LoggingSet {
    const NAME: &'static [&'static str] = &["logging", "set"];
    const ABOUT: &'static str = "Set a logger level";
}

impl Execute for LoggingSet {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let persistency = self.persistency.persistency();
        let key = logger_key(&self.logger);
        info!("Changing logger {key} to {}", self.level);
        Settings::Cluster(persistency).set(session.cluster, &key, Some(self.level.as_str()))?;
        Ok(Outcome::Success(format!("{key} set to {}", self.level)))
    }
}

/// Reset a logger to its default level.
#[derive(Debug, Parser)]
pub struct LoggingReset {
    /// Logger name, with or without the `logger.` prefix
    logger: String,

    #[command(flatten)]
    persistency: PersistencyArgs,
}

impl CommandSpec for LoggingReset {
    const NAME: &'static [&'static str] = &["logging", "reset"];
    const ABOUT: &'static str = "Reset a logger level";
}

impl Execute for LoggingReset {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let persistency = self.persistency.persistency();
        let key = logger_key(&self.logger);
        info!("Resetting logger {key}");
        Settings::Cluster(persistency).set(session.cluster, &key, None)?;
        Ok(Outcome::Success(format!("{key} reset")))
    }
}
