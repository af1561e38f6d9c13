/// `config` commands: inspect the loaded configuration file.
use clap::Parser;
use serde_json::json;

use super::{CommandSpec, Execute, Session};
use crate::errors::CliError;
use crate::format::transform::mark;
use crate::format::{ColumnSpec, Marker, to_table};
use crate::types::Outcome;

/// List the contexts defined in the configuration file.
#[derive(Debug, Parser)]
pub struct ConfigContextList;

impl CommandSpec for ConfigContextList {
    const NAME: &'static [&'static str] = &["config", "context", "list"];
    const ABOUT: &'static str = "List all contexts";
}

impl Execute for ConfigContextList {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let config = session.config;
        let contexts: Vec<_> = config
            .contexts
            .iter()
            .map(|(name, context)| {
                let mut item = json!({
                    "name": name,
                    "user": context.user,
                    "cluster": context.cluster,
                });
                // The default context stands out.
                if config.default_context.as_deref() == Some(name.as_str()) {
                    mark(&mut item, "name", Marker::Healthy);
                }
                item
            })
            .collect();
        let columns = [
            ColumnSpec::new("name"),
            ColumnSpec::new("user"),
            ColumnSpec::new("cluster"),
        ];
        Ok(Outcome::Table(to_table(&contexts, &columns)))
    }
}
