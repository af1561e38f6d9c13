/// `alias` commands: create, delete and list index aliases.
use clap::Parser;
use tracing::info;

use super::{CommandSpec, Execute, Session, cat_rows};
use crate::client::Request;
use crate::errors::{CliError, NotFoundExt};
use crate::format::transform::filter_by_field;
use crate::format::{ColumnSpec, to_table};
use crate::types::Outcome;

/// Create an alias.
#[derive(Debug, Parser)]
pub struct AliasCreate {
    /// Index the alias should point to
    index: String,
    /// Alias to create
    name: String,
}

impl CommandSpec for AliasCreate {
    const NAME: &'static [&'static str] = &["alias", "create"];
    const ABOUT: &'static str = "Create an alias";
}

impl Execute for AliasCreate {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!("Creating alias {} on index {}", self.name, self.index);
        let path = format!("/{}/_alias/{}", self.index, self.name);
        session
            .cluster
            .send(&Request::put(path))
            .or_not_found("Index", &self.index)?;
        Ok(Outcome::Success(format!(
            "Alias {} now points to {}",
            self.name, self.index
        )))
    }
}

/// Delete an alias.
#[derive(Debug, Parser)]
pub struct AliasDelete {
    /// Index the alias points to
    index: String,
    /// Alias to delete
    name: String,
}

impl CommandSpec for AliasDelete {
    const NAME: &'static [&'static str] = &["alias", "delete"];
    const ABOUT: &'static str = "Delete an alias";
}

impl Execute for AliasDelete {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!("Deleting alias {} from index {}", self.name, self.index);
        let path = format!("/{}/_alias/{}", self.index, self.name);
        session
            .cluster
            .send(&Request::delete(path))
            .or_not_found("Alias", &self.name)?;
        Ok(Outcome::Success(format!(
            "Alias {} removed from {}",
            self.name, self.index
        )))
    }
}

/// List aliases, optionally only those of one index.
#[derive(Debug, Parser)]
pub struct AliasList {
    /// Only show aliases of this index
    index: Option<String>,
}

impl CommandSpec for AliasList {
    const NAME: &'static [&'static str] = &["alias", "list"];
    const ABOUT: &'static str = "List all aliases";
}

impl Execute for AliasList {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let aliases = cat_rows(session, "/_cat/aliases")?;
        let aliases = filter_by_field(aliases, "index", self.index.as_deref());

        let mut columns = vec![ColumnSpec::new("alias").labeled("Aliases")];
        if self.index.is_none() {
            columns.push(ColumnSpec::new("index"));
        }
        Ok(Outcome::Table(to_table(&aliases, &columns)))
    }
}
