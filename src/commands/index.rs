/// `index` commands: lifecycle, listing, settings and slowlog thresholds.
use clap::{Parser, ValueEnum};
use serde_json::{Map, Value, json};
use tracing::info;

use super::settings::Settings;
use super::{CommandSpec, Execute, Session, cat_rows};
use crate::client::Request;
use crate::errors::{CliError, NotFoundExt};
use crate::format::transform::{health_marker, recolor};
use crate::format::{ColumnSpec, to_table};
use crate::types::Outcome;

/// Create an index.
#[derive(Debug, Parser)]
pub struct IndexCreate {
    /// Index to create
    index: String,

    /// Number of primary shards
    #[arg(long)]
    shards: Option<u32>,

    /// Number of replicas per primary
    #[arg(long)]
    replicas: Option<u32>,
}

impl IndexCreate {
    fn body(&self) -> Option<Value> {
        let mut settings = Map::new();
        if let Some(shards) = self.shards {
            settings.insert("number_of_shards".to_owned(), shards.into());
        }
        if let Some(replicas) = self.replicas {
            settings.insert("number_of_replicas".to_owned(), replicas.into());
        }
        (!settings.is_empty()).then(|| json!({ "settings": settings }))
    }
}

impl CommandSpec for IndexCreate {
    const NAME: &'static [&'static str] = &["index", "create"];
    const ABOUT: &'static str = "Create an index";
}

impl Execute for IndexCreate {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!(
            shards = ?self.shards,
            replicas = ?self.replicas,
            "Creating index {}",
            self.index
        );
        let mut request = Request::put(format!("/{}", self.index));
        if let Some(body) = self.body() {
            request = request.json(body);
        }
        session.cluster.send(&request)?;
        Ok(Outcome::Success(format!("Index {} created", self.index)))
    }
}

/// Index lifecycle actions that take nothing but the index name.
#[derive(Debug, Clone, Copy)]
enum Lifecycle {
    Open,
    Close,
    Delete,
}

impl Lifecycle {
    fn run(self, session: &Session<'_>, index: &str) -> Result<Outcome, CliError> {
        let (request, verb, done) = match self {
            Self::Open => (Request::post(format!("/{index}/_open")), "Opening", "opened"),
            Self::Close => (Request::post(format!("/{index}/_close")), "Closing", "closed"),
            Self::Delete => (Request::delete(format!("/{index}")), "Deleting", "deleted"),
        };
        info!("{verb} index {index}");
        session
            .cluster
            .send(&request)
            .or_not_found("Index", index)?;
        Ok(Outcome::Success(format!("Index {index} {done}")))
    }
}

/// Open a closed index.
#[derive(Debug, Parser)]
pub struct IndexOpen {
    /// Index to open
    index: String,
}

impl CommandSpec for IndexOpen {
    const NAME: &'static [&'static str] = &["index", "open"];
    const ABOUT: &'static str = "Open an index";
}

impl Execute for IndexOpen {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        Lifecycle::Open.run(session, &self.index)
    }
}

/// Close an index.
#[derive(Debug, Parser)]
pub struct IndexClose {
    /// Index to close
    index: String,
}

impl CommandSpec for IndexClose {
    const NAME: &'static [&'static str] = &["index", "close"];
    const ABOUT: &'static str = "Close an index";
}

impl Execute for IndexClose {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        Lifecycle::Close.run(session, &self.index)
    }
}

/// Delete an index.
#[derive(Debug, Parser)]
pub struct IndexDelete {
    /// Index to delete
    index: String,
}

impl CommandSpec for IndexDelete {
    const NAME: &'static [&'static str] = &["index", "delete"];
    const ABOUT: &'static str = "Delete an index";
}

impl Execute for IndexDelete {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        Lifecycle::Delete.run(session, &self.index)
    }
}

/// List all indices.
#[derive(Debug, Parser)]
pub struct IndexList;

impl CommandSpec for IndexList {
    const NAME: &'static [&'static str] = &["index", "list"];
    const ABOUT: &'static str = "List all indices";
}

impl Execute for IndexList {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let mut indices = cat_rows(session, "/_cat/indices")?;
        for index in &mut indices {
            recolor(index, "health", health_marker);
        }
        let columns = [
            ColumnSpec::new("index"),
            ColumnSpec::new("health"),
            ColumnSpec::new("status"),
            ColumnSpec::new("uuid").labeled("UUID"),
            ColumnSpec::new("pri").labeled("Primary"),
            ColumnSpec::new("rep").labeled("Replica"),
            ColumnSpec::new("docs.count"),
            ColumnSpec::new("docs.deleted"),
            ColumnSpec::new("store.size"),
            ColumnSpec::new("pri.store.size").labeled("Primary Store Size"),
        ];
        Ok(Outcome::Table(to_table(&indices, &columns)))
    }
}

/// One row per matched index: index, setting, value.
fn settings_table(session: &Session<'_>, index: &str, setting: &str) -> Result<Outcome, CliError> {
    let rows: Vec<Value> = Settings::Index(index.to_owned())
        .get(session.cluster, setting)?
        .iter()
        .map(|s| s.to_item())
        .collect();
    let columns = [
        ColumnSpec::new("scope").labeled("Index"),
        ColumnSpec::new("setting"),
        ColumnSpec::new("value"),
    ];
    Ok(Outcome::Table(to_table(&rows, &columns)))
}

/// Show an index setting.
#[derive(Debug, Parser)]
pub struct IndexSettingsGet {
    /// Index, comma-separated list or pattern
    index: String,
    /// Setting to read, with or without the `index.` prefix
    setting: String,
}

impl CommandSpec for IndexSettingsGet {
    const NAME: &'static [&'static str] = &["index", "settings", "get"];
    const ABOUT: &'static str = "Retrieve an index setting";
}

impl Execute for IndexSettingsGet {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        settings_table(session, &self.index, &self.setting)
    }
}

/// Change an index setting.
#[derive(Debug, Parser)]
pub struct IndexSettingsSet {
    /// Index, comma-separated list or pattern
    index: String,
    /// Setting to change
    setting: String,
    /// New value
    value: String,
}

impl CommandSpec for IndexSettingsSet {
    const NAME: &'static [&'static str] = &["index", "settings", "set"];
    const ABOUT: &'static str = "Set an index setting";
}

impl Execute for IndexSettingsSet {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!(
            "Changing setting {} to {} in index {}",
            self.setting, self.value, self.index
        );
        Settings::Index(self.index.clone()).set(
            session.cluster,
            &self.setting,
            Some(self.value.as_str()),
        )?;
        Ok(Outcome::Success(format!(
            "{} set to {} on {}",
            self.setting, self.value, self.index
        )))
    }
}

/// Reset an index setting to its default.
#[derive(Debug, Parser)]
pub struct IndexSettingsReset {
    /// Index, comma-separated list or pattern
    index: String,
    /// Setting to reset
    setting: String,
}

impl CommandSpec for IndexSettingsReset {
    const NAME: &'static [&'static str] = &["index", "settings", "reset"];
    const ABOUT: &'static str = "Reset an index setting";
}

impl Execute for IndexSettingsReset {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!("Resetting setting {} in index {}", self.setting, self.index);
        Settings::Index(self.index.clone()).set(session.cluster, &self.setting, None)?;
        Ok(Outcome::Success(format!(
            "{} reset on {}",
            self.setting, self.index
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SlowlogKind {
    Indexing,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchPhase {
    Query,
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SlowlogLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

impl SlowlogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }
}

/// Show or change an index slowlog threshold.
#[derive(Debug, Parser)]
pub struct IndexSlowlogThreshold {
    /// Index to act on
    index: String,

    /// Slowlog type
    #[arg(short = 't', long = "type", value_enum)]
    kind: SlowlogKind,

    /// Search phase (required for the search slowlog)
    #[arg(short, long, value_enum, required_if_eq("kind", "search"))]
    search_type: Option<SearchPhase>,

    /// Log level the threshold applies to
    #[arg(short, long, value_enum)]
    level: SlowlogLevel,

    /// New threshold (e.g. 500ms); omit to show the current one
    value: Option<String>,
}

impl IndexSlowlogThreshold {
    /// Full setting key, e.g. `index.search.slowlog.threshold.query.warn`.
    fn setting(&self) -> Result<String, CliError> {
        let (kind, phase) = match (self.kind, self.search_type) {
            (SlowlogKind::Indexing, _) => ("indexing", "index"),
            (SlowlogKind::Search, Some(SearchPhase::Query)) => ("search", "query"),
            (SlowlogKind::Search, Some(SearchPhase::Fetch)) => ("search", "fetch"),
            (SlowlogKind::Search, None) => {
                return Err(CliError::Usage(
                    "--search-type is required for the search slowlog".to_owned(),
                ));
            }
        };
        Ok(format!(
            "index.{kind}.slowlog.threshold.{phase}.{}",
            self.level.as_str()
        ))
    }
}

impl CommandSpec for IndexSlowlogThreshold {
    const NAME: &'static [&'static str] = &["index", "slowlog", "threshold"];
    const ABOUT: &'static str = "Show or change an index slowlog threshold";
}

impl Execute for IndexSlowlogThreshold {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let setting = self.setting()?;
        match &self.value {
            None => settings_table(session, &self.index, &setting),
            Some(value) => {
                info!("Setting {setting} to {value} in index {}", self.index);
                Settings::Index(self.index.clone()).set(
                    session.cluster,
                    &setting,
                    Some(value.as_str()),
                )?;
                Ok(Outcome::Success(format!(
                    "{setting} set to {value} on {}",
                    self.index
                )))
            }
        }
    }
}
