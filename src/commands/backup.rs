/// `repository` and `snapshot` commands.
use clap::{ArgAction, Parser};
use serde_json::{Value, json};
use tracing::info;

use super::{CommandSpec, Execute, Session, acknowledged, into_items};
use crate::client::Request;
use crate::errors::{CliError, NotFoundExt};
use crate::format::transform::{
    join_array, lift, mark, numeric_field, recolor, snapshot_state_marker, snapshot_status_marker,
};
use crate::format::{ColumnSpec, Marker, cell_text, to_record, to_table};
use crate::types::Outcome;

/// List snapshot repositories.
#[derive(Debug, Parser)]
pub struct RepositoryList;

impl CommandSpec for RepositoryList {
    const NAME: &'static [&'static str] = &["repository", "list"];
    const ABOUT: &'static str = "List repositories";
}

impl Execute for RepositoryList {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let repositories = super::cat_rows(session, "/_cat/repositories")?;
        let columns = [ColumnSpec::new("id"), ColumnSpec::new("type")];
        Ok(Outcome::Table(to_table(&repositories, &columns)))
    }
}

/// Show a repository's type and settings.
#[derive(Debug, Parser)]
pub struct RepositoryShow {
    /// Repository name
    repository: String,
}

impl CommandSpec for RepositoryShow {
    const NAME: &'static [&'static str] = &["repository", "show"];
    const ABOUT: &'static str = "Display repository details";
}

impl Execute for RepositoryShow {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let body = session
            .cluster
            .send(&Request::get(format!("/_snapshot/{}", self.repository)))
            .or_not_found("Repository", &self.repository)?;
        let repository = body
            .get(&self.repository)
            .ok_or_else(|| CliError::not_found("Repository", &self.repository))?;
        let columns = [ColumnSpec::new("type"), ColumnSpec::new("settings")];
        Ok(Outcome::Record(to_record(repository, &columns)))
    }
}

/// Check that every node can access a repository.
#[derive(Debug, Parser)]
pub struct RepositoryVerify {
    /// Repository name
    repository: String,
}

impl CommandSpec for RepositoryVerify {
    const NAME: &'static [&'static str] = &["repository", "verify"];
    const ABOUT: &'static str = "Verify repository status";
}

impl Execute for RepositoryVerify {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let path = format!("/_snapshot/{}/_verify", self.repository);
        let body = session
            .cluster
            .send(&Request::post(path))
            .or_not_found("Repository", &self.repository)?;
        let nodes: Vec<Value> = body
            .get("nodes")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .map(|(id, node)| json!({"id": id, "name": node.get("name")}))
            .collect();
        let columns = [
            ColumnSpec::new("id").labeled("Node ID"),
            ColumnSpec::new("name"),
        ];
        Ok(Outcome::Table(to_table(&nodes, &columns)))
    }
}

/// Start a snapshot.
#[derive(Debug, Parser)]
pub struct SnapshotCreate {
    /// Repository to store the snapshot in
    #[arg(short, long)]
    repository: String,

    /// Snapshot name
    name: String,

    /// Skip missing or closed indices instead of failing
    #[arg(long, action = ArgAction::Set, default_value_t = false, value_name = "BOOL")]
    ignore_unavailable: bool,

    /// Store the cluster global state in the snapshot
    #[arg(long, action = ArgAction::Set, default_value_t = true, value_name = "BOOL")]
    include_global_state: bool,
}

impl CommandSpec for SnapshotCreate {
    const NAME: &'static [&'static str] = &["snapshot", "create"];
    const ABOUT: &'static str = "Create a snapshot";
}

impl Execute for SnapshotCreate {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!("Creating snapshot {} in {}", self.name, self.repository);
        let request = Request::put(format!("/_snapshot/{}/{}", self.repository, self.name)).json(json!({
            "ignore_unavailable": self.ignore_unavailable,
            "include_global_state": self.include_global_state,
        }));
        let status = session
            .cluster
            .send(&request)
            .or_not_found("Repository", &self.repository)?;
        if acknowledged(&status) {
            Ok(Outcome::Success(format!("Snapshot {} accepted", self.name)))
        } else {
            Ok(Outcome::Text(status.to_string()))
        }
    }
}

/// Delete a snapshot.
#[derive(Debug, Parser)]
pub struct SnapshotDelete {
    /// Repository holding the snapshot
    #[arg(short, long)]
    repository: String,

    /// Snapshot to delete
    snapshot: String,
}

impl CommandSpec for SnapshotDelete {
    const NAME: &'static [&'static str] = &["snapshot", "delete"];
    const ABOUT: &'static str = "Delete a snapshot from a repository";
}

impl Execute for SnapshotDelete {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!("Deleting snapshot {} from {}", self.snapshot, self.repository);
        let path = format!("/_snapshot/{}/{}", self.repository, self.snapshot);
        session
            .cluster
            .send(&Request::delete(path))
            .or_not_found("Snapshot", &self.snapshot)?;
        Ok(Outcome::Success(format!("Snapshot {} deleted", self.snapshot)))
    }
}

/// List the snapshots of a repository.
#[derive(Debug, Parser)]
pub struct SnapshotList {
    /// Repository to list
    #[arg(short, long)]
    repository: String,
}

impl CommandSpec for SnapshotList {
    const NAME: &'static [&'static str] = &["snapshot", "list"];
    const ABOUT: &'static str = "List snapshots";
}

impl Execute for SnapshotList {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let request = Request::get(format!("/_cat/snapshots/{}", self.repository)).json_format();
        let body = session
            .cluster
            .send(&request)
            .or_not_found("Repository", &self.repository)?;
        let mut snapshots = into_items(body);
        for snapshot in &mut snapshots {
            if recolor(snapshot, "status", snapshot_status_marker) == Some(Marker::Warning) {
                mark(snapshot, "failed_shards", Marker::Critical);
            }
        }
        let columns = [
            ColumnSpec::new("id"),
            ColumnSpec::new("status"),
            ColumnSpec::new("start_time"),
            ColumnSpec::new("end_time"),
            ColumnSpec::new("duration"),
            ColumnSpec::new("indices"),
            ColumnSpec::new("successful_shards"),
            ColumnSpec::new("failed_shards"),
            ColumnSpec::new("total_shards"),
        ];
        Ok(Outcome::Table(to_table(&snapshots, &columns)))
    }
}

/// Restore a snapshot.
#[derive(Debug, Parser)]
pub struct SnapshotRestore {
    /// Repository holding the snapshot
    #[arg(short, long)]
    repository: String,

    /// Snapshot to restore
    snapshot: String,
}

impl CommandSpec for SnapshotRestore {
    const NAME: &'static [&'static str] = &["snapshot", "restore"];
    const ABOUT: &'static str = "Restore a snapshot";
}

impl Execute for SnapshotRestore {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!("Restoring snapshot {} from {}", self.snapshot, self.repository);
        let path = format!("/_snapshot/{}/{}/_restore", self.repository, self.snapshot);
        session
            .cluster
            .send(&Request::post(path))
            .or_not_found("Snapshot", &self.snapshot)?;
        Ok(Outcome::Success(format!(
            "Restore of snapshot {} started",
            self.snapshot
        )))
    }
}

/// Show the details of one snapshot.
#[derive(Debug, Parser)]
pub struct SnapshotShow {
    /// Repository holding the snapshot
    #[arg(short, long)]
    repository: String,

    /// Snapshot to show
    snapshot: String,
}

impl CommandSpec for SnapshotShow {
    const NAME: &'static [&'static str] = &["snapshot", "show"];
    const ABOUT: &'static str = "Display snapshot details";
}

impl Execute for SnapshotShow {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let path = format!("/_snapshot/{}/{}", self.repository, self.snapshot);
        let body = session
            .cluster
            .send(&Request::get(path))
            .or_not_found("Snapshot", &self.snapshot)?;
        let mut snapshot = body
            .get("snapshots")
            .and_then(|s| s.get(0))
            .cloned()
            .ok_or_else(|| CliError::not_found("Snapshot", &self.snapshot))?;
        shape_snapshot(&mut snapshot)?;

        let columns = [
            ColumnSpec::new("snapshot"),
            ColumnSpec::new("uuid").labeled("UUID"),
            ColumnSpec::new("version_id"),
            ColumnSpec::new("version"),
            ColumnSpec::new("indices"),
            ColumnSpec::new("state"),
            ColumnSpec::new("start_time"),
            ColumnSpec::new("end_time"),
            ColumnSpec::new("duration_in_millis").labeled("Duration (ms)"),
            ColumnSpec::new("failures"),
            ColumnSpec::new("total_shards"),
            ColumnSpec::new("failed_shards"),
            ColumnSpec::new("successful_shards"),
        ];
        Ok(Outcome::Record(to_record(&snapshot, &columns)))
    }
}

/// Split `shards` into three fields, join `indices`, describe failures, color `state`.
fn shape_snapshot(snapshot: &mut Value) -> Result<(), CliError> {
    if let Some(indices) = snapshot.get_mut("indices") {
        *indices = join_array(indices, ", ");
    }
    lift(snapshot, "shards", "total", "total_shards");
    lift(snapshot, "shards", "successful", "successful_shards");
    lift(snapshot, "shards", "failed", "failed_shards");
    if numeric_field(snapshot, "failed_shards")?.is_some_and(|failed| failed > 0.0) {
        mark(snapshot, "failed_shards", Marker::Critical);
    }

    let failures = snapshot
        .get("failures")
        .and_then(Value::as_array)
        .map(|failures| failures.iter().map(describe_failure).collect::<Vec<_>>())
        .unwrap_or_default();
    if let Some(object) = snapshot.as_object_mut() {
        let text = if failures.is_empty() {
            "0".to_owned()
        } else {
            failures.join("\n")
        };
        object.insert("failures".to_owned(), Value::String(text));
    }

    recolor(snapshot, "state", snapshot_state_marker);
    Ok(())
}

/// `index[shard] - STATUS: reason`.
fn describe_failure(failure: &Value) -> String {
    let field = |key: &str| failure.get(key).map(cell_text).unwrap_or_default();
    format!(
        "{}[{}] - {}: {}",
        field("index"),
        field("shard_id"),
        field("status"),
        field("reason")
    )
}
