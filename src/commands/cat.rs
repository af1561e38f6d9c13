/// `cat` commands: allocation and shard overviews.
use clap::Parser;

use super::{CommandSpec, Execute, Session, cat_rows};
use crate::client::Request;
use crate::errors::{CliError, NotFoundExt};
use crate::format::transform::annotate_threshold;
use crate::format::{ColumnSpec, to_table};
use crate::types::Outcome;

/// Byte units accepted by the `_cat` APIs.
const BYTE_UNITS: [&str; 11] = ["b", "k", "kb", "m", "mb", "g", "gb", "t", "tb", "p", "pb"];

/// Show how shards are allocated around the cluster and the state of disk usage.
#[derive(Debug, Parser)]
pub struct CatAllocation;

impl CommandSpec for CatAllocation {
    const NAME: &'static [&'static str] = &["cat", "allocation"];
    const ABOUT: &'static str = "Show shard allocation and disk usage per node";
}

impl Execute for CatAllocation {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let mut nodes = cat_rows(session, "/_cat/allocation")?;
        for node in &mut nodes {
            annotate_threshold(node, "disk.percent")?;
        }
        let columns = [
            ColumnSpec::new("shards"),
            ColumnSpec::new("disk.indices"),
            ColumnSpec::new("disk.used"),
            ColumnSpec::new("disk.avail"),
            ColumnSpec::new("disk.total"),
            ColumnSpec::new("disk.percent").labeled("Disk %"),
            ColumnSpec::new("host"),
            ColumnSpec::new("ip").labeled("IP"),
            ColumnSpec::new("node"),
        ];
        Ok(Outcome::Table(to_table(&nodes, &columns)))
    }
}

/// Show which nodes hold which shards.
#[derive(Debug, Parser)]
pub struct CatShards {
    /// Comma-separated list of indices to limit the output to
    #[arg(short, long)]
    index: Option<String>,

    /// Unit for byte values
    #[arg(long, default_value = "mb", value_parser = BYTE_UNITS)]
    unit: String,
}

impl CommandSpec for CatShards {
    const NAME: &'static [&'static str] = &["cat", "shards"];
    const ABOUT: &'static str = "Show a detailed view of what nodes contain which shards";
}

impl Execute for CatShards {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let path = match &self.index {
            Some(index) => format!("/_cat/shards/{index}"),
            None => "/_cat/shards".to_owned(),
        };
        let request = Request::get(path).json_format().query("bytes", &self.unit);
        let response = session.cluster.send(&request);
        let body = match &self.index {
            Some(index) => response.or_not_found("Index", index)?,
            None => response?,
        };
        let shards = super::into_items(body);

        let columns = [
            ColumnSpec::new("index"),
            ColumnSpec::new("shard").labeled("#"),
            ColumnSpec::new("prirep").labeled("Primary/Replica"),
            ColumnSpec::new("state"),
            ColumnSpec::new("docs").labeled("Documents"),
            ColumnSpec::new("store").labeled(format!("Size ({})", self.unit)),
            ColumnSpec::new("node"),
        ];
        Ok(Outcome::Table(to_table(&shards, &columns)))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::stub::StubCluster;
    use crate::commands::testing::{assert_marked, render, run};
    use crate::errors::CliError;
    use crate::format::Marker;
    use crate::types::Outcome;
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_allocation_marks_disk_usage() {
        let cluster = StubCluster::new().on(
            Method::GET,
            "/_cat/allocation",
            json!([
                {"shards": "10", "disk.percent": "95", "node": "n1", "ip": "10.0.0.1"},
                {"shards": "8", "disk.percent": "80", "node": "n2", "ip": "10.0.0.2"},
                {"shards": "3", "disk.percent": "40", "node": "n3", "ip": "10.0.0.3"},
                {"shards": "2", "disk.percent": null, "node": "UNASSIGNED"}
            ]),
        );
        let Outcome::Table(table) = run(&cluster, "cat allocation").unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(table.labels()[5], "Disk %");
        assert_marked(&table.rows[0][5], Marker::Critical, "95");
        assert_marked(&table.rows[1][5], Marker::Warning, "80");
        assert_eq!(table.rows[2][5], json!("40"));
        assert_eq!(table.rows[3][5], json!(null));
    }

    #[test]
    fn test_allocation_rejects_garbage_percent() {
        let cluster = StubCluster::new().on(
            Method::GET,
            "/_cat/allocation",
            json!([{"disk.percent": "lots"}]),
        );
        let err = run(&cluster, "cat allocation").unwrap_err();
        assert!(matches!(err, CliError::Format { ref field, .. } if field == "disk.percent"));
    }

    #[test]
    fn test_shards_unit_and_index() {
        let cluster = StubCluster::new().on(
            Method::GET,
            "/_cat/shards/logs",
            json!([{"index": "logs", "shard": "0", "prirep": "p", "state": "STARTED", "store": "12"}]),
        );
        let outcome = run(&cluster, "cat shards -i logs --unit gb").unwrap();
        let text = render(&outcome);
        assert!(text.contains("Size (gb)"));
        assert!(text.contains("STARTED"));
        assert_eq!(cluster.calls()[0].query_value("bytes"), Some("gb"));
    }

    #[test]
    fn test_shards_missing_index_is_not_found() {
        let cluster = StubCluster::new().fail(
            Method::GET,
            "/_cat/shards/nope",
            404,
            json!({"error": {"reason": "no such index [nope]"}, "status": 404}),
        );
        let err = run(&cluster, "cat shards -i nope").unwrap_err();
        assert_eq!(err.to_string(), "Index 'nope' does not exist");
    }

    #[test]
    fn test_shards_404_without_index_is_transport() {
        let cluster = StubCluster::new().fail(
            Method::GET,
            "/_cat/shards",
            404,
            json!({"error": {"reason": "not found"}, "status": 404}),
        );
        let err = run(&cluster, "cat shards").unwrap_err();
        assert!(matches!(err, CliError::Transport { status: Some(404), .. }));
    }

    #[test]
    fn test_shards_rejects_unknown_unit() {
        let cluster = StubCluster::new();
        let err = run(&cluster, "cat shards --unit furlongs").unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
        assert!(cluster.calls().is_empty());
    }
}
