/// `node` commands: listing, hot threads and allocation exclusion.
use clap::Parser;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::settings::{Persistency, Settings};
use super::{CommandSpec, Execute, Session, cat_rows};
use crate::client::Request;
use crate::errors::CliError;
use crate::format::{ColumnSpec, cell_text, to_record, to_table};
use crate::types::Outcome;

/// Transient setting holding the comma-separated names of excluded nodes.
const EXCLUDE_NAME: &str = "cluster.routing.allocation.exclude._name";

const EXCLUSIONS: Settings = Settings::Cluster(Persistency::Transient);

/// Current exclusion list; an unset or empty setting is an empty list.
fn excluded(value: Option<&Value>) -> Vec<String> {
    value
        .map(cell_text)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Exclude a node from shard allocation, or show the current exclusions.
#[derive(Debug, Parser)]
pub struct NodeDecommission {
    /// Node name; omit to show the nodes currently excluded
    name: Option<String>,
}

impl CommandSpec for NodeDecommission {
    const NAME: &'static [&'static str] = &["node", "decommission"];
    const ABOUT: &'static str = "Decommission a node";
}

impl Execute for NodeDecommission {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let current = EXCLUSIONS.value(session.cluster, EXCLUDE_NAME)?;
        let Some(name) = &self.name else {
            let item = json!({ "excluded": current });
            let columns = [ColumnSpec::new("excluded").labeled("Excluded Nodes")];
            return Ok(Outcome::Record(to_record(&item, &columns)));
        };

        let mut nodes = excluded(current.as_ref());
        if nodes.iter().any(|n| n == name) {
            info!("Aborting, {name} is already in list: {}", nodes.join(","));
            return Ok(Outcome::Text(format!("{name} is already decommissioned")));
        }
        nodes.push(name.clone());
        let list = nodes.join(",");
        debug!(%list, "new exclusion list");

        info!("Decommissioning {name}");
        EXCLUSIONS.set(session.cluster, EXCLUDE_NAME, Some(list.as_str()))?;
        Ok(Outcome::Success(format!("{name} decommissioned")))
    }
}

/// Allow shards on a previously decommissioned node again.
#[derive(Debug, Parser)]
pub struct NodeRecommission {
    /// Node name
    name: String,
}

impl CommandSpec for NodeRecommission {
    const NAME: &'static [&'static str] = &["node", "recommission"];
    const ABOUT: &'static str = "Recommission a node";
}

impl Execute for NodeRecommission {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let current = EXCLUSIONS.value(session.cluster, EXCLUDE_NAME)?;
        let mut nodes = excluded(current.as_ref());
        let Some(position) = nodes.iter().position(|n| *n == self.name) else {
            info!("{} is already commissioned", self.name);
            return Ok(Outcome::Text(format!("{} is already commissioned", self.name)));
        };
        nodes.remove(position);

        info!("Recommissioning {}", self.name);
        // An empty list resets the setting instead of storing "".
        let list = nodes.join(",");
        let value = (!nodes.is_empty()).then_some(list.as_str());
        EXCLUSIONS.set(session.cluster, EXCLUDE_NAME, value)?;
        Ok(Outcome::Success(format!("{} recommissioned", self.name)))
    }
}

/// Print the hot threads of every node.
#[derive(Debug, Parser)]
pub struct NodeHotThreads {
    /// Thread state to sample
    #[arg(default_value = "cpu", value_parser = ["cpu", "wait", "block"])]
    kind: String,
}

impl CommandSpec for NodeHotThreads {
    const NAME: &'static [&'static str] = &["node", "hot-threads"];
    const ABOUT: &'static str = "Print hot threads on each node";
}

impl Execute for NodeHotThreads {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let body = session
            .cluster
            .send(&Request::get("/_nodes/hot_threads").query("type", &self.kind))?;
        Ok(Outcome::Text(cell_text(&body)))
    }
}

/// List the nodes of the cluster.
#[derive(Debug, Parser)]
pub struct NodeList;

impl CommandSpec for NodeList {
    const NAME: &'static [&'static str] = &["node", "list"];
    const ABOUT: &'static str = "List nodes";
}

impl Execute for NodeList {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let nodes = cat_rows(session, "/_cat/nodes")?;
        let columns = [
            ColumnSpec::new("ip").labeled("IP"),
            ColumnSpec::new("heap.percent").labeled("Heap %"),
            ColumnSpec::new("ram.percent").labeled("RAM %"),
            ColumnSpec::new("cpu"),
            ColumnSpec::new("load_1m"),
            ColumnSpec::new("load_5m"),
            ColumnSpec::new("load_15m"),
            ColumnSpec::new("node.role").labeled("Role"),
            ColumnSpec::new("master"),
            ColumnSpec::new("name"),
        ];
        Ok(Outcome::Table(to_table(&nodes, &columns)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stub::StubCluster;
    use crate::commands::testing::{render, run};
    use reqwest::Method;

    fn exclusions(list: Value) -> StubCluster {
        StubCluster::new()
            .on(
                Method::GET,
                "/_cluster/settings",
                json!({"transient": {EXCLUDE_NAME: list}, "persistent": {}}),
            )
            .on(Method::PUT, "/_cluster/settings", json!({"acknowledged": true}))
    }

    #[test]
    fn test_excluded_parsing() {
        assert!(excluded(None).is_empty());
        assert!(excluded(Some(&json!(""))).is_empty());
        assert_eq!(excluded(Some(&json!("n1,n2"))), vec!["n1", "n2"]);
    }

    #[test]
    fn test_decommission_without_name_only_reads() {
        let cluster = StubCluster::new().on(
            Method::GET,
            "/_cluster/settings",
            json!({"transient": {}, "persistent": {}}),
        );
        let outcome = run(&cluster, "node decommission").unwrap();
        let Outcome::Record(record) = &outcome else {
            panic!("expected a record");
        };
        assert_eq!(record.labels(), vec!["Excluded Nodes"]);
        assert_eq!(record.values(), vec![Value::Null]);
        assert!(render(&outcome).contains("Excluded Nodes"));
        assert!(cluster.calls_with(&Method::PUT).is_empty());
    }

    #[test]
    fn test_decommission_appends() {
        let cluster = exclusions(json!("node-1"));
        run(&cluster, "node decommission node-10").unwrap();
        let puts = cluster.calls_with(&Method::PUT);
        assert_eq!(
            puts[0].body,
            Some(json!({"transient": {EXCLUDE_NAME: "node-1,node-10"}}))
        );
    }

    #[test]
    fn test_decommission_is_exact_match() {
        // `node-1` is a substring of `node-10` but not a member.
        let cluster = exclusions(json!("node-10"));
        run(&cluster, "node decommission node-1").unwrap();
        assert_eq!(cluster.calls_with(&Method::PUT).len(), 1);

        let cluster = exclusions(json!("node-10"));
        let outcome = run(&cluster, "node decommission node-10").unwrap();
        assert!(matches!(outcome, Outcome::Text(_)));
        assert!(cluster.calls_with(&Method::PUT).is_empty());
    }

    #[test]
    fn test_recommission() {
        let cluster = exclusions(json!("node-1,node-2"));
        run(&cluster, "node recommission node-1").unwrap();
        assert_eq!(
            cluster.calls_with(&Method::PUT)[0].body,
            Some(json!({"transient": {EXCLUDE_NAME: "node-2"}}))
        );

        let cluster = exclusions(json!("node-2"));
        run(&cluster, "node recommission node-2").unwrap();
        assert_eq!(
            cluster.calls_with(&Method::PUT)[0].body,
            Some(json!({"transient": {EXCLUDE_NAME: null}}))
        );

        let cluster = exclusions(json!("node-2"));
        let outcome = run(&cluster, "node recommission node-3").unwrap();
        assert_eq!(outcome, Outcome::Text("node-3 is already commissioned".to_owned()));
        assert!(cluster.calls_with(&Method::PUT).is_empty());
    }

    #[test]
    fn test_hot_threads_is_text() {
        let cluster = StubCluster::new().on(
            Method::GET,
            "/_nodes/hot_threads",
            json!("::: {node-1}\n   Hot threads at ..."),
        );
        let outcome = run(&cluster, "node hot-threads wait").unwrap();
        assert!(matches!(outcome, Outcome::Text(ref t) if t.starts_with("::: {node-1}")));
        assert_eq!(cluster.calls()[0].query_value("type"), Some("wait"));
    }

    #[test]
    fn test_list_columns() {
        let cluster = StubCluster::new().on(
            Method::GET,
            "/_cat/nodes",
            json!([{"ip": "10.0.0.1", "heap.percent": "40", "name": "node-1", "load_1m": "0.5"}]),
        );
        let Outcome::Table(table) = run(&cluster, "node list").unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(table.labels()[..3], ["IP", "Heap %", "RAM %"]);
        assert_eq!(table.labels()[4], "Load 1M");
        assert_eq!(table.rows[0][9], json!("node-1"));
    }
}
