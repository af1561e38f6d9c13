/// `cluster` commands: health, stats, allocation, routing and settings.
use clap::Parser;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::settings::{PersistencyArgs, Settings};
use super::{CommandSpec, Execute, Session};
use crate::client::Request;
use crate::errors::{CliError, capitalize};
use crate::format::transform::{flatten, health_marker, recolor};
use crate::format::{ColumnSpec, cell_text, to_record};
use crate::types::Outcome;

/// Leading text of the 400 the cluster returns when every shard is assigned.
const NOTHING_TO_EXPLAIN: &str = "unable to find any unassigned shards to explain";

const ROUTING_ALLOCATION_ENABLE: &str = "cluster.routing.allocation.enable";

/// Explain why a shard is unassigned.
#[derive(Debug, Parser)]
pub struct ClusterAllocationExplain;

impl CommandSpec for ClusterAllocationExplain {
    const NAME: &'static [&'static str] = &["cluster", "allocation", "explain"];
    const ABOUT: &'static str = "Provide explanations for shard allocations in the cluster";
}

impl Execute for ClusterAllocationExplain {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let response = match session
            .cluster
            .send(&Request::get("/_cluster/allocation/explain"))
        {
            Ok(response) => response,
            Err(err) if err.status() == Some(400) && err.reason().starts_with(NOTHING_TO_EXPLAIN) => {
                warn!(
                    "{}. This may indicate that all shards are allocated.",
                    capitalize(NOTHING_TO_EXPLAIN)
                );
                return Ok(Outcome::Done);
            }
            Err(err) => return Err(err.into()),
        };
        let (item, columns) = explanation(&response);
        Ok(Outcome::Record(to_record(&item, &columns)))
    }
}

/// Flatten an allocation explanation: summary fields, then one line per node decision.
fn explanation(response: &Value) -> (Value, Vec<ColumnSpec>) {
    let field = |path: &[&str]| {
        path.iter()
            .try_fold(response, |value, key| value.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    };
    let mut item = Map::new();
    item.insert("index".to_owned(), field(&["index"]));
    item.insert("shard".to_owned(), field(&["shard"]));
    item.insert("primary".to_owned(), field(&["primary"]));
    item.insert("can_allocate".to_owned(), field(&["can_allocate"]));
    item.insert("explanation".to_owned(), field(&["allocate_explanation"]));
    item.insert(
        "last_allocation_status".to_owned(),
        field(&["unassigned_info", "last_allocation_status"]),
    );
    item.insert("reason".to_owned(), field(&["unassigned_info", "reason"]));
    let mut columns: Vec<ColumnSpec> = item.keys().map(|k| ColumnSpec::new(k.as_str())).collect();

    let decisions = response
        .get("node_allocation_decisions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for decision in decisions {
        let Some(node) = decision.get("node_name").and_then(Value::as_str) else {
            continue;
        };
        let verdict = decision
            .get("deciders")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("explanation"))
            .or_else(|| decision.get("node_decision"))
            .cloned()
            .unwrap_or(Value::Null);
        item.insert(node.to_owned(), verdict);
        columns.push(ColumnSpec::new(node).labeled(node));
    }
    (Value::Object(item), columns)
}

/// Show the cluster health.
#[derive(Debug, Parser)]
pub struct ClusterHealth;

impl CommandSpec for ClusterHealth {
    const NAME: &'static [&'static str] = &["cluster", "health"];
    const ABOUT: &'static str = "Retrieve the cluster health";
}

impl Execute for ClusterHealth {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let mut health = session.cluster.send(&Request::get("/_cluster/health"))?;
        if let Some(marker) = recolor(&mut health, "status", health_marker) {
            debug!(?marker, "cluster status");
        }
        let mut keys: Vec<&String> = health.as_object().map(Map::keys).into_iter().flatten().collect();
        keys.sort();
        let columns: Vec<ColumnSpec> = keys.into_iter().map(|k| ColumnSpec::new(k.as_str())).collect();
        Ok(Outcome::Record(to_record(&health, &columns)))
    }
}

/// Retry allocation of shards that failed too many times.
#[derive(Debug, Parser)]
pub struct ClusterRerouteRetry;

impl CommandSpec for ClusterRerouteRetry {
    const NAME: &'static [&'static str] = &["cluster", "reroute", "retry"];
    const ABOUT: &'static str = "Try again to reroute failed shards";
}

impl Execute for ClusterRerouteRetry {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        info!("Retrying failed shard allocations");
        session
            .cluster
            .send(&Request::post("/_cluster/reroute").query("retry_failed", true))?;
        Ok(Outcome::Success("Reroute of failed shards requested".to_owned()))
    }
}

/// Change which shards may be allocated.
#[derive(Debug, Parser)]
pub struct ClusterRoutingAllocationEnable {
    /// Routing allocation status
    #[arg(value_parser = ["all", "primaries", "new_primaries", "none"])]
    status: String,

    #[command(flatten)]
    persistency: PersistencyArgs,
}

impl CommandSpec for ClusterRoutingAllocationEnable {
    const NAME: &'static [&'static str] = &["cluster", "routing", "allocation", "enable"];
    const ABOUT: &'static str = "Change the routing allocation status";
}

impl Execute for ClusterRoutingAllocationEnable {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let persistency = self.persistency.persistency();
        debug!(persistency = persistency.as_str(), "routing allocation");
        info!("Changing cluster routing allocation to {}", self.status);
        Settings::Cluster(persistency).set(
            session.cluster,
            ROUTING_ALLOCATION_ENABLE,
            Some(self.status.as_str()),
        )?;
        Ok(Outcome::Success(format!(
            "Routing allocation set to {} ({})",
            self.status,
            persistency.as_str()
        )))
    }
}

/// Show cluster-wide statistics.
#[derive(Debug, Parser)]
pub struct ClusterStats;

impl CommandSpec for ClusterStats {
    const NAME: &'static [&'static str] = &["cluster", "stats"];
    const ABOUT: &'static str = "Retrieve the cluster statistics";
}

impl Execute for ClusterStats {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let stats = session.cluster.send(&Request::get("/_cluster/stats"))?;
        let mut stats = flatten(&stats);
        if let Some(plugins) = stats.get_mut("nodes.plugins") {
            *plugins = plugin_list(plugins);
        }
        let columns: Vec<ColumnSpec> = stats
            .as_object()
            .map(Map::keys)
            .into_iter()
            .flatten()
            .map(|k| ColumnSpec::new(k.as_str()).labeled(k.as_str()))
            .collect();
        Ok(Outcome::Record(to_record(&stats, &columns)))
    }
}

/// `classname@version` for every plugin, space separated.
fn plugin_list(plugins: &Value) -> Value {
    let Some(plugins) = plugins.as_array() else {
        return plugins.clone();
    };
    let names: Vec<String> = plugins
        .iter()
        .map(|p| {
            let class = p.get("classname").or_else(|| p.get("name")).map(cell_text);
            let version = p.get("version").map(cell_text);
            format!("{}@{}", class.unwrap_or_default(), version.unwrap_or_default())
        })
        .collect();
    Value::String(names.join(" "))
}

/// Show one cluster setting.
#[derive(Debug, Parser)]
pub struct ClusterSettingsGet {
    /// Setting to read
    setting: String,

    #[command(flatten)]
    persistency: PersistencyArgs,
}

impl CommandSpec for ClusterSettingsGet {
    const NAME: &'static [&'static str] = &["cluster", "settings", "get"];
    const ABOUT: &'static str = "Retrieve a cluster setting";
}

impl Execute for ClusterSettingsGet {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let settings = Settings::Cluster(self.persistency.persistency());
        let found = settings.get(session.cluster, &self.setting)?;
        match found.into_iter().next() {
            Some(setting) if setting.value.is_some() => {
                let columns = [
                    ColumnSpec::new("setting"),
                    ColumnSpec::new("value"),
                    ColumnSpec::new("scope").labeled("Persistency"),
                ];
                Ok(Outcome::Record(to_record(&setting.to_item(), &columns)))
            }
            _ => Err(CliError::not_found("Setting", &self.setting)),
        }
    }
}

/// Change one cluster setting.
#[derive(Debug, Parser)]
pub struct ClusterSettingsSet {
    /// Setting to change
    setting: String,
    /// New value
    value: String,

    #[command(flatten)]
    persistency: PersistencyArgs,
}

impl CommandSpec for ClusterSettingsSet {
    const NAME: &'static [&'static str] = &["cluster", "settings", "set"];
    const ABOUT: &'static str = "Set a cluster setting";
}

impl Execute for ClusterSettingsSet {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let persistency = self.persistency.persistency();
        info!("Changing setting {} to {}", self.setting, self.value);
        Settings::Cluster(persistency).set(session.cluster, &self.setting, Some(self.value.as_str()))?;
        Ok(Outcome::Success(format!(
            "{} set to {} ({})",
            self.setting,
            self.value,
            persistency.as_str()
        )))
    }
}

/// Reset one cluster setting to its default.
#[derive(Debug, Parser)]
pub struct ClusterSettingsReset {
    /// Setting to reset
    setting: String,

    #[command(flatten)]
    persistency: PersistencyArgs,
}

impl CommandSpec for ClusterSettingsReset {
    const NAME: &'static [&'static str] = &["cluster", "settings", "reset"];
    const ABOUT: &'static str = "Reset a cluster setting";
}

impl Execute for ClusterSettingsReset {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let persistency = self.persistency.persistency();
        info!("Resetting setting {}", self.setting);
        Settings::Cluster(persistency).set(session.cluster, &self.setting, None)?;
        Ok(Outcome::Success(format!(
            "{} reset ({})",
            self.setting,
            persistency.as_str()
        )))
    }
}
