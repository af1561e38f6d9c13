/// Cluster- and index-level settings access shared by the settings, logging,
/// routing and node commands.
use clap::Args;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::{Cluster, Request};
use crate::errors::{CliError, NotFoundExt};

/// Whether a cluster setting survives a full cluster restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persistency {
    #[default]
    Transient,
    Persistent,
}

impl Persistency {
    /// Section name used by the cluster settings API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Persistent => "persistent",
        }
    }
}

/// Mutually exclusive `--transient` / `--persistent` flags; neither means transient.
#[derive(Debug, Clone, Copy, Default, Args)]
#[group(multiple = false)]
pub struct PersistencyArgs {
    /// Apply to transient settings (default)
    #[arg(long)]
    transient: bool,

    /// Apply to persistent settings
    #[arg(long)]
    persistent: bool,
}

impl PersistencyArgs {
    #[must_use]
    pub fn persistency(self) -> Persistency {
        debug_assert!(!(self.transient && self.persistent));
        if self.persistent {
            Persistency::Persistent
        } else {
            Persistency::Transient
        }
    }
}

/// One looked-up setting. `scope` is the persistency section or the index name.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingValue {
    pub scope: String,
    pub key: String,
    pub value: Option<Value>,
}

impl SettingValue {
    /// As a flat object for the table formatter.
    #[must_use]
    pub fn to_item(&self) -> Value {
        json!({
            "scope": self.scope,
            "setting": self.key,
            "value": self.value.clone().unwrap_or(Value::Null),
        })
    }
}

/// Where a setting lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settings {
    /// Cluster-wide settings in the given section.
    Cluster(Persistency),
    /// Settings of one index (or a comma-separated list / pattern).
    Index(String),
}

impl Settings {
    /// Resource kind and name used when the target does not exist.
    #[must_use]
    pub fn resource(&self) -> (&'static str, &str) {
        match self {
            Self::Cluster(persistency) => ("Cluster settings", persistency.as_str()),
            Self::Index(index) => ("Index", index),
        }
    }

    fn path(&self) -> String {
        match self {
            Self::Cluster(_) => "/_cluster/settings".to_owned(),
            Self::Index(index) => format!("/{index}/_settings"),
        }
    }

    /// Look `key` up. Cluster settings yield one entry; index settings one per
    /// matched index, sorted by index name.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotFound` on 404, `CliError::Transport` on other failures.
    pub fn get(&self, cluster: &dyn Cluster, key: &str) -> Result<Vec<SettingValue>, CliError> {
        let (resource, name) = self.resource();
        let request = Request::get(self.path())
            .query("include_defaults", true)
            .query("flat_settings", true);
        let body = cluster.send(&request).or_not_found(resource, name)?;

        match self {
            Self::Cluster(persistency) => {
                let value = body
                    .get(persistency.as_str())
                    .and_then(|section| section.get(key))
                    .cloned();
                debug!(key, section = persistency.as_str(), found = value.is_some(), "cluster setting");
                Ok(vec![SettingValue {
                    scope: persistency.as_str().to_owned(),
                    key: key.to_owned(),
                    value,
                }])
            }
            Self::Index(_) => {
                let mut indices: Vec<(&String, &Value)> =
                    body.as_object().map(Map::iter).into_iter().flatten().collect();
                indices.sort_by(|a, b| a.0.cmp(b.0));
                Ok(indices
                    .into_iter()
                    .map(|(index, settings)| SettingValue {
                        scope: index.clone(),
                        key: key.to_owned(),
                        value: index_setting(settings, key),
                    })
                    .collect())
            }
        }
    }

    /// Value of a cluster setting in this section, `None` when unset.
    ///
    /// # Errors
    ///
    /// Propagates [`Settings::get`] failures.
    pub fn value(&self, cluster: &dyn Cluster, key: &str) -> Result<Option<Value>, CliError> {
        Ok(self
            .get(cluster, key)?
            .into_iter()
            .next()
            .and_then(|setting| setting.value))
    }

    /// Write `key`; `None` resets it to the default.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotFound` on 404, `CliError::Transport` on other failures.
    pub fn set(
        &self,
        cluster: &dyn Cluster,
        key: &str,
        value: Option<&str>,
    ) -> Result<Value, CliError> {
        let (resource, name) = self.resource();
        let mut change = Map::new();
        change.insert(key.to_owned(), value.map_or(Value::Null, Value::from));

        let request = match self {
            Self::Cluster(persistency) => {
                let mut body = Map::new();
                body.insert(persistency.as_str().to_owned(), Value::Object(change));
                Request::put(self.path()).json(Value::Object(body))
            }
            Self::Index(_) => Request::put(self.path())
                .query("flat_settings", true)
                .json(Value::Object(change)),
        };
        cluster.send(&request).or_not_found(resource, name)
    }
}

/// Look a key up in an index's `settings`, then `defaults`, also trying the `index.` prefix.
fn index_setting(settings: &Value, key: &str) -> Option<Value> {
    let prefixed = (!key.starts_with("index.")).then(|| format!("index.{key}"));
    ["settings", "defaults"]
        .iter()
        .filter_map(|section| settings.get(section))
        .find_map(|section| {
            section
                .get(key)
                .or_else(|| prefixed.as_deref().and_then(|p| section.get(p)))
        })
        .cloned()
}
