/// Response transforms: reshape and annotate raw cluster JSON before formatting.
///
/// All functions are pure apart from mutating the value they are handed.
/// Absent fields are left alone; only a present-but-unparsable number is an error.
use colored::Colorize;
use serde_json::{Map, Value};

use super::table::cell_text;
use crate::errors::CliError;

/// Usage above this percentage is critical.
pub const CRITICAL_THRESHOLD: f64 = 90.0;

/// Usage above this percentage (and not critical) is a warning.
pub const WARNING_THRESHOLD: f64 = 75.0;

/// Display-only severity/status marker, rendered as a terminal color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Red.
    Critical,
    /// Yellow.
    Warning,
    /// Cyan.
    Progress,
    /// Green.
    Healthy,
}

impl Marker {
    /// Wrap `text` in this marker's color.
    #[must_use]
    pub fn paint(self, text: &str) -> String {
        match self {
            Self::Critical => text.red().to_string(),
            Self::Warning => text.yellow().to_string(),
            Self::Progress => text.cyan().to_string(),
            Self::Healthy => text.green().to_string(),
        }
    }
}

/// `> 90` critical, `> 75` warning, otherwise nothing.
#[must_use]
pub fn threshold_marker(value: f64) -> Option<Marker> {
    if value > CRITICAL_THRESHOLD {
        Some(Marker::Critical)
    } else if value > WARNING_THRESHOLD {
        Some(Marker::Warning)
    } else {
        None
    }
}

/// Cluster/index health colors.
#[must_use]
pub fn health_marker(status: &str) -> Option<Marker> {
    match status {
        "green" => Some(Marker::Healthy),
        "yellow" => Some(Marker::Warning),
        "red" => Some(Marker::Critical),
        _ => None,
    }
}

/// Snapshot listing status colors.
#[must_use]
pub fn snapshot_status_marker(status: &str) -> Option<Marker> {
    match status {
        "PARTIAL" => Some(Marker::Warning),
        "IN_PROGRESS" => Some(Marker::Progress),
        _ => None,
    }
}

/// Snapshot detail state colors.
#[must_use]
pub fn snapshot_state_marker(state: &str) -> Option<Marker> {
    match state {
        "SUCCESS" => Some(Marker::Healthy),
        "PARTIAL" => Some(Marker::Warning),
        _ => None,
    }
}

/// Paint `item[field]` with `marker`. No-op when the field is absent or null.
pub fn mark(item: &mut Value, field: &str, marker: Marker) {
    if let Some(value) = item.get_mut(field) {
        if !value.is_null() {
            *value = Value::String(marker.paint(&cell_text(value)));
        }
    }
}

/// Recolor a string status field through `classify`; unknown values stay as they are.
///
/// Returns the marker applied, if any.
pub fn recolor(
    item: &mut Value,
    field: &str,
    classify: fn(&str) -> Option<Marker>,
) -> Option<Marker> {
    let marker = item.get(field).and_then(Value::as_str).and_then(classify)?;
    mark(item, field, marker);
    Some(marker)
}

/// Mark a percentage field according to [`threshold_marker`].
///
/// # Errors
///
/// Returns `CliError::Format` when the field is present but not numeric.
pub fn annotate_threshold(item: &mut Value, field: &str) -> Result<Option<Marker>, CliError> {
    let Some(value) = numeric_field(item, field)? else {
        return Ok(None);
    };
    let marker = threshold_marker(value);
    if let Some(m) = marker {
        mark(item, field, m);
    }
    Ok(marker)
}

/// Read a number that may arrive as a JSON number or a numeric string.
///
/// # Errors
///
/// Returns `CliError::Format` when the field is present but not numeric.
pub fn numeric_field(item: &Value, field: &str) -> Result<Option<f64>, CliError> {
    let parsed = match item.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(n) => Ok(Some(n)),
        None => Err(CliError::Format {
            field: field.to_owned(),
            value: item.get(field).map(cell_text).unwrap_or_default(),
        }),
    }
}

/// Keep items whose `field` equals `wanted`; `None` keeps everything.
#[must_use]
pub fn filter_by_field(items: Vec<Value>, field: &str, wanted: Option<&str>) -> Vec<Value> {
    match wanted {
        None => items,
        Some(wanted) => items
            .into_iter()
            .filter(|item| item.get(field).and_then(Value::as_str) == Some(wanted))
            .collect(),
    }
}

/// Join an array into one delimited string; other values are returned unchanged.
#[must_use]
pub fn join_array(value: &Value, separator: &str) -> Value {
    match value {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(cell_text)
                .collect::<Vec<_>>()
                .join(separator),
        ),
        other => other.clone(),
    }
}

/// Flatten nested objects into one level with dot-joined keys.
///
/// Arrays and scalars are kept as leaf values. A non-object input is returned unchanged.
#[must_use]
pub fn flatten(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut out = Map::new();
            flatten_into("", object, &mut out);
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn flatten_into(prefix: &str, object: &Map<String, Value>, out: &mut Map<String, Value>) {
    for (key, value) in object {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(&path, inner, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// Copy `nested.inner` into a flat `target` field (null when absent).
pub fn lift(item: &mut Value, nested: &str, inner: &str, target: &str) {
    let value = item
        .get(nested)
        .and_then(|n| n.get(inner))
        .cloned()
        .unwrap_or(Value::Null);
    if let Some(object) = item.as_object_mut() {
        object.insert(target.to_owned(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{assert_marked, force_colors};
    use serde_json::json;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(threshold_marker(95.0), Some(Marker::Critical));
        assert_eq!(threshold_marker(91.0), Some(Marker::Critical));
        assert_eq!(threshold_marker(90.0), Some(Marker::Warning));
        assert_eq!(threshold_marker(80.0), Some(Marker::Warning));
        assert_eq!(threshold_marker(76.0), Some(Marker::Warning));
        assert_eq!(threshold_marker(75.0), None);
        assert_eq!(threshold_marker(50.0), None);
    }

    #[test]
    fn test_annotate_threshold_paints_string_percent() {
        force_colors();
        let mut node = json!({"node": "n1", "disk.percent": "95"});
        let marker = annotate_threshold(&mut node, "disk.percent").unwrap();
        assert_eq!(marker, Some(Marker::Critical));
        assert_marked(&node["disk.percent"], Marker::Critical, "95");

        let mut calm = json!({"disk.percent": 50});
        assert_eq!(annotate_threshold(&mut calm, "disk.percent").unwrap(), None);
        assert_eq!(calm["disk.percent"], json!(50));
    }

    #[test]
    fn test_annotate_threshold_absent_or_null_is_fine() {
        let mut unassigned = json!({"node": "UNASSIGNED", "disk.percent": null});
        assert_eq!(annotate_threshold(&mut unassigned, "disk.percent").unwrap(), None);
        let mut bare = json!({"node": "n2"});
        assert_eq!(annotate_threshold(&mut bare, "disk.percent").unwrap(), None);
        assert!(bare.get("disk.percent").is_none());
    }

    #[test]
    fn test_annotate_threshold_rejects_garbage() {
        let mut node = json!({"disk.percent": "lots"});
        let err = annotate_threshold(&mut node, "disk.percent").unwrap_err();
        assert!(matches!(err, CliError::Format { ref field, .. } if field == "disk.percent"));
    }

    #[test]
    fn test_snapshot_status_recolor() {
        assert_eq!(snapshot_status_marker("PARTIAL"), Some(Marker::Warning));
        assert_eq!(snapshot_status_marker("IN_PROGRESS"), Some(Marker::Progress));
        assert_eq!(snapshot_status_marker("SUCCESS"), None);

        let mut snap = json!({"id": "s1", "status": "SUCCESS"});
        assert_eq!(recolor(&mut snap, "status", snapshot_status_marker), None);
        assert_eq!(snap["status"], json!("SUCCESS"));

        force_colors();
        let mut partial = json!({"id": "s2", "status": "PARTIAL"});
        assert_eq!(
            recolor(&mut partial, "status", snapshot_status_marker),
            Some(Marker::Warning)
        );
        assert_marked(&partial["status"], Marker::Warning, "PARTIAL");

        let mut running = json!({"id": "s3", "status": "IN_PROGRESS"});
        assert_eq!(
            recolor(&mut running, "status", snapshot_status_marker),
            Some(Marker::Progress)
        );
        assert_marked(&running["status"], Marker::Progress, "IN_PROGRESS");
    }

    #[test]
    fn test_health_marker() {
        assert_eq!(health_marker("green"), Some(Marker::Healthy));
        assert_eq!(health_marker("yellow"), Some(Marker::Warning));
        assert_eq!(health_marker("red"), Some(Marker::Critical));
        assert_eq!(health_marker("purple"), None);
    }

    #[test]
    fn test_filter_by_field() {
        let aliases = vec![
            json!({"alias": "a1", "index": "logs"}),
            json!({"alias": "a2", "index": "metrics"}),
        ];
        assert_eq!(filter_by_field(aliases.clone(), "index", None).len(), 2);
        let only = filter_by_field(aliases, "index", Some("metrics"));
        assert_eq!(only, vec![json!({"alias": "a2", "index": "metrics"})]);
    }

    #[test]
    fn test_flatten_and_lift() {
        let flat = flatten(&json!({"nodes": {"count": {"total": 3}, "plugins": []}, "status": "green"}));
        assert_eq!(flat["nodes.count.total"], json!(3));
        assert_eq!(flat["nodes.plugins"], json!([]));
        assert_eq!(flat["status"], json!("green"));

        let mut snap = json!({"shards": {"total": 5, "failed": 0}});
        lift(&mut snap, "shards", "total", "total_shards");
        lift(&mut snap, "shards", "successful", "successful_shards");
        assert_eq!(snap["total_shards"], json!(5));
        assert_eq!(snap["successful_shards"], Value::Null);
    }

    #[test]
    fn test_join_array() {
        assert_eq!(join_array(&json!(["a", "b"]), ", "), json!("a, b"));
        assert_eq!(join_array(&json!("a"), ", "), json!("a"));
    }
}
