/// `query search`: run a search request and print the raw response.
use std::io;

use clap::Parser;
use serde_json::Value;
use tracing::{debug, info};

use super::{CommandSpec, Execute, Session};
use crate::client::Request;
use crate::errors::{CliError, NotFoundExt};
use crate::types::Outcome;

/// Execute a search query given inline or on stdin.
#[derive(Debug, Parser)]
pub struct QuerySearch {
    /// Comma-separated list of indices to search (default: all)
    #[arg(short, long)]
    index: Option<String>,

    /// Query body as JSON; read from stdin when omitted
    #[arg(long, value_name = "JSON")]
    body: Option<String>,
}

impl QuerySearch {
    fn query(&self) -> Result<Value, CliError> {
        let raw = match &self.body {
            Some(body) => body.clone(),
            None => {
                debug!("reading query from stdin");
                io::read_to_string(io::stdin())
                    .map_err(|e| CliError::Usage(format!("Cannot read query from stdin: {e}")))?
            }
        };
        if raw.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&raw).map_err(|e| CliError::Usage(format!("Invalid query body: {e}")))
    }
}

impl CommandSpec for QuerySearch {
    const NAME: &'static [&'static str] = &["query", "search"];
    const ABOUT: &'static str = "Execute a search query";
}

impl Execute for QuerySearch {
    fn execute(&self, session: &Session<'_>) -> Result<Outcome, CliError> {
        let query = self.query()?;
        let path = match &self.index {
            Some(index) => format!("/{index}/_search"),
            None => "/_search".to_owned(),
        };
        info!("Searching {}", self.index.as_deref().unwrap_or("all indices"));
        let sent = session.cluster.send(&Request::post(path).json(query));
        let response = match &self.index {
            Some(index) => sent.or_not_found("Index", index)?,
            None => sent?,
        };
        let pretty = serde_json::to_string_pretty(&response).unwrap_or_else(|_| response.to_string());
        Ok(Outcome::Text(pretty))
    }
}

#[cfg(test)]
mod tests {
    use crate::client::stub::StubCluster;
    use crate::commands::testing::run;
    use crate::errors::CliError;
    use crate::types::Outcome;
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_search_posts_body_and_prints_json() {
        let cluster = StubCluster::new().on(
            Method::POST,
            "/logs/_search",
            json!({"hits": {"total": {"value": 1}}}),
        );
        let outcome = run(&cluster, r#"query search -i logs --body {"size":1}"#).unwrap();
        let Outcome::Text(text) = outcome else {
            panic!("expected text");
        };
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["hits"]["total"]["value"], 1);
        assert_eq!(cluster.calls()[0].body, Some(json!({"size": 1})));
    }

    #[test]
    fn test_search_404_names_index_only_when_given() {
        let missing = json!({"error": {"reason": "no such index [logs]"}, "status": 404});
        let cluster = StubCluster::new().fail(Method::POST, "/logs/_search", 404, missing.clone());
        let err = run(&cluster, "query search -i logs --body {}").unwrap_err();
        assert_eq!(err.to_string(), "Index 'logs' does not exist");

        let cluster = StubCluster::new().fail(Method::POST, "/_search", 404, missing);
        let err = run(&cluster, "query search --body {}").unwrap_err();
        assert!(matches!(err, CliError::Transport { status: Some(404), .. }));
    }

    #[test]
    fn test_search_rejects_invalid_body() {
        let cluster = StubCluster::new();
        let err = run(&cluster, "query search --body {nope").unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
        assert!(cluster.calls().is_empty());
    }
}
