/// Cluster client: the REST seam every command talks through.
pub mod errors;
pub mod http;
pub mod request;
#[cfg(test)]
pub mod stub;

pub use errors::ClientError;
pub use http::{Credentials, HttpCluster};
pub use request::Request;

use serde_json::Value;

/// A handle able to issue one REST call against the cluster.
///
/// Constructed once at startup and passed by reference into every command.
pub trait Cluster {
    /// Send `request` and return the decoded body.
    ///
    /// Non-JSON bodies (e.g. hot threads) come back as `Value::String`,
    /// empty bodies as `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure or a non-success status.
    fn send(&self, request: &Request) -> Result<Value, ClientError>;
}
