/// In-memory [`Cluster`] serving canned replies and recording every request.
use std::cell::RefCell;

use reqwest::Method;
use serde_json::{Value, json};

use super::{ClientError, Cluster, Request};

enum Reply {
    Json(Value),
    Status(u16, Value),
}

/// Canned replies keyed by (method, path); unknown routes answer 404.
#[derive(Default)]
pub struct StubCluster {
    routes: Vec<(Method, String, Reply)>,
    calls: RefCell<Vec<Request>>,
}

impl StubCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `body`.
    pub fn on(mut self, method: Method, path: &str, body: Value) -> Self {
        self.routes.push((method, path.to_owned(), Reply::Json(body)));
        self
    }

    /// Answer `method path` with an error status and body.
    pub fn fail(mut self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.routes
            .push((method, path.to_owned(), Reply::Status(status, body)));
        self
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<Request> {
        self.calls.borrow().clone()
    }

    /// Requests received with `method`.
    pub fn calls_with(&self, method: &Method) -> Vec<Request> {
        self.calls
            .borrow()
            .iter()
            .filter(|r| &r.method == method)
            .cloned()
            .collect()
    }
}

impl Cluster for StubCluster {
    fn send(&self, request: &Request) -> Result<Value, ClientError> {
        self.calls.borrow_mut().push(request.clone());
        let reply = self
            .routes
            .iter()
            .find(|(m, p, _)| *m == request.method && *p == request.path)
            .map(|(_, _, reply)| reply);
        match reply {
            Some(Reply::Json(body)) => Ok(body.clone()),
            Some(Reply::Status(status, body)) => {
                Err(ClientError::from_body(*status, &body.to_string()))
            }
            None => Err(ClientError::from_body(
                404,
                &json!({"error": {"reason": format!("no stub for {}", request.path)}}).to_string(),
            )),
        }
    }
}
