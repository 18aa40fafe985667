//! Test utilities for wialon-client
//!
//! [`MockApi`] is a scripted stand-in for the Remote API endpoint that records
//! every call it receives; [`TestServer`] serves it (or any router) on a local
//! port.
//!
//! ```rust,ignore
//! use serde_json::json;
//! use wialon_client::testing::{MockApi, TestServer};
//!
//! let api = MockApi::new().with_login("S1", "alice", 42);
//! let server = TestServer::start(api.router()).await?;
//! let session = server.open_session("token").await?;
//! assert_eq!(api.services(), vec!["token/login"]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::client::{Session, SessionBuilder};
use crate::config::{SessionConfig, DEFAULT_API_PATH};
use crate::Result;

/// A call received by [`MockApi`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub svc: String,
    pub params: Value,
    pub sid: Option<String>,
}

#[derive(Default)]
struct MockState {
    queued: HashMap<String, VecDeque<Value>>,
    fixed: HashMap<String, Value>,
    calls: Vec<RecordedCall>,
}

/// Scripted Remote API endpoint
///
/// Responses are looked up by service name: queued one-shot responses first,
/// then the fixed response. Unknown services answer with error 2.
#[derive(Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `token/login` and `core/logout` successfully
    pub fn with_login(self, sid: &str, username: &str, account_id: i64) -> Self {
        self.respond("token/login", login_response(sid, username, account_id))
            .respond("core/logout", json!({ "error": 0 }))
    }

    /// Answer every call to `svc` with `response`
    pub fn respond(self, svc: &str, response: Value) -> Self {
        self.state.lock().fixed.insert(svc.to_string(), response);
        self
    }

    /// Answer the next call to `svc` with `response`
    pub fn respond_once(self, svc: &str, response: Value) -> Self {
        self.state
            .lock()
            .queued
            .entry(svc.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Service names of every call received so far, in order
    pub fn services(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|call| call.svc.clone())
            .collect()
    }

    /// Router answering at the default API path
    pub fn router(&self) -> Router {
        self.router_at(DEFAULT_API_PATH)
    }

    pub fn router_at(&self, path: &str) -> Router {
        Router::new()
            .route(path, post(handle_call))
            .with_state(self.clone())
    }

    fn answer(&self, query: HashMap<String, String>) -> Value {
        let svc = query.get("svc").cloned().unwrap_or_default();
        let params = query
            .get("params")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Null);

        let mut state = self.state.lock();
        state.calls.push(RecordedCall {
            svc: svc.clone(),
            params,
            sid: query.get("sid").cloned(),
        });

        if let Some(response) = state.queued.get_mut(&svc).and_then(VecDeque::pop_front) {
            return response;
        }
        state
            .fixed
            .get(&svc)
            .cloned()
            .unwrap_or_else(|| json!({ "error": 2 }))
    }
}

async fn handle_call(
    State(api): State<MockApi>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(api.answer(query))
}

/// `token/login` response body
pub fn login_response(sid: &str, username: &str, account_id: i64) -> Value {
    json!({
        "eid": sid,
        "host": "127.0.0.1",
        "user": { "nm": username, "id": account_id + 1, "bact": account_id }
    })
}

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    config: SessionConfig,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` on a free local port
    pub async fn start(router: Router) -> Result<Self> {
        Self::start_with_timeout(router, Duration::from_secs(5)).await
    }

    /// Serve `router` and give sessions a custom per-call timeout
    pub async fn start_with_timeout(router: Router, timeout: Duration) -> Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let config = SessionConfig::builder()
            .host(format!("http://{}", addr))
            .timeout_ms(timeout.as_millis() as u64)
            .build();

        Ok(Self {
            addr,
            config,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Session configuration pointing at this server
    pub fn config(&self) -> SessionConfig {
        self.config.clone()
    }

    pub fn builder(&self, token: &str) -> SessionBuilder {
        Session::builder(token).config(self.config())
    }

    pub async fn open_session(&self, token: &str) -> Result<Session> {
        self.builder(token).open().await
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_before_fixed() {
        let api = MockApi::new()
            .respond("messages/unload", json!({}))
            .respond_once("messages/unload", json!({ "error": 4 }));

        let query = HashMap::from([("svc".to_string(), "messages/unload".to_string())]);
        assert_eq!(api.answer(query.clone()), json!({ "error": 4 }));
        assert_eq!(api.answer(query), json!({}));
        assert_eq!(api.services(), vec!["messages/unload", "messages/unload"]);
    }

    #[test]
    fn test_unknown_service() {
        let api = MockApi::new();
        let query = HashMap::from([
            ("svc".to_string(), "core/nope".to_string()),
            ("params".to_string(), "{\"a\":1}".to_string()),
            ("sid".to_string(), "S1".to_string()),
        ]);
        assert_eq!(api.answer(query), json!({ "error": 2 }));

        let calls = api.calls();
        assert_eq!(calls[0].params, json!({ "a": 1 }));
        assert_eq!(calls[0].sid.as_deref(), Some("S1"));
    }
}
