//! Wialon Remote API session
//!
//! A [`Session`] owns one HTTP client and, once logged in, one server-side
//! session identifier (`sid`). Every service call goes through
//! [`Session::call`], which injects the `sid`, serializes the parameters and
//! classifies any error code the server reports.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::SessionConfig;
use crate::dump::{DirectorySink, Exchange, ResponseSink};
use crate::error::{ApiError, Result, WialonError};
use crate::types::LoginResponse;

/// Lifecycle of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Authenticating,
    Authenticated,
    LoggingOut,
}

/// Builder for opening a [`Session`]
pub struct SessionBuilder {
    token: String,
    config: SessionConfig,
    sink: Option<Arc<dyn ResponseSink>>,
}

impl SessionBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            config: SessionConfig::default(),
            sink: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Offer every request/response pair to `sink`
    ///
    /// Takes precedence over `dump_dir` from the configuration.
    pub fn sink(mut self, sink: Arc<dyn ResponseSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Create the session and log in
    pub async fn open(self) -> Result<Session> {
        let mut session = self.build()?;
        session.login().await?;
        Ok(session)
    }

    /// Create the session without logging in
    pub fn build(self) -> Result<Session> {
        let endpoint = Url::parse(&self.config.endpoint())?;
        let sink = self.sink.or_else(|| {
            self.config
                .dump_dir
                .clone()
                .map(|dir| Arc::new(DirectorySink::new(dir)) as Arc<dyn ResponseSink>)
        });

        Ok(Session {
            token: self.token,
            endpoint,
            timeout: self.config.timeout(),
            client: None,
            state: SessionState::Disconnected,
            sid: None,
            username: None,
            user_id: None,
            account_id: None,
            session_info: Value::Null,
            sink,
        })
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

/// Authenticated Wialon Remote API connection
///
/// Not meant for concurrent use: the server keeps a single loaded message
/// window per `sid`, so interleaved message loads on one session race.
/// Open independent sessions for parallel work.
pub struct Session {
    token: String,
    endpoint: Url,
    timeout: Option<Duration>,
    client: Option<Client>,
    state: SessionState,
    sid: Option<String>,
    username: Option<String>,
    user_id: Option<i64>,
    account_id: Option<i64>,
    session_info: Value,
    sink: Option<Arc<dyn ResponseSink>>,
}

impl Session {
    pub fn builder(token: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(token)
    }

    /// Open a session with the given configuration
    pub async fn open(token: impl Into<String>, config: SessionConfig) -> Result<Self> {
        SessionBuilder::new(token).config(config).open().await
    }

    /// Run `f` inside an open session and log out afterwards
    ///
    /// Logout runs on every exit path. An error from `f` takes precedence
    /// over a logout error, which is then only logged.
    ///
    /// ```rust,no_run
    /// use futures::FutureExt;
    /// use wialon_client::Session;
    ///
    /// # async fn example() -> wialon_client::Result<()> {
    /// let units = Session::scoped(Session::builder("token"), |session| {
    ///     async move { session.load_units(None).await }.boxed()
    /// })
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scoped<T, F>(builder: SessionBuilder, f: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, Result<T>>,
    {
        let mut session = builder.open().await?;
        let outcome = f(&session).await;
        let closed = session.close().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!("Logout failed after an earlier error: {}", close_err);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Server-side session identifier
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn account_id(&self) -> Option<i64> {
        self.account_id
    }

    /// Raw `token/login` response
    pub fn session_info(&self) -> &Value {
        &self.session_info
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Account id, or [`WialonError::NotAuthenticated`] before login
    pub(crate) fn require_account_id(&self) -> Result<i64> {
        self.account_id.ok_or(WialonError::NotAuthenticated)
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Log in with the access token
    ///
    /// No-op when already authenticated. On failure the HTTP client is
    /// released before the error is returned.
    #[instrument(skip(self))]
    pub async fn login(&mut self) -> Result<()> {
        if self.is_authenticated() {
            return Ok(());
        }

        match self.authenticate().await {
            Ok(()) => {
                self.state = SessionState::Authenticated;
                Ok(())
            }
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    async fn authenticate(&mut self) -> Result<()> {
        self.client = Some(build_client(self.timeout)?);
        self.state = SessionState::Authenticating;

        let content = self
            .call("token/login", json!({ "token": self.token }))
            .await?;
        let login: LoginResponse = serde_json::from_value(content.clone())
            .map_err(|e| WialonError::ParseError(format!("token/login: {}", e)))?;
        if login.eid.is_empty() {
            return Err(WialonError::ParseError(
                "token/login: empty session identifier".to_string(),
            ));
        }

        debug!(
            "User {} logged in to {} (sid {})",
            login.user.name,
            login.host.as_deref().unwrap_or("-"),
            login.eid
        );
        self.sid = Some(login.eid);
        self.username = Some(login.user.name);
        self.user_id = Some(login.user.id);
        self.account_id = Some(login.user.account_id);
        self.session_info = content;
        Ok(())
    }

    /// Log out and release the HTTP client
    ///
    /// An already expired server session (code 1) is not an error. Any other
    /// failure is returned after the session has been cleared. Calling this on
    /// a closed session does nothing.
    #[instrument(skip(self))]
    pub async fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Disconnected && self.client.is_none() {
            return Ok(());
        }

        let outcome = if self.sid.is_some() {
            self.state = SessionState::LoggingOut;
            match self.call("core/logout", json!({})).await {
                Ok(_) => {
                    debug!(
                        "User {} logged out (sid {})",
                        self.username.as_deref().unwrap_or("-"),
                        self.sid.as_deref().unwrap_or("-")
                    );
                    Ok(())
                }
                Err(e) if e.is_invalid_session() => {
                    debug!("Session already expired on the server");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        } else {
            Ok(())
        };

        self.release();
        outcome
    }

    fn release(&mut self) {
        self.client = None;
        self.sid = None;
        self.state = SessionState::Disconnected;
    }

    // =========================================================================
    // Service Calls
    // =========================================================================

    /// Execute a Remote API service and return the decoded response
    #[instrument(skip(self, params))]
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let client = match (&self.client, self.state) {
            (Some(client), state) if state != SessionState::Disconnected => client,
            _ => return Err(WialonError::NotAuthenticated),
        };

        let encoded = serde_json::to_string(&params)
            .map_err(|e| WialonError::ParseError(e.to_string()))?;
        let mut query: Vec<(&'static str, String)> =
            vec![("svc", method.to_string()), ("params", encoded)];
        if let Some(sid) = &self.sid {
            query.push(("sid", sid.clone()));
        }

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));

        debug!("Call API method {} (sid {})", method, self.sid().unwrap_or("-"));
        let response = client.post(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let content: Value = serde_json::from_str(&body)
            .map_err(|e| WialonError::ParseError(format!("HTTP {}: {}", status, e)))?;

        if let Some(sink) = &self.sink {
            sink.store(&Exchange {
                method,
                params: &params,
                query: &query,
                response: &content,
            });
        }

        if let Some(code) = error_code(&content) {
            let reason = content
                .get("reason")
                .and_then(Value::as_str)
                .map(String::from);
            let err = ApiError::classify(code, reason, self.sid.clone());
            warn!(
                code,
                sid = self.sid().unwrap_or("-"),
                "{} failed: {}",
                method,
                err.message()
            );
            return Err(err.into());
        }

        Ok(content)
    }

    /// Execute a service and deserialize its response
    pub async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let content = self.call(method, params).await?;
        serde_json::from_value(content)
            .map_err(|e| WialonError::ParseError(format!("{}: {}", method, e)))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint.as_str())
            .field("state", &self.state)
            .field("sid", &self.sid)
            .field("username", &self.username)
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(sid) = &self.sid {
            warn!("Session dropped without logout (sid {})", sid);
        }
    }
}

fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );

    let mut builder = Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Positive `error` field of an object response
fn error_code(content: &Value) -> Option<i64> {
    content
        .get("error")
        .and_then(Value::as_i64)
        .filter(|code| *code > 0)
}
