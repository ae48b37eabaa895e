//! Remote data gateway
//!
//! Authenticated JSON requests against the requirements API. Every call
//! carries the session's bearer token when one is held, bodies are
//! normalized to JSON, and a 401 ends the session.

mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::session::SessionHandle;

/// Called after a 401 has cleared the session; front ends use it to send
/// the user back to sign-in.
pub type AuthExpiredHook = Box<dyn Fn() + Send + Sync>;

pub struct Gateway {
    transport: Box<dyn Transport>,
    session: SessionHandle,
    on_auth_expired: Option<AuthExpiredHook>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("authenticated", &self.session.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway over any transport
    pub fn new(transport: impl Transport + 'static, session: SessionHandle) -> Self {
        Self {
            transport: Box::new(transport),
            session,
            on_auth_expired: None,
        }
    }

    /// Create a gateway that talks HTTP using the configured timeout
    pub fn connect(config: &ClientConfig, session: SessionHandle) -> ApiResult<Self> {
        Ok(Self::new(ReqwestTransport::new(config.timeout)?, session))
    }

    /// Register the sign-in redirect fired after a 401
    pub fn on_auth_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_auth_expired = Some(Box::new(hook));
        self
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn get(&self, url: &str) -> ApiResult<Value> {
        self.execute(Method::Get, url, None)
    }

    pub fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> ApiResult<Value> {
        let body = serde_json::to_string(body)?;
        self.execute(Method::Post, url, Some(body))
    }

    pub fn put<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> ApiResult<Value> {
        let body = serde_json::to_string(body)?;
        self.execute(Method::Put, url, Some(body))
    }

    pub fn delete(&self, url: &str) -> ApiResult<Value> {
        self.execute(Method::Delete, url, None)
    }

    fn execute(&self, method: Method, url: &str, body: Option<String>) -> ApiResult<Value> {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if let Some(auth) = self.session.authorization_header() {
            headers.push(("Authorization".to_string(), auth));
        }

        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
        };

        log::debug!("{} {}", method, url);
        let response = self.transport.send(&request).map_err(|e| {
            log::error!("API request failed: {} {}: {}", method, url, e);
            e
        })?;
        log::debug!("{} {} -> {}", method, url, response.status);

        if response.status == 401 {
            self.expire_session();
            return Err(ApiError::AuthExpired);
        }

        let data = normalize_body(&response)?;

        if !response.is_success() {
            let message = error_message(&data, response.status);
            log::error!("API request failed: {} {}: {}", method, url, message);
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        Ok(data)
    }

    fn expire_session(&self) {
        log::warn!("Server rejected the session token; signing out");
        if let Err(e) = self.session.teardown() {
            log::warn!("Failed to clear persisted session: {:#}", e);
        }
        if let Some(hook) = &self.on_auth_expired {
            hook();
        }
    }
}

/// Turn a raw response body into JSON. Non-JSON bodies become
/// `{"message": <text>}`; an empty JSON body is `null`.
pub fn normalize_body(response: &HttpResponse) -> ApiResult<Value> {
    if response.is_json() {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&response.body)?);
    }
    Ok(json!({ "message": response.body }))
}

/// Server-provided `message`, else `Error: <status>`
fn error_message(data: &Value, status: u16) -> String {
    data.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("Error: {}", status))
}

/// Parse a normalized body into the expected type, rejecting mismatches
pub fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::InvalidPayload(e.to_string()))
}
