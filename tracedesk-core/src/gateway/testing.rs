//! In-memory transport for exercising the gateway and services without a server

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::error::{ApiError, ApiResult};

#[derive(Default)]
struct MockState {
    responses: VecDeque<ApiResult<HttpResponse>>,
    requests: Vec<HttpRequest>,
}

/// Replays queued responses in order and records every request it sees
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(HttpResponse {
            status,
            content_type: Some("application/json".into()),
            body: body.to_string(),
        }))
    }

    pub fn push_text(&self, status: u16, body: &str) -> &Self {
        self.push(Ok(HttpResponse {
            status,
            content_type: Some("text/plain".into()),
            body: body.to_string(),
        }))
    }

    pub fn push_error(&self, error: ApiError) -> &Self {
        self.push(Err(error))
    }

    pub fn push(&self, response: ApiResult<HttpResponse>) -> &Self {
        self.inner.lock().unwrap().responses.push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        let mut state = self.inner.lock().unwrap();
        state.requests.push(request.clone());
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no response queued".into())))
    }
}
