//! Typed services over the gateway
//!
//! One service per resource. Responses are decoded into the domain types in
//! [`crate::models`]; a body of the wrong shape is an
//! [`ApiError::InvalidPayload`](crate::error::ApiError::InvalidPayload)
//! rather than a half-filled value.

mod auth;
mod endpoints;
mod resources;
mod traceability;

pub use auth::AuthApi;
pub use endpoints::Endpoints;
pub use resources::{OrganizationsApi, RequirementsApi, TestCasesApi};
pub use traceability::TraceabilityApi;

use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::gateway::Gateway;
use crate::session::SessionHandle;

/// Entry point for every remote call
#[derive(Debug)]
pub struct ApiClient {
    gateway: Gateway,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new(gateway: Gateway, endpoints: Endpoints) -> Self {
        Self { gateway, endpoints }
    }

    /// HTTP client for the configured server
    pub fn connect(config: &ClientConfig, session: SessionHandle) -> ApiResult<Self> {
        let endpoints = Endpoints::from_config(config)?;
        let gateway = Gateway::connect(config, session)?;
        Ok(Self::new(gateway, endpoints))
    }

    /// Register the sign-in redirect fired after a 401
    pub fn on_auth_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.gateway = self.gateway.on_auth_expired(hook);
        self
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn requirements(&self) -> RequirementsApi<'_> {
        RequirementsApi::new(&self.gateway, &self.endpoints)
    }

    pub fn test_cases(&self) -> TestCasesApi<'_> {
        TestCasesApi::new(&self.gateway, &self.endpoints)
    }

    pub fn traceability(&self) -> TraceabilityApi<'_> {
        TraceabilityApi::new(&self.gateway, &self.endpoints)
    }

    pub fn organizations(&self) -> OrganizationsApi<'_> {
        OrganizationsApi::new(&self.gateway, &self.endpoints)
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.gateway, &self.endpoints)
    }
}
