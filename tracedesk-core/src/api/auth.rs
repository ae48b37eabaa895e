use super::endpoints::Endpoints;
use crate::error::{ApiError, ApiResult};
use crate::gateway::{decode, Gateway};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use crate::session::USER_ROLE;

/// `/auth`: account registration, login and the current profile
pub struct AuthApi<'a> {
    gateway: &'a Gateway,
    endpoints: &'a Endpoints,
}

impl<'a> AuthApi<'a> {
    pub(super) fn new(gateway: &'a Gateway, endpoints: &'a Endpoints) -> Self {
        Self { gateway, endpoints }
    }

    pub fn register(&self, request: &RegisterRequest) -> ApiResult<UserProfile> {
        request.validate()?;
        decode(self.gateway.post(&self.endpoints.register(), request)?)
    }

    /// Log in and store the issued token in the shared session
    pub fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse =
            decode(self.gateway.post(&self.endpoints.login(), &request)?)?;

        self.gateway
            .session()
            .establish(response.token.clone(), USER_ROLE.to_string())?;
        log::info!("Logged in as {}", request.email);

        Ok(response)
    }

    pub fn me(&self) -> ApiResult<UserProfile> {
        decode(self.gateway.get(&self.endpoints.me())?)
    }

    /// Drop the token and role locally; the server is not contacted
    pub fn logout(&self) -> ApiResult<()> {
        self.gateway.session().teardown()?;
        Ok(())
    }
}
