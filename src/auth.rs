use log::{error, info, warn};

use crate::api::TelemetryApi;
use crate::error::AuthError;
use crate::messages::{LoginRequest, LoginResponse};

/// Bearer token state for the process. The server never tells us when a
/// token expires; we only find out from a 401.
#[derive(Debug)]
pub struct AuthSession {
    credentials: LoginRequest,
    token: Option<String>,
}

impl AuthSession {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthSession {
            credentials: LoginRequest {
                username: username.into(),
                password: password.into(),
            },
            token: None,
        }
    }

    pub fn current_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Forget the token after the server rejected it.
    pub fn invalidate(&mut self) {
        self.token = None;
    }

    /// Exchange the credentials for a fresh token.
    ///
    /// A successful response without a token leaves the session without
    /// one. Rejections and transport failures leave the current state
    /// untouched.
    pub async fn login<A: TelemetryApi>(&mut self, api: &A) -> Result<String, AuthError> {
        let response = match api.login(&self.credentials).await {
            Ok(response) => response,
            Err(err) => {
                error!("Login error: {}", err);
                return Err(AuthError::Transport(err));
            }
        };

        if response.status != 200 {
            warn!("Login failed: {}", response.status);
            return Err(AuthError::Rejected(response.status));
        }

        let token = serde_json::from_str::<LoginResponse>(&response.body)
            .ok()
            .and_then(|body| body.access_token)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => {
                info!("Access token received");
                self.token = Some(token.clone());
                Ok(token)
            }
            None => {
                error!("Access token not found in login response");
                self.token = None;
                Err(AuthError::MissingToken)
            }
        }
    }
}
