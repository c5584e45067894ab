use std::time::Duration;

use log::debug;
use reqwest::Url;

use crate::error::Result;
use crate::messages::{LoginRequest, TelemetryPayload};

/// Status and body of an answered request. Anything that never got an
/// answer comes back as an `Err` instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }
}

pub trait TelemetryApi {
    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse>;

    async fn post_reading(&self, token: &str, payload: &TelemetryPayload) -> Result<ApiResponse>;
}

/// The remote API over one shared, long-lived HTTP client.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    login_url: Url,
    api_url: Url,
}

impl HttpApi {
    pub fn new(login_url: Url, api_url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpApi {
            client,
            login_url,
            api_url,
        })
    }
}

impl TelemetryApi for HttpApi {
    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse> {
        debug!("POST {} as {}", self.login_url, request.username);
        let response = self
            .client
            .post(self.login_url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        Ok(ApiResponse::new(status, response.text().await?))
    }

    async fn post_reading(&self, token: &str, payload: &TelemetryPayload) -> Result<ApiResponse> {
        debug!("POST {} {:?}", self.api_url, payload);
        let response = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        Ok(ApiResponse::new(status, response.text().await?))
    }
}
