//! reqwest plumbing shared by the HTTP-based adapters

use super::Endpoint;
use crate::{
    error::{AppError, Result},
    types::ConnectionMode,
};
use reqwest::{Client, Response};
use serde::Deserialize;

const USER_AGENT: &str = concat!("arena-bench/", env!("CARGO_PKG_VERSION"));

/// Status reported by `GET /health`
pub const HEALTHY: &str = "healthy";

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// Hands out reqwest clients according to the connection mode
#[derive(Debug, Clone)]
pub struct HttpHandle {
    endpoint: Endpoint,
    shared: Option<Client>,
}

impl HttpHandle {
    pub fn new(endpoint: Endpoint, mode: ConnectionMode) -> Result<Self> {
        let shared = match mode {
            ConnectionMode::Shared => Some(build_client(&endpoint, true)?),
            ConnectionMode::Fresh => None,
        };
        Ok(Self { endpoint, shared })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn mode(&self) -> ConnectionMode {
        if self.shared.is_some() {
            ConnectionMode::Shared
        } else {
            ConnectionMode::Fresh
        }
    }

    /// The shared client, or a new one with no idle pool in fresh mode
    pub fn client(&self) -> Result<Client> {
        match &self.shared {
            Some(client) => Ok(client.clone()),
            None => build_client(&self.endpoint, false),
        }
    }

    /// `GET /health`, expecting 200 and `{"status": "healthy"}`
    pub async fn check_health(&self) -> Result<()> {
        let url = self.endpoint.url("/health")?;
        let response = self.client()?.get(url).send().await?;
        let body: HealthBody = ensure_success(response)?.json().await?;

        if body.status == HEALTHY {
            Ok(())
        } else {
            Err(AppError::protocol(format!(
                "{} reported status '{}'",
                self.endpoint.protocol, body.status
            )))
        }
    }
}

/// Reject non-2xx responses as protocol failures
pub fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::protocol(format!("HTTP {} from {}", status.as_u16(), response.url().path())))
    }
}

fn build_client(endpoint: &Endpoint, pooled: bool) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(endpoint.timeout)
        .connect_timeout(endpoint.timeout)
        .user_agent(USER_AGENT);

    if !pooled {
        builder = builder.pool_max_idle_per_host(0);
    }

    builder
        .build()
        .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))
}
