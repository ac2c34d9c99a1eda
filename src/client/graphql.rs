//! GraphQL adapter: `POST /graphql` with a `logs(limit:)` query

use super::{http::{ensure_success, HttpHandle}, Endpoint, ProtocolAdapter};
use crate::{
    error::{AppError, Result},
    models::LogRecord,
    types::{ConnectionMode, Protocol},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<LogsData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct LogsData {
    logs: Option<Vec<LogRecord>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Query selecting the fields the benchmark compares across protocols
pub fn logs_query(limit: u32) -> String {
    format!("{{ logs(limit: {}) {{ id action timestamp }} }}", limit)
}

pub struct GraphQlAdapter {
    http: HttpHandle,
}

impl GraphQlAdapter {
    pub fn new(endpoint: Endpoint, mode: ConnectionMode) -> Result<Self> {
        if endpoint.protocol != Protocol::GraphQL {
            return Err(AppError::config(format!("GraphQL adapter cannot serve {}", endpoint.protocol)));
        }
        Ok(Self { http: HttpHandle::new(endpoint, mode)? })
    }

    pub async fn logs(&self, limit: u32) -> Result<Vec<LogRecord>> {
        let url = self.http.endpoint().url("/graphql")?;
        let request = GraphQlRequest { query: logs_query(limit) };

        let response = self.http.client()?.post(url).json(&request).send().await?;
        let body: GraphQlResponse = ensure_success(response)?.json().await?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(AppError::protocol(format!("GraphQL errors: {}", messages.join("; "))));
        }

        body.data
            .and_then(|data| data.logs)
            .ok_or_else(|| AppError::protocol("GraphQL response has no data.logs"))
    }
}

#[async_trait]
impl ProtocolAdapter for GraphQlAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::GraphQL
    }

    fn endpoint(&self) -> &Endpoint {
        self.http.endpoint()
    }

    fn connection_mode(&self) -> ConnectionMode {
        self.http.mode()
    }

    async fn fetch_logs(&self, limit: u32) -> Result<usize> {
        Ok(self.logs(limit).await?.len())
    }

    async fn check_health(&self) -> Result<()> {
        self.http.check_health().await
    }
}
