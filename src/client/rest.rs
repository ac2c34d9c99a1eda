//! REST adapter: `GET /logs?limit=N`

use super::{http::{ensure_success, HttpHandle}, Endpoint, ProtocolAdapter};
use crate::{
    error::{AppError, Result},
    models::LogRecord,
    types::{ConnectionMode, Protocol},
};
use async_trait::async_trait;

pub struct RestAdapter {
    http: HttpHandle,
}

impl RestAdapter {
    pub fn new(endpoint: Endpoint, mode: ConnectionMode) -> Result<Self> {
        if endpoint.protocol != Protocol::Rest {
            return Err(AppError::config(format!("REST adapter cannot serve {}", endpoint.protocol)));
        }
        Ok(Self { http: HttpHandle::new(endpoint, mode)? })
    }

    /// Fetch and decode the records
    pub async fn logs(&self, limit: u32) -> Result<Vec<LogRecord>> {
        let mut url = self.http.endpoint().url("/logs")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());

        let response = self.http.client()?.get(url).send().await?;
        let records: Vec<LogRecord> = ensure_success(response)?
            .json()
            .await
            .map_err(|e| AppError::protocol(format!("REST /logs body is not a record array: {}", e)))?;
        Ok(records)
    }
}

#[async_trait]
impl ProtocolAdapter for RestAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
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
