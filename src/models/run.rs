//! Description of a single benchmark run

use crate::client::Endpoint;
use crate::types::{AppError, ConnectionMode, Protocol, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a run issues against its backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Workload {
    /// `requests` sequential requests, one sample each
    Latency { requests: u32 },
    /// Batches of `batch_size` concurrent requests until `window` elapses
    Throughput { window: Duration, batch_size: u32 },
    /// `clients` concurrent clients, each issuing sequential requests
    Concurrency { clients: u32, requests_per_client: u32 },
}

/// Everything needed to execute one run against one protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub protocol: Protocol,
    pub host: String,
    pub target_port: u16,
    pub workload: Workload,
    /// `limit` parameter sent with every log fetch
    pub limit: u32,
    pub timeout: Duration,
    pub connection_mode: ConnectionMode,
}

impl RunConfig {
    pub fn latency(endpoint: &Endpoint, requests: u32, limit: u32) -> Self {
        Self::new(endpoint, Workload::Latency { requests }, limit)
    }

    /// Throughput runs always reuse one client handle
    pub fn throughput(endpoint: &Endpoint, window: Duration, batch_size: u32, limit: u32) -> Self {
        Self::new(endpoint, Workload::Throughput { window, batch_size }, limit)
            .with_connection_mode(ConnectionMode::Shared)
    }

    pub fn concurrency(endpoint: &Endpoint, clients: u32, requests_per_client: u32, limit: u32) -> Self {
        Self::new(
            endpoint,
            Workload::Concurrency { clients, requests_per_client },
            limit,
        )
    }

    fn new(endpoint: &Endpoint, workload: Workload, limit: u32) -> Self {
        Self {
            protocol: endpoint.protocol,
            host: endpoint.host.clone(),
            target_port: endpoint.port,
            workload,
            limit,
            timeout: endpoint.timeout,
            connection_mode: ConnectionMode::default(),
        }
    }

    pub fn with_connection_mode(mut self, mode: ConnectionMode) -> Self {
        self.connection_mode = mode;
        self
    }

    /// Endpoint the run targets
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.protocol, self.host.clone(), self.target_port).with_timeout(self.timeout)
    }

    /// Upper bound on requests the run issues, `None` for time-bounded runs
    pub fn request_budget(&self) -> Option<u64> {
        match self.workload {
            Workload::Latency { requests } => Some(requests as u64),
            Workload::Concurrency { clients, requests_per_client } => {
                Some(clients as u64 * requests_per_client as u64)
            }
            Workload::Throughput { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(AppError::validation("limit must be greater than 0"));
        }
        if self.timeout.is_zero() {
            return Err(AppError::validation("timeout must be greater than 0"));
        }
        match self.workload {
            Workload::Latency { requests } if requests == 0 => {
                Err(AppError::validation("latency run needs at least one request"))
            }
            Workload::Throughput { window, batch_size } if window.is_zero() || batch_size == 0 => {
                Err(AppError::validation("throughput run needs a non-zero window and batch size"))
            }
            Workload::Concurrency { clients, requests_per_client }
                if clients == 0 || requests_per_client == 0 =>
            {
                Err(AppError::validation("concurrency run needs at least one client and request"))
            }
            _ => Ok(()),
        }
    }
}
