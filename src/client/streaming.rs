//! SSE and WebSocket backends: health probes only

use super::{http::HttpHandle, Endpoint, ProtocolAdapter};
use crate::{
    error::{AppError, Result},
    types::{ConnectionMode, Protocol},
};
use async_trait::async_trait;

/// Adapter for the streaming transports.
///
/// These servers push records over `/stream` or `/ws`; there is no
/// request/response fetch to time, so measuring one is a protocol error.
pub struct StreamingAdapter {
    http: HttpHandle,
}

impl StreamingAdapter {
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        if endpoint.protocol.is_benchmarkable() {
            return Err(AppError::config(format!(
                "{} is not a streaming protocol",
                endpoint.protocol
            )));
        }
        Ok(Self { http: HttpHandle::new(endpoint, ConnectionMode::Fresh)? })
    }
}

#[async_trait]
impl ProtocolAdapter for StreamingAdapter {
    fn protocol(&self) -> Protocol {
        self.http.endpoint().protocol
    }

    fn endpoint(&self) -> &Endpoint {
        self.http.endpoint()
    }

    async fn fetch_logs(&self, _limit: u32) -> Result<usize> {
        Err(AppError::protocol(format!(
            "{} is a streaming transport and cannot be benchmarked",
            self.protocol()
        )))
    }

    async fn check_health(&self) -> Result<()> {
        self.http.check_health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_streaming_protocols_accepted() {
        assert!(StreamingAdapter::new(Endpoint::new(Protocol::Sse, "localhost", 8002)).is_ok());
        assert!(StreamingAdapter::new(Endpoint::new(Protocol::WebSocket, "localhost", 8003)).is_ok());
        assert!(StreamingAdapter::new(Endpoint::new(Protocol::Rest, "localhost", 8000)).is_err());
    }

    #[tokio::test]
    async fn test_fetch_is_a_protocol_error() {
        let adapter = StreamingAdapter::new(Endpoint::new(Protocol::Sse, "localhost", 8002)).unwrap();
        let error = adapter.fetch_logs(1).await.unwrap_err();
        assert!(matches!(error, AppError::Protocol(_)));
    }
}
