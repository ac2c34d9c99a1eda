//! gRPC adapter for `activity.ActivityService`

use super::{
    proto::{activity_service_client::ActivityServiceClient, GetLogsRequest, HealthRequest},
    Endpoint, ProtocolAdapter,
};
use crate::{
    error::{AppError, Result},
    models::LogRecord,
    types::{ConnectionMode, Protocol},
};
use async_trait::async_trait;
use tonic::{
    transport::{Channel, Endpoint as ChannelEndpoint},
    Request,
};

pub struct GrpcAdapter {
    endpoint: Endpoint,
    /// Lazily connected channel reused in shared mode
    shared: Option<Channel>,
}

impl GrpcAdapter {
    pub fn new(endpoint: Endpoint, mode: ConnectionMode) -> Result<Self> {
        if endpoint.protocol != Protocol::Grpc {
            return Err(AppError::config(format!("gRPC adapter cannot serve {}", endpoint.protocol)));
        }
        let shared = match mode {
            ConnectionMode::Shared => Some(channel_endpoint(&endpoint)?.connect_lazy()),
            ConnectionMode::Fresh => None,
        };
        Ok(Self { endpoint, shared })
    }

    /// Client over the shared channel, or over a new connection in fresh mode
    async fn client(&self) -> Result<ActivityServiceClient<Channel>> {
        let channel = match &self.shared {
            Some(channel) => channel.clone(),
            None => channel_endpoint(&self.endpoint)?.connect().await?,
        };
        Ok(ActivityServiceClient::new(channel))
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.endpoint.timeout);
        request
    }

    pub async fn logs(&self, limit: u32) -> Result<Vec<LogRecord>> {
        let limit = i32::try_from(limit)
            .map_err(|_| AppError::validation(format!("limit {} does not fit an int32", limit)))?;
        let list = self
            .client()
            .await?
            .get_logs(self.request(GetLogsRequest { limit }))
            .await?
            .into_inner();
        Ok(list.logs.into_iter().map(LogRecord::from).collect())
    }
}

fn channel_endpoint(endpoint: &Endpoint) -> Result<ChannelEndpoint> {
    let endpoint_uri = endpoint.base_url();
    let channel = ChannelEndpoint::from_shared(endpoint_uri.clone())
        .map_err(|e| AppError::config(format!("Invalid gRPC endpoint '{}': {}", endpoint_uri, e)))?
        .connect_timeout(endpoint.timeout)
        .timeout(endpoint.timeout);
    Ok(channel)
}

#[async_trait]
impl ProtocolAdapter for GrpcAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn connection_mode(&self) -> ConnectionMode {
        if self.shared.is_some() {
            ConnectionMode::Shared
        } else {
            ConnectionMode::Fresh
        }
    }

    async fn fetch_logs(&self, limit: u32) -> Result<usize> {
        Ok(self.logs(limit).await?.len())
    }

    async fn check_health(&self) -> Result<()> {
        let response = self
            .client()
            .await?
            .check_health(self.request(HealthRequest {}))
            .await?
            .into_inner();
        if response.status == super::http::HEALTHY {
            Ok(())
        } else {
            Err(AppError::protocol(format!("gRPC reported status '{}'", response.status)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::proto::{
        activity_service_server::{ActivityService, ActivityServiceServer},
        HealthResponse, LogEntry, LogList,
    };
    use std::time::Duration;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::{transport::Server, Response, Status};

    /// Serves `limit` generated entries and a fixed health status
    struct CannedActivity {
        status: &'static str,
    }

    #[tonic::async_trait]
    impl ActivityService for CannedActivity {
        async fn get_logs(&self, request: Request<GetLogsRequest>) -> std::result::Result<Response<LogList>, Status> {
            let limit = request.into_inner().limit;
            let logs = (1..=limit)
                .map(|id| LogEntry {
                    id,
                    user_id: id % 3,
                    action: "view".into(),
                    timestamp: "2024-01-01T00:00:00".into(),
                    ..Default::default()
                })
                .collect();
            Ok(Response::new(LogList { logs }))
        }

        async fn check_health(
            &self,
            _request: Request<HealthRequest>,
        ) -> std::result::Result<Response<HealthResponse>, Status> {
            Ok(Response::new(HealthResponse { status: self.status.to_string() }))
        }
    }

    async fn serve(status: &'static str) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let incoming = TcpListenerStream::new(listener);
        tokio::spawn(
            Server::builder()
                .add_service(ActivityServiceServer::new(CannedActivity { status }))
                .serve_with_incoming(incoming),
        );
        port
    }

    fn adapter(port: u16, mode: ConnectionMode) -> GrpcAdapter {
        let endpoint = Endpoint::new(Protocol::Grpc, "127.0.0.1", port).with_timeout(Duration::from_secs(2));
        GrpcAdapter::new(endpoint, mode).unwrap()
    }

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_rejects_foreign_endpoint() {
        let endpoint = Endpoint::new(Protocol::Rest, "localhost", 8000);
        assert!(GrpcAdapter::new(endpoint, ConnectionMode::Fresh).is_err());
    }

    #[tokio::test]
    async fn test_live_service_in_both_modes() {
        let port = serve("healthy").await;

        for mode in [ConnectionMode::Fresh, ConnectionMode::Shared] {
            let adapter = adapter(port, mode);
            assert_eq!(adapter.connection_mode(), mode);
            adapter.check_health().await.unwrap();
            assert_eq!(adapter.fetch_logs(7).await.unwrap(), 7);
            // Reuse of the same handle
            assert_eq!(adapter.fetch_logs(3).await.unwrap(), 3);
        }
    }

    #[tokio::test]
    async fn test_entries_map_to_records() {
        let port = serve("healthy").await;
        let records = adapter(port, ConnectionMode::Shared).logs(2).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, Some(1));
        assert_eq!(records[1].user_id, 2);
        assert!(records[0].ip_address.is_none());
    }

    #[tokio::test]
    async fn test_unhealthy_status_is_rejected() {
        let port = serve("starting").await;
        let error = adapter(port, ConnectionMode::Fresh).check_health().await.unwrap_err();
        assert!(matches!(error, AppError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_health() {
        let endpoint = Endpoint::new(Protocol::Grpc, "127.0.0.1", closed_port())
            .with_timeout(Duration::from_millis(500));
        let adapter = GrpcAdapter::new(endpoint, ConnectionMode::Fresh).unwrap();
        let error = adapter.check_health().await.unwrap_err();
        assert!(matches!(error, AppError::Connection(_) | AppError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_fetch_in_shared_mode() {
        let endpoint = Endpoint::new(Protocol::Grpc, "127.0.0.1", closed_port())
            .with_timeout(Duration::from_millis(500));
        let adapter = GrpcAdapter::new(endpoint, ConnectionMode::Shared).unwrap();
        assert!(adapter.fetch_logs(1).await.is_err());
    }
}
