//! Delivery target for audit events.

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use common::{AppError, AppResult};
use domain::AuditEvent;
use proto::audit::{audit_trail_client::AuditTrailClient as ProtoAuditClient, AuditRecord};

/// Where dispatched audit events go. The collector owns events after
/// delivery; this side never reads them back.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn deliver(&self, event: &AuditEvent) -> AppResult<()>;
}

/// gRPC sink forwarding to the external log collector.
pub struct GrpcAuditSink {
    client: ProtoAuditClient<Channel>,
}

impl GrpcAuditSink {
    /// Build a lazily-connecting sink; audit must not block startup on the
    /// collector being up.
    pub fn connect_lazy(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        debug!("Connecting lazily to audit collector at {}", endpoint);
        let channel = Endpoint::from_shared(endpoint.to_string())?.connect_lazy();
        Ok(Self {
            client: ProtoAuditClient::new(channel),
        })
    }
}

#[async_trait]
impl AuditSink for GrpcAuditSink {
    async fn deliver(&self, event: &AuditEvent) -> AppResult<()> {
        let record = AuditRecord {
            user_id: event.user_id.to_string(),
            action: event.action.to_string(),
            ip: event.ip.clone(),
            detail: event.detail.clone(),
            timestamp: event.timestamp.to_rfc3339(),
        };

        let mut client = self.client.clone();
        client
            .record_operation(tonic::Request::new(record))
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
