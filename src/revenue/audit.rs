//! Audit trail for revenue decisions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One audit event emitted during a revenue calculation. The `detail`
/// payload carries the numbers behind the decision (shares, TDS inputs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueAuditEvent {
    pub enrollment_id: String,
    pub action: String,
    pub detail: Value,
    pub occurred_at: DateTime<Utc>,
}

impl RevenueAuditEvent {
    #[must_use]
    pub fn new(enrollment_id: impl Into<String>, action: impl Into<String>, detail: Value) -> Self {
        Self {
            enrollment_id: enrollment_id.into(),
            action: action.into(),
            detail,
            occurred_at: Utc::now(),
        }
    }
}

/// Destination for audit events. Sinks must not fail the calculation; any
/// delivery problem is theirs to log and swallow.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: RevenueAuditEvent);
}

/// Writes audit events to the structured log.
#[derive(Default, Clone)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: RevenueAuditEvent) {
        tracing::info!(
            enrollment_id = %event.enrollment_id,
            action = %event.action,
            detail = %event.detail,
            "Revenue audit"
        );
    }
}

/// Discards audit events.
#[derive(Default, Clone)]
pub struct NoOpAuditSink;

#[async_trait]
impl AuditSink for NoOpAuditSink {
    async fn record(&self, _event: RevenueAuditEvent) {}
}
