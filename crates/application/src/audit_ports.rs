use async_trait::async_trait;
use opsdesk_core::AppResult;
use opsdesk_domain::{AuditAction, UserId};

/// Audit event appended by security-sensitive use-cases.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// User that performed the action.
    pub actor_id: UserId,
    /// Stable action.
    pub action: AuditAction,
    /// User the action was performed on, if any.
    pub target_id: Option<UserId>,
    /// Structured action details.
    pub details: serde_json::Value,
}

/// Append-only audit log port.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
