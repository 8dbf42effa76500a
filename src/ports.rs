//! Outbound capability ports.
//!
//! Identity enrichment and notification delivery are external services.
//! Both are best-effort: implementations bound their own latency and their
//! failure never fails the primary operation.

use uuid::Uuid;

use crate::events::Event;
use crate::types::UserId;

/// Resolves a user id to a display name. Returning `None` means the lookup
/// failed or timed out; callers fall back to a placeholder label.
pub trait IdentityLookup: Send + Sync {
    fn display_name(&self, user_id: UserId) -> Option<String>;
}

/// Receives engine events for downstream delivery. Fire-and-forget:
/// implementations swallow and log their own failures.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, event: &Event);
}

/// placeholder label when identity enrichment is unavailable
pub fn fallback_label(user_id: UserId) -> String {
    let mut short = user_id.to_string();
    short.truncate(8);
    format!("user {short}")
}

/// identity lookup that always falls back
#[derive(Debug, Default)]
pub struct NoIdentity;

impl IdentityLookup for NoIdentity {
    fn display_name(&self, _user_id: Uuid) -> Option<String> {
        None
    }
}

/// notification sink that drops everything
#[derive(Debug, Default)]
pub struct NoNotifications;

impl NotificationSink for NoNotifications {
    fn deliver(&self, _event: &Event) {}
}
