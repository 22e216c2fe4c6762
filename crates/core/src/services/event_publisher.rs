//! Event publisher service.
//!
//! Announces applied moderation outcomes to whatever is listening
//! (notifications, audit feeds). Publishing is best effort: the state
//! change is already committed when an event goes out.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use trustmod_common::{AppError, AppResult};

/// An applied moderation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModerationEvent {
    /// An account was suspended.
    #[serde(rename_all = "camelCase")]
    UserSuspended {
        user_id: String,
        days: u32,
        report_id: Option<String>,
    },
    /// An account was deactivated.
    #[serde(rename_all = "camelCase")]
    UserDeactivated {
        user_id: String,
        report_id: Option<String>,
    },
    /// An account was returned to active by a moderator.
    #[serde(rename_all = "camelCase")]
    UserReactivated { user_id: String },
    /// A report was closed without action.
    #[serde(rename_all = "camelCase")]
    ReportRejected { report_id: String },
}

/// Trait for publishing moderation events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: &ModerationEvent) -> AppResult<()>;
}

/// A no-op implementation of EventPublisher for when nobody listens.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: &ModerationEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Keeps every published event in memory. Useful in tests.
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<ModerationEvent>>,
    fail: bool,
}

impl RecordingEventPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher that rejects every event.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Events published so far, oldest first.
    pub async fn events(&self) -> Vec<ModerationEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: &ModerationEvent) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Internal("Event sink unavailable".to_string()));
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// Wrapper for boxed EventPublisher trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = ModerationEvent::UserSuspended {
            user_id: "elder".to_string(),
            days: 30,
            report_id: Some("r1".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "userSuspended");
        assert_eq!(json["userId"], "elder");
        assert_eq!(json["days"], 30);
        assert_eq!(json["reportId"], "r1");
    }

    #[tokio::test]
    async fn test_recording_publisher() {
        let publisher = RecordingEventPublisher::new();
        let event = ModerationEvent::ReportRejected {
            report_id: "r1".to_string(),
        };
        publisher.publish(&event).await.unwrap();
        assert_eq!(publisher.events().await, vec![event.clone()]);

        let failing = RecordingEventPublisher::failing();
        assert!(failing.publish(&event).await.is_err());
        assert!(failing.events().await.is_empty());
    }
}
