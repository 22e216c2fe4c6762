//! Moderation services.

#![allow(missing_docs)]

pub mod account_status;
pub mod authorization;
pub mod event_publisher;
pub mod moderation;
pub mod report_lifecycle;
pub mod suspension_clock;

pub use account_status::{AccountStatusStore, AppliedChange, StatusChange, StatusView};
pub use authorization::{AuthorizationMatrix, ModerationAction};
pub use event_publisher::{
    EventPublisher, EventPublisherService, ModerationEvent, NoOpEventPublisher,
    RecordingEventPublisher,
};
pub use moderation::{ActionParams, ModerationCoordinator, ModerationRequest};
pub use report_lifecycle::{ReportLifecycle, SubmitReportInput};
pub use suspension_clock::{
    ALLOWED_SUSPENSION_DAYS, AUTO_EXPIRY_ACTOR, SuspensionClock, SuspensionDuration,
};
