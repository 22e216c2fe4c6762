//! Abuse report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Abuse report review status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ReportStatus {
    /// Whether no further transition may leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }
}

/// Stored action column of a closed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ResolutionAction {
    #[sea_orm(string_value = "suspend")]
    Suspend,
    #[sea_orm(string_value = "deactivate")]
    Deactivate,
    #[sea_orm(string_value = "reject")]
    Reject,
}

/// Outcome recorded on a closed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ResolutionKind {
    Suspend { days: u32 },
    Deactivate,
    Reject,
}

impl ResolutionKind {
    /// Split into the stored action and optional day count.
    #[must_use]
    pub const fn to_columns(self) -> (ResolutionAction, Option<i32>) {
        match self {
            Self::Suspend { days } => (ResolutionAction::Suspend, Some(days as i32)),
            Self::Deactivate => (ResolutionAction::Deactivate, None),
            Self::Reject => (ResolutionAction::Reject, None),
        }
    }
}

/// Immutable resolution of a closed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub kind: ResolutionKind,
    pub moderator_id: String,
    pub resolved_at: chrono::DateTime<chrono::Utc>,
}

/// Abuse report model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "abuse_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// The user who submitted the report.
    pub reporter_id: String,
    /// The user being reported.
    pub reported_user_id: String,
    /// Short reason category.
    pub reason: String,
    /// Free-text description.
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Evidence references (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: Json,
    /// Current review status.
    pub status: ReportStatus,
    /// Moderator holding the review claim.
    pub claimed_by: Option<String>,
    /// When the claim was taken.
    pub claimed_at: Option<DateTimeWithTimeZone>,
    pub resolution_action: Option<ResolutionAction>,
    /// Suspension length when the resolution suspended the user.
    pub resolution_days: Option<i32>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTimeWithTimeZone>,
    /// When the report was submitted.
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Decoded resolution, present once the report is closed.
    #[must_use]
    pub fn resolution(&self) -> Option<Resolution> {
        let kind = match (self.resolution_action?, self.resolution_days) {
            (ResolutionAction::Suspend, Some(days)) => ResolutionKind::Suspend {
                days: u32::try_from(days).ok()?,
            },
            (ResolutionAction::Suspend, None) => return None,
            (ResolutionAction::Deactivate, _) => ResolutionKind::Deactivate,
            (ResolutionAction::Reject, _) => ResolutionKind::Reject,
        };

        Some(Resolution {
            kind,
            moderator_id: self.resolved_by.clone()?,
            resolved_at: self.resolved_at?.with_timezone(&chrono::Utc),
        })
    }

    /// Evidence references as strings. Non-string entries are skipped.
    #[must_use]
    pub fn attachment_refs(&self) -> Vec<String> {
        self.attachments
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
