//! Account standing entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Platform role. Fixed when the account is created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    #[sea_orm(string_value = "elderly")]
    Elderly,
    #[sea_orm(string_value = "volunteer")]
    Volunteer,
    #[sea_orm(string_value = "caregiver")]
    Caregiver,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// Whether an account with this role may be the subject of an abuse report.
    #[must_use]
    pub const fn is_reportable(self) -> bool {
        matches!(self, Self::Elderly | Self::Volunteer)
    }

    /// Whether accounts with this role can ever leave the active status.
    #[must_use]
    pub const fn is_status_exempt(self) -> bool {
        matches!(self, Self::Caregiver)
    }
}

/// Account standing.
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
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountStatus {
    #[sea_orm(string_value = "active")]
    #[default]
    Active,
    #[sea_orm(string_value = "suspended")]
    Suspended,
    #[sea_orm(string_value = "deactivated")]
    Deactivated,
}

/// Account model. Rows are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub role: Role,

    pub status: AccountStatus,

    /// Set only while suspended.
    #[sea_orm(nullable)]
    pub suspension_expires_at: Option<DateTimeWithTimeZone>,

    /// Required whenever the status is not active.
    #[sea_orm(column_type = "Text", nullable)]
    pub status_reason: Option<String>,

    /// Moderator id, or `system:auto-expiry` for lazy expiry.
    #[sea_orm(nullable)]
    pub status_changed_by: Option<String>,

    #[sea_orm(nullable)]
    pub status_changed_at: Option<DateTimeWithTimeZone>,

    /// Bumped on every status write; the compare-and-set token.
    pub version: i64,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_status_history::Entity")]
    StatusHistory,
}

impl Related<super::account_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
