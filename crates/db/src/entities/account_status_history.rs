//! Account status history entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::account::AccountStatus;

/// One applied status change. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account_status_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub from_status: AccountStatus,
    pub to_status: AccountStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,
    pub changed_by: String,
    pub changed_at: DateTimeWithTimeZone,
    /// Suspension expiry when `to_status` is suspended.
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,
    /// Report whose resolution caused this change, if any.
    #[sea_orm(nullable)]
    pub report_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::UserId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
