//! SQL-backed abuse report store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use trustmod_common::{AppError, AppResult};

use super::{ReportStore, ReportTransition};
use crate::entities::{
    AbuseReport,
    abuse_report::{self, ReportStatus},
};

fn db_err(e: DbErr) -> AppError {
    AppError::Database(e.to_string())
}

/// Report store on a sea-orm connection.
///
/// Transitions run `UPDATE abuse_report ... WHERE id = ? AND status = ?
/// AND claimed_by = ?` (or `IS NULL`), so exactly one of several racing
/// writers sees a row affected.
#[derive(Clone)]
pub struct SeaOrmReportStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmReportStore {
    /// Create a new report store.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReportStore for SeaOrmReportStore {
    async fn insert(&self, model: abuse_report::Model) -> AppResult<abuse_report::Model> {
        let active = abuse_report::ActiveModel {
            id: Set(model.id.clone()),
            reporter_id: Set(model.reporter_id.clone()),
            reported_user_id: Set(model.reported_user_id.clone()),
            reason: Set(model.reason.clone()),
            description: Set(model.description.clone()),
            attachments: Set(model.attachments.clone()),
            status: Set(model.status),
            claimed_by: Set(model.claimed_by.clone()),
            claimed_at: Set(model.claimed_at),
            resolution_action: Set(model.resolution_action),
            resolution_days: Set(model.resolution_days),
            resolved_by: Set(model.resolved_by.clone()),
            resolved_at: Set(model.resolved_at),
            created_at: Set(model.created_at),
        };

        AbuseReport::insert(active)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(model)
    }

    async fn find(&self, id: &str) -> AppResult<Option<abuse_report::Model>> {
        AbuseReport::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    async fn transition(
        &self,
        current: &abuse_report::Model,
        transition: ReportTransition,
    ) -> AppResult<Option<abuse_report::Model>> {
        if current.status.is_terminal() {
            return Ok(None);
        }

        let next = transition.applied_to(current);

        let mut query = AbuseReport::update_many()
            .set(abuse_report::ActiveModel {
                status: Set(next.status),
                claimed_by: Set(next.claimed_by.clone()),
                claimed_at: Set(next.claimed_at),
                resolution_action: Set(next.resolution_action),
                resolution_days: Set(next.resolution_days),
                resolved_by: Set(next.resolved_by.clone()),
                resolved_at: Set(next.resolved_at),
                ..Default::default()
            })
            .filter(abuse_report::Column::Id.eq(current.id.as_str()))
            .filter(abuse_report::Column::Status.eq(current.status));

        query = match current.claimed_by.as_deref() {
            Some(holder) => query.filter(abuse_report::Column::ClaimedBy.eq(holder)),
            None => query.filter(abuse_report::Column::ClaimedBy.is_null()),
        };

        let result = query.exec(self.db.as_ref()).await.map_err(db_err)?;

        Ok((result.rows_affected == 1).then_some(next))
    }

    async fn list(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<abuse_report::Model>> {
        let mut query = AbuseReport::find().order_by_desc(abuse_report::Column::CreatedAt);

        if let Some(s) = status {
            query = query.filter(abuse_report::Column::Status.eq(s));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<abuse_report::Model>> {
        AbuseReport::find()
            .filter(abuse_report::Column::ReportedUserId.eq(user_id))
            .order_by_desc(abuse_report::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    async fn count_by_status(&self, status: ReportStatus) -> AppResult<u64> {
        AbuseReport::find()
            .filter(abuse_report::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    async fn claimed_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<abuse_report::Model>> {
        AbuseReport::find()
            .filter(abuse_report::Column::Status.eq(ReportStatus::InProgress))
            .filter(abuse_report::Column::ClaimedAt.lt(cutoff))
            .order_by_asc(abuse_report::Column::ClaimedAt)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}
