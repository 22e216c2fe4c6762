//! Persistence collaborators for account standing and abuse reports.
//!
//! Both stores expose a single compare-and-set write path keyed by record
//! id. Accounts are guarded by their `version` column; reports by their
//! `(status, claimed_by)` pair. A write whose expectation no longer holds
//! returns `Ok(None)` and leaves the record untouched.

mod account_store;
mod memory;
mod report_store;

pub use account_store::SeaOrmAccountStore;
pub use memory::{MemoryAccountStore, MemoryReportStore};
pub use report_store::SeaOrmReportStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use trustmod_common::AppResult;

use crate::entities::{
    abuse_report::{self, ReportStatus, Resolution},
    account::{self, AccountStatus},
    account_status_history,
};

/// New status fields for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: AccountStatus,
    pub suspension_expires_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    /// Report whose resolution caused the change.
    pub report_id: Option<String>,
}

impl StatusUpdate {
    /// Apply the update to a snapshot, bumping its version.
    #[must_use]
    pub fn applied_to(&self, current: &account::Model) -> account::Model {
        account::Model {
            status: self.status,
            suspension_expires_at: self.suspension_expires_at.map(Into::into),
            status_reason: self.reason.clone(),
            status_changed_by: Some(self.changed_by.clone()),
            status_changed_at: Some(self.changed_at.into()),
            version: current.version + 1,
            ..current.clone()
        }
    }

    /// History entry recording the move away from `current`.
    #[must_use]
    pub fn history_entry(&self, id: String, current: &account::Model) -> account_status_history::Model {
        account_status_history::Model {
            id,
            user_id: current.id.clone(),
            from_status: current.status,
            to_status: self.status,
            reason: self.reason.clone(),
            changed_by: self.changed_by.clone(),
            changed_at: self.changed_at.into(),
            expires_at: self.suspension_expires_at.map(Into::into),
            report_id: self.report_id.clone(),
        }
    }
}

/// New review fields for a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTransition {
    pub status: ReportStatus,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub resolution: Option<Resolution>,
}

impl ReportTransition {
    /// Apply the transition to a snapshot.
    #[must_use]
    pub fn applied_to(&self, current: &abuse_report::Model) -> abuse_report::Model {
        let (resolution_action, resolution_days) = self
            .resolution
            .as_ref()
            .map_or((None, None), |r| {
                let (action, days) = r.kind.to_columns();
                (Some(action), days)
            });

        abuse_report::Model {
            status: self.status,
            claimed_by: self.claimed_by.clone(),
            claimed_at: self.claimed_at.map(Into::into),
            resolution_action,
            resolution_days,
            resolved_by: self.resolution.as_ref().map(|r| r.moderator_id.clone()),
            resolved_at: self.resolution.as_ref().map(|r| r.resolved_at.into()),
            ..current.clone()
        }
    }
}

/// Account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Fails with `Validation` if the id is taken.
    async fn insert(&self, account: account::Model) -> AppResult<account::Model>;

    /// Find an account by id.
    async fn find(&self, id: &str) -> AppResult<Option<account::Model>>;

    /// Apply `update` if the stored version still equals `current.version`,
    /// appending a history entry in the same atomic step.
    ///
    /// Returns the new record, or `None` if another writer got there first.
    async fn compare_and_set(
        &self,
        current: &account::Model,
        update: StatusUpdate,
    ) -> AppResult<Option<account::Model>>;

    /// Status history for an account, oldest first.
    async fn history(&self, id: &str) -> AppResult<Vec<account_status_history::Model>>;

    /// Suspended accounts whose expiry is at or before `now`.
    async fn find_expired_suspensions(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<account::Model>>;
}

/// Abuse report persistence.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Insert a new report.
    async fn insert(&self, report: abuse_report::Model) -> AppResult<abuse_report::Model>;

    /// Find a report by id.
    async fn find(&self, id: &str) -> AppResult<Option<abuse_report::Model>>;

    /// Apply `transition` if the stored status and claimant still equal
    /// those of `current`.
    ///
    /// Returns the new record, or `None` if the expectation no longer holds.
    async fn transition(
        &self,
        current: &abuse_report::Model,
        transition: ReportTransition,
    ) -> AppResult<Option<abuse_report::Model>>;

    /// Reports, newest first, optionally filtered by status.
    async fn list(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<abuse_report::Model>>;

    /// Reports filed against a user, newest first.
    async fn list_for_user(&self, user_id: &str, limit: u64)
    -> AppResult<Vec<abuse_report::Model>>;

    /// Number of reports in `status`.
    async fn count_by_status(&self, status: ReportStatus) -> AppResult<u64>;

    /// In-progress reports claimed before `cutoff`, oldest claim first.
    async fn claimed_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<abuse_report::Model>>;
}

/// Shared account store handle.
pub type AccountStoreService = Arc<dyn AccountStore>;

/// Shared report store handle.
pub type ReportStoreService = Arc<dyn ReportStore>;
