//! In-memory stores.
//!
//! Each record sits behind its own mutex. The outer map lock is held only
//! long enough to look up or insert a slot, so writes to unrelated records
//! never wait on each other.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use trustmod_common::{AppError, AppResult, IdGenerator};

use super::{AccountStore, ReportStore, ReportTransition, StatusUpdate};
use crate::entities::{
    abuse_report::{self, ReportStatus},
    account::{self, AccountStatus},
    account_status_history,
};

struct AccountRecord {
    account: account::Model,
    history: Vec<account_status_history::Model>,
}

type Slot<T> = Arc<Mutex<T>>;

/// In-memory account store.
#[derive(Default)]
pub struct MemoryAccountStore {
    records: RwLock<HashMap<String, Slot<AccountRecord>>>,
    id_gen: IdGenerator,
}

impl MemoryAccountStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: &str) -> Option<Slot<AccountRecord>> {
        self.records.read().await.get(id).cloned()
    }

    async fn slots(&self) -> Vec<Slot<AccountRecord>> {
        self.records.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, model: account::Model) -> AppResult<account::Model> {
        let mut records = self.records.write().await;
        match records.entry(model.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Validation(format!(
                "Account {} already exists",
                model.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(AccountRecord {
                    account: model.clone(),
                    history: Vec::new(),
                })));
                Ok(model)
            }
        }
    }

    async fn find(&self, id: &str) -> AppResult<Option<account::Model>> {
        match self.slot(id).await {
            Some(slot) => Ok(Some(slot.lock().await.account.clone())),
            None => Ok(None),
        }
    }

    async fn compare_and_set(
        &self,
        current: &account::Model,
        update: StatusUpdate,
    ) -> AppResult<Option<account::Model>> {
        let Some(slot) = self.slot(&current.id).await else {
            return Err(AppError::NotFound(format!("Account {} not found", current.id)));
        };

        let mut record = slot.lock().await;
        if record.account.version != current.version {
            return Ok(None);
        }

        let entry = update.history_entry(self.id_gen.generate_uuid_v7(), &record.account);
        let next = update.applied_to(&record.account);
        record.account = next.clone();
        record.history.push(entry);

        Ok(Some(next))
    }

    async fn history(&self, id: &str) -> AppResult<Vec<account_status_history::Model>> {
        match self.slot(id).await {
            Some(slot) => Ok(slot.lock().await.history.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn find_expired_suspensions(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<account::Model>> {
        let mut expired = Vec::new();
        for slot in self.slots().await {
            let record = slot.lock().await;
            let due = record.account.status == AccountStatus::Suspended
                && record
                    .account
                    .suspension_expires_at
                    .is_some_and(|at| at <= now);
            if due {
                expired.push(record.account.clone());
            }
        }

        expired.sort_by_key(|a| a.suspension_expires_at);
        expired.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(expired)
    }
}

/// In-memory abuse report store.
#[derive(Default)]
pub struct MemoryReportStore {
    records: RwLock<HashMap<String, Slot<abuse_report::Model>>>,
}

impl MemoryReportStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn snapshot(&self) -> Vec<abuse_report::Model> {
        let slots: Vec<_> = self.records.read().await.values().cloned().collect();
        let mut reports = Vec::with_capacity(slots.len());
        for slot in slots {
            reports.push(slot.lock().await.clone());
        }
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        reports
    }
}

fn page(
    reports: impl Iterator<Item = abuse_report::Model>,
    limit: u64,
    offset: u64,
) -> Vec<abuse_report::Model> {
    reports
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn insert(&self, model: abuse_report::Model) -> AppResult<abuse_report::Model> {
        let mut records = self.records.write().await;
        match records.entry(model.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Validation(format!(
                "Report {} already exists",
                model.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(model.clone())));
                Ok(model)
            }
        }
    }

    async fn find(&self, id: &str) -> AppResult<Option<abuse_report::Model>> {
        let slot = self.records.read().await.get(id).cloned();
        match slot {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn transition(
        &self,
        current: &abuse_report::Model,
        transition: ReportTransition,
    ) -> AppResult<Option<abuse_report::Model>> {
        let slot = self.records.read().await.get(&current.id).cloned();
        let Some(slot) = slot else {
            return Err(AppError::NotFound(format!("Report {} not found", current.id)));
        };

        let mut stored = slot.lock().await;
        if stored.status.is_terminal()
            || stored.status != current.status
            || stored.claimed_by != current.claimed_by
        {
            return Ok(None);
        }

        let next = transition.applied_to(&stored);
        *stored = next.clone();

        Ok(Some(next))
    }

    async fn list(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<abuse_report::Model>> {
        let reports = self.snapshot().await;
        Ok(page(
            reports
                .into_iter()
                .filter(|r| status.is_none_or(|s| r.status == s)),
            limit,
            offset,
        ))
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<abuse_report::Model>> {
        let reports = self.snapshot().await;
        Ok(page(
            reports
                .into_iter()
                .filter(|r| r.reported_user_id == user_id),
            limit,
            0,
        ))
    }

    async fn count_by_status(&self, status: ReportStatus) -> AppResult<u64> {
        let reports = self.snapshot().await;
        Ok(reports.iter().filter(|r| r.status == status).count() as u64)
    }

    async fn claimed_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<abuse_report::Model>> {
        let mut stale: Vec<_> = self
            .snapshot()
            .await
            .into_iter()
            .filter(|r| {
                r.status == ReportStatus::InProgress && r.claimed_at.is_some_and(|at| at < cutoff)
            })
            .collect();
        stale.sort_by_key(|r| r.claimed_at);
        Ok(stale)
    }
}
