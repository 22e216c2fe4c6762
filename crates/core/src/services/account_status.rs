//! Account standing: status, suspension window and history.
//!
//! [`AccountStatusStore::set_status`] is the only path that writes an
//! account's status. Reads resolve lapsed suspensions on the way out, so no
//! caller ever observes a suspension past its expiry.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use trustmod_common::{AppError, AppResult, ClockService};
use trustmod_db::{
    entities::{
        account::{self, AccountStatus, Role},
        account_status_history,
    },
    repositories::{AccountStoreService, StatusUpdate},
};

use super::suspension_clock::{AUTO_EXPIRY_ACTOR, SuspensionClock, SuspensionDuration};

/// Compare-and-set attempts before a write gives up.
pub(crate) const MAX_CAS_ATTEMPTS: usize = 16;

/// Accounts examined per expiry sweep.
const EXPIRY_SWEEP_BATCH: u64 = 500;

/// Status as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusView {
    pub status: AccountStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A requested status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub user_id: String,
    pub status: AccountStatus,
    pub reason: Option<String>,
    pub moderator_id: String,
    /// Required for suspensions, rejected otherwise.
    pub duration_days: Option<u32>,
    /// Report whose resolution asked for the change.
    pub report_id: Option<String>,
}

/// The record before and after an applied change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub previous: account::Model,
    pub current: account::Model,
}

/// Keyed account standing store.
#[derive(Clone)]
pub struct AccountStatusStore {
    store: AccountStoreService,
    clock: ClockService,
}

impl AccountStatusStore {
    /// Create a new account status store.
    #[must_use]
    pub fn new(store: AccountStoreService, clock: ClockService) -> Self {
        Self { store, clock }
    }

    /// Create an account at signup. Status starts active.
    pub async fn register(&self, user_id: &str, role: Role) -> AppResult<account::Model> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::Validation("User id is required".to_string()));
        }

        let model = account::Model {
            id: user_id.to_string(),
            role,
            status: AccountStatus::Active,
            suspension_expires_at: None,
            status_reason: None,
            status_changed_by: None,
            status_changed_at: None,
            version: 0,
            created_at: self.clock.now().into(),
        };

        let account = self.store.insert(model).await?;
        debug!(user_id = %account.id, role = ?account.role, "Registered account");
        Ok(account)
    }

    /// Full account record with any lapsed suspension resolved.
    pub async fn get_account(&self, user_id: &str) -> AppResult<account::Model> {
        let account = self.load(user_id).await?;
        self.resolve_expiry(account).await
    }

    /// Current status and suspension expiry.
    pub async fn get_status(&self, user_id: &str) -> AppResult<StatusView> {
        let account = self.get_account(user_id).await?;
        Ok(StatusView {
            status: account.status,
            expires_at: account
                .suspension_expires_at
                .map(|at| at.with_timezone(&Utc)),
        })
    }

    /// Overwrite an account's status.
    ///
    /// Caregivers can only ever be active. Suspensions need a duration from
    /// the allowed set, and any non-active status needs a reason.
    pub async fn set_status(&self, change: StatusChange) -> AppResult<AppliedChange> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let previous = self.get_account(&change.user_id).await?;
            let update = self.build_update(&previous, &change)?;

            if let Some(current) = self.store.compare_and_set(&previous, update).await? {
                info!(
                    user_id = %current.id,
                    from = ?previous.status,
                    to = ?current.status,
                    moderator_id = %change.moderator_id,
                    "Account status changed"
                );
                return Ok(AppliedChange { previous, current });
            }

            debug!(user_id = %change.user_id, "Account changed concurrently, retrying status write");
        }

        Err(AppError::Internal(format!(
            "Gave up writing status of {} after {MAX_CAS_ATTEMPTS} attempts",
            change.user_id
        )))
    }

    /// Undo an applied change, provided nothing has written the account since.
    ///
    /// Returns `false` when the account moved on and was left alone.
    pub async fn revert(&self, applied: &AppliedChange, actor_id: &str) -> AppResult<bool> {
        let previous = &applied.previous;
        let update = StatusUpdate {
            status: previous.status,
            suspension_expires_at: previous
                .suspension_expires_at
                .map(|at| at.with_timezone(&Utc)),
            reason: previous.status_reason.clone(),
            changed_by: actor_id.to_string(),
            changed_at: self.clock.now(),
            report_id: None,
        };

        match self.store.compare_and_set(&applied.current, update).await? {
            Some(_) => {
                info!(user_id = %previous.id, status = ?previous.status, "Reverted account status");
                Ok(true)
            }
            None => {
                warn!(user_id = %previous.id, "Account changed before revert; leaving it as is");
                Ok(false)
            }
        }
    }

    /// Status history, oldest first.
    pub async fn history(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<account_status_history::Model>> {
        self.load(user_id).await?;
        self.store.history(user_id).await
    }

    /// Lift every suspension whose expiry has passed.
    ///
    /// Same transition as the read path, so racing a concurrent read is
    /// harmless. Returns the number of lapsed suspensions lifted.
    pub async fn expire_due(&self) -> AppResult<u64> {
        let now = self.clock.now();
        let mut lifted = 0;

        loop {
            let due = self
                .store
                .find_expired_suspensions(now, EXPIRY_SWEEP_BATCH)
                .await?;
            if due.is_empty() {
                break;
            }

            let batch_len = due.len() as u64;
            let mut lifted_in_batch = 0;
            for account in due {
                let before = account.version;
                let after = self.resolve_expiry(account).await?;
                if after.version != before
                    && after.status_changed_by.as_deref() == Some(AUTO_EXPIRY_ACTOR)
                {
                    lifted_in_batch += 1;
                }
            }
            lifted += lifted_in_batch;

            if batch_len < EXPIRY_SWEEP_BATCH || lifted_in_batch == 0 {
                break;
            }
        }

        if lifted > 0 {
            info!(count = lifted, "Lifted expired suspensions");
        }
        Ok(lifted)
    }

    async fn load(&self, user_id: &str) -> AppResult<account::Model> {
        self.store
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {user_id} not found")))
    }

    /// Lift a lapsed suspension, re-reading on a lost write.
    async fn resolve_expiry(&self, mut account: account::Model) -> AppResult<account::Model> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let now = self.clock.now();
            if !SuspensionClock::has_lapsed(&account, now) {
                return Ok(account);
            }

            let update = StatusUpdate {
                status: AccountStatus::Active,
                suspension_expires_at: None,
                reason: None,
                changed_by: AUTO_EXPIRY_ACTOR.to_string(),
                changed_at: now,
                report_id: None,
            };

            match self.store.compare_and_set(&account, update).await? {
                Some(lifted) => {
                    info!(user_id = %lifted.id, "Suspension expired");
                    return Ok(lifted);
                }
                None => account = self.load(&account.id).await?,
            }
        }

        Err(AppError::Internal(format!(
            "Gave up resolving expiry of {} after {MAX_CAS_ATTEMPTS} attempts",
            account.id
        )))
    }

    fn build_update(
        &self,
        account: &account::Model,
        change: &StatusChange,
    ) -> AppResult<StatusUpdate> {
        if account.role.is_status_exempt() && change.status != AccountStatus::Active {
            return Err(AppError::InvalidTransition(format!(
                "{:?} accounts cannot be {:?}",
                account.role, change.status
            )));
        }

        let now = self.clock.now();
        let suspension_expires_at = match (change.status, change.duration_days) {
            (AccountStatus::Suspended, Some(days)) => {
                Some(SuspensionDuration::from_days(days)?.expires_at(now))
            }
            (AccountStatus::Suspended, None) => {
                return Err(AppError::InvalidTransition(
                    "A suspension needs a duration".to_string(),
                ));
            }
            (_, Some(_)) => {
                return Err(AppError::Validation(
                    "A duration only applies to suspensions".to_string(),
                ));
            }
            (_, None) => None,
        };

        let reason = change
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        if change.status != AccountStatus::Active && reason.is_none() {
            return Err(AppError::InvalidTransition(format!(
                "A reason is required to set an account {:?}",
                change.status
            )));
        }

        Ok(StatusUpdate {
            status: change.status,
            suspension_expires_at,
            reason,
            changed_by: change.moderator_id.clone(),
            changed_at: now,
            report_id: change.report_id.clone(),
        })
    }
}
