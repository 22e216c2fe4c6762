//! Periodic maintenance.

use std::future::Future;
use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};
use trustmod_common::AppResult;
use trustmod_core::{AccountStatusStore, ReportLifecycle};

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub suspensions_lifted: u64,
    pub stale_claims: usize,
}

/// Sweeps expired suspensions and watches for abandoned claims.
pub struct Maintenance {
    accounts: AccountStatusStore,
    reports: ReportLifecycle,
    stale_claim_after: chrono::Duration,
}

impl Maintenance {
    pub const fn new(
        accounts: AccountStatusStore,
        reports: ReportLifecycle,
        stale_claim_after: chrono::Duration,
    ) -> Self {
        Self {
            accounts,
            reports,
            stale_claim_after,
        }
    }

    /// Run one pass.
    pub async fn run_once(&self) -> AppResult<PassSummary> {
        let suspensions_lifted = self.accounts.expire_due().await?;

        let stale = self.reports.stale_claims(self.stale_claim_after).await?;
        for report in &stale {
            warn!(
                report_id = %report.id,
                claimed_by = ?report.claimed_by,
                claimed_at = ?report.claimed_at,
                "Report claim is stale"
            );
        }

        Ok(PassSummary {
            suspensions_lifted,
            stale_claims: stale.len(),
        })
    }

    /// Run a pass every `period` until `shutdown` completes.
    pub async fn run(&self, period: Duration, shutdown: impl Future<Output = ()>) {
        let mut interval = interval(period);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = interval.tick() => {
                    match self.run_once().await {
                        Ok(summary) => {
                            if summary.stale_claims > 0 {
                                info!(count = summary.stale_claims, "Stale report claims pending follow-up");
                            }
                        }
                        Err(e) => {
                            warn!("Maintenance pass failed");
                            e.log();
                        }
                    }
                }
            }
        }

        info!("Maintenance loop stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Arc;
    use trustmod_common::{AppError, ManualClock};
    use trustmod_core::{StatusChange, SubmitReportInput};
    use trustmod_db::entities::account::{self, AccountStatus, Role};
    use trustmod_db::entities::account_status_history;
    use trustmod_db::repositories::{
        AccountStore, MemoryAccountStore, MemoryReportStore, StatusUpdate,
    };

    /// Account store whose database is down.
    struct UnreachableAccounts;

    fn down() -> AppError {
        AppError::Database("connection refused".to_string())
    }

    #[async_trait]
    impl AccountStore for UnreachableAccounts {
        async fn insert(&self, _account: account::Model) -> AppResult<account::Model> {
            Err(down())
        }

        async fn find(&self, _id: &str) -> AppResult<Option<account::Model>> {
            Err(down())
        }

        async fn compare_and_set(
            &self,
            _current: &account::Model,
            _update: StatusUpdate,
        ) -> AppResult<Option<account::Model>> {
            Err(down())
        }

        async fn history(&self, _id: &str) -> AppResult<Vec<account_status_history::Model>> {
            Err(down())
        }

        async fn find_expired_suspensions(
            &self,
            _now: DateTime<Utc>,
            _limit: u64,
        ) -> AppResult<Vec<account::Model>> {
            Err(down())
        }
    }

    async fn setup() -> (Maintenance, AccountStatusStore, ReportLifecycle, Arc<ManualClock>) {
        let account_store = Arc::new(MemoryAccountStore::new());
        let clock = Arc::new(ManualClock::default());
        let accounts = AccountStatusStore::new(account_store.clone(), clock.clone());
        let reports = ReportLifecycle::new(
            Arc::new(MemoryReportStore::new()),
            account_store,
            clock.clone(),
        );

        accounts.register("elder", Role::Elderly).await.unwrap();
        accounts.register("helper", Role::Volunteer).await.unwrap();

        let maintenance = Maintenance::new(
            accounts.clone(),
            reports.clone(),
            chrono::Duration::hours(72),
        );
        (maintenance, accounts, reports, clock)
    }

    #[tokio::test]
    async fn test_pass_lifts_and_counts() {
        let (maintenance, accounts, reports, clock) = setup().await;

        accounts
            .set_status(StatusChange {
                user_id: "elder".to_string(),
                status: AccountStatus::Suspended,
                reason: Some("spam".to_string()),
                moderator_id: "admin1".to_string(),
                duration_days: Some(7),
                report_id: None,
            })
            .await
            .unwrap();

        let report = reports
            .submit(
                "helper",
                SubmitReportInput {
                    reported_user_id: "elder".to_string(),
                    reason: "rude".to_string(),
                    description: String::new(),
                    attachments: vec![],
                },
            )
            .await
            .unwrap();
        reports.claim(&report.id, "admin1").await.unwrap();

        assert_eq!(maintenance.run_once().await.unwrap(), PassSummary::default());

        clock.advance(chrono::Duration::days(8));
        assert_eq!(
            maintenance.run_once().await.unwrap(),
            PassSummary {
                suspensions_lifted: 1,
                stale_claims: 1,
            }
        );

        // Nothing left to lift on the next pass.
        assert_eq!(maintenance.run_once().await.unwrap().suspensions_lifted, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (maintenance, ..) = setup().await;
        maintenance
            .run(Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_millis(30)).await;
            })
            .await;
    }

    #[tokio::test]
    async fn test_failed_pass_keeps_loop_running() {
        let clock = Arc::new(ManualClock::default());
        let accounts = AccountStatusStore::new(Arc::new(UnreachableAccounts), clock.clone());
        let reports = ReportLifecycle::new(
            Arc::new(MemoryReportStore::new()),
            Arc::new(UnreachableAccounts),
            clock,
        );
        let maintenance = Maintenance::new(accounts, reports, chrono::Duration::hours(72));

        let err = maintenance.run_once().await.unwrap_err();
        assert!(err.is_infrastructure());

        // Several failing passes, then a clean stop.
        maintenance
            .run(Duration::from_millis(5), async {
                tokio::time::sleep(Duration::from_millis(30)).await;
            })
            .await;
    }
}
