//! Abuse report review lifecycle.
//!
//! ```text
//! Pending ──claim──▶ InProgress ──resolve──▶ Resolved
//!    ▲                   │      └──reject───▶ Rejected
//!    └─────release───────┘
//! ```
//!
//! Every transition is a compare-and-set on the report's status and
//! claimant, so of several moderators claiming the same pending report
//! exactly one wins and the rest see [`AppError::AlreadyClaimed`].

use chrono::Duration;
use serde::Deserialize;
use tracing::{debug, info, warn};
use trustmod_common::{AppError, AppResult, ClockService, IdGenerator};
use trustmod_db::{
    entities::abuse_report::{self, ReportStatus, Resolution, ResolutionKind},
    repositories::{AccountStoreService, ReportStoreService, ReportTransition},
};
use validator::Validate;

use super::account_status::MAX_CAS_ATTEMPTS;
use super::suspension_clock::SuspensionDuration;

/// Input for submitting an abuse report.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportInput {
    pub reported_user_id: String,
    #[validate(length(min = 1, max = 200))]
    pub reason: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 10))]
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Owner of report state transitions.
#[derive(Clone)]
pub struct ReportLifecycle {
    reports: ReportStoreService,
    accounts: AccountStoreService,
    clock: ClockService,
    id_gen: IdGenerator,
}

impl ReportLifecycle {
    /// Create a new report lifecycle.
    #[must_use]
    pub fn new(
        reports: ReportStoreService,
        accounts: AccountStoreService,
        clock: ClockService,
    ) -> Self {
        Self {
            reports,
            accounts,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a new report. It starts pending.
    pub async fn submit(
        &self,
        reporter_id: &str,
        input: SubmitReportInput,
    ) -> AppResult<abuse_report::Model> {
        input.validate()?;

        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("Report reason is required".to_string()));
        }

        if reporter_id == input.reported_user_id {
            return Err(AppError::Validation("Cannot report yourself".to_string()));
        }

        self.accounts
            .find(reporter_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {reporter_id} not found")))?;

        let reported = self
            .accounts
            .find(&input.reported_user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Account {} not found", input.reported_user_id))
            })?;

        if !reported.role.is_reportable() {
            return Err(AppError::Validation(format!(
                "{:?} accounts cannot be reported",
                reported.role
            )));
        }

        let model = abuse_report::Model {
            id: self.id_gen.generate(),
            reporter_id: reporter_id.to_string(),
            reported_user_id: reported.id,
            reason: reason.to_string(),
            description: input.description.trim().to_string(),
            attachments: serde_json::json!(input.attachments),
            status: ReportStatus::Pending,
            claimed_by: None,
            claimed_at: None,
            resolution_action: None,
            resolution_days: None,
            resolved_by: None,
            resolved_at: None,
            created_at: self.clock.now().into(),
        };

        let report = self.reports.insert(model).await?;
        info!(
            report_id = %report.id,
            reporter_id = %report.reporter_id,
            reported_user_id = %report.reported_user_id,
            "Report submitted"
        );
        Ok(report)
    }

    /// Get a report by ID.
    pub async fn get(&self, report_id: &str) -> AppResult<abuse_report::Model> {
        self.reports
            .find(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {report_id} not found")))
    }

    /// List reports, newest first.
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<abuse_report::Model>> {
        self.reports.list(status, limit, offset).await
    }

    /// Reports filed against a user, newest first.
    pub async fn reports_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<abuse_report::Model>> {
        self.reports.list_for_user(user_id, limit).await
    }

    /// Count reports waiting for a moderator.
    pub async fn count_pending(&self) -> AppResult<u64> {
        self.reports.count_by_status(ReportStatus::Pending).await
    }

    /// Take the review claim on a pending report.
    ///
    /// No role check happens here; callers acting for a user go through
    /// [`ModerationCoordinator::claim_report`](super::moderation::ModerationCoordinator::claim_report).
    pub async fn claim(
        &self,
        report_id: &str,
        moderator_id: &str,
    ) -> AppResult<abuse_report::Model> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.get(report_id).await?;

            match current.status {
                ReportStatus::Pending => {}
                ReportStatus::InProgress => {
                    let holder = current.claimed_by.unwrap_or_default();
                    warn!(
                        report_id = %report_id,
                        moderator_id = %moderator_id,
                        holder = %holder,
                        "Report already under review"
                    );
                    return Err(AppError::AlreadyClaimed(holder));
                }
                ReportStatus::Resolved | ReportStatus::Rejected => {
                    return Err(closed_error(&current));
                }
            }

            let transition = ReportTransition {
                status: ReportStatus::InProgress,
                claimed_by: Some(moderator_id.to_string()),
                claimed_at: Some(self.clock.now()),
                resolution: None,
            };

            if let Some(claimed) = self.reports.transition(&current, transition).await? {
                info!(report_id = %report_id, moderator_id = %moderator_id, "Report claimed");
                return Ok(claimed);
            }

            // Lost the race; the next read shows who won.
            debug!(report_id = %report_id, moderator_id = %moderator_id, "Claim write lost, re-reading");
        }

        Err(contention_error(report_id))
    }

    /// Close a claimed report with `kind`.
    ///
    /// Only the claim holder may resolve. A [`ResolutionKind::Reject`]
    /// closes the report as rejected, anything else as resolved.
    pub async fn resolve(
        &self,
        report_id: &str,
        moderator_id: &str,
        kind: ResolutionKind,
    ) -> AppResult<abuse_report::Model> {
        if let ResolutionKind::Suspend { days } = kind {
            SuspensionDuration::from_days(days)?;
        }

        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.require_claim_holder(report_id, moderator_id).await?;
            if let Some(closed) = self.close(&current, moderator_id, kind).await? {
                return Ok(closed);
            }
        }

        Err(contention_error(report_id))
    }

    /// Close a claimed report without action against the reported user.
    pub async fn reject(
        &self,
        report_id: &str,
        moderator_id: &str,
    ) -> AppResult<abuse_report::Model> {
        self.resolve(report_id, moderator_id, ResolutionKind::Reject)
            .await
    }

    /// Hand a claimed report back to the queue.
    pub async fn release(
        &self,
        report_id: &str,
        moderator_id: &str,
    ) -> AppResult<abuse_report::Model> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.require_claim_holder(report_id, moderator_id).await?;
            let transition = ReportTransition {
                status: ReportStatus::Pending,
                claimed_by: None,
                claimed_at: None,
                resolution: None,
            };

            if let Some(released) = self.reports.transition(&current, transition).await? {
                info!(report_id = %report_id, moderator_id = %moderator_id, "Report claim released");
                return Ok(released);
            }
        }

        Err(contention_error(report_id))
    }

    /// In-progress reports whose claim is older than `older_than`.
    pub async fn stale_claims(&self, older_than: Duration) -> AppResult<Vec<abuse_report::Model>> {
        let cutoff = self.clock.now() - older_than;
        self.reports.claimed_before(cutoff).await
    }

    /// Current report, provided `moderator_id` holds its claim.
    pub async fn require_claim_holder(
        &self,
        report_id: &str,
        moderator_id: &str,
    ) -> AppResult<abuse_report::Model> {
        let current = self.get(report_id).await?;

        match current.status {
            ReportStatus::InProgress if current.claimed_by.as_deref() == Some(moderator_id) => {
                Ok(current)
            }
            ReportStatus::Pending | ReportStatus::InProgress => {
                warn!(
                    report_id = %report_id,
                    moderator_id = %moderator_id,
                    holder = ?current.claimed_by,
                    "Report action by non-holder"
                );
                Err(AppError::NotClaimHolder)
            }
            ReportStatus::Resolved | ReportStatus::Rejected => Err(closed_error(&current)),
        }
    }

    /// Close `current` if it is still exactly as read.
    ///
    /// Returns `None` when the report changed in between.
    pub(crate) async fn close(
        &self,
        current: &abuse_report::Model,
        moderator_id: &str,
        kind: ResolutionKind,
    ) -> AppResult<Option<abuse_report::Model>> {
        let status = match kind {
            ResolutionKind::Reject => ReportStatus::Rejected,
            ResolutionKind::Suspend { .. } | ResolutionKind::Deactivate => ReportStatus::Resolved,
        };

        let transition = ReportTransition {
            status,
            claimed_by: None,
            claimed_at: None,
            resolution: Some(Resolution {
                kind,
                moderator_id: moderator_id.to_string(),
                resolved_at: self.clock.now(),
            }),
        };

        let closed = self.reports.transition(current, transition).await?;
        if let Some(report) = &closed {
            info!(
                report_id = %report.id,
                moderator_id = %moderator_id,
                status = ?report.status,
                resolution = ?kind,
                "Report closed"
            );
        }
        Ok(closed)
    }
}

fn closed_error(report: &abuse_report::Model) -> AppError {
    AppError::InvalidTransition(format!(
        "Report {} is already {:?}",
        report.id, report.status
    ))
}

fn contention_error(report_id: &str) -> AppError {
    AppError::Internal(format!(
        "Gave up writing report {report_id} after {MAX_CAS_ATTEMPTS} attempts"
    ))
}
