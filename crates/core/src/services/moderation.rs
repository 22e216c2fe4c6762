//! Moderation action orchestration.
//!
//! Every disciplinary write enters through [`ModerationCoordinator::apply_action`],
//! which checks, in order: authorization, the report claim (for report-bound
//! actions), the account invariants, and only then closes the report. An
//! action either fully applies or leaves both records as they were.

use serde::Deserialize;
use tracing::{error, info, warn};
use trustmod_common::{AppError, AppResult};
use trustmod_db::entities::{
    abuse_report::{self, ResolutionKind},
    account::{AccountStatus, Role},
};

use super::account_status::{AccountStatusStore, AppliedChange, StatusChange};
use super::authorization::{AuthorizationMatrix, ModerationAction};
use super::event_publisher::{EventPublisherService, ModerationEvent};
use super::report_lifecycle::ReportLifecycle;

/// Parameters accompanying an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParams {
    pub reason: Option<String>,
    pub duration_days: Option<u32>,
    /// Required for report-bound actions, rejected otherwise.
    pub report_id: Option<String>,
}

/// A moderation action request. Actor identity and role are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    pub actor_id: String,
    pub actor_role: Role,
    pub target_user_id: String,
    pub target_role: Role,
    pub action: ModerationAction,
    #[serde(default)]
    pub params: ActionParams,
}

/// Orchestrator over account standing and report review.
#[derive(Clone)]
pub struct ModerationCoordinator {
    accounts: AccountStatusStore,
    reports: ReportLifecycle,
    event_publisher: Option<EventPublisherService>,
}

impl ModerationCoordinator {
    /// Create a new coordinator.
    #[must_use]
    pub fn new(accounts: AccountStatusStore, reports: ReportLifecycle) -> Self {
        Self {
            accounts,
            reports,
            event_publisher: None,
        }
    }

    /// Set the event publisher for announcing applied actions.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Claim a report for review on behalf of `actor_id`. Admins only.
    pub async fn claim_report(
        &self,
        actor_id: &str,
        actor_role: Role,
        report_id: &str,
    ) -> AppResult<abuse_report::Model> {
        if let Err(e) = AuthorizationMatrix::authorize_review(actor_role) {
            warn!(
                actor_id = %actor_id,
                actor_role = ?actor_role,
                report_id = %report_id,
                "Report claim denied"
            );
            return Err(e);
        }

        self.reports.claim(report_id, actor_id).await
    }

    /// Apply a moderation action and return the event describing it.
    pub async fn apply_action(&self, request: &ModerationRequest) -> AppResult<ModerationEvent> {
        let action = request.action;

        if let Err(e) =
            AuthorizationMatrix::authorize(request.actor_role, request.target_role, action)
        {
            warn!(
                actor_id = %request.actor_id,
                actor_role = ?request.actor_role,
                target_user_id = %request.target_user_id,
                action = ?action,
                "Moderation action denied"
            );
            return Err(e);
        }

        let report = self.claimed_report(request).await?;

        let account = self.accounts.get_account(&request.target_user_id).await?;
        if account.role != request.target_role {
            return Err(AppError::Validation(format!(
                "Account {} is {:?}, not {:?}",
                account.id, account.role, request.target_role
            )));
        }

        let Some(change) = status_change(request, report.as_ref()) else {
            // Report rejection leaves the account alone.
            let report = report.ok_or_else(|| {
                AppError::Validation("Rejecting requires a report".to_string())
            })?;
            self.close_report(&report, &request.actor_id, ResolutionKind::Reject)
                .await?;
            return Ok(ModerationEvent::ReportRejected {
                report_id: report.id,
            });
        };

        let applied = self.accounts.set_status(change).await?;

        if let Some(report) = &report {
            let kind = if applied.current.status == AccountStatus::Suspended {
                ResolutionKind::Suspend {
                    days: request.params.duration_days.unwrap_or_default(),
                }
            } else {
                ResolutionKind::Deactivate
            };

            if let Err(e) = self.close_report(report, &request.actor_id, kind).await {
                self.compensate(&applied, &request.actor_id, &report.id)
                    .await;
                return Err(e);
            }
        }

        Ok(event_for(request, &applied))
    }

    /// [`Self::apply_action`], then hand the event to the publisher.
    ///
    /// A failed publish is logged and does not fail the action.
    pub async fn apply_and_publish(
        &self,
        request: &ModerationRequest,
    ) -> AppResult<ModerationEvent> {
        let event = self.apply_action(request).await?;

        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher.publish(&event).await {
                warn!(error = %e, event = ?event, "Failed to publish moderation event");
            }
        }

        Ok(event)
    }

    /// The claimed report for report-bound actions, after checking that the
    /// actor holds the claim and the report concerns the target.
    async fn claimed_report(
        &self,
        request: &ModerationRequest,
    ) -> AppResult<Option<abuse_report::Model>> {
        let report_id = request.params.report_id.as_deref();

        if !request.action.is_report_bound() {
            if report_id.is_some() {
                return Err(AppError::Validation(format!(
                    "{:?} is not applied through a report",
                    request.action
                )));
            }
            return Ok(None);
        }

        let report_id = report_id.ok_or_else(|| {
            AppError::Validation(format!("{:?} requires a report id", request.action))
        })?;

        let report = self
            .reports
            .require_claim_holder(report_id, &request.actor_id)
            .await?;

        if report.reported_user_id != request.target_user_id {
            return Err(AppError::Validation(format!(
                "Report {} does not concern user {}",
                report.id, request.target_user_id
            )));
        }

        Ok(Some(report))
    }

    async fn close_report(
        &self,
        report: &abuse_report::Model,
        moderator_id: &str,
        kind: ResolutionKind,
    ) -> AppResult<()> {
        if self.reports.close(report, moderator_id, kind).await?.is_some() {
            return Ok(());
        }

        // The report moved since the claim check; report why.
        self.reports
            .require_claim_holder(&report.id, moderator_id)
            .await?;
        Err(AppError::Internal(format!(
            "Report {} changed while being closed",
            report.id
        )))
    }

    async fn compensate(&self, applied: &AppliedChange, actor_id: &str, report_id: &str) {
        match self.accounts.revert(applied, actor_id).await {
            Ok(true) => {
                info!(
                    user_id = %applied.current.id,
                    report_id = %report_id,
                    "Rolled back account change after report close failed"
                );
            }
            Ok(false) => {
                error!(
                    user_id = %applied.current.id,
                    report_id = %report_id,
                    "Account changed concurrently; could not roll back"
                );
            }
            Err(e) => {
                error!(
                    error = %e,
                    user_id = %applied.current.id,
                    report_id = %report_id,
                    "Failed to roll back account change"
                );
            }
        }
    }
}

/// Status write requested by `request`, or `None` for a plain rejection.
fn status_change(
    request: &ModerationRequest,
    report: Option<&abuse_report::Model>,
) -> Option<StatusChange> {
    let status = match request.action {
        ModerationAction::Suspend | ModerationAction::ResolveReportSuspend => {
            AccountStatus::Suspended
        }
        ModerationAction::Deactivate | ModerationAction::ResolveReportDeactivate => {
            AccountStatus::Deactivated
        }
        ModerationAction::Reactivate => AccountStatus::Active,
        ModerationAction::RejectReport => return None,
    };

    let reason = request
        .params
        .reason
        .clone()
        .filter(|r| !r.trim().is_empty())
        .or_else(|| report.map(|r| r.reason.clone()));

    Some(StatusChange {
        user_id: request.target_user_id.clone(),
        status,
        reason,
        moderator_id: request.actor_id.clone(),
        duration_days: request.params.duration_days,
        report_id: report.map(|r| r.id.clone()),
    })
}

fn event_for(request: &ModerationRequest, applied: &AppliedChange) -> ModerationEvent {
    let user_id = applied.current.id.clone();
    let report_id = request.params.report_id.clone();

    match applied.current.status {
        AccountStatus::Suspended => ModerationEvent::UserSuspended {
            user_id,
            days: request.params.duration_days.unwrap_or_default(),
            report_id,
        },
        AccountStatus::Deactivated => ModerationEvent::UserDeactivated { user_id, report_id },
        AccountStatus::Active => ModerationEvent::UserReactivated { user_id },
    }
}
