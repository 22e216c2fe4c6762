//! Role-scoped authorization for disciplinary actions.

use serde::{Deserialize, Serialize};
use trustmod_common::{AppError, AppResult};
use trustmod_db::entities::account::Role;

/// A moderation action an actor may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModerationAction {
    /// Direct suspension outside the report flow.
    Suspend,
    /// Direct deactivation outside the report flow.
    Deactivate,
    /// Return an account to active.
    Reactivate,
    /// Close a claimed report by suspending the reported user.
    ResolveReportSuspend,
    /// Close a claimed report by deactivating the reported user.
    ResolveReportDeactivate,
    /// Close a claimed report without touching the reported user.
    RejectReport,
}

impl ModerationAction {
    /// Every action, in table order.
    pub const ALL: [Self; 6] = [
        Self::Suspend,
        Self::Deactivate,
        Self::Reactivate,
        Self::ResolveReportSuspend,
        Self::ResolveReportDeactivate,
        Self::RejectReport,
    ];

    /// Whether the action closes a report and so needs the caller's claim.
    #[must_use]
    pub const fn is_report_bound(self) -> bool {
        matches!(
            self,
            Self::ResolveReportSuspend | Self::ResolveReportDeactivate | Self::RejectReport
        )
    }
}

/// The fixed authorization table.
pub struct AuthorizationMatrix;

impl AuthorizationMatrix {
    /// Whether `actor` may apply `action` to an account with role `target`.
    ///
    /// Only admins act. Admin accounts are never a valid target, and report
    /// resolutions only reach the roles a report can be filed against.
    #[must_use]
    pub const fn is_allowed(actor: Role, target: Role, action: ModerationAction) -> bool {
        if !Self::may_review(actor) {
            return false;
        }

        match action {
            ModerationAction::Suspend
            | ModerationAction::Deactivate
            | ModerationAction::Reactivate => {
                matches!(target, Role::Elderly | Role::Volunteer | Role::Caregiver)
            }
            ModerationAction::ResolveReportSuspend | ModerationAction::ResolveReportDeactivate => {
                target.is_reportable()
            }
            ModerationAction::RejectReport => true,
        }
    }

    /// Whether `actor` may claim reports for review.
    #[must_use]
    pub const fn may_review(actor: Role) -> bool {
        matches!(actor, Role::Admin)
    }

    /// [`Self::may_review`], as a result.
    pub fn authorize_review(actor: Role) -> AppResult<()> {
        if Self::may_review(actor) {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "{actor:?} may not review reports"
            )))
        }
    }

    /// [`Self::is_allowed`], as a result.
    pub fn authorize(actor: Role, target: Role, action: ModerationAction) -> AppResult<()> {
        if Self::is_allowed(actor, target, action) {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "{actor:?} may not apply {action:?} to a {target:?} account"
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ROLES: [Role; 4] = [Role::Elderly, Role::Volunteer, Role::Caregiver, Role::Admin];

    #[test]
    fn test_non_admins_are_always_denied() {
        for actor in [Role::Elderly, Role::Volunteer, Role::Caregiver] {
            for target in ROLES {
                for action in ModerationAction::ALL {
                    assert!(
                        !AuthorizationMatrix::is_allowed(actor, target, action),
                        "{actor:?} -> {target:?} {action:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_direct_actions_cover_non_admins() {
        for action in [
            ModerationAction::Suspend,
            ModerationAction::Deactivate,
            ModerationAction::Reactivate,
        ] {
            assert!(AuthorizationMatrix::is_allowed(Role::Admin, Role::Elderly, action));
            assert!(AuthorizationMatrix::is_allowed(Role::Admin, Role::Volunteer, action));
            assert!(AuthorizationMatrix::is_allowed(Role::Admin, Role::Caregiver, action));
            assert!(!AuthorizationMatrix::is_allowed(Role::Admin, Role::Admin, action));
        }
    }

    #[test]
    fn test_report_resolutions_exclude_caregivers() {
        for action in [
            ModerationAction::ResolveReportSuspend,
            ModerationAction::ResolveReportDeactivate,
        ] {
            assert!(AuthorizationMatrix::is_allowed(Role::Admin, Role::Elderly, action));
            assert!(AuthorizationMatrix::is_allowed(Role::Admin, Role::Volunteer, action));
            assert!(!AuthorizationMatrix::is_allowed(Role::Admin, Role::Caregiver, action));
            assert!(!AuthorizationMatrix::is_allowed(Role::Admin, Role::Admin, action));
        }
    }

    #[test]
    fn test_reject_ignores_target_role() {
        for target in ROLES {
            assert!(AuthorizationMatrix::is_allowed(
                Role::Admin,
                target,
                ModerationAction::RejectReport
            ));
        }
    }

    #[test]
    fn test_only_admins_review() {
        assert!(AuthorizationMatrix::may_review(Role::Admin));
        for actor in [Role::Elderly, Role::Volunteer, Role::Caregiver] {
            assert!(!AuthorizationMatrix::may_review(actor));
            assert!(matches!(
                AuthorizationMatrix::authorize_review(actor).unwrap_err(),
                AppError::Unauthorized(_)
            ));
        }
    }

    #[test]
    fn test_authorize_error_kind() {
        let err = AuthorizationMatrix::authorize(
            Role::Volunteer,
            Role::Elderly,
            ModerationAction::Suspend,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }
}
