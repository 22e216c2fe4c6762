//! Suspension expiry rules.
//!
//! Every check of "is this user still suspended" goes through
//! [`SuspensionClock`], so the read path and the write path cannot disagree
//! about when a suspension ends.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use trustmod_common::{AppError, AppResult};
use trustmod_db::entities::account::{self, AccountStatus};

/// Actor recorded when a suspension lapses on its own.
pub const AUTO_EXPIRY_ACTOR: &str = "system:auto-expiry";

/// Allowed suspension lengths in days.
pub const ALLOWED_SUSPENSION_DAYS: [u32; 3] = [7, 30, 90];

/// A suspension length from the closed set of allowed durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SuspensionDuration {
    Week,
    Month,
    Quarter,
}

impl SuspensionDuration {
    /// Length in days.
    #[must_use]
    pub const fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    /// Parse a day count. Anything outside `{7, 30, 90}` is rejected, never clamped.
    pub fn from_days(days: u32) -> AppResult<Self> {
        match days {
            7 => Ok(Self::Week),
            30 => Ok(Self::Month),
            90 => Ok(Self::Quarter),
            other => Err(AppError::InvalidTransition(format!(
                "Suspension duration must be one of {ALLOWED_SUSPENSION_DAYS:?} days, got {other}"
            ))),
        }
    }

    /// Expiry instant for a suspension starting at `from`.
    #[must_use]
    pub fn expires_at(self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + Duration::days(i64::from(self.days()))
    }
}

impl TryFrom<u32> for SuspensionDuration {
    type Error = AppError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        Self::from_days(days)
    }
}

impl From<SuspensionDuration> for u32 {
    fn from(duration: SuspensionDuration) -> Self {
        duration.days()
    }
}

/// Stateless expiry evaluation.
pub struct SuspensionClock;

impl SuspensionClock {
    /// Whether a suspension ending at `expires_at` is over at `now`.
    #[must_use]
    pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now >= expires_at
    }

    /// Whether `account` is suspended with an expiry that has passed.
    #[must_use]
    pub fn has_lapsed(account: &account::Model, now: DateTime<Utc>) -> bool {
        account.status == AccountStatus::Suspended
            && account
                .suspension_expires_at
                .is_some_and(|at| Self::is_expired(at.with_timezone(&Utc), now))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use trustmod_db::entities::account::Role;

    fn suspended_until(expires_at: DateTime<Utc>) -> account::Model {
        account::Model {
            id: "user1".to_string(),
            role: Role::Elderly,
            status: AccountStatus::Suspended,
            suspension_expires_at: Some(expires_at.into()),
            status_reason: Some("spam".to_string()),
            status_changed_by: Some("admin1".to_string()),
            status_changed_at: None,
            version: 1,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_is_expired_boundary() {
        let now = Utc::now();
        assert!(SuspensionClock::is_expired(now, now));
        assert!(SuspensionClock::is_expired(now - Duration::seconds(1), now));
        assert!(!SuspensionClock::is_expired(now + Duration::seconds(1), now));
    }

    #[test]
    fn test_allowed_durations() {
        for days in ALLOWED_SUSPENSION_DAYS {
            assert_eq!(SuspensionDuration::from_days(days).unwrap().days(), days);
        }
        for days in [0, 1, 8, 31, 365] {
            let err = SuspensionDuration::from_days(days).unwrap_err();
            assert!(matches!(err, AppError::InvalidTransition(_)));
        }
    }

    #[test]
    fn test_expires_at() {
        let now = Utc::now();
        assert_eq!(
            SuspensionDuration::Month.expires_at(now),
            now + Duration::days(30)
        );
    }

    #[test]
    fn test_has_lapsed() {
        let now = Utc::now();
        assert!(SuspensionClock::has_lapsed(&suspended_until(now - Duration::hours(1)), now));
        assert!(SuspensionClock::has_lapsed(&suspended_until(now), now));
        assert!(!SuspensionClock::has_lapsed(&suspended_until(now + Duration::hours(1)), now));

        let mut deactivated = suspended_until(now - Duration::hours(1));
        deactivated.status = AccountStatus::Deactivated;
        assert!(!SuspensionClock::has_lapsed(&deactivated, now));
    }

    #[test]
    fn test_deserialize_rejects_unlisted_duration() {
        let ok: SuspensionDuration = serde_json::from_str("90").unwrap();
        assert_eq!(ok, SuspensionDuration::Quarter);
        assert!(serde_json::from_str::<SuspensionDuration>("14").is_err());
    }
}
