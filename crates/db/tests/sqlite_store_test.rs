//! Store tests against a migrated in-memory SQLite database.
//!
//! These exercise the real conditional `UPDATE` statements, so a lost
//! compare-and-set shows up as zero affected rows rather than a mocked one.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use trustmod_db::entities::{
    abuse_report::{self, ReportStatus, Resolution, ResolutionKind},
    account::{self, AccountStatus, Role},
};
use trustmod_db::repositories::{
    AccountStore, ReportStore, ReportTransition, SeaOrmAccountStore, SeaOrmReportStore,
    StatusUpdate,
};
use trustmod_db::test_utils::TestDatabase;

fn new_account(id: &str, role: Role) -> account::Model {
    account::Model {
        id: id.to_string(),
        role,
        status: AccountStatus::Active,
        suspension_expires_at: None,
        status_reason: None,
        status_changed_by: None,
        status_changed_at: None,
        version: 0,
        created_at: Utc::now().into(),
    }
}

fn new_report(id: &str) -> abuse_report::Model {
    abuse_report::Model {
        id: id.to_string(),
        reporter_id: "reporter".to_string(),
        reported_user_id: "elder".to_string(),
        reason: "harassment".to_string(),
        description: "Repeated rude messages".to_string(),
        attachments: serde_json::json!(["evidence/1.png"]),
        status: ReportStatus::Pending,
        claimed_by: None,
        claimed_at: None,
        resolution_action: None,
        resolution_days: None,
        resolved_by: None,
        resolved_at: None,
        created_at: Utc::now().into(),
    }
}

fn claim_by(moderator: &str) -> ReportTransition {
    ReportTransition {
        status: ReportStatus::InProgress,
        claimed_by: Some(moderator.to_string()),
        claimed_at: Some(Utc::now()),
        resolution: None,
    }
}

#[tokio::test]
async fn test_account_compare_and_set_records_history() {
    let db = TestDatabase::sqlite().await.unwrap();
    let store = SeaOrmAccountStore::new(db.connection());

    let current = store.insert(new_account("elder", Role::Elderly)).await.unwrap();
    let now = Utc::now();
    let update = StatusUpdate {
        status: AccountStatus::Suspended,
        suspension_expires_at: Some(now + Duration::days(30)),
        reason: Some("harassment".to_string()),
        changed_by: "admin1".to_string(),
        changed_at: now,
        report_id: None,
    };

    let applied = store
        .compare_and_set(&current, update.clone())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(applied.version, 1);

    // The snapshot at version 0 is stale now.
    assert!(store.compare_and_set(&current, update).await.unwrap().is_none());

    let stored = store.find("elder").await.unwrap().unwrap();
    assert_eq!(stored.status, AccountStatus::Suspended);
    assert_eq!(stored.version, 1);

    let history = store.history("elder").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_status, AccountStatus::Active);
    assert_eq!(history[0].changed_by, "admin1");
}

#[tokio::test]
async fn test_duplicate_account_is_validation_error() {
    let db = TestDatabase::sqlite().await.unwrap();
    let store = SeaOrmAccountStore::new(db.connection());

    store.insert(new_account("elder", Role::Elderly)).await.unwrap();
    let err = store
        .insert(new_account("elder", Role::Elderly))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_report_claim_is_single_winner() {
    let db = TestDatabase::sqlite().await.unwrap();
    let accounts = SeaOrmAccountStore::new(db.connection());
    let reports = SeaOrmReportStore::new(db.connection());

    accounts.insert(new_account("reporter", Role::Volunteer)).await.unwrap();
    accounts.insert(new_account("elder", Role::Elderly)).await.unwrap();
    let pending = reports.insert(new_report("r1")).await.unwrap();

    let first = reports.transition(&pending, claim_by("admin1")).await.unwrap();
    let second = reports.transition(&pending, claim_by("admin2")).await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());

    let stored = reports.find("r1").await.unwrap().unwrap();
    assert_eq!(stored.status, ReportStatus::InProgress);
    assert_eq!(stored.claimed_by.as_deref(), Some("admin1"));
    assert_eq!(stored.attachment_refs(), vec!["evidence/1.png"]);
}

#[tokio::test]
async fn test_closed_report_keeps_resolution() {
    let db = TestDatabase::sqlite().await.unwrap();
    let accounts = SeaOrmAccountStore::new(db.connection());
    let reports = SeaOrmReportStore::new(db.connection());

    accounts.insert(new_account("reporter", Role::Volunteer)).await.unwrap();
    accounts.insert(new_account("elder", Role::Elderly)).await.unwrap();
    let pending = reports.insert(new_report("r1")).await.unwrap();
    let claimed = reports
        .transition(&pending, claim_by("admin1"))
        .await
        .unwrap()
        .unwrap();

    let resolved = reports
        .transition(
            &claimed,
            ReportTransition {
                status: ReportStatus::Resolved,
                claimed_by: None,
                claimed_at: None,
                resolution: Some(Resolution {
                    kind: ResolutionKind::Suspend { days: 30 },
                    moderator_id: "admin1".to_string(),
                    resolved_at: Utc::now(),
                }),
            },
        )
        .await
        .unwrap()
        .unwrap();

    // Terminal: nothing moves it again.
    assert!(reports
        .transition(&resolved, claim_by("admin2"))
        .await
        .unwrap()
        .is_none());

    let stored = reports.find("r1").await.unwrap().unwrap();
    let resolution = stored.resolution().unwrap();
    assert_eq!(resolution.kind, ResolutionKind::Suspend { days: 30 });
    assert_eq!(resolution.moderator_id, "admin1");
    assert_eq!(
        reports.count_by_status(ReportStatus::Resolved).await.unwrap(),
        1
    );
}
