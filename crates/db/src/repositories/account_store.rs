//! SQL-backed account store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use trustmod_common::{AppError, AppResult, IdGenerator};

use super::{AccountStore, StatusUpdate};
use crate::entities::{
    Account, AccountStatusHistory,
    account::{self, AccountStatus},
    account_status_history,
};

fn db_err(e: DbErr) -> AppError {
    AppError::Database(e.to_string())
}

/// Account store on a sea-orm connection.
///
/// Status writes run `UPDATE account ... WHERE id = ? AND version = ?`
/// together with the history insert in one transaction.
#[derive(Clone)]
pub struct SeaOrmAccountStore {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl SeaOrmAccountStore {
    /// Create a new account store.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }
}

#[async_trait]
impl AccountStore for SeaOrmAccountStore {
    async fn insert(&self, model: account::Model) -> AppResult<account::Model> {
        let active = account::ActiveModel {
            id: Set(model.id.clone()),
            role: Set(model.role),
            status: Set(model.status),
            suspension_expires_at: Set(model.suspension_expires_at),
            status_reason: Set(model.status_reason.clone()),
            status_changed_by: Set(model.status_changed_by.clone()),
            status_changed_at: Set(model.status_changed_at),
            version: Set(model.version),
            created_at: Set(model.created_at),
        };

        match Account::insert(active)
            .exec_without_returning(self.db.as_ref())
            .await
        {
            Ok(_) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                AppError::Validation(format!("Account {} already exists", model.id)),
            ),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn find(&self, id: &str) -> AppResult<Option<account::Model>> {
        Account::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    async fn compare_and_set(
        &self,
        current: &account::Model,
        update: StatusUpdate,
    ) -> AppResult<Option<account::Model>> {
        let next = update.applied_to(current);
        let entry = update.history_entry(self.id_gen.generate_uuid_v7(), current);

        let txn = self.db.begin().await.map_err(db_err)?;

        let result = Account::update_many()
            .set(account::ActiveModel {
                status: Set(next.status),
                suspension_expires_at: Set(next.suspension_expires_at),
                status_reason: Set(next.status_reason.clone()),
                status_changed_by: Set(next.status_changed_by.clone()),
                status_changed_at: Set(next.status_changed_at),
                version: Set(next.version),
                ..Default::default()
            })
            .filter(account::Column::Id.eq(current.id.as_str()))
            .filter(account::Column::Version.eq(current.version))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Ok(None);
        }

        let history = account_status_history::ActiveModel {
            id: Set(entry.id),
            user_id: Set(entry.user_id),
            from_status: Set(entry.from_status),
            to_status: Set(entry.to_status),
            reason: Set(entry.reason),
            changed_by: Set(entry.changed_by),
            changed_at: Set(entry.changed_at),
            expires_at: Set(entry.expires_at),
            report_id: Set(entry.report_id),
        };
        AccountStatusHistory::insert(history)
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        Ok(Some(next))
    }

    async fn history(&self, id: &str) -> AppResult<Vec<account_status_history::Model>> {
        AccountStatusHistory::find()
            .filter(account_status_history::Column::UserId.eq(id))
            .order_by_asc(account_status_history::Column::ChangedAt)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    async fn find_expired_suspensions(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<account::Model>> {
        Account::find()
            .filter(account::Column::Status.eq(AccountStatus::Suspended))
            .filter(account::Column::SuspensionExpiresAt.lte(now))
            .order_by_asc(account::Column::SuspensionExpiresAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::account::Role;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_account(id: &str, status: AccountStatus) -> account::Model {
        account::Model {
            id: id.to_string(),
            role: Role::Volunteer,
            status,
            suspension_expires_at: None,
            status_reason: None,
            status_changed_by: None,
            status_changed_at: None,
            version: 0,
            created_at: Utc::now().into(),
        }
    }

    fn suspend_update() -> StatusUpdate {
        let now = Utc::now();
        StatusUpdate {
            status: AccountStatus::Suspended,
            suspension_expires_at: Some(now + Duration::days(7)),
            reason: Some("spam".to_string()),
            changed_by: "admin1".to_string(),
            changed_at: now,
            report_id: None,
        }
    }

    #[tokio::test]
    async fn test_find() {
        let account = create_test_account("user1", AccountStatus::Active);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account]])
                .into_connection(),
        );

        let store = SeaOrmAccountStore::new(db);
        let result = store.find("user1").await.unwrap().unwrap();

        assert_eq!(result.id, "user1");
        assert_eq!(result.role, Role::Volunteer);
    }

    #[tokio::test]
    async fn test_compare_and_set_applies() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let store = SeaOrmAccountStore::new(db);
        let current = create_test_account("user1", AccountStatus::Active);
        let result = store
            .compare_and_set(&current, suspend_update())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.status, AccountStatus::Suspended);
        assert_eq!(result.version, 1);
    }

    #[tokio::test]
    async fn test_compare_and_set_stale_version() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let store = SeaOrmAccountStore::new(db);
        let current = create_test_account("user1", AccountStatus::Active);
        let result = store
            .compare_and_set(&current, suspend_update())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_expired_suspensions() {
        let mut account = create_test_account("user1", AccountStatus::Suspended);
        account.suspension_expires_at = Some((Utc::now() - Duration::days(1)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account]])
                .into_connection(),
        );

        let store = SeaOrmAccountStore::new(db);
        let result = store
            .find_expired_suspensions(Utc::now(), 100)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
    }
}
