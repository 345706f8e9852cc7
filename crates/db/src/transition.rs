//! Collaborator request state transitions.
//!
//! A [`Transition`] carries every mutation one resolution implies: the request
//! status write and, on approval, the account grant. [`TransitionStore::apply`]
//! runs them inside a single database transaction so the request store and the
//! account directory commit together or not at all.

use std::sync::Arc;

use crate::entities::{
    collaborator_request::{self, RequestStatus},
    user::{self, Role},
};
use crate::repositories::{CollaboratorRequestRepository, Resolution, UserRepository};
use atelier_common::{AppError, AppResult};
use sea_orm::{
    ActiveValue::Unchanged, DatabaseConnection, DatabaseTransaction, Set, SqlErr,
    TransactionTrait, prelude::DateTimeWithTimeZone,
};
use tracing::{debug, warn};

/// Outcome requested by the resolving admin.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Approve,
    Reject { reason: Option<String> },
}

impl Decision {
    /// Build a rejection, dropping a blank reason.
    #[must_use]
    pub fn reject(reason: Option<String>) -> Self {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Self::Reject { reason }
    }

    /// Status the request ends in.
    #[must_use]
    pub const fn target_status(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject { .. } => RequestStatus::Rejected,
        }
    }

    fn rejection_reason(&self) -> Option<String> {
        match self {
            Self::Approve => None,
            Self::Reject { reason } => reason.clone(),
        }
    }
}

/// A resolution of one pending request.
#[derive(Debug, Clone)]
pub struct Transition {
    pub request_id: String,
    pub resolver_id: String,
    pub at: DateTimeWithTimeZone,
    pub decision: Decision,
}

impl Transition {
    fn resolution(&self) -> Resolution {
        Resolution {
            status: self.decision.target_status(),
            resolver_id: self.resolver_id.clone(),
            resolved_at: self.at,
            rejection_reason: self.decision.rejection_reason(),
        }
    }

    /// Account fields granted when `request` is approved.
    #[must_use]
    pub fn account_grant(&self, request: &collaborator_request::Model) -> user::ActiveModel {
        user::ActiveModel {
            id: Unchanged(request.user_id.clone()),
            role: Set(Role::Collaborator),
            is_approved: Set(true),
            bank_account: Set(Some(request.bank_account.clone())),
            bank_name: Set(Some(request.bank_name.clone())),
            commission_rate: Set(request.commission_rate),
            approved_at: Set(Some(self.at)),
            approved_by: Set(Some(self.resolver_id.clone())),
            updated_at: Set(Some(self.at)),
            ..Default::default()
        }
    }

    fn resolved(&self, request: collaborator_request::Model) -> collaborator_request::Model {
        collaborator_request::Model {
            status: self.decision.target_status(),
            approved_by: Some(self.resolver_id.clone()),
            approved_at: Some(self.at),
            rejection_reason: self.decision.rejection_reason(),
            updated_at: self.at,
            ..request
        }
    }
}

/// A new application ready to be stored.
#[derive(Debug, Clone)]
pub struct Application {
    pub id: String,
    pub user_id: String,
    pub bank_account: String,
    pub bank_name: String,
    pub commission_rate: f64,
    pub at: DateTimeWithTimeZone,
}

impl From<Application> for collaborator_request::ActiveModel {
    fn from(app: Application) -> Self {
        Self {
            id: Set(app.id),
            user_id: Set(app.user_id),
            status: Set(RequestStatus::Pending),
            bank_account: Set(app.bank_account),
            bank_name: Set(app.bank_name),
            commission_rate: Set(app.commission_rate),
            approved_by: Set(None),
            approved_at: Set(None),
            rejection_reason: Set(None),
            created_at: Set(app.at),
            updated_at: Set(app.at),
        }
    }
}

/// Result of an applied transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub request: collaborator_request::Model,
    /// Updated account, present on approval.
    pub account: Option<user::Model>,
}

/// Transactional boundary over the request store and account directory.
#[derive(Clone)]
pub struct TransitionStore {
    db: Arc<DatabaseConnection>,
    requests: CollaboratorRequestRepository,
    accounts: UserRepository,
}

impl TransitionStore {
    /// Create a new transition store.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            requests: CollaboratorRequestRepository::new(Arc::clone(&db)),
            accounts: UserRepository::new(Arc::clone(&db)),
            db,
        }
    }

    /// Store a new pending request unless the applicant already has a live one.
    pub async fn submit(&self, app: Application) -> AppResult<collaborator_request::Model> {
        let user_id = app.user_id.clone();
        let txn = self.begin().await?;

        match self.submit_in(&txn, app).await {
            Ok(inserted) => {
                txn.commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(inserted)
            }
            // Unique index fired: a concurrent submit committed first.
            Err(AppError::DuplicateRequest { existing }) if existing.is_null() => {
                rollback(txn).await;
                debug!(user_id = %user_id, "Concurrent application lost the live-request race");
                Err(self
                    .requests
                    .find_live_by_user(&user_id)
                    .await?
                    .map_or(AppError::DuplicateRequest { existing }, |winner| {
                        duplicate(&winner)
                    }))
            }
            Err(e) => {
                rollback(txn).await;
                Err(e)
            }
        }
    }

    async fn submit_in(
        &self,
        txn: &DatabaseTransaction,
        app: Application,
    ) -> AppResult<collaborator_request::Model> {
        if let Some(existing) = self.requests.find_live_by_user_in(txn, &app.user_id).await? {
            return Err(duplicate(&existing));
        }

        self.requests
            .insert_in(txn, app.into())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateRequest {
                    existing: serde_json::Value::Null,
                },
                _ => AppError::Database(e.to_string()),
            })
    }

    /// Apply a resolution atomically.
    ///
    /// Any failure after the transaction has begun rolls it back before the
    /// error is returned.
    pub async fn apply(&self, transition: &Transition) -> AppResult<TransitionOutcome> {
        let txn = self.begin().await?;

        match self.apply_in(&txn, transition).await {
            Ok(outcome) => {
                txn.commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(outcome)
            }
            Err(e) => {
                rollback(txn).await;
                Err(e)
            }
        }
    }

    async fn apply_in(
        &self,
        txn: &DatabaseTransaction,
        transition: &Transition,
    ) -> AppResult<TransitionOutcome> {
        let id = transition.request_id.as_str();

        let request = self
            .requests
            .find_for_update_in(txn, id)
            .await?
            .ok_or_else(|| AppError::RequestNotFound(id.to_string()))?;

        let target = transition.decision.target_status();
        if !request.status.can_transition_to(target) {
            return Err(already_processed(request.status));
        }

        let written = self
            .requests
            .resolve_pending_in(txn, id, &transition.resolution())
            .await?;

        // Guarded write matched nothing: another resolution got there first.
        if written == 0 {
            return match self.requests.find_by_id_in(txn, id).await? {
                Some(current) => Err(already_processed(current.status)),
                None => Err(AppError::RequestNotFound(id.to_string())),
            };
        }

        let account = match transition.decision {
            Decision::Approve => Some(
                self.accounts
                    .update_fields_in(txn, transition.account_grant(&request))
                    .await?,
            ),
            Decision::Reject { .. } => None,
        };

        Ok(TransitionOutcome {
            request: transition.resolved(request),
            account,
        })
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        warn!(error = %e, "Failed to roll back transaction");
    }
}

fn duplicate(existing: &collaborator_request::Model) -> AppError {
    AppError::DuplicateRequest {
        existing: serde_json::to_value(existing).unwrap_or(serde_json::Value::Null),
    }
}

fn already_processed(status: RequestStatus) -> AppError {
    AppError::AlreadyProcessed {
        status: status.as_str().to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

    fn pending_request(id: &str, user_id: &str) -> collaborator_request::Model {
        let now = Utc::now();
        collaborator_request::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            status: RequestStatus::Pending,
            bank_account: "0123456789".to_string(),
            bank_name: "ACB".to_string(),
            commission_rate: 30.0,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn approved_account(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            token: None,
            role: Role::Collaborator,
            is_active: true,
            is_approved: true,
            bank_account: Some("0123456789".to_string()),
            bank_name: Some("ACB".to_string()),
            commission_rate: 30.0,
            approved_at: Some(Utc::now().into()),
            approved_by: Some("admin1".to_string()),
            created_at: Utc::now().into(),
            updated_at: Some(Utc::now().into()),
        }
    }

    fn transition(decision: Decision) -> Transition {
        Transition {
            request_id: "req1".to_string(),
            resolver_id: "admin1".to_string(),
            at: Utc::now().into(),
            decision,
        }
    }

    fn application() -> Application {
        Application {
            id: "req1".to_string(),
            user_id: "user1".to_string(),
            bank_account: "0123456789".to_string(),
            bank_name: "ACB".to_string(),
            commission_rate: 30.0,
            at: Utc::now().into(),
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn statements(log: &[Transaction]) -> String {
        format!("{log:?}")
    }

    #[test]
    fn test_reject_drops_blank_reason() {
        assert_eq!(
            Decision::reject(Some("   ".to_string())),
            Decision::Reject { reason: None }
        );
        assert_eq!(
            Decision::reject(Some(" Incomplete bank info ".to_string())),
            Decision::Reject {
                reason: Some("Incomplete bank info".to_string())
            }
        );
    }

    #[test]
    fn test_account_grant_copies_settlement_terms() {
        let request = pending_request("req1", "user1");
        let t = transition(Decision::Approve);
        let grant = t.account_grant(&request);

        assert_eq!(grant.id, Unchanged("user1".to_string()));
        assert_eq!(grant.role, Set(Role::Collaborator));
        assert_eq!(grant.is_approved, Set(true));
        assert_eq!(grant.bank_account, Set(Some("0123456789".to_string())));
        assert_eq!(grant.commission_rate, Set(30.0));
        assert_eq!(grant.approved_by, Set(Some("admin1".to_string())));
    }

    #[tokio::test]
    async fn test_submit_inserts_pending_request() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    Vec::<collaborator_request::Model>::new(),
                    vec![pending_request("req1", "user1")],
                ])
                .into_connection(),
        );

        let store = TransitionStore::new(db);
        let created = store.submit(application()).await.unwrap();

        assert_eq!(created.status, RequestStatus::Pending);
        assert_eq!(created.user_id, "user1");
    }

    #[tokio::test]
    async fn test_submit_rejects_live_duplicate() {
        let mut existing = pending_request("old", "user1");
        existing.status = RequestStatus::Approved;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let store = TransitionStore::new(db.clone());
        let result = store.submit(application()).await;

        match result {
            Err(AppError::DuplicateRequest { existing }) => {
                assert_eq!(existing["id"], "old");
                assert_eq!(existing["status"], "approved");
            }
            other => panic!("expected DuplicateRequest, got {other:?}"),
        }

        drop(store);
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert!(!statements(&log).contains("INSERT"));
    }

    #[tokio::test]
    async fn test_approve_updates_request_and_account() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_request("req1", "user1")]])
                .append_exec_results([exec(1)])
                .append_query_results([[approved_account("user1")]])
                .into_connection(),
        );

        let store = TransitionStore::new(db.clone());
        let outcome = store.apply(&transition(Decision::Approve)).await.unwrap();

        assert_eq!(outcome.request.status, RequestStatus::Approved);
        assert_eq!(outcome.request.approved_by.as_deref(), Some("admin1"));
        let account = outcome.account.unwrap();
        assert_eq!(account.role, Role::Collaborator);
        assert!(account.is_approved);

        drop(store);
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = statements(&log);
        assert!(sql.contains("FOR UPDATE"));
        assert!(sql.contains("UPDATE \\\"collaborator_request\\\""));
        assert!(sql.contains("UPDATE \\\"user\\\""));
    }

    #[tokio::test]
    async fn test_reject_leaves_account_untouched() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_request("req1", "user1")]])
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let store = TransitionStore::new(db.clone());
        let outcome = store
            .apply(&transition(Decision::reject(Some(
                "Incomplete bank info".to_string(),
            ))))
            .await
            .unwrap();

        assert_eq!(outcome.request.status, RequestStatus::Rejected);
        assert_eq!(
            outcome.request.rejection_reason.as_deref(),
            Some("Incomplete bank info")
        );
        assert!(outcome.account.is_none());

        drop(store);
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert!(!statements(&log).contains("UPDATE \\\"user\\\""));
    }

    #[tokio::test]
    async fn test_apply_missing_request() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<collaborator_request::Model>::new()])
                .into_connection(),
        );

        let store = TransitionStore::new(db);
        let result = store.apply(&transition(Decision::Approve)).await;

        assert!(matches!(result, Err(AppError::RequestNotFound(id)) if id == "req1"));
    }

    #[tokio::test]
    async fn test_apply_already_processed_writes_nothing() {
        let mut resolved = pending_request("req1", "user1");
        resolved.status = RequestStatus::Rejected;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[resolved]])
                .into_connection(),
        );

        let store = TransitionStore::new(db.clone());
        let result = store.apply(&transition(Decision::Approve)).await;

        assert!(matches!(result, Err(AppError::AlreadyProcessed { status }) if status == "rejected"));

        drop(store);
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = statements(&log);
        // Only the locking read ran.
        assert!(sql.contains("FOR UPDATE"));
        assert!(!sql.contains("UPDATE \\\"collaborator_request\\\""));
        assert!(!sql.contains("UPDATE \\\"user\\\""));
        assert!(sql.contains("ROLLBACK"));
        assert!(!sql.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_apply_lost_race_reports_winner_status() {
        let mut winner = pending_request("req1", "user1");
        winner.status = RequestStatus::Approved;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_request("req1", "user1")]])
                .append_exec_results([exec(0)])
                .append_query_results([[winner]])
                .into_connection(),
        );

        let store = TransitionStore::new(db);
        let result = store.apply(&transition(Decision::reject(None))).await;

        assert!(matches!(result, Err(AppError::AlreadyProcessed { status }) if status == "approved"));
    }

    #[tokio::test]
    async fn test_approve_missing_account_rolls_back() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_request("req1", "ghost")]])
                .append_exec_results([exec(1)])
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let store = TransitionStore::new(db.clone());
        let result = store.apply(&transition(Decision::Approve)).await;

        assert!(matches!(result, Err(AppError::AccountNotFound(id)) if id == "ghost"));

        // The request write is undone with the missing account.
        drop(store);
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = statements(&log);
        assert!(sql.contains("UPDATE \\\"collaborator_request\\\""));
        assert!(sql.contains("ROLLBACK"));
        assert!(!sql.contains("COMMIT"));
    }
}
