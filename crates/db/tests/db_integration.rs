//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p atelier-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `atelier_test`)
//!   `TEST_DB_PASSWORD` (default: `atelier_test`)
//!   `TEST_DB_NAME` (default: `atelier_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use atelier_common::{AppError, IdGenerator};
use atelier_db::entities::{
    collaborator_request::RequestStatus,
    user::{self, Role},
};
use atelier_db::repositories::{CollaboratorRequestRepository, UserRepository};
use atelier_db::test_utils::{TestDatabase, TestDbConfig};
use atelier_db::transition::{Application, Decision, Transition, TransitionStore};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};

async fn seed_account(db: &Arc<DatabaseConnection>, username: &str) -> user::Model {
    let id = IdGenerator::new().generate();
    UserRepository::new(Arc::clone(db))
        .create(user::ActiveModel {
            id: Set(id),
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            token: Set(None),
            role: Set(Role::User),
            is_active: Set(true),
            is_approved: Set(false),
            bank_account: Set(None),
            bank_name: Set(None),
            commission_rate: Set(0.0),
            approved_at: Set(None),
            approved_by: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .expect("seed account")
}

fn application(user_id: &str) -> Application {
    Application {
        id: IdGenerator::new().generate(),
        user_id: user_id.to_string(),
        bank_account: "0123456789".to_string(),
        bank_name: "ACB".to_string(),
        commission_rate: 30.0,
        at: Utc::now().into(),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_submits_leave_one_live_request() {
    let test_db = TestDatabase::create_unique().await.expect("create database");
    let db = test_db.connection();
    let applicant = seed_account(&db, "alice").await;
    let store = TransitionStore::new(Arc::clone(&db));

    let attempts = (0..8).map(|_| store.submit(application(&applicant.id)));
    let results = futures::future::join_all(attempts).await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::DuplicateRequest { .. })))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, 7);

    let requests = CollaboratorRequestRepository::new(Arc::clone(&db))
        .list(None)
        .await
        .unwrap();
    assert_eq!(requests.len(), 1);

    drop(store);
    drop(db);
    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_resolutions_apply_once() {
    let test_db = TestDatabase::create_unique().await.expect("create database");
    let db = test_db.connection();
    let applicant = seed_account(&db, "bob").await;
    let admin = seed_account(&db, "root").await;
    let store = TransitionStore::new(Arc::clone(&db));

    let request = store.submit(application(&applicant.id)).await.unwrap();

    let approve = Transition {
        request_id: request.id.clone(),
        resolver_id: admin.id.clone(),
        at: Utc::now().into(),
        decision: Decision::Approve,
    };
    let reject = Transition {
        decision: Decision::reject(Some("Incomplete bank info".to_string())),
        ..approve.clone()
    };

    let (a, r) = futures::join!(store.apply(&approve), store.apply(&reject));
    let winners = [a.is_ok(), r.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);

    let loser = if a.is_ok() { r } else { a };
    assert!(matches!(loser, Err(AppError::AlreadyProcessed { .. })));

    // Request and account agree on the outcome.
    let stored = CollaboratorRequestRepository::new(Arc::clone(&db))
        .find_by_id(&request.id)
        .await
        .unwrap()
        .unwrap();
    let account = UserRepository::new(Arc::clone(&db))
        .get_by_id(&applicant.id)
        .await
        .unwrap();
    match stored.status {
        RequestStatus::Approved => {
            assert_eq!(account.role, Role::Collaborator);
            assert!(account.is_approved);
            assert_eq!(account.commission_rate, 30.0);
        }
        RequestStatus::Rejected => {
            assert_eq!(account.role, Role::User);
            assert!(!account.is_approved);
        }
        RequestStatus::Pending => panic!("request left pending"),
    }

    drop(store);
    drop(db);
    test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_reapply_after_rejection() {
    let test_db = TestDatabase::create_unique().await.expect("create database");
    let db = test_db.connection();
    let applicant = seed_account(&db, "carol").await;
    let admin = seed_account(&db, "root").await;
    let store = TransitionStore::new(Arc::clone(&db));

    let first = store.submit(application(&applicant.id)).await.unwrap();
    store
        .apply(&Transition {
            request_id: first.id.clone(),
            resolver_id: admin.id.clone(),
            at: Utc::now().into(),
            decision: Decision::reject(None),
        })
        .await
        .unwrap();

    let second = store.submit(application(&applicant.id)).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(second.status, RequestStatus::Pending);

    drop(store);
    drop(db);
    test_db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
