//! User service.

use atelier_common::{AppError, AppResult};
use atelier_db::{entities::user, repositories::UserRepository};

/// User service for account lookups and token authentication.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Authenticate a user by access token.
    ///
    /// Deactivated accounts are treated as unauthenticated.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_db::entities::user::Role;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, is_active: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            token: Some("test_token".to_string()),
            role: Role::User,
            is_active,
            is_approved: false,
            bank_account: None,
            bank_name: None,
            commission_rate: 0.0,
            approved_at: None,
            approved_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> UserService {
        UserService::new(UserRepository::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn test_authenticate_by_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("user1", true)]])
            .into_connection();

        let user = service_with(db)
            .authenticate_by_token("test_token")
            .await
            .unwrap();

        assert_eq!(user.id, "user1");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let result = service_with(db).authenticate_by_token("nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_inactive_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("user1", false)]])
            .into_connection();

        let result = service_with(db).authenticate_by_token("test_token").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let result = service_with(db).get("missing").await;

        assert!(matches!(result, Err(AppError::AccountNotFound(_))));
    }
}
