//! Collaborator request repository.
//!
//! Reads run against the pool; the `*_in` methods take an explicit
//! connection so the transition store can run them inside one transaction.

use std::sync::Arc;

use crate::entities::{CollaboratorRequest, collaborator_request, collaborator_request::RequestStatus};
use atelier_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, prelude::DateTimeWithTimeZone,
};

/// Fields written when a pending request is resolved.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub status: RequestStatus,
    pub resolver_id: String,
    pub resolved_at: DateTimeWithTimeZone,
    pub rejection_reason: Option<String>,
}

/// Collaborator request repository for database operations.
#[derive(Clone)]
pub struct CollaboratorRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl CollaboratorRequestRepository {
    /// Create a new collaborator request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a collaborator request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<collaborator_request::Model>> {
        self.find_by_id_in(self.db.as_ref(), id).await
    }

    /// List requests, newest first, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<collaborator_request::Model>> {
        let mut query =
            CollaboratorRequest::find().order_by_desc(collaborator_request::Column::CreatedAt);

        if let Some(s) = status {
            query = query.filter(collaborator_request::Column::Status.eq(s));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the applicant's live (pending or approved) request.
    pub async fn find_live_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Option<collaborator_request::Model>> {
        self.find_live_by_user_in(self.db.as_ref(), user_id).await
    }

    /// Find a collaborator request by ID on the given connection.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<collaborator_request::Model>> {
        CollaboratorRequest::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a collaborator request by ID and lock the row until the
    /// surrounding transaction ends.
    pub async fn find_for_update_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<collaborator_request::Model>> {
        CollaboratorRequest::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the applicant's live request on the given connection.
    pub async fn find_live_by_user_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<Option<collaborator_request::Model>> {
        CollaboratorRequest::find()
            .filter(collaborator_request::Column::UserId.eq(user_id))
            .filter(collaborator_request::Column::Status.is_in(RequestStatus::LIVE))
            .order_by_desc(collaborator_request::Column::CreatedAt)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new request on the given connection.
    ///
    /// The raw `DbErr` is returned so callers can recognise a unique
    /// violation on the live-request index.
    pub async fn insert_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: collaborator_request::ActiveModel,
    ) -> Result<collaborator_request::Model, sea_orm::DbErr> {
        model.insert(conn).await
    }

    /// Resolve a request only if it is still pending.
    ///
    /// Returns the number of rows written: `0` means another resolution
    /// committed first.
    pub async fn resolve_pending_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        resolution: &Resolution,
    ) -> AppResult<u64> {
        let changes = collaborator_request::ActiveModel {
            status: Set(resolution.status),
            approved_by: Set(Some(resolution.resolver_id.clone())),
            approved_at: Set(Some(resolution.resolved_at)),
            rejection_reason: Set(resolution.rejection_reason.clone()),
            updated_at: Set(resolution.resolved_at),
            ..Default::default()
        };

        let result = CollaboratorRequest::update_many()
            .set(changes)
            .filter(collaborator_request::Column::Id.eq(id))
            .filter(collaborator_request::Column::Status.eq(RequestStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
