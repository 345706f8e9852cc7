//! Resource repository.

use std::sync::Arc;

use crate::entities::{Resource, resource};
use atelier_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QuerySelect,
};

/// Per-owner resource aggregate.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct OwnerTotals {
    pub owner_id: String,
    pub resource_count: i64,
    pub price_total: f64,
}

/// Resource repository for database operations.
#[derive(Clone)]
pub struct ResourceRepository {
    db: Arc<DatabaseConnection>,
}

impl ResourceRepository {
    /// Create a new resource repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Count resources and sum their prices for each of the given owners.
    ///
    /// Owners without resources are absent from the result.
    pub async fn totals_by_owner(&self, owner_ids: &[String]) -> AppResult<Vec<OwnerTotals>> {
        if owner_ids.is_empty() {
            return Ok(vec![]);
        }

        Resource::find()
            .filter(resource::Column::OwnerId.is_in(owner_ids.to_vec()))
            .select_only()
            .column(resource::Column::OwnerId)
            .column_as(resource::Column::Id.count(), "resource_count")
            .column_as(resource::Column::Price.sum(), "price_total")
            .group_by(resource::Column::OwnerId)
            .into_model::<OwnerTotals>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
