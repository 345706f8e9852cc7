//! Collaborator earnings statistics.

use std::collections::HashMap;

use atelier_common::AppResult;
use atelier_db::repositories::{ResourceRepository, UserRepository};
use serde::Serialize;

/// Earnings summary for one approved collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorStats {
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub bank_account: Option<String>,
    pub bank_name: Option<String>,
    pub commission_rate: f64,
    pub total_resource_count: i64,
    pub total_earnings: f64,
}

/// Read-only aggregation over approved collaborators.
#[derive(Clone)]
pub struct CollaboratorStatsService {
    user_repo: UserRepository,
    resource_repo: ResourceRepository,
}

impl CollaboratorStatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, resource_repo: ResourceRepository) -> Self {
        Self {
            user_repo,
            resource_repo,
        }
    }

    /// Per-collaborator resource counts and earnings, highest earnings first.
    pub async fn collaborator_stats(&self) -> AppResult<Vec<CollaboratorStats>> {
        let collaborators = self.user_repo.find_approved_collaborators().await?;
        let ids: Vec<String> = collaborators.iter().map(|c| c.id.clone()).collect();

        let totals: HashMap<String, (i64, f64)> = self
            .resource_repo
            .totals_by_owner(&ids)
            .await?
            .into_iter()
            .map(|t| (t.owner_id, (t.resource_count, t.price_total)))
            .collect();

        let mut stats: Vec<CollaboratorStats> = collaborators
            .into_iter()
            .map(|c| {
                let (count, price_total) = totals.get(&c.id).copied().unwrap_or((0, 0.0));
                CollaboratorStats {
                    total_earnings: earnings(price_total, c.commission_rate),
                    total_resource_count: count,
                    account_id: c.id,
                    username: c.username,
                    email: c.email,
                    bank_account: c.bank_account,
                    bank_name: c.bank_name,
                    commission_rate: c.commission_rate,
                }
            })
            .collect();

        stats.sort_by(|a, b| b.total_earnings.total_cmp(&a.total_earnings));

        tracing::debug!(collaborators = stats.len(), "Computed collaborator stats");

        Ok(stats)
    }
}

fn earnings(price_total: f64, commission_rate: f64) -> f64 {
    price_total * commission_rate / 100.0
}
