//! Collaborator onboarding workflow.
//!
//! Accounts apply with their settlement terms; an admin approves or rejects
//! each pending request once. Approval elevates the applicant to an approved
//! collaborator in the same transaction that resolves the request.

use std::collections::HashMap;

use atelier_common::{AppError, AppResult, IdGenerator};
use atelier_db::{
    entities::{collaborator_request, collaborator_request::RequestStatus, user},
    repositories::{CollaboratorRequestRepository, UserRepository},
    transition::{Application, Decision, Transition, TransitionOutcome, TransitionStore},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

/// Input for applying as a collaborator.
///
/// Missing fields deserialize to empty values so they surface as
/// validation errors rather than body rejections.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "bankAccount is required"))]
    pub bank_account: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "bankName is required"))]
    pub bank_name: String,

    #[serde(default)]
    #[validate(
        required(message = "commissionRate is required"),
        range(min = 0.0, max = 100.0, message = "commissionRate must be between 0 and 100")
    )]
    pub commission_rate: Option<f64>,
}

impl SubmitApplicationInput {
    fn normalized(self) -> Self {
        Self {
            bank_account: self.bank_account.trim().to_string(),
            bank_name: self.bank_name.trim().to_string(),
            commission_rate: self.commission_rate,
        }
    }
}

/// Applicant identity shown alongside a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantSummary {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Resolver identity shown alongside a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverSummary {
    pub id: String,
    pub username: String,
}

/// A request enriched with applicant and resolver identities.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    #[serde(flatten)]
    pub request: collaborator_request::Model,
    pub applicant: Option<ApplicantSummary>,
    pub resolver: Option<ResolverSummary>,
}

/// Collaborator workflow service.
#[derive(Clone)]
pub struct CollaboratorService {
    transitions: TransitionStore,
    request_repo: CollaboratorRequestRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CollaboratorService {
    /// Create a new collaborator service.
    #[must_use]
    pub const fn new(
        transitions: TransitionStore,
        request_repo: CollaboratorRequestRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            transitions,
            request_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a collaborator application for `account_id`.
    pub async fn submit_application(
        &self,
        account_id: &str,
        input: SubmitApplicationInput,
    ) -> AppResult<collaborator_request::Model> {
        let input = input.normalized();
        input.validate()?;

        let commission_rate = input
            .commission_rate
            .filter(|r| r.is_finite())
            .ok_or_else(|| AppError::Validation("commissionRate must be a number".to_string()))?;

        let request = self
            .transitions
            .submit(Application {
                id: self.id_gen.generate(),
                user_id: account_id.to_string(),
                bank_account: input.bank_account,
                bank_name: input.bank_name,
                commission_rate,
                at: chrono::Utc::now().into(),
            })
            .await?;

        info!(
            request_id = %request.id,
            user_id = %account_id,
            commission_rate,
            "Collaborator application submitted"
        );

        Ok(request)
    }

    /// Approve or reject a pending request.
    pub async fn resolve_request(
        &self,
        request_id: &str,
        admin_id: &str,
        decision: Decision,
    ) -> AppResult<TransitionOutcome> {
        let transition = Transition {
            request_id: request_id.to_string(),
            resolver_id: admin_id.to_string(),
            at: chrono::Utc::now().into(),
            decision,
        };

        let outcome = self.transitions.apply(&transition).await?;

        info!(
            request_id = %request_id,
            admin_id = %admin_id,
            status = outcome.request.status.as_str(),
            user_id = %outcome.request.user_id,
            "Collaborator request resolved"
        );

        Ok(outcome)
    }

    /// List requests newest first, optionally filtered by status.
    pub async fn list_requests(&self, status: Option<RequestStatus>) -> AppResult<Vec<RequestView>> {
        let requests = self.request_repo.list(status).await?;

        let mut ids: Vec<String> = requests
            .iter()
            .flat_map(|r| std::iter::once(r.user_id.clone()).chain(r.approved_by.clone()))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let accounts: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        debug!(count = requests.len(), "Listed collaborator requests");

        Ok(requests
            .into_iter()
            .map(|request| RequestView {
                applicant: accounts.get(&request.user_id).map(|u| ApplicantSummary {
                    id: u.id.clone(),
                    username: u.username.clone(),
                    email: u.email.clone(),
                }),
                resolver: request
                    .approved_by
                    .as_ref()
                    .and_then(|id| accounts.get(id))
                    .map(|u| ResolverSummary {
                        id: u.id.clone(),
                        username: u.username.clone(),
                    }),
                request,
            })
            .collect())
    }

    /// Get the caller's collaborator profile.
    pub async fn my_collaborator_info(&self, account_id: &str) -> AppResult<user::Model> {
        let account = self.user_repo.get_by_id(account_id).await?;

        if !account.is_collaborator() {
            return Err(AppError::NotACollaborator);
        }

        Ok(account)
    }
}
