//! Collaborator onboarding endpoints.

use atelier_common::{AppError, AppResult, LocalizedText};
use atelier_core::{
    CollaboratorStats, Decision, RequestView, SubmitApplicationInput,
};
use atelier_db::entities::{
    collaborator_request::{self, RequestStatus},
    user,
};
use axum::{
    Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{
        AuthUser, Authorized, JsonBody,
        gate::{Admin, ApprovedCollaborator},
    },
    middleware::AppState,
    response::ApiResponse,
};

/// Query for listing requests.
#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
}

impl ListRequestsQuery {
    fn status_filter(&self) -> AppResult<Option<RequestStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => RequestStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| AppError::Validation(format!("unknown status filter: {raw}"))),
        }
    }
}

/// Body for rejecting a request.
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Approval payload.
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub request: collaborator_request::Model,
    pub user: Option<user::Model>,
}

/// Rejection payload.
#[derive(Debug, Serialize)]
pub struct RejectionResponse {
    pub request: collaborator_request::Model,
}

/// Submit an application to become a collaborator.
async fn apply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SubmitApplicationInput>,
) -> AppResult<ApiResponse<collaborator_request::Model>> {
    let request = state
        .collaborator_service
        .submit_application(&user.id, input)
        .await?;

    Ok(ApiResponse::created(
        LocalizedText::new(
            "Đã gửi yêu cầu trở thành cộng tác viên thành công",
            "Request to become a collaborator has been submitted successfully",
        ),
        request,
    ))
}

/// Get the caller's collaborator profile.
async fn me(
    caller: Authorized<ApprovedCollaborator>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = caller.into_inner();
    let info = state
        .collaborator_service
        .my_collaborator_info(&user.id)
        .await?;

    Ok(ApiResponse::ok(
        LocalizedText::new(
            "Lấy thông tin cộng tác viên thành công",
            "Successfully retrieved collaborator information",
        ),
        info,
    ))
}

/// List requests (admin only).
async fn list_requests(
    _admin: Authorized<Admin>,
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> AppResult<ApiResponse<Vec<RequestView>>> {
    let requests = state
        .collaborator_service
        .list_requests(query.status_filter()?)
        .await?;

    Ok(ApiResponse::ok(
        LocalizedText::new(
            "Lấy danh sách yêu cầu thành công",
            "Successfully retrieved collaborator requests",
        ),
        requests,
    ))
}

/// Approve a pending request (admin only).
async fn approve(
    admin: Authorized<Admin>,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> AppResult<ApiResponse<ApprovalResponse>> {
    let admin = admin.into_inner();
    let outcome = state
        .collaborator_service
        .resolve_request(&request_id, &admin.id, Decision::Approve)
        .await?;

    Ok(ApiResponse::ok(
        LocalizedText::new("Đã duyệt yêu cầu thành công", "Request approved successfully"),
        ApprovalResponse {
            request: outcome.request,
            user: outcome.account,
        },
    ))
}

/// Reject a pending request (admin only).
async fn reject(
    admin: Authorized<Admin>,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    JsonBody(body): JsonBody<RejectRequest>,
) -> AppResult<ApiResponse<RejectionResponse>> {
    let admin = admin.into_inner();
    let outcome = state
        .collaborator_service
        .resolve_request(&request_id, &admin.id, Decision::reject(body.reason))
        .await?;

    Ok(ApiResponse::ok(
        LocalizedText::new("Đã từ chối yêu cầu thành công", "Request rejected successfully"),
        RejectionResponse {
            request: outcome.request,
        },
    ))
}

/// Per-collaborator earnings (admin only).
async fn stats(
    _admin: Authorized<Admin>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CollaboratorStats>>> {
    let stats = state
        .collaborator_stats_service
        .collaborator_stats()
        .await?;

    Ok(ApiResponse::ok(
        LocalizedText::new(
            "Lấy thống kê cộng tác viên thành công",
            "Successfully retrieved collaborator statistics",
        ),
        stats,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apply", post(apply))
        .route("/me", get(me))
        .route("/requests", get(list_requests))
        .route("/requests/{request_id}/approve", put(approve))
        .route("/requests/{request_id}/reject", put(reject))
        .route("/stats", get(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_parsing() {
        let query = |s: Option<&str>| ListRequestsQuery {
            status: s.map(String::from),
        };

        assert!(matches!(query(None).status_filter(), Ok(None)));
        assert!(matches!(query(Some("")).status_filter(), Ok(None)));
        assert!(matches!(
            query(Some("approved")).status_filter(),
            Ok(Some(RequestStatus::Approved))
        ));
        assert!(matches!(
            query(Some("archived")).status_filter(),
            Err(AppError::Validation(_))
        ));
    }
}
