//! services/api/src/web/admin.rs
//!
//! Admin triage endpoints. All of them sit behind `require_auth` + `require_admin`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use protolab_core::domain::RequestType;
use protolab_core::ports::PortError;
use protolab_core::triage::TriageError;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::web::protocol::{
    parse_status_filter, ListRequestsQuery, ReplyBody, RequestDetailsResponse, RequestDto,
    RequestListResponse, SolveBody,
};
use crate::web::state::AppState;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Maps a triage failure onto the HTTP status the admin UI reacts to.
fn triage_error_response(e: TriageError) -> (StatusCode, String) {
    let status = match &e {
        TriageError::Busy => StatusCode::CONFLICT,
        TriageError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
        TriageError::UnknownRequest(_) | TriageError::Remote(PortError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        TriageError::Remote(PortError::Unauthorized) => StatusCode::UNAUTHORIZED,
        TriageError::Remote(PortError::Unexpected(_)) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

fn parse_type(raw: &str) -> ApiResult<RequestType> {
    raw.parse().map_err(|e: String| (StatusCode::BAD_REQUEST, e))
}

/// The request must be in the loaded list and its type must match the path.
async fn ensure_known(state: &AppState, request_type: RequestType, id: Uuid) -> ApiResult<()> {
    match state.triage.find(id).await {
        Some(r) if r.request_type == request_type => Ok(()),
        _ => Err(triage_error_response(TriageError::UnknownRequest(id))),
    }
}

async fn list_response(state: &AppState, status: Option<&str>) -> ApiResult<RequestListResponse> {
    let filter = parse_status_filter(status).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let requests = state
        .triage
        .requests(filter)
        .await
        .into_iter()
        .map(RequestDto::from)
        .collect();
    Ok(RequestListResponse {
        requests,
        counts: state.triage.counts().await.into(),
    })
}

/// Requests in one status tab, plus the count for every tab.
#[utoipa::path(
    get,
    path = "/admin/requests",
    params(ListRequestsQuery),
    responses(
        (status = 200, description = "Filtered request list", body = RequestListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_requests_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRequestsQuery>,
) -> ApiResult<Json<RequestListResponse>> {
    Ok(Json(list_response(&state, query.status.as_deref()).await?))
}

/// Re-fetch every request from the database.
#[utoipa::path(
    post,
    path = "/admin/requests/refresh",
    responses(
        (status = 200, description = "Fresh request list", body = RequestListResponse),
        (status = 502, description = "Request store unreachable")
    )
)]
pub async fn refresh_requests_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RequestListResponse>> {
    state.triage.refresh().await.map_err(triage_error_response)?;
    Ok(Json(list_response(&state, None).await?))
}

/// A request with its type-specific fields and reply history.
#[utoipa::path(
    get,
    path = "/admin/requests/{request_type}/{id}",
    params(
        ("request_type" = String, Path, description = "consulting, prototyping, firmware or ondemand"),
        ("id" = Uuid, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request details", body = RequestDetailsResponse),
        (status = 404, description = "Unknown request")
    )
)]
pub async fn request_details_handler(
    State(state): State<Arc<AppState>>,
    Path((request_type, id)): Path<(String, Uuid)>,
) -> ApiResult<Json<RequestDetailsResponse>> {
    let request_type = parse_type(&request_type)?;
    let details = state.triage.details(request_type, id).await.map_err(|e| {
        error!("Failed to load details for request {}: {:?}", id, e);
        triage_error_response(e)
    })?;
    Ok(Json(details.into()))
}

/// Reply to the customer; moves the request to `under_review`.
#[utoipa::path(
    post,
    path = "/admin/requests/{request_type}/{id}/reply",
    params(
        ("request_type" = String, Path, description = "consulting, prototyping, firmware or ondemand"),
        ("id" = Uuid, Path, description = "Request id")
    ),
    request_body = ReplyBody,
    responses(
        (status = 200, description = "Reply stored; list re-fetched", body = RequestListResponse),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Another reply is in flight"),
        (status = 422, description = "Empty message"),
        (status = 502, description = "Request store unreachable")
    )
)]
pub async fn reply_handler(
    State(state): State<Arc<AppState>>,
    Path((request_type, id)): Path<(String, Uuid)>,
    Json(body): Json<ReplyBody>,
) -> ApiResult<Json<RequestListResponse>> {
    let request_type = parse_type(&request_type)?;
    ensure_known(&state, request_type, id).await?;
    state
        .triage
        .submit_reply(id, &body.message)
        .await
        .map_err(triage_error_response)?;
    info!("Admin replied to {} request {}", request_type, id);
    Ok(Json(list_response(&state, None).await?))
}

/// Close the request; an empty message is replaced with a standard one.
#[utoipa::path(
    post,
    path = "/admin/requests/{request_type}/{id}/solve",
    params(
        ("request_type" = String, Path, description = "consulting, prototyping, firmware or ondemand"),
        ("id" = Uuid, Path, description = "Request id")
    ),
    request_body = SolveBody,
    responses(
        (status = 200, description = "Request solved; list re-fetched", body = RequestListResponse),
        (status = 404, description = "Unknown request"),
        (status = 409, description = "Another reply is in flight"),
        (status = 502, description = "Request store unreachable")
    )
)]
pub async fn solve_handler(
    State(state): State<Arc<AppState>>,
    Path((request_type, id)): Path<(String, Uuid)>,
    Json(body): Json<SolveBody>,
) -> ApiResult<Json<RequestListResponse>> {
    let request_type = parse_type(&request_type)?;
    ensure_known(&state, request_type, id).await?;
    let message = body.message.unwrap_or_default();
    state
        .triage
        .mark_solved(id, &message)
        .await
        .map_err(triage_error_response)?;
    info!("Admin solved {} request {}", request_type, id);
    Ok(Json(list_response(&state, None).await?))
}
