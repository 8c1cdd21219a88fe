//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the estimator endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    admin, auth,
    protocol::{
        AdminReplyDto, CatalogClassDto, CatalogItemDto, CatalogResponse, CategoryGroupDto,
        ClassSubtotalDto, CommandRequest, EstimateResponse, LineItemDto, ReplyBody,
        RequestDetailsResponse, RequestDto, RequestListResponse, SelectedEntryDto, SolveBody,
        StatusCountsDto, WireItemClass,
    },
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use protolab_core::domain::{AuthContext, NewRequest, RequestType};
use protolab_core::estimate::Estimate;
use protolab_core::export::{export_filename, render_report, REPORT_MIME};
use protolab_core::selection::SelectionStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        catalog_handler,
        create_estimate_handler,
        get_estimate_handler,
        apply_command_handler,
        export_estimate_handler,
        submit_quote_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        admin::list_requests_handler,
        admin::refresh_requests_handler,
        admin::request_details_handler,
        admin::reply_handler,
        admin::solve_handler,
    ),
    components(
        schemas(
            WireItemClass, CommandRequest, CatalogResponse, CatalogClassDto, CategoryGroupDto,
            CatalogItemDto, EstimateResponse, SelectedEntryDto, ClassSubtotalDto, LineItemDto,
            QuoteResponse, RequestDto, RequestListResponse, StatusCountsDto,
            RequestDetailsResponse, AdminReplyDto, ReplyBody, SolveBody,
            auth::LoginRequest, auth::AuthResponse, auth::ProfileResponse,
        )
    ),
    tags(
        (name = "Prototyping Estimator API", description = "Cost estimation and admin request triage.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after a quote request has been filed.
#[derive(Serialize, ToSchema)]
pub struct QuoteResponse {
    request: RequestDto,
    total: u64,
}

fn estimate_not_found(id: Uuid) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Estimate {} not found", id))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// The parts catalog, grouped by class and category.
#[utoipa::path(
    get,
    path = "/catalog",
    responses(
        (status = 200, description = "Catalog grouped for display", body = CatalogResponse)
    )
)]
pub async fn catalog_handler(State(app_state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    let loaded = &app_state.catalog;
    Json(CatalogResponse::new(&loaded.catalog, loaded.banner.clone()))
}

/// Start a new, empty estimate.
#[utoipa::path(
    post,
    path = "/estimates",
    responses(
        (status = 201, description = "Estimate created", body = EstimateResponse)
    )
)]
pub async fn create_estimate_handler(
    State(app_state): State<Arc<AppState>>,
) -> (StatusCode, Json<EstimateResponse>) {
    let id = app_state.estimates.create().await;
    let store = SelectionStore::new();
    (
        StatusCode::CREATED,
        Json(EstimateResponse::new(id, &app_state.catalog.catalog, &store)),
    )
}

/// Current selection and totals of an estimate.
#[utoipa::path(
    get,
    path = "/estimates/{id}",
    params(("id" = Uuid, Path, description = "Estimate id")),
    responses(
        (status = 200, description = "Current estimate", body = EstimateResponse),
        (status = 404, description = "Unknown estimate")
    )
)]
pub async fn get_estimate_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EstimateResponse>, (StatusCode, String)> {
    let store = app_state
        .estimates
        .get(id)
        .await
        .ok_or_else(|| estimate_not_found(id))?;
    Ok(Json(EstimateResponse::new(id, &app_state.catalog.catalog, &store)))
}

/// Apply one selection command and return the recomputed estimate.
#[utoipa::path(
    post,
    path = "/estimates/{id}/commands",
    params(("id" = Uuid, Path, description = "Estimate id")),
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Estimate after the command", body = EstimateResponse),
        (status = 404, description = "Unknown estimate"),
        (status = 422, description = "Malformed command or item not in the catalog")
    )
)]
pub async fn apply_command_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(command): Json<CommandRequest>,
) -> Result<Json<EstimateResponse>, (StatusCode, String)> {
    if let Some((class, item_id)) = command.added_item() {
        if app_state.catalog.catalog.find(class, item_id).is_none() {
            warn!("Rejected unknown item {}/{} for estimate {}", class, item_id, id);
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Unknown {} item '{}'", class, item_id),
            ));
        }
    }

    let store = app_state
        .estimates
        .apply(id, command.into())
        .await
        .ok_or_else(|| estimate_not_found(id))?;
    Ok(Json(EstimateResponse::new(id, &app_state.catalog.catalog, &store)))
}

/// Download the estimate as a plain-text report.
#[utoipa::path(
    get,
    path = "/estimates/{id}/export",
    params(("id" = Uuid, Path, description = "Estimate id")),
    responses(
        (status = 200, description = "Plain-text report", content_type = "text/plain", body = String),
        (status = 404, description = "Unknown estimate")
    )
)]
pub async fn export_estimate_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = app_state
        .estimates
        .get(id)
        .await
        .ok_or_else(|| estimate_not_found(id))?;

    let now = Utc::now();
    let report = render_report(&app_state.catalog.catalog, &store, now.date_naive());
    let disposition = format!("attachment; filename=\"{}\"", export_filename(now));

    Ok((
        [
            (header::CONTENT_TYPE, format!("{}; charset=utf-8", REPORT_MIME)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report,
    ))
}

/// File a prototyping request from the estimate. Requires a selected microcontroller.
#[utoipa::path(
    post,
    path = "/estimates/{id}/quote",
    params(("id" = Uuid, Path, description = "Estimate id")),
    responses(
        (status = 201, description = "Request filed", body = QuoteResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Unknown estimate"),
        (status = 422, description = "Estimate is incomplete"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn submit_quote_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = app_state
        .estimates
        .get(id)
        .await
        .ok_or_else(|| estimate_not_found(id))?;

    store.validate_for_quote().map_err(|e| {
        warn!("Rejected quote for estimate {}: {}", id, e);
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;

    let catalog = &app_state.catalog.catalog;
    let total = Estimate::compute(catalog, &store).total;
    let mut fields = BTreeMap::new();
    fields.insert("estimate_id".to_string(), id.to_string());
    fields.insert("estimated_total".to_string(), total.to_string());

    let new_request = NewRequest {
        request_type: RequestType::Prototyping,
        user_id: context.user.user_id,
        summary: render_report(catalog, &store, Utc::now().date_naive()),
        fields,
    };

    match app_state.requests.create_request(new_request).await {
        Ok(request) => {
            info!("Filed quote request {} from estimate {}", request.id, id);
            Ok((
                StatusCode::CREATED,
                Json(QuoteResponse {
                    request: request.into(),
                    total,
                }),
            ))
        }
        Err(e) => {
            error!("Failed to file quote request: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to submit quote request".to_string(),
            ))
        }
    }
}
