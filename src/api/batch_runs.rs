//! Batch run API handlers.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::config::USER_ID_HEADER;
use crate::error::{AppError, AppResult};
use crate::models::{AdvanceOutcome, BatchRunRequest, MAX_ID_LEN};
use crate::services::BatchRunService;

/// Response for an accepted batch run.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchRunAccepted {
    pub status: &'static str,
    pub project_id: String,
    pub run_mode: String,
}

/// Id of the user triggering the request, taken from the user id header.
fn user_id(req: &HttpRequest) -> AppResult<String> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{} header is required", USER_ID_HEADER)))?;

    if user_id.chars().count() > MAX_ID_LEN {
        return Err(AppError::InvalidInput(format!(
            "{} header must be at most {} characters",
            USER_ID_HEADER, MAX_ID_LEN
        )));
    }
    Ok(user_id.to_string())
}

/// Start a batch run.
///
/// The batch runs in the background; the response only confirms it was accepted.
#[utoipa::path(
    post,
    path = "/batch-runs",
    tag = "Batch runs",
    request_body = BatchRunRequest,
    responses(
        (status = 202, description = "Batch run accepted", body = BatchRunAccepted),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn start_batch_run(
    req: HttpRequest,
    service: web::Data<BatchRunService>,
    body: web::Json<BatchRunRequest>,
) -> AppResult<HttpResponse> {
    let user_id = user_id(&req)?;
    let request = body.into_inner();
    request.validate().map_err(AppError::InvalidInput)?;

    let response = BatchRunAccepted {
        status: "accepted",
        project_id: request.project_id.clone(),
        run_mode: request.run_mode_config.run_mode.to_string(),
    };
    info!(
        project_id = %request.project_id,
        run_mode = %response.run_mode,
        select_all = request.selection.select_all,
        user_id = %user_id,
        "Batch run accepted"
    );

    service.async_batch_run(request, user_id);
    Ok(HttpResponse::Accepted().json(response))
}

/// Dispatch the next entry of a serial execution queue.
///
/// Called once the previous task of the queue has completed.
#[utoipa::path(
    post,
    path = "/execution-queues/{queue_id}/advance",
    tag = "Batch runs",
    params(
        ("queue_id" = String, Path, description = "Execution queue id")
    ),
    responses(
        (status = 200, description = "Queue advanced", body = AdvanceOutcome),
        (status = 404, description = "Queue not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Execution engine rejected the task", body = crate::error::ErrorResponse),
    )
)]
pub async fn advance_queue(
    service: web::Data<BatchRunService>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let queue_id = path.into_inner();
    let outcome = service.advance(&queue_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Configure batch run routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/batch-runs").route(web::post().to(start_batch_run)))
        .service(
            web::resource("/execution-queues/{queue_id}/advance")
                .route(web::post().to(advance_queue)),
        );
}
