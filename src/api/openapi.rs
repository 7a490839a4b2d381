//! OpenAPI documentation configuration.

use actix_web::{HttpResponse, get, web};
use utoipa::OpenApi;

use crate::config::USER_ID_HEADER;
use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "API Case Batch Runner",
        version = "0.1.0",
        description = "Starts batch runs of API test cases and advances serial execution queues"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Batch run endpoints
        api::batch_runs::start_batch_run,
        api::batch_runs::advance_queue,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Batch runs
            models::BatchRunMode,
            models::RunModeRequest,
            models::BatchSelection,
            models::BatchRunRequest,
            models::AdvanceOutcome,
            api::batch_runs::BatchRunAccepted,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Batch runs", description = "Batch execution of API test cases")
    ),
    modifiers(&UserHeaderAddon)
)]
pub struct ApiDoc;

/// Document the header carrying the triggering user.
struct UserHeaderAddon;

impl utoipa::Modify for UserHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(USER_ID_HEADER),
                    ),
                ),
            );
        }
    }
}

/// Serve the OpenAPI document as JSON.
#[get("/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Configure OpenAPI routes.
pub fn configure_openapi_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(openapi_json);
}
