//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{assets, assistant, auth, health, imports, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AssetDesk API",
        version = "1.0.0",
        description = "Asset tracking REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::me,
        // Assets
        assets::list_assets,
        assets::get_asset,
        assets::scan,
        assets::create_asset,
        assets::update_asset,
        assets::delete_asset,
        assets::check_out,
        assets::check_in,
        assets::set_condition,
        assets::duplicate_asset,
        // Imports
        imports::import_json,
        imports::import_csv,
        // Stats
        stats::get_stats,
        // Assistant
        assistant::suggest,
        assistant::ask,
        // Users
        users::list_users,
        users::update_role,
    ),
    components(
        schemas(
            auth::MeResponse,
            crate::models::CapabilitySet,
            crate::models::Role,
            // Assets
            crate::models::Asset,
            crate::models::AssetInput,
            crate::models::AssetStatus,
            crate::models::Condition,
            crate::services::assets::ScanOutcome,
            assets::CheckOutRequest,
            assets::ConditionRequest,
            // Imports
            imports::ImportRequest,
            crate::models::ImportCandidate,
            crate::models::ImportReport,
            crate::models::BatchFailure,
            // Stats
            crate::models::InventoryStats,
            // Assistant
            crate::models::EnrichmentResult,
            crate::services::assistant::SuggestRequest,
            crate::services::assistant::AskRequest,
            crate::services::assistant::AskResponse,
            // Users
            crate::models::User,
            crate::models::UpdateRole,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Caller identity"),
        (name = "assets", description = "Inventory and asset lifecycle"),
        (name = "imports", description = "Bulk import with optional AI enrichment"),
        (name = "stats", description = "Statistics"),
        (name = "assistant", description = "AI assistant"),
        (name = "users", description = "User management")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
