// --- File: crates/services/vacationstay_backend/src/app.rs ---
use std::path::Path;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use vacationstay_common::MessageResponse;
use vacationstay_config::CorsConfig;
use vacationstay_db::DbClient;

use crate::app_state::AppState;

#[axum::debug_handler]
async fn health(State(db_client): State<DbClient>) -> (StatusCode, Json<MessageResponse>) {
    if db_client.is_healthy().await {
        (StatusCode::OK, Json(MessageResponse::new("ok")))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(MessageResponse::new("database unavailable")),
        )
    }
}

/// CORS for the configured browser origins. `*` or an empty list allows any.
pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let any_origin = origins.is_empty() || cors.allowed_origins.iter().any(|o| o == "*");
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if any_origin {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// The full application: every feature router under `/api`, plus docs and
/// static files when configured.
pub fn build_app(state: &AppState) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the VacationStay API!" }))
        .route("/health", get(health))
        .with_state(state.db_client.clone())
        .merge(vacationstay_auth::routes::routes(state.auth.clone()))
        .merge(vacationstay_properties::routes::routes(state.properties.clone()))
        .merge(vacationstay_bookings::routes::routes(state.bookings.clone()));

    #[allow(unused_mut)] // only reassigned with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        use vacationstay_auth::doc::AuthApiDoc;
        use vacationstay_bookings::doc::BookingsApiDoc;
        use vacationstay_properties::doc::PropertiesApiDoc;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "VacationStay API",
                version = "0.1.0",
                description = "Vacation rental listings, availability and bookings"
            ),
            servers((url = "/api", description = "Main API Prefix"))
        )]
        struct ApiDoc;

        if state.config.use_swagger {
            let mut openapi_doc = ApiDoc::openapi();
            openapi_doc.merge(AuthApiDoc::openapi());
            openapi_doc.merge(PropertiesApiDoc::openapi());
            openapi_doc.merge(BookingsApiDoc::openapi());

            info!("Adding Swagger UI at /api/docs");
            app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
        }
    }

    let app = match state.config.static_dir.as_deref() {
        Some(dir) if Path::new(dir).is_dir() => {
            info!("Serving static files from {}", dir);
            app.fallback_service(ServeDir::new(dir))
        }
        Some(dir) => {
            warn!("Static directory {} does not exist; not serving files", dir);
            app
        }
        None => app,
    };

    app.layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
}
