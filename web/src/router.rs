use crate::controller::{
    admin_controller, chunk_stream_controller, event_stream_controller, health_check_controller,
};
use crate::response::stream::{RetiredStreamResponse, StreamSummaryResponse};
use axum::http::HeaderValue;
use axum::routing::{delete, get};
use axum::Router;
use service::config::Config;
use service::AppState;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "SSE Sandbox API"
        ),
        paths(
            event_stream_controller::events,
            chunk_stream_controller::chunks,
            admin_controller::stream_index,
            admin_controller::stream_delete,
            admin_controller::chunk_index,
            admin_controller::chunk_delete,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                crate::params::chunk_stream::ChunkFormatParam,
                StreamSummaryResponse,
                RetiredStreamResponse,
            )
        ),
        tags(
            (name = "sse_sandbox", description = "Protocol-exercising SSE source for clients, proxies and middleware")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config);
    Router::new()
        .merge(event_stream_routes(app_state.clone()))
        .merge(chunk_stream_routes(app_state.clone()))
        .merge(admin_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

fn event_stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/events", get(event_stream_controller::events))
        .with_state(app_state)
}

fn chunk_stream_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/chunks", get(chunk_stream_controller::chunks))
        .with_state(app_state)
}

fn admin_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/streams", get(admin_controller::stream_index))
        .route("/streams/:id", delete(admin_controller::stream_delete))
        .route("/chunk-streams", get(admin_controller::chunk_index))
        .route("/chunk-streams/:id", delete(admin_controller::chunk_delete))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
