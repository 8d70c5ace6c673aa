use std::{net::SocketAddr, path::Path, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

mod error;
mod fetch;
mod format;
mod models;
mod openapi;
mod relay;
mod scan;
mod settings;
mod upload;

use models::{ErrorResponse, GetImageParams, ImageUrlResponse};
use relay::ImageRelay;
use settings::Settings;

const PLUGIN_MANIFEST: &str = "ai-plugin.json";

#[derive(Clone)]
struct AppState {
    relay: Arc<ImageRelay>,
    openapi: Arc<Value>,
}

impl AppState {
    fn new(relay: ImageRelay, public_url: &str) -> Self {
        Self {
            relay: Arc::new(relay),
            openapi: Arc::new(openapi::document(public_url)),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = Settings::load().context("failed to load configuration")?;
    let relay = ImageRelay::from_settings(&settings)?;
    tracing::info!(
        search = %settings.search_base_url,
        scan_limit = settings.scan_limit,
        default_key = settings.imgbb_api_key.is_some(),
        "image relay configured"
    );

    let state = AppState::new(relay, &settings.public_url);
    let app = build_router(state, &settings.static_dir, settings.allow_cors);

    let addr = SocketAddr::new(settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState, static_dir: &Path, allow_cors: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/get_image_url", get(get_image_url))
        .route("/openapi.json", get(openapi_document))
        .route_service(
            "/.well-known/ai-plugin.json",
            ServeFile::new(static_dir.join(PLUGIN_MANIFEST)),
        )
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if allow_cors {
        tracing::info!("Enabling CORS");
        let cors_layer = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any);
        router.layer(cors_layer)
    } else {
        router
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn openapi_document(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.openapi.as_ref().clone())
}

async fn get_image_url(
    State(state): State<AppState>,
    Query(params): Query<GetImageParams>,
) -> Response {
    let product = params.product.trim();
    match state
        .relay
        .relay(product, params.imgbb_key.as_deref())
        .await
    {
        Ok(url) => {
            let response = ImageUrlResponse::new(product.to_string(), url);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::warn!(product, error = %e, "image relay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}
