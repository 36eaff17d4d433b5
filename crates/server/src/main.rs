use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use shared::{
    error::{ApiError, ErrorCode, SkillError},
    protocol::{SkillRequestEnvelope, SkillResponseEnvelope},
};
use skill_core::{
    config::{SkillConfig, UiTemplates},
    handle_request, SkillContext,
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    if settings.seed_demo_catalog {
        storage.seed_demo_catalog().await?;
    }

    let templates = match settings.templates_path.as_deref() {
        Some(path) => {
            info!(path = %path.display(), "loading response templates");
            UiTemplates::load(path)?
        }
        None => UiTemplates::default(),
    };
    let skill_config = SkillConfig::new(
        settings.skill_version.clone(),
        settings.group_size,
        settings.product_group_size,
        templates,
    )?;

    let state = AppState {
        skill: SkillContext::new(Arc::new(storage.clone()), skill_config),
        storage,
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, version = %settings.skill_version, "skill server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/skill", post(skill_turn))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.storage.health_check().await.map_err(|e| {
        warn!(error = %e, "health check failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn skill_turn(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SkillRequestEnvelope>, JsonRejection>,
) -> Result<Json<SkillResponseEnvelope>, HttpError> {
    let Json(envelope) = payload.map_err(|rejection| {
        (
            rejection.status(),
            Json(ApiError::new(ErrorCode::Validation, rejection.body_text())),
        )
    })?;

    let session_id = envelope
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Some(sent_at) = envelope.timestamp {
        let age_ms = (Utc::now() - sent_at).num_milliseconds();
        debug!(%session_id, age_ms, "request received");
    }

    let response = handle_request(&state.skill, envelope.request, envelope.session)
        .await
        .map_err(|e| skill_error_response(&session_id, e))?;

    Ok(Json(SkillResponseEnvelope {
        version: state.skill.config.version.clone(),
        session_id,
        response,
    }))
}

fn skill_error_response(session_id: &str, error: SkillError) -> HttpError {
    let status = if error.is_fatal() {
        error!(%session_id, %error, "skill turn failed");
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        warn!(%session_id, %error, "skill turn rejected");
        match error {
            SkillError::NoResults => StatusCode::NOT_FOUND,
            SkillError::Catalog(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    };
    (status, Json(ApiError::from(error)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
