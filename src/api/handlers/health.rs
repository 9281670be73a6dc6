use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use std::path::Path;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub libreoffice: bool,
    pub unoconv: bool,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service liveness", body = RootResponse)
    ),
    tag = "system"
)]
pub async fn root() -> impl IntoResponse {
    Json(RootResponse {
        status: "running".to_string(),
        message: "PDF Matrix Backend API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Converter tool availability", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    // PATH resolution only; the tools are never invoked here
    Json(HealthResponse {
        status: "ok".to_string(),
        libreoffice: resolve_on_path(&state.config.soffice_program),
        unoconv: resolve_on_path(&state.config.unoconv_program),
    })
}

/// Whether a program is resolvable the way process spawn will resolve
/// it: explicit paths are checked directly, bare names are searched on
/// the execution PATH.
fn resolve_on_path(program: &str) -> bool {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }

    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| dir.join(program).is_file())
}
