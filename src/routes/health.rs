use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[axum::debug_handler]
pub async fn index() -> impl IntoResponse {
    let body = json!({
        "service": "pharmacy-backend",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
    });
    (StatusCode::OK, Json(body))
}
