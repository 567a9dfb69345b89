use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, LoginResponse, SignupPayload, UserResponse},
    error::{Error, Result},
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupPayload,
    responses(
        (status = 201, description = "Account created", body = Json<UserResponse>),
        (status = 400, description = "Duplicate username or unknown role")
    )
)]
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.auth_service.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token issued, redirect target by role", body = Json<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state.auth_service.login(payload).await?;
    Ok(Json(LoginResponse {
        token: outcome.token,
        redirect: outcome.redirect,
        user: UserResponse::from(outcome.user),
    }))
}

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated")
    )
)]
#[axum::debug_handler]
pub async fn logout(Extension(claims): Extension<Claims>) -> Result<impl IntoResponse> {
    // Tokens are stateless; the client discards its copy.
    tracing::info!(username = %claims.username, "user logged out");
    Ok(Json(json!({ "ok": true, "redirect": "/login" })))
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current identity", body = Json<UserResponse>),
        (status = 401, description = "Not authenticated")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id: Uuid = claims
        .sub
        .parse()
        .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;
    let user = state.auth_service.get_by_id(user_id).await?;
    Ok(Json(UserResponse::from(user)))
}
