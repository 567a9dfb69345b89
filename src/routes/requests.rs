use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::request_dto::{
        CreateRequestPayload, RequestCustomer, RequestDetailsResponse, RequestListResponse,
        RequestResponse,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    AppState,
};

fn caller_id(claims: &Claims) -> Result<Uuid> {
    claims
        .sub
        .parse()
        .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
}

#[utoipa::path(
    get,
    path = "/customer/dashboard",
    responses(
        (status = 200, description = "Caller's requests, newest first", body = Json<RequestListResponse>),
        (status = 403, description = "Caller is not a customer")
    )
)]
#[axum::debug_handler]
pub async fn customer_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let items = state.request_service.list_own(caller_id(&claims)?).await?;
    Ok(Json(RequestListResponse {
        items: items.into_iter().map(RequestResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/customer/new_prescription",
    request_body = CreateRequestPayload,
    responses(
        (status = 201, description = "Request created with status Pending", body = Json<RequestResponse>),
        (status = 400, description = "Empty medicine list"),
        (status = 403, description = "Caller is not a customer")
    )
)]
#[axum::debug_handler]
pub async fn new_prescription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let request = state
        .request_service
        .create(caller_id(&claims)?, &payload.medicines)
        .await?;
    Ok((StatusCode::CREATED, Json(RequestResponse::from(request))))
}

#[utoipa::path(
    get,
    path = "/pharmacist/dashboard",
    responses(
        (status = 200, description = "Pending requests, oldest first", body = Json<RequestListResponse>),
        (status = 403, description = "Caller is not a pharmacist")
    )
)]
#[axum::debug_handler]
pub async fn pharmacist_dashboard(
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let items = state.request_service.list_pending().await?;
    Ok(Json(RequestListResponse {
        items: items.into_iter().map(RequestResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/request/{id}",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request, owning customer and chat history", body = Json<RequestDetailsResponse>),
        (status = 403, description = "Customer caller does not own the request"),
        (status = 404, description = "Request not found")
    )
)]
#[axum::debug_handler]
pub async fn request_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let details = state
        .request_service
        .get_details(id, caller_id(&claims)?, claims.role)
        .await?;
    Ok(Json(RequestDetailsResponse {
        request: RequestResponse::from(details.request),
        customer: RequestCustomer {
            id: details.customer.id,
            username: details.customer.username,
        },
        chat_history: details.chat_history,
    }))
}

#[utoipa::path(
    post,
    path = "/request/{id}",
    params(
        ("id" = i64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request and its messages deleted"),
        (status = 403, description = "Caller does not own the request"),
        (status = 404, description = "Request not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    state.request_service.delete(id, caller_id(&claims)?).await?;
    Ok(Json(json!({ "ok": true })))
}
