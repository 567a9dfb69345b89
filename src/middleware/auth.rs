use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::user::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

fn decode_bearer(req: &Request) -> Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response());
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"bad_authorization"})),
        )
            .into_response());
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unsupported_scheme"})),
        )
            .into_response());
    };

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response()
    })
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

pub async fn require_customer(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => {
            if claims.role != Role::Customer {
                return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response();
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

pub async fn require_pharmacist(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => {
            if claims.role != Role::Pharmacist {
                return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response();
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}
