use sqlx::PgPool;
use uuid::Uuid;

use crate::config::get_config;
use crate::dto::auth_dto::{LoginPayload, SignupPayload};
use crate::error::{Error, Result};
use crate::models::user::{Role, User};
use crate::utils::{crypto, token};

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
}

pub struct LoginOutcome {
    pub token: String,
    pub redirect: String,
    pub user: User,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn signup(&self, payload: SignupPayload) -> Result<User> {
        let role: Role = payload
            .role
            .parse()
            .map_err(|_| Error::BadRequest(format!("Unknown role: {}", payload.role)))?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(&payload.username)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            return Err(Error::BadRequest("Username already exists".to_string()));
        }

        let password_hash = crypto::hash_password(&payload.password)
            .map_err(|e| Error::Internal(format!("failed to hash password: {}", e)))?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&payload.username)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Backstop for the signup race the pre-check cannot close.
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return Error::BadRequest("Username already exists".to_string());
                }
            }
            Error::from(e)
        })?;

        tracing::info!(username = %user.username, role = %user.role, "user signed up");
        Ok(user)
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<LoginOutcome> {
        let user = self
            .find_by_username(&payload.username)
            .await?
            .ok_or_else(|| Error::Unauthorized("Invalid username or password".to_string()))?;

        let ok = crypto::verify_password(&payload.password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("failed to verify password: {}", e)))?;
        if !ok {
            return Err(Error::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        let config = get_config();
        let token = token::issue_token(&user, &config.jwt_secret, config.token_ttl_hours)?;
        let redirect = match user.role {
            Role::Pharmacist => "/pharmacist/dashboard".to_string(),
            _ => "/customer/dashboard".to_string(),
        };

        Ok(LoginOutcome {
            token,
            redirect,
            user,
        })
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }
}
