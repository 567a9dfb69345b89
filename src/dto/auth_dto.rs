use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupPayload {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Accepted as a string and parsed against the closed Role set; unknown
    /// values are rejected.
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Role-based landing target: pharmacists go to their triage dashboard,
    /// everyone else to the customer dashboard.
    pub redirect: String,
    pub user: UserResponse,
}
