use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

/// Issue an HS256 bearer token for a user. Claims carry the user id as `sub`
/// plus the username and role so handlers can authorize without a lookup.
pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| Error::Internal("token expiry overflow".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use uuid::Uuid;

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            password_hash: String::new(),
            role: Role::Customer,
            created_at: Utc::now(),
        };
        let token = issue_token(&user, "test_secret_key", 24).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test_secret_key"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims.sub, user.id.to_string());
        assert_eq!(data.claims.username, "alice");
        assert_eq!(data.claims.role, Role::Customer);
    }

    #[test]
    fn token_fails_with_wrong_secret() {
        let user = User {
            id: Uuid::new_v4(),
            username: "bob".into(),
            password_hash: String::new(),
            role: Role::Pharmacist,
            created_at: Utc::now(),
        };
        let token = issue_token(&user, "secret_a", 24).unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret_b"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }
}
