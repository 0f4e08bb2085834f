use chrono::{Utc, Duration};
use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Serialize, Deserialize};
use uuid::Uuid;
use crate::error::AppError;
use crate::models::user::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub pump_master_id: Uuid,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
    pub username: String,
}

pub struct TokenSubject<'a> {
    pub user_id: Uuid,
    pub pump_master_id: Uuid,
    pub role: UserRole,
    pub username: &'a str,
}

pub fn sign_token(subject: &TokenSubject<'_>, secret: &str, ttl_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);
    let claims = Claims {
        sub: subject.user_id,
        pump_master_id: subject.pump_master_id,
        role: subject.role,
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
        username: subject.username.to_string(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::internal(format!("Token signing failed: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256)
    )
    .map(|d| d.claims)
    .map_err(|e| AppError::unauthorized(format!("Invalid or expired token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> TokenSubject<'static> {
        TokenSubject {
            user_id: Uuid::new_v4(),
            pump_master_id: Uuid::new_v4(),
            role: UserRole::Salesman,
            username: "ravi",
        }
    }

    #[test]
    fn signed_token_verifies_with_same_secret() {
        let subject = subject();
        let token = sign_token(&subject, "top-secret", 8).unwrap();
        let claims = verify_token(&token, "top-secret").unwrap();

        assert_eq!(claims.sub, subject.user_id);
        assert_eq!(claims.pump_master_id, subject.pump_master_id);
        assert_eq!(claims.role, UserRole::Salesman);
        assert_eq!(claims.username, "ravi");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_token(&subject(), "top-secret", 8).unwrap();
        let err = verify_token(&token, "other-secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign_token(&subject(), "top-secret", -2).unwrap();
        assert!(verify_token(&token, "top-secret").is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_token("not.a.jwt", "top-secret").is_err());
    }
}
