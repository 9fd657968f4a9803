//! Bearer-token authentication for vendor endpoints.
//!
//! Tokens are HS256 JWTs carrying the vendor id and email with a 24 hour
//! lifetime; passwords are stored as Argon2id PHC strings.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::AppState;
use crate::error::BookingError;
use crate::models::Vendor;
use crate::schema::vendors;

const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Vendor primary key.
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn generate_token(vendor: &Vendor, secret: &str) -> Result<String, BookingError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: vendor.id,
        email: vendor.email.clone(),
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| BookingError::Internal(format!("token encode: {e}")))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, BookingError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            BookingError::AuthenticationFailed("Token has expired".to_string())
        }
        _ => BookingError::AuthenticationFailed("Invalid token".to_string()),
    })
}

pub fn hash_password(password: &str) -> Result<String, BookingError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BookingError::Internal(format!("password hash: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, BookingError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| BookingError::Internal(format!("stored hash malformed: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(BookingError::Internal(format!("password verify: {e}"))),
    }
}

/// Extractor proving the request carries a valid token for an active vendor.
pub struct AuthVendor(pub Vendor);

#[axum::async_trait]
impl axum::extract::FromRequestParts<AppState> for AuthVendor {
    type Rejection = BookingError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).ok_or_else(|| {
            BookingError::AuthenticationFailed(
                "Authentication credentials were not provided".to_string(),
            )
        })?;
        let raw = header.to_str().map_err(|_| {
            BookingError::AuthenticationFailed("Invalid token".to_string())
        })?;
        // Both "Bearer <token>" and a bare token are accepted.
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw);

        let claims = decode_token(token, &state.jwt_secret)?;

        let mut conn = state.pool.get().await?;
        let vendor = vendors::table
            .find(claims.sub)
            .filter(vendors::is_active.eq(true))
            .first::<Vendor>(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| BookingError::AuthenticationFailed("User not found".to_string()))?;

        Ok(AuthVendor(vendor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor() -> Vendor {
        Vendor {
            id: Uuid::new_v4(),
            vendor_id: "V12345678".to_string(),
            email: "vendor@example.com".to_string(),
            password_hash: String::new(),
            company_name: "Test Company".to_string(),
            description: String::new(),
            address: "123 Test St".to_string(),
            city: "Test City".to_string(),
            state: "TS".to_string(),
            country: "Test Country".to_string(),
            zip_code: "12345".to_string(),
            phone: "+1234567890".to_string(),
            website: String::new(),
            status: "approved".to_string(),
            rating: 0.0,
            total_reviews: 0,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("testpassword123").unwrap();
        assert!(verify_password("testpassword123", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let v = vendor();
        let token = generate_token(&v, "test-secret").unwrap();
        let claims = decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, v.id);
        assert_eq!(claims.email, v.email);
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_token(&vendor(), "test-secret").unwrap();
        let err = decode_token(&token, "other-secret").unwrap_err();
        assert!(matches!(err, BookingError::AuthenticationFailed(m) if m == "Invalid token"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "vendor@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        let err = decode_token(&token, "test-secret").unwrap_err();
        assert!(matches!(err, BookingError::AuthenticationFailed(m) if m == "Token has expired"));
    }
}
