use crate::error::ApiError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,       // Subject (user id as string)
    pub user_id: Uuid,     // User UUID
    pub mobile_no: String, // Mobile number (for logging)
    pub exp: i64,          // Expiration timestamp
    pub iat: i64,          // Issued at timestamp
    pub iss: String,       // Issuer
    pub jti: String,       // JWT ID (unique token identifier)
}

/// JWT Service - creates and verifies login tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtService {
    /// Create new JWT service with secret, issuer and token lifetime
    pub fn new(secret: &str, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Create a new token for a user
    pub fn create_token(&self, user_id: Uuid, mobile_no: &str) -> Result<String, ApiError> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.ttl.as_secs() as i64);

        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            mobile_no: mobile_no.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify and decode a token
    ///
    /// Returns claims if the token is valid and not expired
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "test_issuer", WEEK);
        let user_id = Uuid::new_v4();

        let token = service.create_token(user_id, "09171234567").unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.mobile_no, "09171234567");
        assert_eq!(claims.iss, "test_issuer");
    }

    #[test]
    fn test_invalid_token() {
        let service = JwtService::new("test_secret_key", "test_issuer", WEEK);
        let result = service.verify_token("invalid_token");
        assert!(matches!(result, Err(ApiError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new("secret1", "test_issuer", WEEK);
        let service2 = JwtService::new("secret2", "test_issuer", WEEK);

        let token = service1.create_token(Uuid::new_v4(), "09171234567").unwrap();

        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let service1 = JwtService::new("secret", "issuer-a", WEEK);
        let service2 = JwtService::new("secret", "issuer-b", WEEK);

        let token = service1.create_token(Uuid::new_v4(), "09171234567").unwrap();

        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn test_token_lifetime_is_seven_days() {
        let service = JwtService::new("test_secret_key", "test_issuer", WEEK);

        let token = service.create_token(Uuid::new_v4(), "09171234567").unwrap();
        let claims = service.verify_token(&token).unwrap();

        let now = chrono::Utc::now().timestamp();
        let expires_in = claims.exp - now;
        assert!(expires_in > 7 * 24 * 3600 - 60);
        assert!(expires_in <= 7 * 24 * 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new("test_secret_key", "test_issuer", WEEK);
        let past = chrono::Utc::now() - chrono::Duration::hours(1);

        let claims = Claims {
            sub: "someone".into(),
            user_id: Uuid::new_v4(),
            mobile_no: "09171234567".into(),
            exp: past.timestamp(),
            iat: (past - chrono::Duration::hours(1)).timestamp(),
            iss: "test_issuer".into(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test_secret_key"),
        )
        .unwrap();

        assert!(matches!(
            service.verify_token(&token),
            Err(ApiError::InvalidToken)
        ));
    }
}
