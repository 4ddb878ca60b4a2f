use crate::core::errors::CofundError;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const ISSUER: &str = "cofund";

/// Token claims. `sub` is the acting identity for every protected route.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        JwtService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn generate_token(&self, user_id: &str) -> Result<String, CofundError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| CofundError::InternalServerError(format!("JWT encoding error: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, CofundError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| CofundError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_carries_subject() {
        let jwt = JwtService::new("test-secret", Duration::hours(1));
        let token = jwt.generate_token("u1").unwrap();
        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtService::new("a", Duration::hours(1)).generate_token("u1").unwrap();
        let result = JwtService::new("b", Duration::hours(1)).validate_token(&token);
        assert!(matches!(result, Err(CofundError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60s leeway.
        let jwt = JwtService::new("test-secret", Duration::minutes(-5));
        let token = jwt.generate_token("u1").unwrap();
        assert!(matches!(jwt.validate_token(&token), Err(CofundError::Unauthorized(_))));
    }
}
