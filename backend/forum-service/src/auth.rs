//! Bearer token verification.
//!
//! Tokens are minted by the identity service; this service only validates
//! them. The verifier is built once from `AuthConfig` and shared through
//! `web::Data`.

use crate::config::AuthConfig;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiry (unix seconds)
    pub exp: usize,
    #[serde(default)]
    pub is_admin: bool,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub is_admin: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("invalid or expired token")]
    Invalid,
    #[error("token subject is not a user id")]
    BadSubject,
}

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Actor, TokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            TokenError::Invalid
        })?;

        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::BadSubject)?;

        Ok(Actor {
            id,
            is_admin: data.claims.is_admin,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_tokens::mint;
    use super::*;

    fn verifier(secret: &str) -> JwtVerifier {
        JwtVerifier::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            leeway_secs: 0,
        })
    }

    #[test]
    fn accepts_valid_token() {
        let user = Uuid::new_v4();
        let token = mint("s3cret", user, false, 600);

        let actor = verifier("s3cret").verify(&token).unwrap();
        assert_eq!(actor, Actor { id: user, is_admin: false });
    }

    #[test]
    fn carries_admin_flag() {
        let token = mint("s3cret", Uuid::new_v4(), true, 600);
        assert!(verifier("s3cret").verify(&token).unwrap().is_admin);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let user = Uuid::new_v4();
        assert_eq!(
            verifier("other").verify(&mint("s3cret", user, false, 600)),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            verifier("s3cret").verify(&mint("s3cret", user, false, -600)),
            Err(TokenError::Invalid)
        );
        assert_eq!(verifier("s3cret").verify("not-a-jwt"), Err(TokenError::Invalid));
    }

    #[test]
    fn rejects_non_uuid_subject() {
        let claims = Claims {
            sub: "42".into(),
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
            is_admin: false,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();

        assert_eq!(verifier("s3cret").verify(&token), Err(TokenError::BadSubject));
    }
}
