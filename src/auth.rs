use std::sync::OnceLock;

use argon2::{self, Config as ArgonConfig};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;

use crate::models::Claims;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] argon2::Error),

    #[error("failed to encode token: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    Expired,

    #[error("token lifetime overflows the clock")]
    Lifetime,
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();
    Ok(argon2::hash_encoded(password.as_bytes(), &salt, &config)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}

/// Checks a login attempt. Unknown users still pay for one verification against
/// a throwaway hash so both failure paths cost the same.
pub fn check_credentials(stored_hash: Option<&str>, password: &str) -> Result<bool, AuthError> {
    match stored_hash {
        Some(hash) => Ok(verify_password(hash, password)),
        None => {
            let dummy = dummy_hash()?;
            verify_password(dummy, password);
            Ok(false)
        }
    }
}

fn dummy_hash() -> Result<&'static str, AuthError> {
    static DUMMY: OnceLock<String> = OnceLock::new();
    if let Some(hash) = DUMMY.get() {
        return Ok(hash.as_str());
    }
    let hash = hash_password("not-a-real-password")?;
    Ok(DUMMY.get_or_init(|| hash).as_str())
}

/// Issues and verifies HS256 bearer tokens carrying the user id.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        TokenIssuer {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires = now.checked_add_signed(self.ttl).ok_or(AuthError::Lifetime)?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp().max(0) as usize,
            exp: expires.timestamp().max(0) as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Encode)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert_ne!(first, second);
        assert!(!first.contains("secret1"));
        assert!(verify_password(&first, "secret1"));
        assert!(!verify_password(&first, "secret2"));
        assert!(!verify_password("garbage", "secret1"));
    }

    #[test]
    fn unknown_user_never_matches() {
        assert!(!check_credentials(None, "not-a-real-password").unwrap());
        let hash = hash_password("pw1234").unwrap();
        assert!(check_credentials(Some(&hash), "pw1234").unwrap());
    }

    #[test]
    fn token_round_trip_carries_user_id() {
        let issuer = TokenIssuer::new("test-secret", Duration::hours(1));
        let token = issuer.issue("user-1").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_foreign_and_expired_tokens() {
        let issuer = TokenIssuer::new("test-secret", Duration::hours(1));
        let other = TokenIssuer::new("other-secret", Duration::hours(1));
        let token = other.issue("user-1").unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.verify("not.a.token"), Err(AuthError::InvalidToken)));

        let stale = TokenIssuer::new("test-secret", Duration::hours(-2));
        let token = stale.issue("user-1").unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let issuer = TokenIssuer::new("test-secret", Duration::weeks(1_000_000_000));
        assert!(matches!(issuer.issue("user-1"), Err(AuthError::Lifetime)));
    }
}
