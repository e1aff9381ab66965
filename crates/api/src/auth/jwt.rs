//! Session token generation and verification.
//!
//! Tokens are HS256-signed JWTs containing a [`Claims`] payload. They are
//! self-contained: verification needs only the signing secret, and there is
//! no server-side session table or revocation list.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use jqlgate_core::types::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{env_or, ConfigError, DeploymentMode};

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject -- the user's id.
    pub sub: UserId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

/// Configuration for session token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Token lifetime in hours (default: 24).
    pub expiry_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiry_hours", &self.expiry_hours)
            .finish()
    }
}

/// Default token lifetime in hours.
const DEFAULT_EXPIRY_HOURS: i64 = 24;

/// Longest accepted token lifetime (one year).
const MAX_EXPIRY_HOURS: i64 = 24 * 366;

impl JwtConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var            | Required            | Default |
    /// |--------------------|---------------------|---------|
    /// | `JWT_SECRET`       | in production only  | random  |
    /// | `JWT_EXPIRY_HOURS` | no                  | `24`    |
    ///
    /// `JWT_EXPIRY_HOURS` must lie in `1..=MAX_EXPIRY_HOURS`.
    ///
    /// In development an unset secret is replaced by a random one, so tokens
    /// stop verifying after a restart (as do the in-memory users).
    pub fn from_env(mode: DeploymentMode) -> Result<Self, ConfigError> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if mode.is_development() => {
                tracing::warn!("JWT_SECRET not set; using a random per-process secret");
                generate_secret()
            }
            _ => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let expiry_hours = check_expiry_hours(env_or("JWT_EXPIRY_HOURS", DEFAULT_EXPIRY_HOURS)?)?;

        Ok(Self {
            secret,
            expiry_hours,
        })
    }
}

fn check_expiry_hours(hours: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_EXPIRY_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(ConfigError::Invalid {
            key: "JWT_EXPIRY_HOURS",
            value: hours.to_string(),
            reason: format!("must be between 1 and {MAX_EXPIRY_HOURS}"),
        })
    }
}

/// 256 random bits, URL-safe base64.
fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Why a token failed verification.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signature is valid but `exp` is not in the future.
    #[error("token expired")]
    Expired,

    /// Bad signature, malformed structure, or missing claims.
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Sign an arbitrary [`Claims`] payload.
pub fn encode_claims(
    claims: &Claims,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(), // HS256
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Generate a session token for the given user, valid for
/// `config.expiry_hours`.
pub fn generate_token(
    user_id: &str,
    email: &str,
    name: &str,
    roles: &[String],
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        roles: roles.to_vec(),
        exp: now + config.expiry_hours * 3600,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode_claims(&claims, config)
}

/// Verify a token and return the embedded [`Claims`].
///
/// The signature is checked first; a token whose `exp` is at or before the
/// current time then yields [`TokenError::Expired`].
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
    let mut validation = Validation::default(); // HS256
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e),
    })?;

    if token_data.claims.exp <= chrono::Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Helper to build a test config with a known secret.
    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            expiry_hours: 24,
        }
    }

    fn roles() -> Vec<String> {
        vec!["user".to_string()]
    }

    #[test]
    fn test_generate_and_verify_token() {
        let config = test_config();
        let token = generate_token("u-1", "ana@x.com", "Ana", &roles(), &config)
            .expect("token generation should succeed");

        let claims = verify_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.email, "ana@x.com");
        assert_eq!(claims.name, "Ana");
        assert_eq!(claims.roles, roles());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let config = test_config();

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "u-1".to_string(),
            email: "ana@x.com".to_string(),
            name: "Ana".to_string(),
            roles: roles(),
            exp: now - 1,
            iat: now - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode_claims(&claims, &config).expect("encoding should succeed");

        assert_matches!(verify_token(&token, &config), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let config = test_config();
        assert_matches!(
            verify_token("not.a.jwt", &config),
            Err(TokenError::Invalid(_))
        );
        assert_matches!(verify_token("", &config), Err(TokenError::Invalid(_)));
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_a = JwtConfig {
            secret: "secret-alpha".to_string(),
            expiry_hours: 24,
        };
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            expiry_hours: 24,
        };

        let token = generate_token("u-1", "a@b.com", "A", &roles(), &config_a)
            .expect("token generation should succeed");

        assert_matches!(verify_token(&token, &config_b), Err(TokenError::Invalid(_)));
    }

    #[test]
    fn test_expired_token_with_wrong_secret_is_invalid() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "u-1".to_string(),
            email: "a@b.com".to_string(),
            name: "A".to_string(),
            roles: Vec::new(),
            exp: now - 600,
            iat: now - 1200,
            jti: Uuid::new_v4().to_string(),
        };
        let other = JwtConfig {
            secret: "someone-else".to_string(),
            expiry_hours: 24,
        };
        let token = encode_claims(&claims, &other).unwrap();

        assert_matches!(verify_token(&token, &config), Err(TokenError::Invalid(_)));
    }

    #[test]
    fn test_missing_roles_claim_defaults_to_empty() {
        #[derive(Serialize)]
        struct Legacy<'a> {
            sub: &'a str,
            email: &'a str,
            name: &'a str,
            exp: i64,
            iat: i64,
            jti: &'a str,
        }

        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &Legacy {
                sub: "u-9",
                email: "old@x.com",
                name: "Old",
                exp: now + 60,
                iat: now,
                jti: "j",
            },
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let claims = verify_token(&token, &config).unwrap();
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_expiry_hours_bounds() {
        assert_eq!(check_expiry_hours(1).unwrap(), 1);
        assert_eq!(check_expiry_hours(MAX_EXPIRY_HOURS).unwrap(), MAX_EXPIRY_HOURS);
        for bad in [0, -5, MAX_EXPIRY_HOURS + 1, i64::MAX] {
            assert_matches!(
                check_expiry_hours(bad),
                Err(ConfigError::Invalid { key: "JWT_EXPIRY_HOURS", .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_generated_secret_is_random() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
    }
}
