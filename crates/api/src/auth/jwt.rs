//! Verification of identity-provider access tokens.
//!
//! Tokens are HS256-signed JWTs carrying [`Claims`]. The `provider` claim
//! names the sign-in method; providers listed in `BLOCKED_AUTH_PROVIDERS`
//! are refused even with a valid signature.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims embedded in every identity token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the identity provider's user id.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// `learner`, `instructor` or `admin`.
    pub role: String,
    /// Sign-in method, e.g. `password`, `google`, `anonymous`.
    pub provider: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Settings for verifying identity tokens.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// HMAC-SHA256 secret shared with the identity provider.
    pub secret: String,
    /// Expected `iss` claim; unchecked when `None`.
    pub issuer: Option<String>,
    /// Sign-in providers that are not accepted.
    pub blocked_providers: Vec<String>,
}

/// Providers refused when `BLOCKED_AUTH_PROVIDERS` is unset.
const DEFAULT_BLOCKED_PROVIDERS: &str = "anonymous";

impl IdentityConfig {
    /// Load identity settings from environment variables.
    ///
    /// | Env Var                  | Required | Default     |
    /// |--------------------------|----------|-------------|
    /// | `IDENTITY_JWT_SECRET`    | **yes**  | --          |
    /// | `IDENTITY_ISSUER`        | no       | unset       |
    /// | `BLOCKED_AUTH_PROVIDERS` | no       | `anonymous` |
    ///
    /// # Panics
    ///
    /// Panics if `IDENTITY_JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret = std::env::var("IDENTITY_JWT_SECRET")
            .expect("IDENTITY_JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "IDENTITY_JWT_SECRET must not be empty");

        let issuer = std::env::var("IDENTITY_ISSUER")
            .ok()
            .filter(|s| !s.is_empty());

        let blocked_providers = std::env::var("BLOCKED_AUTH_PROVIDERS")
            .unwrap_or_else(|_| DEFAULT_BLOCKED_PROVIDERS.into())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            secret,
            issuer,
            blocked_providers,
        }
    }

    pub fn is_blocked_provider(&self, provider: &str) -> bool {
        self.blocked_providers
            .iter()
            .any(|p| p.eq_ignore_ascii_case(provider))
    }
}

/// Validate and decode an identity token.
///
/// Checks the signature, `exp`, and `iss` when an issuer is configured.
pub fn validate_token(
    token: &str,
    config: &IdentityConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    if let Some(issuer) = &config.issuer {
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
    }
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

/// Sign a token the way the identity provider does.
pub fn issue_token(
    uid: &str,
    role: &str,
    provider: &str,
    ttl_secs: i64,
    config: &IdentityConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: uid.to_string(),
        email: None,
        role: role.to_string(),
        provider: provider.to_string(),
        exp: now + ttl_secs,
        iat: now,
        iss: config.issuer.clone(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}
