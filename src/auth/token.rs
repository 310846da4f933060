//! HS256 bearer token verification and issuance.

use std::fmt;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::principal::{Principal, Role};
use crate::observability::metrics;

/// Why a credential did not yield a [`Principal`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("no credential supplied")]
    Unauthenticated,

    /// Bad signature, malformed payload or elapsed expiry.
    #[error("invalid token")]
    InvalidToken,

    /// The process has no signing secret. Operational fault, not a client error.
    #[error("token signing secret is not configured")]
    ServerMisconfigured,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    /// Label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ServerMisconfigured => "server_misconfigured",
            AuthError::Signing(_) => "signing",
        }
    }
}

/// Wire claims. `id` is accepted in place of `sub`.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(alias = "id")]
    sub: String,
    email: String,
    name: String,
    role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<u64>,
    exp: u64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Stateless credential verifier.
///
/// Holds the process-wide signing secret. Verification never consults
/// server-side state, so a token stays valid until its `exp` claim.
pub struct TokenAuthenticator {
    keys: Option<Keys>,
    validation: Validation,
}

impl fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl TokenAuthenticator {
    /// Build from an optional secret. An empty secret counts as missing.
    pub fn new(secret: Option<&str>) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|s| Keys {
            encoding: EncodingKey::from_secret(s.as_bytes()),
            decoding: DecodingKey::from_secret(s.as_bytes()),
        });

        if keys.is_none() {
            tracing::error!("Token signing secret missing; every credential will be rejected");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self { keys, validation }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Verify `credential` and decode its principal.
    pub fn authenticate(&self, credential: Option<&str>) -> Result<Principal, AuthError> {
        let result = self.verify(credential);
        if let Err(err) = &result {
            metrics::record_auth_failure(err.reason());
        }
        result
    }

    fn verify(&self, credential: Option<&str>) -> Result<Principal, AuthError> {
        let Some(keys) = &self.keys else {
            tracing::error!("Rejecting credential: signing secret not configured");
            return Err(AuthError::ServerMisconfigured);
        };

        let token = match credential.map(strip_bearer) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::Unauthenticated),
        };

        let data = decode::<Claims>(token, &keys.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Credential rejected");
            AuthError::InvalidToken
        })?;

        let claims = data.claims;
        Ok(Principal {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    }

    /// Sign a token for `principal` that expires `ttl` from now.
    pub fn issue(&self, principal: &Principal, ttl: Duration) -> Result<String, AuthError> {
        let now = jsonwebtoken::get_current_timestamp();
        self.sign(principal, now, now.saturating_add(ttl.as_secs()))
    }

    /// Sign a token with an explicit `exp` (seconds since epoch).
    pub fn issue_with_expiry(&self, principal: &Principal, exp: u64) -> Result<String, AuthError> {
        self.sign(principal, jsonwebtoken::get_current_timestamp(), exp)
    }

    fn sign(&self, principal: &Principal, iat: u64, exp: u64) -> Result<String, AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::ServerMisconfigured)?;
        let claims = Claims {
            sub: principal.subject.clone(),
            email: principal.email.clone(),
            name: principal.name.clone(),
            role: principal.role,
            iat: Some(iat),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

fn strip_bearer(raw: &str) -> &str {
    let raw = raw.trim();
    // A bare scheme carries no token.
    if raw.eq_ignore_ascii_case("bearer") {
        return "";
    }
    match raw.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => raw[7..].trim(),
        _ => raw,
    }
}
