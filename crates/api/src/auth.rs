//! JWT authentication.
//!
//! Tokens are HS256-signed and carry the user id (`sub`), role and email.
//! They are read from the `token` cookie first, then from an
//! `Authorization: Bearer` header.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use common::UserId;
use domain::{RequestContext, Role};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use store::DocumentStore;

use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_COOKIE: &str = "token";

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub email: String,
    pub exp: u64,
}

impl Claims {
    /// Claims for `ctx` expiring `ttl_secs` from now.
    pub fn for_context(ctx: &RequestContext, ttl_secs: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Self {
            sub: ctx.user_id.to_string(),
            role: ctx.role,
            email: ctx.email.clone(),
            exp: now + ttl_secs,
        }
    }
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Signs a token for `ctx`.
    pub fn issue(&self, ctx: &RequestContext, ttl_secs: u64) -> Result<String, ApiError> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &Claims::for_context(ctx, ttl_secs),
            &self.encoding,
        )
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verifies a token and builds the caller's context from it.
    pub fn verify(&self, token: &str) -> Result<RequestContext, ApiError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                ApiError::Unauthorized("Token invalid or expired".to_string())
            })?;

        let claims = data.claims;
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ApiError::Unauthorized("Token invalid or expired".to_string()))?;

        Ok(RequestContext::new(user_id, claims.role, claims.email))
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

/// Extracts the raw token from the request, cookie first.
fn token_from_parts(parts: &Parts) -> Option<&str> {
    let from_cookie = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    })
}

/// Authenticated caller. Rejects with 401 when no valid token is present.
#[derive(Debug, Clone)]
pub struct Auth(pub RequestContext);

impl<S: DocumentStore> FromRequestParts<Arc<AppState<S>>> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let result = match token_from_parts(parts) {
            Some(token) => state.jwt.verify(token).map(Auth),
            None => Err(ApiError::Unauthorized(
                "Not authorized, no token provided".to_string(),
            )),
        };
        if result.is_err() {
            metrics::counter!("auth_rejections_total").increment(1);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: (&str, &str)) -> Parts {
        Request::builder()
            .header(header.0, header.1)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = JwtKeys::new(b"secret");
        let ctx = RequestContext::admin(UserId::new(), "admin@example.com");

        let token = keys.issue(&ctx, 3600).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), ctx);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let ctx = RequestContext::user(UserId::new(), "u@example.com");
        let token = JwtKeys::new(b"one").issue(&ctx, 3600).unwrap();

        assert!(matches!(
            JwtKeys::new(b"two").verify(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::new(b"secret");
        let mut claims =
            Claims::for_context(&RequestContext::user(UserId::new(), "u@example.com"), 0);
        claims.exp -= 3600;
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(keys.verify(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_token_sources() {
        assert_eq!(
            token_from_parts(&parts(("authorization", "Bearer abc"))),
            Some("abc")
        );
        assert_eq!(
            token_from_parts(&parts(("cookie", "theme=dark; token=xyz"))),
            Some("xyz")
        );
        assert_eq!(token_from_parts(&parts(("authorization", "Basic abc"))), None);
        assert_eq!(token_from_parts(&parts(("cookie", "token="))), None);
    }
}
