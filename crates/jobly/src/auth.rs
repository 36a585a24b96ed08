//! Token authentication and the authorization gates.
//!
//! A request is first run through [`authenticate`], which turns the
//! `Authorization: Bearer <token>` header into a [`RequestContext`]. A missing
//! or invalid token is not an error at this point: the context simply carries
//! no claims. Route handlers then call one of the gates
//! ([`ensure_logged_in`], [`ensure_admin`], [`ensure_correct_user_or_admin`])
//! which fail with [`JoblyError::Unauthorized`].
//!
//! ```ignore
//! let ctx = jobly::auth::authenticate(&headers, &keys);
//! jobly::auth::ensure_correct_user_or_admin(&ctx, &username)?;
//! ```

use crate::error::{JoblyError, JoblyResult};
use chrono::Utc;
use http::HeaderMap;
use http::header;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Verified token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 keys for issuing and verifying tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Issue a token for `username`, expiring after the configured TTL.
    pub fn issue(&self, username: &str, is_admin: bool) -> JoblyResult<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        self.sign(&Claims {
            username: username.to_string(),
            is_admin,
            iat: now,
            exp: now.saturating_add(ttl),
        })
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> JoblyResult<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Verify signature and expiry. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring invalid token");
                None
            }
        }
    }
}

/// Request-scoped identity, passed explicitly to every gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub claims: Option<Claims>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_claims(claims: Claims) -> Self {
        Self {
            claims: Some(claims),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.claims
            .as_ref()
            .map(|c| c.username.as_str())
            .filter(|u| !u.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.claims.as_ref().is_some_and(|c| c.is_admin)
    }

    /// Classify this request against the principal a route targets.
    pub fn access(&self, target: Option<&str>) -> Access {
        if self.is_admin() {
            return Access::Admin;
        }
        match (self.username(), target) {
            (None, _) => Access::Anonymous,
            (Some(user), Some(target)) if user == target => Access::Owner,
            (Some(_), _) => Access::Other,
        }
    }
}

/// What a request may do relative to a target principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No valid credential.
    Anonymous,
    /// Logged in as someone other than the target.
    Other,
    /// Logged in as the target.
    Owner,
    /// Elevated; bypasses ownership checks.
    Admin,
}

/// Verify the bearer token in `headers`, if any.
///
/// Never fails: a missing, malformed, forged or expired token produces an
/// anonymous context.
pub fn authenticate(headers: &HeaderMap, keys: &TokenKeys) -> RequestContext {
    let Some(token) = bearer_token(headers) else {
        return RequestContext::anonymous();
    };

    RequestContext {
        claims: keys.verify(token),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let authz = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = authz
        .strip_prefix("Bearer ")
        .or_else(|| authz.strip_prefix("bearer "))
        .unwrap_or(authz)
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Pass when any user is logged in.
pub fn ensure_logged_in(ctx: &RequestContext) -> JoblyResult<()> {
    if ctx.username().is_some() {
        return Ok(());
    }
    deny("logged_in")
}

/// Pass when the user is an admin.
pub fn ensure_admin(ctx: &RequestContext) -> JoblyResult<()> {
    if ctx.is_admin() {
        return Ok(());
    }
    deny("admin")
}

/// Pass when the user is an admin or is `username`.
///
/// Anonymous requests and requests from a different user fail identically.
pub fn ensure_correct_user_or_admin(ctx: &RequestContext, username: &str) -> JoblyResult<()> {
    match ctx.access(Some(username)) {
        Access::Admin | Access::Owner => Ok(()),
        Access::Anonymous | Access::Other => deny("correct_user_or_admin"),
    }
}

fn deny(gate: &'static str) -> JoblyResult<()> {
    tracing::debug!(gate, "authorization denied");
    Err(JoblyError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn keys() -> TokenKeys {
        TokenKeys::new(b"secret-test", Duration::from_secs(3600))
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn claims(username: &str, is_admin: bool) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            username: username.to_string(),
            is_admin,
            iat: now,
            exp: now + 3600,
        }
    }

    #[test]
    fn authenticate_accepts_bearer_token() {
        let keys = keys();
        let token = keys.issue("test", false).unwrap();

        let ctx = authenticate(&headers(&format!("Bearer {token}")), &keys);
        let claims = ctx.claims.unwrap();
        assert_eq!(claims.username, "test");
        assert!(!claims.is_admin);
    }

    #[test]
    fn authenticate_accepts_lowercase_scheme_and_padding() {
        let keys = keys();
        let token = keys.issue("admin", true).unwrap();

        let ctx = authenticate(&headers(&format!("bearer  {token} ")), &keys);
        assert!(ctx.is_admin());
    }

    #[test]
    fn authenticate_without_header_is_anonymous() {
        let ctx = authenticate(&HeaderMap::new(), &keys());
        assert_eq!(ctx, RequestContext::anonymous());
    }

    #[test]
    fn authenticate_with_foreign_signature_is_anonymous() {
        let other = TokenKeys::new(b"wrong", Duration::from_secs(3600));
        let token = other.issue("test", true).unwrap();

        let ctx = authenticate(&headers(&format!("Bearer {token}")), &keys());
        assert!(ctx.claims.is_none());
    }

    #[test]
    fn authenticate_with_garbage_is_anonymous() {
        let ctx = authenticate(&headers("Bearer not.a.jwt"), &keys());
        assert!(ctx.claims.is_none());
    }

    #[test]
    fn authenticate_with_expired_token_is_anonymous() {
        let keys = keys();
        let mut expired = claims("test", true);
        expired.iat -= 7200;
        expired.exp -= 7200;
        let token = keys.sign(&expired).unwrap();

        let ctx = authenticate(&headers(&format!("Bearer {token}")), &keys);
        assert!(ctx.claims.is_none());
    }

    #[test]
    fn token_payload_uses_camel_case() {
        let value = serde_json::to_value(claims("u1", true)).unwrap();
        assert_eq!(value["username"], "u1");
        assert_eq!(value["isAdmin"], true);
    }

    #[test]
    fn logged_in_gate() {
        assert!(ensure_logged_in(&RequestContext::with_claims(claims("test", false))).is_ok());
        assert!(ensure_logged_in(&RequestContext::anonymous()).unwrap_err().is_unauthorized());
        assert!(ensure_logged_in(&RequestContext::with_claims(claims("", true))).is_err());
    }

    #[test]
    fn admin_gate() {
        assert!(ensure_admin(&RequestContext::with_claims(claims("admin", true))).is_ok());
        assert!(
            ensure_admin(&RequestContext::with_claims(claims("u1", false)))
                .unwrap_err()
                .is_unauthorized()
        );
        assert!(ensure_admin(&RequestContext::anonymous()).is_err());
    }

    #[test]
    fn correct_user_or_admin_gate() {
        let owner = RequestContext::with_claims(claims("test", false));
        let admin = RequestContext::with_claims(claims("someone-else", true));
        let other = RequestContext::with_claims(claims("wrong", false));

        assert!(ensure_correct_user_or_admin(&owner, "test").is_ok());
        assert!(ensure_correct_user_or_admin(&admin, "test").is_ok());
        assert!(ensure_correct_user_or_admin(&other, "test").unwrap_err().is_unauthorized());
        assert!(
            ensure_correct_user_or_admin(&RequestContext::anonymous(), "test")
                .unwrap_err()
                .is_unauthorized()
        );
    }

    #[test]
    fn access_classification() {
        let owner = RequestContext::with_claims(claims("test", false));
        assert_eq!(owner.access(Some("test")), Access::Owner);
        assert_eq!(owner.access(Some("nope")), Access::Other);
        assert_eq!(owner.access(None), Access::Other);
        assert_eq!(RequestContext::anonymous().access(Some("test")), Access::Anonymous);
        assert_eq!(
            RequestContext::with_claims(claims("x", true)).access(Some("test")),
            Access::Admin
        );
    }
}
