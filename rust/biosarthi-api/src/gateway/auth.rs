//! Caller identity from bearer JWTs.
//!
//! Requests without an `Authorization` header are guests. A header that is
//! present but cannot be verified is rejected with 401 before any handler
//! runs, so handlers only ever see a verified [`Session`] or nothing.

use std::convert::Infallible;

use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::domain::user::Session;

/// Authentication error response.
#[derive(Debug, Serialize)]
pub struct AuthError {
    pub error: String,
    pub message: String,
}

impl AuthError {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// JWT claims issued by the sign-in service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,
    pub email: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Session::new(claims.sub, claims.email)
    }
}

/// Generate an HS256 token for a user.
pub fn generate_jwt(
    user_id: &str,
    email: &str,
    secret: &str,
    expiry_secs: u64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let ttl = i64::try_from(expiry_secs).unwrap_or(i64::MAX);
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: now.saturating_add(ttl),
        iat: now,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a token's signature and expiry.
pub fn validate_jwt(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Resolve the caller and store the [`Session`] in request extensions.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let path = req.uri().path();
    if path == "/health" || path == "/ready" {
        return Ok(next.run(req).await);
    }

    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::new("invalid_auth", "Expected 'Authorization: Bearer <token>'"))?;

    let secret = state
        .config
        .auth
        .jwt_secret
        .as_deref()
        .ok_or_else(|| AuthError::new("configuration_error", "JWT secret not configured"))?;

    let claims = validate_jwt(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AuthError::new("invalid_token", format!("JWT validation failed: {e}"))
    })?;

    req.extensions_mut().insert(Session::from(claims));

    Ok(next.run(req).await)
}

/// The verified caller of a request, `None` for guests.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Session>);

impl Caller {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Session>().cloned()))
    }
}
