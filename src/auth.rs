use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderValue, header, request::Parts},
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    config::AppConfig,
    error::AppError,
    repository::{Repository, RepositoryState},
};

/// Tokens expire one day after issuance.
pub const TOKEN_TTL_SECS: usize = 24 * 60 * 60;

/// Claims
///
/// The payload carried inside an access token. `email` identifies the caller; any
/// other claims supplied at issuance are kept verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    /// Issued At (iat).
    pub iat: usize,
    /// Expiration Time (exp). Always `iat + TOKEN_TTL_SECS`.
    pub exp: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// AuthUser
///
/// The verified identity of a request. Produced purely from the token: no store
/// access happens during verification.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub claims: Claims,
}

/// AdminUser
///
/// An `AuthUser` whose account has additionally passed the admin authority gate.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// issue_token
///
/// Signs the caller-supplied claims with a one-day expiry. The claims must carry a
/// string `email`. Issuance is not preceded by any login step: whoever calls `/jwt`
/// receives a token for the email they name.
pub fn issue_token(mut payload: Map<String, Value>, secret: &str) -> Result<String, AppError> {
    let email = match payload.remove("email") {
        Some(Value::String(email)) if !email.trim().is_empty() => email,
        _ => return Err(AppError::BadInput("token claims must include an email".to_string())),
    };
    payload.remove("iat");
    payload.remove("exp");

    let iat = chrono::Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        email,
        iat,
        exp: iat + TOKEN_TTL_SECS,
        extra: payload,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// verify_token
///
/// Checks the HS256 signature and expiry of a raw token.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // Issued tokens may carry a caller-supplied `aud`; no audience is enforced.
    validation.validate_aud = false;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!(reason = ?other, "rejected invalid token"),
            }
            AppError::Unauthenticated
        })
}

/// verify_bearer
///
/// The credential verifier: `Authorization: Bearer <token>` in, identity out.
/// Absent, malformed, badly-signed or expired credentials are all `Unauthenticated`.
pub fn verify_bearer(header: Option<&HeaderValue>, secret: &str) -> Result<AuthUser, AppError> {
    let token = header
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthenticated)?;

    let claims = verify_token(token, secret)?;
    Ok(AuthUser {
        email: claims.email.clone(),
        claims,
    })
}

/// require_admin
///
/// The authority gate. Re-reads the caller's account on every call; succeeds only
/// when the account exists and has `isAdmin = true`.
pub async fn require_admin(repo: &dyn Repository, identity: &AuthUser) -> Result<(), AppError> {
    match repo.find_account_by_email(&identity.email).await? {
        Some(account) if account.is_admin => Ok(()),
        _ => {
            tracing::warn!(email = %identity.email, "admin gate rejected caller");
            Err(AppError::Forbidden)
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Reuses an identity already attached to the request extensions by the
/// authentication middleware; otherwise verifies the bearer token itself.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);
        let user = verify_bearer(parts.headers.get(header::AUTHORIZATION), &config.jwt_secret)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// AdminUser Extractor Implementation
///
/// Composes the two gates: token verification first (401), then the admin lookup (403).
/// A request without credentials never reaches the store.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    RepositoryState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let repo = RepositoryState::from_ref(state);
        require_admin(repo.as_ref(), &user).await?;
        Ok(AdminUser(user))
    }
}
