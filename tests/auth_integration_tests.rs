mod common;

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, header, request::Parts},
};
use common::{ADMIN_EMAIL, MEMBER_EMAIL, seeded_repo, state_with, token_for};
use jsonwebtoken::{EncodingKey, Header, encode};
use luxe_matches::{
    AppConfig, AppError, MemoryRepository, MockPaymentProvider,
    auth::{AdminUser, AuthUser, Claims, TOKEN_TTL_SECS, issue_token, require_admin, verify_bearer, verify_token},
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

// --- Helper Functions ---

fn secret() -> String {
    AppConfig::default().jwt_secret
}

fn claims_with_email(email: &str) -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert("email".to_string(), json!(email));
    claims
}

fn signed(claims: &Claims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn request_parts(authorization: Option<HeaderValue>) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

// --- Token Issuance ---

#[test]
fn test_issued_token_round_trips_email_and_extra_claims() {
    let mut claims = claims_with_email("someone@luxe.test");
    claims.insert("name".to_string(), json!("Someone"));

    let token = issue_token(claims, &secret()).unwrap();
    let decoded = verify_token(&token, &secret()).unwrap();

    assert_eq!(decoded.email, "someone@luxe.test");
    assert_eq!(decoded.extra.get("name"), Some(&json!("Someone")));
    assert!(!decoded.extra.contains_key("email"));
}

#[test]
fn test_issued_token_expires_one_day_after_issuance() {
    let token = issue_token(claims_with_email("a@luxe.test"), &secret()).unwrap();
    let decoded = verify_token(&token, &secret()).unwrap();
    assert_eq!(decoded.exp - decoded.iat, TOKEN_TTL_SECS);
    assert_eq!(TOKEN_TTL_SECS, 86_400);
}

#[test]
fn test_client_supplied_expiry_is_ignored() {
    let mut claims = claims_with_email("a@luxe.test");
    claims.insert("exp".to_string(), json!(u32::MAX));
    let token = issue_token(claims, &secret()).unwrap();
    let decoded = verify_token(&token, &secret()).unwrap();
    assert_eq!(decoded.exp - decoded.iat, TOKEN_TTL_SECS);
}

#[test]
fn test_token_with_audience_claim_still_verifies() {
    let mut claims = claims_with_email(MEMBER_EMAIL);
    claims.insert("aud".to_string(), json!("web"));
    claims.insert("sub".to_string(), json!("user-1"));

    let token = issue_token(claims, &secret()).unwrap();
    let user = verify_bearer(Some(&bearer(&token)), &secret()).unwrap();

    assert_eq!(user.email, MEMBER_EMAIL);
    assert_eq!(user.claims.extra.get("aud"), Some(&json!("web")));
}

#[test]
fn test_issue_without_email_is_bad_input() {
    let mut claims = Map::new();
    claims.insert("name".to_string(), json!("No Email"));
    assert!(matches!(issue_token(claims, &secret()), Err(AppError::BadInput(_))));

    let mut claims = Map::new();
    claims.insert("email".to_string(), json!(42));
    assert!(matches!(issue_token(claims, &secret()), Err(AppError::BadInput(_))));
}

// --- Credential Verifier ---

#[test]
fn test_verify_bearer_rejects_missing_and_malformed_headers() {
    let token = token_for(MEMBER_EMAIL);

    assert!(matches!(verify_bearer(None, &secret()), Err(AppError::Unauthenticated)));

    let no_prefix = HeaderValue::from_str(&token).unwrap();
    assert!(matches!(
        verify_bearer(Some(&no_prefix), &secret()),
        Err(AppError::Unauthenticated)
    ));

    let empty = HeaderValue::from_static("Bearer ");
    assert!(matches!(
        verify_bearer(Some(&empty), &secret()),
        Err(AppError::Unauthenticated)
    ));

    let garbage = bearer("not.a.token");
    assert!(matches!(
        verify_bearer(Some(&garbage), &secret()),
        Err(AppError::Unauthenticated)
    ));
}

#[test]
fn test_verify_bearer_rejects_foreign_signature() {
    let token = issue_token(claims_with_email(MEMBER_EMAIL), "some-other-secret").unwrap();
    assert!(matches!(
        verify_bearer(Some(&bearer(&token)), &secret()),
        Err(AppError::Unauthenticated)
    ));
}

#[test]
fn test_verify_bearer_rejects_expired_token() {
    let now = chrono::Utc::now().timestamp() as usize;
    let expired = Claims {
        email: MEMBER_EMAIL.to_string(),
        iat: now - 2 * TOKEN_TTL_SECS,
        exp: now - TOKEN_TTL_SECS,
        extra: Map::new(),
    };
    let token = signed(&expired, &secret());
    assert!(matches!(
        verify_bearer(Some(&bearer(&token)), &secret()),
        Err(AppError::Unauthenticated)
    ));
}

#[test]
fn test_verify_bearer_accepts_valid_token() {
    let user = verify_bearer(Some(&bearer(&token_for(MEMBER_EMAIL))), &secret()).unwrap();
    assert_eq!(user.email, MEMBER_EMAIL);
}

#[tokio::test]
async fn test_auth_user_extractor_reads_authorization_header() {
    let repo = Arc::new(MemoryRepository::new());
    let state = state_with(repo.clone(), Arc::new(MockPaymentProvider::new()));

    let mut parts = request_parts(Some(bearer(&token_for(MEMBER_EMAIL))));
    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(user.email, MEMBER_EMAIL);
    // Verification is pure: the store is never consulted.
    assert_eq!(repo.operations(), 0);
}

#[tokio::test]
async fn test_auth_user_extractor_rejects_missing_header() {
    let state = state_with(
        Arc::new(MemoryRepository::new()),
        Arc::new(MockPaymentProvider::new()),
    );
    let mut parts = request_parts(None);
    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Unauthenticated)));
}

// --- Authority Gate ---

#[tokio::test]
async fn test_require_admin_succeeds_only_for_admin_accounts() {
    let repo = seeded_repo().await;

    let admin = verify_bearer(Some(&bearer(&token_for(ADMIN_EMAIL))), &secret()).unwrap();
    let member = verify_bearer(Some(&bearer(&token_for(MEMBER_EMAIL))), &secret()).unwrap();
    let stranger = verify_bearer(Some(&bearer(&token_for("nobody@luxe.test"))), &secret()).unwrap();

    assert!(require_admin(repo.as_ref(), &admin).await.is_ok());
    assert!(matches!(
        require_admin(repo.as_ref(), &member).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        require_admin(repo.as_ref(), &stranger).await,
        Err(AppError::Forbidden)
    ));
}

#[tokio::test]
async fn test_require_admin_rereads_the_store_every_time() {
    let repo = seeded_repo().await;
    let admin = verify_bearer(Some(&bearer(&token_for(ADMIN_EMAIL))), &secret()).unwrap();

    let before = repo.operations();
    require_admin(repo.as_ref(), &admin).await.unwrap();
    require_admin(repo.as_ref(), &admin).await.unwrap();
    assert_eq!(repo.operations() - before, 2);
}

#[tokio::test]
async fn test_admin_extractor_without_credentials_never_touches_store() {
    let repo = seeded_repo().await;
    let state = state_with(repo.clone(), Arc::new(MockPaymentProvider::new()));
    let before = repo.operations();

    let mut parts = request_parts(None);
    let result = AdminUser::from_request_parts(&mut parts, &state).await;

    assert!(matches!(result, Err(AppError::Unauthenticated)));
    assert_eq!(repo.operations(), before);
}

#[tokio::test]
async fn test_admin_extractor_forbids_members() {
    let repo = seeded_repo().await;
    let state = state_with(repo, Arc::new(MockPaymentProvider::new()));

    let mut parts = request_parts(Some(bearer(&token_for(MEMBER_EMAIL))));
    let result = AdminUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let mut parts = request_parts(Some(bearer(&token_for(ADMIN_EMAIL))));
    let AdminUser(user) = AdminUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.email, ADMIN_EMAIL);
}
