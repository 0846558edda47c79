#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use luxe_matches::{
    AppConfig, AppState, MemoryRepository, MockPaymentProvider, auth, create_router,
    models::{Account, BioData, BioDataType},
    payments::PaymentState,
    repository::{Repository, RepositoryState},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@luxe.test";
pub const MEMBER_EMAIL: &str = "member@luxe.test";

pub fn state_with(repo: Arc<MemoryRepository>, payments: PaymentState) -> AppState {
    AppState {
        repo: repo as RepositoryState,
        payments,
        config: AppConfig::default(),
    }
}

pub fn test_app(repo: Arc<MemoryRepository>) -> Router {
    create_router(state_with(repo, Arc::new(MockPaymentProvider::new())))
}

/// A token signed with the default test configuration's secret.
pub fn token_for(email: &str) -> String {
    let mut claims = Map::new();
    claims.insert("email".to_string(), Value::String(email.to_string()));
    auth::issue_token(claims, &AppConfig::default().jwt_secret).unwrap()
}

pub fn bio(id: i64, kind: BioDataType, division: &str, age: i32) -> BioData {
    BioData {
        bio_data_id: Some(id),
        bio_data_type: Some(kind),
        present_division: Some(division.to_string()),
        age: Some(age),
        ..BioData::default()
    }
}

pub fn account(email: &str, name: &str, bio_data: Option<BioData>) -> Account {
    Account {
        email: email.to_string(),
        name: Some(name.to_string()),
        bio_data,
        ..Account::default()
    }
}

/// Seeds an admin and a plain member, returning the repository.
pub async fn seeded_repo() -> Arc<MemoryRepository> {
    let repo = Arc::new(MemoryRepository::new());
    let mut admin = account(ADMIN_EMAIL, "Admin", None);
    admin.is_admin = true;
    repo.insert_account(admin).await.unwrap();
    repo.insert_account(account(MEMBER_EMAIL, "Member", None))
        .await
        .unwrap();
    repo
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends one request through the router and decodes the JSON body (or `Null`).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
