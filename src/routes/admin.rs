use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch},
};

/// Admin Router Module
///
/// Nested under `/admin` and wrapped in `admin_middleware`: the token is verified
/// first (401), then the caller's account is re-read and must have `isAdmin` (403).
///
/// No route approves or rejects success stories yet, so `approved` stays false.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Biodata totals by gender, premium count and succeeded revenue.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/manage-users?q=&page=&limit=
        .route("/manage-users", get(handlers::manage_users))
        // PATCH /admin/make-admin/make-premium/{id}
        // Sets isAdmin and isPremium together.
        .route(
            "/make-admin/make-premium/{id}",
            patch(handlers::set_account_flags),
        )
        // GET /admin/premium-requests
        .route("/premium-requests", get(handlers::get_premium_requests))
        // PATCH /admin/premium-requests/{id}
        // Two-phase: grant premium, then delete the request.
        .route(
            "/premium-requests/{id}",
            patch(handlers::approve_premium_request),
        )
        .route("/success-stories", get(handlers::get_admin_success_stories))
        // GET/PATCH /admin/contact-requests
        .route("/contact-requests", get(handlers::get_contact_requests))
        .route(
            "/contact-requests/{id}",
            patch(handlers::approve_contact_request),
        )
}
