use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind `auth_middleware`, which verifies the bearer token
/// and attaches the caller's identity to the request before any handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Own Biodata ---
        .route("/user/get-bio-data/{email}", get(handlers::get_own_bio_data))
        .route("/user/bio-data-edit/{email}", patch(handlers::edit_bio_data))
        // POST /user/make-bio-data-premium-request
        // Queues a copy of the caller's biodata for admin approval.
        .route(
            "/user/make-bio-data-premium-request",
            post(handlers::request_premium),
        )
        // POST /user/success-stories
        // Stories are stored unapproved.
        .route("/user/success-stories", post(handlers::create_success_story))
        // --- Favourites ---
        // GET lists by requester email; DELETE takes a favourite id and only
        // removes the caller's own record. One path, so one parameter name.
        .route(
            "/user/favourites/{key}",
            get(handlers::get_favourites).delete(handlers::remove_favourite),
        )
        .route("/user/add-favourite/{email}", post(handlers::add_favourite))
        // --- Contact Requests & Payments ---
        .route(
            "/user/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .route("/user/payments", post(handlers::record_payment))
        // GET by requester email, DELETE by payment id (owner-only).
        .route(
            "/user/contact-requests/{key}",
            get(handlers::get_my_contact_requests).delete(handlers::remove_contact_request),
        )
}
