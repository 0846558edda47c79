use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints: liveness, token issuance, registration and the
/// read-only browsing surface.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness text for monitors and load balancers.
        .route("/", get(handlers::root))
        // POST /jwt
        // Signs caller-supplied claims into a one-day token. No login precedes it.
        .route("/jwt", post(handlers::issue_token))
        // POST /users
        // Registers an account; a second registration of the same email is a no-op.
        .route("/users", post(handlers::register_user))
        // GET /success-stories
        .route("/success-stories", get(handlers::get_success_stories))
        // GET /users-bio-data?gender=&division=&minAge=&maxAge=&page=&limit=
        .route("/users-bio-data", get(handlers::get_bio_data_listing))
        // GET /user/bioData-details/{id}
        // One profile plus three of the same biodata type.
        .route(
            "/user/bioData-details/{id}",
            get(handlers::get_bio_data_details),
        )
        // GET /check/{email}
        .route("/check/{email}", get(handlers::check_user))
}
