use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod approvals;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod payments;
pub mod query;
pub mod repository;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::{AdminUser, AuthUser};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, RepoError};
pub use memory::MemoryRepository;
pub use payments::{MockPaymentProvider, PaymentState, StripeClient};
pub use repository::{MongoRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and schema into the OpenAPI document
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root, handlers::issue_token, handlers::register_user,
        handlers::get_success_stories, handlers::get_bio_data_listing,
        handlers::get_bio_data_details, handlers::check_user,
        handlers::get_own_bio_data, handlers::edit_bio_data, handlers::request_premium,
        handlers::create_success_story, handlers::get_favourites, handlers::add_favourite,
        handlers::remove_favourite, handlers::create_payment_intent, handlers::record_payment,
        handlers::get_my_contact_requests, handlers::remove_contact_request,
        handlers::get_admin_stats, handlers::manage_users, handlers::set_account_flags,
        handlers::get_premium_requests, handlers::approve_premium_request,
        handlers::get_admin_success_stories, handlers::get_contact_requests,
        handlers::approve_contact_request,
    ),
    components(
        schemas(
            models::Account, models::BioData, models::BioDataType, models::PremiumRequest,
            models::Review, models::Favourite, models::PaymentRecord,
            models::RegisterAccountRequest, models::PremiumRequestPayload,
            models::CreateReviewRequest, models::CreateFavouriteRequest,
            models::AccountFlagsRequest, models::PaymentIntentRequest,
            models::PaymentIntentResponse, models::CreatePaymentRequest, models::TokenResponse,
            models::BioDataPage, models::BioDataDetails, models::AccountWithCount,
            models::DashboardStats, models::InsertOutcome, models::WriteOutcome,
            models::DeleteOutcome, models::PremiumApproval,
        )
    ),
    tags(
        (name = "luxe-matches", description = "LuxeMatches matrimonial API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request: the record access
/// facade, the payment provider and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    /// Record access facade (MongoDB in production, in-memory for tests/local runs).
    pub repo: RepositoryState,
    /// Payment-intent provider (Stripe or mock).
    pub payments: PaymentState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Lets the auth extractors pull exactly the dependencies they need from the state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for PaymentState {
    fn from_ref(app_state: &AppState) -> PaymentState {
        app_state.payments.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated routes. Extracting `AuthUser` verifies the bearer token
/// (401 on failure); the identity is then attached to the request extensions for
/// the handler.
async fn auth_middleware(user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// admin_middleware
///
/// Guards the admin routes. `AdminUser` composes token verification (401) with the
/// admin account lookup (403).
async fn admin_middleware(
    AdminUser(user): AdminUser,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// cors_layer
///
/// Browser access is limited to the configured origins, with credentials allowed.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// create_router
///
/// Assembles the routing structure, applies the gates per route group, and wraps
/// everything in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Header name used for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of one request carries the same
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
