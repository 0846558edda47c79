use crate::{
    AppState, approvals,
    auth::{self, AuthUser},
    error::AppError,
    models::{
        Account, AccountFlagsRequest, AccountWithCount, BioData, BioDataDetails, BioDataPage,
        CreateFavouriteRequest, CreatePaymentRequest, CreateReviewRequest, DashboardStats,
        DeleteOutcome, Favourite, InsertOutcome, PaymentIntentRequest, PaymentIntentResponse,
        PaymentRecord, PremiumApproval, PremiumRequest, PremiumRequestPayload,
        RegisterAccountRequest, Review, TokenResponse, WriteOutcome,
    },
    payments::to_minor_units,
    query::{
        BioDataQuery, SimilarBioData, UserSearchQuery, build_bio_data_filter, build_user_search,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use mongodb::bson::oid::ObjectId;
use serde_json::{Map, Value};

/// How many look-alike profiles accompany a biodata detail view.
const SIMILAR_LIMIT: i64 = 3;
const PAYMENT_CURRENCY: &str = "usd";

fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::BadInput(format!("invalid id: {raw}")))
}

// --- Public Handlers ---

/// root
///
/// [Public Route] Liveness text.
#[utoipa::path(get, path = "/", responses((status = 200, description = "Alive", body = String)))]
pub async fn root() -> &'static str {
    "LuxeMatches is loving"
}

/// issue_token
///
/// [Public Route] Signs the posted claims into a one-day access token.
///
/// *Trust boundary*: no prior login is checked. The token names whatever email the
/// caller posts; the client is expected to have authenticated with its identity
/// provider first.
#[utoipa::path(
    post,
    path = "/jwt",
    responses(
        (status = 200, description = "Signed token", body = TokenResponse),
        (status = 400, description = "Claims without an email")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    claims: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(claims) = claims?;
    let token = auth::issue_token(claims, &state.config.jwt_secret)?;
    Ok(Json(TokenResponse { token }))
}

/// register_user
///
/// [Public Route] Creates an account unless one already exists for the email.
/// The existence check and the insert are separate operations, so two concurrent
/// registrations of one email can both succeed.
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterAccountRequest,
    responses((status = 200, description = "Inserted, or already exists", body = InsertOutcome))
)]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterAccountRequest>, JsonRejection>,
) -> Result<Json<InsertOutcome>, AppError> {
    let Json(payload) = payload?;
    let email = payload.email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::BadInput("email is required".to_string()));
    }

    if state.repo.find_account_by_email(&email).await?.is_some() {
        tracing::debug!(%email, "registration skipped, account exists");
        return Ok(Json(InsertOutcome::already_exists()));
    }

    let account = Account {
        email,
        name: payload.name,
        photo: payload.photo,
        ..Account::default()
    };
    Ok(Json(state.repo.insert_account(account).await?))
}

/// get_success_stories
///
/// [Public Route] Every submitted success story.
#[utoipa::path(
    get,
    path = "/success-stories",
    responses((status = 200, description = "Reviews", body = [Review]))
)]
pub async fn get_success_stories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.repo.list_reviews().await?))
}

/// get_bio_data_listing
///
/// [Public Route] Filtered, paginated biodata browsing. `count` is the number of
/// accounts matching the filter.
#[utoipa::path(
    get,
    path = "/users-bio-data",
    params(BioDataQuery),
    responses((status = 200, description = "One page of matching biodata", body = BioDataPage))
)]
pub async fn get_bio_data_listing(
    State(state): State<AppState>,
    Query(params): Query<BioDataQuery>,
) -> Result<Json<BioDataPage>, AppError> {
    let filter = build_bio_data_filter(&params);
    let page = params.pagination(state.config.max_page_size);

    let users = state.repo.find_bio_data(&filter, page).await?;
    let count = state.repo.count_bio_data(&filter).await?;
    Ok(Json(BioDataPage { users, count }))
}

/// get_bio_data_details
///
/// [Public Route] One account plus up to three profiles of the same biodata type.
/// An unknown id yields `person: null` with no similar profiles.
#[utoipa::path(
    get,
    path = "/user/bioData-details/{id}",
    params(("id" = String, Path, description = "Account ObjectId")),
    responses(
        (status = 200, description = "Person and similar profiles", body = BioDataDetails),
        (status = 400, description = "Malformed id")
    )
)]
pub async fn get_bio_data_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BioDataDetails>, AppError> {
    let id = parse_object_id(&id)?;
    let person = state.repo.find_account_by_id(id).await?;

    let similar = match person
        .as_ref()
        .and_then(|p| p.bio_data.as_ref())
        .and_then(|bio| bio.bio_data_type.map(|t| (t, bio.bio_data_id)))
    {
        Some((bio_data_type, exclude_bio_data_id)) => {
            let similar = SimilarBioData {
                bio_data_type,
                exclude_bio_data_id,
            };
            state.repo.find_similar(&similar, SIMILAR_LIMIT).await?
        }
        None => Vec::new(),
    };

    Ok(Json(BioDataDetails { person, similar }))
}

/// check_user
///
/// [Public Route] The account registered under an email, or `null`.
#[utoipa::path(
    get,
    path = "/check/{email}",
    params(("email" = String, Path, description = "Account email")),
    responses((status = 200, description = "Account or null", body = Account))
)]
pub async fn check_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Option<Account>>, AppError> {
    Ok(Json(state.repo.find_account_by_email(&email).await?))
}

// --- Authenticated Handlers ---

/// get_own_bio_data
///
/// [Authenticated Route] The account for an email plus the *estimated* size of the
/// whole users collection.
#[utoipa::path(
    get,
    path = "/user/get-bio-data/{email}",
    params(("email" = String, Path, description = "Account email")),
    responses((status = 200, description = "Account and collection estimate", body = AccountWithCount))
)]
pub async fn get_own_bio_data(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AccountWithCount>, AppError> {
    let result = state.repo.find_account_by_email(&email).await?;
    let count = state.repo.estimated_account_count().await?;
    Ok(Json(AccountWithCount { result, count }))
}

/// edit_bio_data
///
/// [Authenticated Route] Replaces the embedded biodata of an account.
#[utoipa::path(
    patch,
    path = "/user/bio-data-edit/{email}",
    params(("email" = String, Path, description = "Account email")),
    request_body = BioData,
    responses((status = 200, description = "Update result", body = WriteOutcome))
)]
pub async fn edit_bio_data(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
    bio_data: Result<Json<BioData>, JsonRejection>,
) -> Result<Json<WriteOutcome>, AppError> {
    let Json(bio_data) = bio_data?;
    Ok(Json(state.repo.update_bio_data(&email, bio_data).await?))
}

/// request_premium
///
/// [Authenticated Route] Queues the caller's biodata for premium approval.
#[utoipa::path(
    post,
    path = "/user/make-bio-data-premium-request",
    request_body = PremiumRequestPayload,
    responses((status = 200, description = "Request queued", body = InsertOutcome))
)]
pub async fn request_premium(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<PremiumRequestPayload>, JsonRejection>,
) -> Result<Json<InsertOutcome>, AppError> {
    let Json(payload) = payload?;
    let request = PremiumRequest {
        id: None,
        email,
        bio_data: payload.bio_data,
        requested_at: chrono::Utc::now(),
    };
    Ok(Json(state.repo.insert_premium_request(request).await?))
}

/// create_success_story
///
/// [Authenticated Route] Submits a success story. Stories always start unapproved.
#[utoipa::path(
    post,
    path = "/user/success-stories",
    request_body = CreateReviewRequest,
    responses((status = 200, description = "Story stored", body = InsertOutcome))
)]
pub async fn create_success_story(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<Json<InsertOutcome>, AppError> {
    let Json(payload) = payload?;
    let review = Review {
        id: None,
        email,
        self_bio_data_id: payload.self_bio_data_id,
        partner_bio_data_id: payload.partner_bio_data_id,
        couple_image: payload.couple_image,
        marriage_date: payload.marriage_date,
        rating: payload.rating,
        success_story: payload.success_story,
        approved: false,
    };
    Ok(Json(state.repo.insert_review(review).await?))
}

/// get_favourites
///
/// [Authenticated Route] Favourites saved under an email.
#[utoipa::path(
    get,
    path = "/user/favourites/{email}",
    params(("email" = String, Path, description = "Requester email")),
    responses((status = 200, description = "Favourites", body = [Favourite]))
)]
pub async fn get_favourites(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Favourite>>, AppError> {
    Ok(Json(state.repo.list_favourites(&email).await?))
}

/// add_favourite
///
/// [Authenticated Route] Saves a biodata under the requester email in the path.
#[utoipa::path(
    post,
    path = "/user/add-favourite/{email}",
    params(("email" = String, Path, description = "Requester email")),
    request_body = CreateFavouriteRequest,
    responses((status = 200, description = "Favourite stored", body = InsertOutcome))
)]
pub async fn add_favourite(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
    payload: Result<Json<CreateFavouriteRequest>, JsonRejection>,
) -> Result<Json<InsertOutcome>, AppError> {
    let Json(payload) = payload?;
    let favourite = Favourite {
        id: None,
        requester_email: email,
        bio_data_id: payload.bio_data_id,
        name: payload.name,
        present_division: payload.present_division,
        occupation: payload.occupation,
    };
    Ok(Json(state.repo.insert_favourite(favourite).await?))
}

/// remove_favourite
///
/// [Authenticated Route] Deletes one of the caller's favourites. Someone else's
/// favourite id deletes nothing.
#[utoipa::path(
    delete,
    path = "/user/favourites/{id}",
    params(("id" = String, Path, description = "Favourite ObjectId")),
    responses((status = 200, description = "Delete result", body = DeleteOutcome))
)]
pub async fn remove_favourite(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = parse_object_id(&id)?;
    Ok(Json(state.repo.delete_favourite(id, &email).await?))
}

/// create_payment_intent
///
/// [Authenticated Route] Creates a payment intent for a contact request. `price` is in
/// dollars; the provider is charged in cents.
#[utoipa::path(
    post,
    path = "/user/create-payment-intent",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Client secret", body = PaymentIntentResponse),
        (status = 400, description = "Invalid price"),
        (status = 502, description = "Provider failure")
    )
)]
pub async fn create_payment_intent(
    _user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<PaymentIntentRequest>, JsonRejection>,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    let Json(payload) = payload?;
    let amount = to_minor_units(payload.price)?;
    let client_secret = state
        .payments
        .create_payment_intent(amount, PAYMENT_CURRENCY)
        .await
        .map_err(AppError::Payment)?;
    Ok(Json(PaymentIntentResponse { client_secret }))
}

/// record_payment
///
/// [Authenticated Route] Stores a confirmed contact-request payment for the caller.
#[utoipa::path(
    post,
    path = "/user/payments",
    request_body = CreatePaymentRequest,
    responses((status = 200, description = "Payment stored", body = InsertOutcome))
)]
pub async fn record_payment(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<Json<InsertOutcome>, AppError> {
    let Json(payload) = payload?;
    let payment = PaymentRecord {
        id: None,
        requester_email: email,
        bio_data_id: payload.bio_data_id,
        transaction_id: payload.transaction_id,
        payment_status: payload.payment_status,
        amount_paid: payload.amount_paid,
        approved: false,
        approve_at: None,
    };
    Ok(Json(state.repo.insert_payment(payment).await?))
}

/// get_my_contact_requests
///
/// [Authenticated Route] Contact payments made by an email.
#[utoipa::path(
    get,
    path = "/user/contact-requests/{email}",
    params(("email" = String, Path, description = "Requester email")),
    responses((status = 200, description = "Contact requests", body = [PaymentRecord]))
)]
pub async fn get_my_contact_requests(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<PaymentRecord>>, AppError> {
    Ok(Json(state.repo.list_payments_for(&email).await?))
}

/// remove_contact_request
///
/// [Authenticated Route] Deletes one of the caller's contact requests.
#[utoipa::path(
    delete,
    path = "/user/contact-requests/{id}",
    params(("id" = String, Path, description = "Payment ObjectId")),
    responses((status = 200, description = "Delete result", body = DeleteOutcome))
)]
pub async fn remove_contact_request(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = parse_object_id(&id)?;
    Ok(Json(state.repo.delete_payment(id, &email).await?))
}

// --- Admin Handlers ---
// The admin router's middleware has already passed both gates for every handler below.

/// get_admin_stats
///
/// [Admin Route] Biodata counters plus revenue from succeeded payments.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Dashboard stats", body = DashboardStats))
)]
pub async fn get_admin_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = state.repo.bio_data_stats().await?;
    let revenue = state.repo.succeeded_revenue().await?;
    Ok(Json(DashboardStats {
        total: stats.total,
        male: stats.male,
        female: stats.female,
        premium: stats.premium,
        revenue,
    }))
}

/// manage_users
///
/// [Admin Route] Paginated account search by name.
#[utoipa::path(
    get,
    path = "/admin/manage-users",
    params(UserSearchQuery),
    responses((status = 200, description = "Accounts", body = [Account]))
)]
pub async fn manage_users(
    State(state): State<AppState>,
    Query(params): Query<UserSearchQuery>,
) -> Result<Json<Vec<Account>>, AppError> {
    let search = build_user_search(&params);
    let page = params.pagination(state.config.max_page_size);
    Ok(Json(state.repo.search_accounts(&search, page).await?))
}

/// set_account_flags
///
/// [Admin Route] Sets both privilege flags on an account. An omitted flag is set to false.
#[utoipa::path(
    patch,
    path = "/admin/make-admin/make-premium/{id}",
    params(("id" = String, Path, description = "Account ObjectId")),
    request_body = AccountFlagsRequest,
    responses((status = 200, description = "Update result", body = WriteOutcome))
)]
pub async fn set_account_flags(
    State(state): State<AppState>,
    Path(id): Path<String>,
    flags: Result<Json<AccountFlagsRequest>, JsonRejection>,
) -> Result<Json<WriteOutcome>, AppError> {
    let Json(flags) = flags?;
    let id = parse_object_id(&id)?;
    let outcome = state
        .repo
        .set_account_flags(
            id,
            flags.is_admin.unwrap_or(false),
            flags.is_premium.unwrap_or(false),
        )
        .await?;
    Ok(Json(outcome))
}

/// get_premium_requests
///
/// [Admin Route] Pending premium requests.
#[utoipa::path(
    get,
    path = "/admin/premium-requests",
    responses((status = 200, description = "Pending requests", body = [PremiumRequest]))
)]
pub async fn get_premium_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<PremiumRequest>>, AppError> {
    Ok(Json(state.repo.list_premium_requests().await?))
}

/// approve_premium_request
///
/// [Admin Route] Grants premium to the requester and removes the request.
#[utoipa::path(
    patch,
    path = "/admin/premium-requests/{id}",
    params(("id" = String, Path, description = "Premium request ObjectId")),
    responses((status = 200, description = "Both phase results", body = PremiumApproval))
)]
pub async fn approve_premium_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PremiumApproval>, AppError> {
    let id = parse_object_id(&id)?;
    Ok(Json(
        approvals::approve_premium_request(state.repo.as_ref(), id).await?,
    ))
}

/// get_admin_success_stories
///
/// [Admin Route] Every success story, approved or not.
#[utoipa::path(
    get,
    path = "/admin/success-stories",
    responses((status = 200, description = "Reviews", body = [Review]))
)]
pub async fn get_admin_success_stories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.repo.list_reviews().await?))
}

/// get_contact_requests
///
/// [Admin Route] Every contact-request payment.
#[utoipa::path(
    get,
    path = "/admin/contact-requests",
    responses((status = 200, description = "Contact requests", body = [PaymentRecord]))
)]
pub async fn get_contact_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentRecord>>, AppError> {
    Ok(Json(state.repo.list_payments().await?))
}

/// approve_contact_request
///
/// [Admin Route] Approves a contact request and stamps the approval time.
#[utoipa::path(
    patch,
    path = "/admin/contact-requests/{id}",
    params(("id" = String, Path, description = "Payment ObjectId")),
    responses((status = 200, description = "Update result", body = WriteOutcome))
)]
pub async fn approve_contact_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WriteOutcome>, AppError> {
    let id = parse_object_id(&id)?;
    Ok(Json(
        approvals::approve_contact_request(state.repo.as_ref(), id, chrono::Utc::now()).await?,
    ))
}
