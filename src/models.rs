use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Serializes record ids as plain hex strings so JSON clients see `"_id": "65f..."`
/// instead of the extended-JSON `{ "$oid": ... }` form. Records are inserted without
/// an id, so this never reaches BSON.
mod hex_id {
    use mongodb::bson::oid::ObjectId;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(id: &Option<ObjectId>, s: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(oid) => s.serialize_str(&oid.to_hex()),
            None => s.serialize_none(),
        }
    }
}

// --- Stored Records (Mapped to Collections) ---

/// BioDataType
///
/// The gender facet of a biodata profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum BioDataType {
    Male,
    Female,
}

impl BioDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BioDataType::Male => "Male",
            BioDataType::Female => "Female",
        }
    }
}

/// BioData
///
/// A user's matrimonial profile, embedded in the owning account under `bioData`.
/// `bioDataType`, `presentDivision` and `age` are the filter facets.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BioData {
    #[serde(default)]
    pub bio_data_id: Option<i64>,
    #[serde(default)]
    pub bio_data_type: Option<BioDataType>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_division: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_division: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fathers_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mothers_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_partner_age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_partner_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_partner_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

/// Account
///
/// A registered user in the `users` collection. The email is the identity key;
/// `isAdmin` and `isPremium` are independent flags.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Account {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "hex_id::serialize"
    )]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_data: Option<BioData>,
}

/// PremiumRequest
///
/// A pending request, stored in `requests`, to upgrade the requester's account to premium.
/// Holds a copy of the biodata submitted at request time.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PremiumRequest {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "hex_id::serialize"
    )]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub email: String,
    pub bio_data: BioData,
    #[ts(type = "string")]
    pub requested_at: DateTime<Utc>,
}

/// Review
///
/// A success story submitted by a matched couple. `approved` starts false and no
/// route flips it yet.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Review {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "hex_id::serialize"
    )]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_bio_data_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_bio_data_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub couple_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marriage_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_story: Option<String>,
    #[serde(default)]
    pub approved: bool,
}

/// Favourite
///
/// A biodata bookmarked by `requesterEmail`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Favourite {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "hex_id::serialize"
    )]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub requester_email: String,
    pub bio_data_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_division: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
}

/// PaymentRecord
///
/// A paid contact request. Created once the client confirms the payment intent,
/// approved by an admin, deletable by its requester.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentRecord {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "hex_id::serialize"
    )]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub requester_email: String,
    pub bio_data_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub payment_status: String,
    pub amount_paid: f64,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub approve_at: Option<DateTime<Utc>>,
}

/// Stripe's status string for a captured payment.
pub const PAYMENT_SUCCEEDED: &str = "succeeded";

// --- Request Payloads (Input Schemas) ---

/// RegisterAccountRequest
///
/// Input for `POST /users`. Privilege flags are not accepted from the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterAccountRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PremiumRequestPayload {
    pub bio_data: BioData,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub self_bio_data_id: Option<i64>,
    #[serde(default)]
    pub partner_bio_data_id: Option<i64>,
    #[serde(default)]
    pub couple_image: Option<String>,
    #[serde(default)]
    pub marriage_date: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub success_story: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateFavouriteRequest {
    pub bio_data_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub present_division: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
}

/// AccountFlagsRequest
///
/// Input for the admin promotion route. Missing flags are treated as false.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccountFlagsRequest {
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub is_premium: Option<bool>,
}

/// PaymentIntentRequest
///
/// `price` is in major currency units (dollars).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PaymentIntentRequest {
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreatePaymentRequest {
    pub bio_data_id: i64,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub payment_status: String,
    pub amount_paid: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

// --- Listing & Dashboard Schemas (Output) ---

/// BioDataPage
///
/// One page of the biodata listing. `count` is the number of accounts matching the
/// filter, not the page length.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BioDataPage {
    pub users: Vec<Account>,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BioDataDetails {
    pub person: Option<Account>,
    pub similar: Vec<Account>,
}

/// AccountWithCount
///
/// `count` here is the estimated size of the whole `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AccountWithCount {
    pub result: Option<Account>,
    pub count: u64,
}

/// BioDataStats
///
/// Counters from the single aggregation pass over accounts that have biodata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BioDataStats {
    pub total: u64,
    pub male: u64,
    pub female: u64,
    pub premium: u64,
}

/// DashboardStats
///
/// Output for `GET /admin/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total: u64,
    pub male: u64,
    pub female: u64,
    pub premium: u64,
    pub revenue: f64,
}

// --- Write Results ---

/// InsertOutcome
///
/// Mirrors the driver's insert acknowledgement. Registration of an existing email
/// yields `insertedId: null` plus a message instead of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InsertOutcome {
    pub fn inserted(id: ObjectId) -> Self {
        Self {
            acknowledged: true,
            inserted_id: Some(id.to_hex()),
            message: None,
        }
    }

    pub fn already_exists() -> Self {
        Self {
            acknowledged: true,
            inserted_id: None,
            message: Some("user already exists".to_string()),
        }
    }
}

/// WriteOutcome
///
/// Result of a single-document update. A filter that matches nothing is not an error:
/// it reports zero counts and callers decide what that means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WriteOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl WriteOutcome {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteOutcome {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// PremiumApproval
///
/// Both phases of a premium approval, reported separately because they are not atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PremiumApproval {
    pub account: WriteOutcome,
    pub request: DeleteOutcome,
}
