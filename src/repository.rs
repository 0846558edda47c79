use crate::error::RepoError;
use crate::models::{
    Account, BioData, BioDataStats, DeleteOutcome, Favourite, InsertOutcome, PAYMENT_SUCCEEDED,
    PaymentRecord, PremiumRequest, Review, WriteOutcome,
};
use crate::query::{BioDataFilter, Pagination, SimilarBioData, UserSearch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Bson, Document, doc, oid::ObjectId, to_bson},
    results::{DeleteResult, InsertOneResult, UpdateResult},
};
use std::sync::Arc;

// Collection namespaces inside the application database.
pub const USERS: &str = "users";
pub const REQUESTS: &str = "requests";
pub const REVIEWS: &str = "reviews";
pub const FAVOURITES: &str = "favourites";
pub const PAYMENTS: &str = "payments";

/// Repository Trait
///
/// The record access facade: the only seam through which handlers and the auth gate
/// read or write accounts, premium requests, reviews, favourites and payments.
///
/// Every write touches a single document. Nothing here spans collections atomically,
/// and a filter that matches nothing reports zero counts rather than an error.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, RepoError>;
    async fn find_account_by_id(&self, id: ObjectId) -> Result<Option<Account>, RepoError>;
    async fn insert_account(&self, account: Account) -> Result<InsertOutcome, RepoError>;
    // One page of accounts matching the biodata filter.
    async fn find_bio_data(
        &self,
        filter: &BioDataFilter,
        page: Pagination,
    ) -> Result<Vec<Account>, RepoError>;
    // Number of accounts matching the biodata filter (not the page length).
    async fn count_bio_data(&self, filter: &BioDataFilter) -> Result<u64, RepoError>;
    // Collection-wide size estimate, unrelated to any filter.
    async fn estimated_account_count(&self) -> Result<u64, RepoError>;
    async fn find_similar(
        &self,
        similar: &SimilarBioData,
        limit: i64,
    ) -> Result<Vec<Account>, RepoError>;
    async fn search_accounts(
        &self,
        search: &UserSearch,
        page: Pagination,
    ) -> Result<Vec<Account>, RepoError>;
    // Replaces the embedded biodata of the account with this email.
    async fn update_bio_data(&self, email: &str, bio_data: BioData)
    -> Result<WriteOutcome, RepoError>;
    async fn set_account_flags(
        &self,
        id: ObjectId,
        is_admin: bool,
        is_premium: bool,
    ) -> Result<WriteOutcome, RepoError>;
    async fn set_premium(&self, email: &str) -> Result<WriteOutcome, RepoError>;
    // Single pass over accounts with biodata.
    async fn bio_data_stats(&self) -> Result<BioDataStats, RepoError>;

    // --- Premium Requests ---
    async fn insert_premium_request(
        &self,
        request: PremiumRequest,
    ) -> Result<InsertOutcome, RepoError>;
    async fn list_premium_requests(&self) -> Result<Vec<PremiumRequest>, RepoError>;
    async fn find_premium_request(&self, id: ObjectId)
    -> Result<Option<PremiumRequest>, RepoError>;
    async fn delete_premium_request(&self, id: ObjectId) -> Result<DeleteOutcome, RepoError>;

    // --- Reviews ---
    async fn insert_review(&self, review: Review) -> Result<InsertOutcome, RepoError>;
    async fn list_reviews(&self) -> Result<Vec<Review>, RepoError>;

    // --- Favourites ---
    async fn insert_favourite(&self, favourite: Favourite) -> Result<InsertOutcome, RepoError>;
    async fn list_favourites(&self, requester_email: &str) -> Result<Vec<Favourite>, RepoError>;
    // Owner-only: matches on both id and requester.
    async fn delete_favourite(
        &self,
        id: ObjectId,
        requester_email: &str,
    ) -> Result<DeleteOutcome, RepoError>;

    // --- Payments ---
    async fn insert_payment(&self, payment: PaymentRecord) -> Result<InsertOutcome, RepoError>;
    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, RepoError>;
    async fn list_payments_for(&self, requester_email: &str)
    -> Result<Vec<PaymentRecord>, RepoError>;
    // Sets `approved` and `approveAt` in one update.
    async fn approve_payment(
        &self,
        id: ObjectId,
        at: DateTime<Utc>,
    ) -> Result<WriteOutcome, RepoError>;
    // Owner-only: matches on both id and requester.
    async fn delete_payment(
        &self,
        id: ObjectId,
        requester_email: &str,
    ) -> Result<DeleteOutcome, RepoError>;
    // Sum of `amountPaid` over succeeded payments.
    async fn succeeded_revenue(&self) -> Result<f64, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// MongoRepository
///
/// The `Repository` implementation backed by MongoDB. Collection handles are cheap
/// clones of the client's pooled connection.
#[derive(Clone)]
pub struct MongoRepository {
    users: Collection<Account>,
    requests: Collection<PremiumRequest>,
    reviews: Collection<Review>,
    favourites: Collection<Favourite>,
    payments: Collection<PaymentRecord>,
}

impl MongoRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection(USERS),
            requests: db.collection(REQUESTS),
            reviews: db.collection(REVIEWS),
            favourites: db.collection(FAVOURITES),
            payments: db.collection(PAYMENTS),
        }
    }
}

fn inserted(result: InsertOneResult) -> InsertOutcome {
    InsertOutcome {
        acknowledged: true,
        inserted_id: result.inserted_id.as_object_id().map(|id| id.to_hex()),
        message: None,
    }
}

fn updated(result: UpdateResult) -> WriteOutcome {
    WriteOutcome::new(result.matched_count, result.modified_count)
}

fn deleted(result: DeleteResult) -> DeleteOutcome {
    DeleteOutcome::new(result.deleted_count)
}

/// Reads a numeric aggregation field regardless of the BSON width `$sum` produced.
fn number(doc: &Document, key: &str) -> f64 {
    match doc.get(key) {
        Some(Bson::Int32(n)) => f64::from(*n),
        Some(Bson::Int64(n)) => *n as f64,
        Some(Bson::Double(n)) => *n,
        _ => 0.0,
    }
}

fn count(doc: &Document, key: &str) -> u64 {
    number(doc, key).max(0.0) as u64
}

#[async_trait]
impl Repository for MongoRepository {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, RepoError> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn find_account_by_id(&self, id: ObjectId) -> Result<Option<Account>, RepoError> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }

    /// Ids are always assigned by the server.
    async fn insert_account(&self, mut account: Account) -> Result<InsertOutcome, RepoError> {
        account.id = None;
        Ok(inserted(self.users.insert_one(account).await?))
    }

    async fn find_bio_data(
        &self,
        filter: &BioDataFilter,
        page: Pagination,
    ) -> Result<Vec<Account>, RepoError> {
        let cursor = self
            .users
            .find(filter.to_document())
            .skip(page.skip)
            .limit(page.limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_bio_data(&self, filter: &BioDataFilter) -> Result<u64, RepoError> {
        Ok(self.users.count_documents(filter.to_document()).await?)
    }

    async fn estimated_account_count(&self) -> Result<u64, RepoError> {
        Ok(self.users.estimated_document_count().await?)
    }

    async fn find_similar(
        &self,
        similar: &SimilarBioData,
        limit: i64,
    ) -> Result<Vec<Account>, RepoError> {
        let cursor = self.users.find(similar.to_document()).limit(limit).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_accounts(
        &self,
        search: &UserSearch,
        page: Pagination,
    ) -> Result<Vec<Account>, RepoError> {
        let cursor = self
            .users
            .find(search.to_document())
            .skip(page.skip)
            .limit(page.limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_bio_data(
        &self,
        email: &str,
        bio_data: BioData,
    ) -> Result<WriteOutcome, RepoError> {
        let update = doc! { "$set": { "bioData": to_bson(&bio_data)? } };
        Ok(updated(
            self.users.update_one(doc! { "email": email }, update).await?,
        ))
    }

    async fn set_account_flags(
        &self,
        id: ObjectId,
        is_admin: bool,
        is_premium: bool,
    ) -> Result<WriteOutcome, RepoError> {
        let update = doc! { "$set": { "isAdmin": is_admin, "isPremium": is_premium } };
        Ok(updated(self.users.update_one(doc! { "_id": id }, update).await?))
    }

    async fn set_premium(&self, email: &str) -> Result<WriteOutcome, RepoError> {
        let update = doc! { "$set": { "isPremium": true } };
        Ok(updated(
            self.users.update_one(doc! { "email": email }, update).await?,
        ))
    }

    /// Counts total, male, female and premium accounts in one `$group` stage.
    async fn bio_data_stats(&self) -> Result<BioDataStats, RepoError> {
        let pipeline = vec![
            doc! { "$match": { "bioData": { "$exists": true } } },
            doc! {
                "$group": {
                    "_id": null,
                    "total": { "$sum": 1 },
                    "male": { "$sum": { "$cond": [{ "$eq": ["$bioData.bioDataType", "Male"] }, 1, 0] } },
                    "female": { "$sum": { "$cond": [{ "$eq": ["$bioData.bioDataType", "Female"] }, 1, 0] } },
                    "premium": { "$sum": { "$cond": [{ "$eq": ["$isPremium", true] }, 1, 0] } },
                }
            },
            doc! { "$project": { "_id": 0 } },
        ];

        let mut cursor = self.users.aggregate(pipeline).await?;
        Ok(match cursor.try_next().await? {
            Some(row) => BioDataStats {
                total: count(&row, "total"),
                male: count(&row, "male"),
                female: count(&row, "female"),
                premium: count(&row, "premium"),
            },
            // No account has biodata yet.
            None => BioDataStats::default(),
        })
    }

    async fn insert_premium_request(
        &self,
        mut request: PremiumRequest,
    ) -> Result<InsertOutcome, RepoError> {
        request.id = None;
        Ok(inserted(self.requests.insert_one(request).await?))
    }

    async fn list_premium_requests(&self) -> Result<Vec<PremiumRequest>, RepoError> {
        Ok(self.requests.find(doc! {}).await?.try_collect().await?)
    }

    async fn find_premium_request(
        &self,
        id: ObjectId,
    ) -> Result<Option<PremiumRequest>, RepoError> {
        Ok(self.requests.find_one(doc! { "_id": id }).await?)
    }

    async fn delete_premium_request(&self, id: ObjectId) -> Result<DeleteOutcome, RepoError> {
        Ok(deleted(self.requests.delete_one(doc! { "_id": id }).await?))
    }

    async fn insert_review(&self, mut review: Review) -> Result<InsertOutcome, RepoError> {
        review.id = None;
        Ok(inserted(self.reviews.insert_one(review).await?))
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, RepoError> {
        Ok(self.reviews.find(doc! {}).await?.try_collect().await?)
    }

    async fn insert_favourite(&self, mut favourite: Favourite) -> Result<InsertOutcome, RepoError> {
        favourite.id = None;
        Ok(inserted(self.favourites.insert_one(favourite).await?))
    }

    async fn list_favourites(&self, requester_email: &str) -> Result<Vec<Favourite>, RepoError> {
        Ok(self
            .favourites
            .find(doc! { "requesterEmail": requester_email })
            .await?
            .try_collect()
            .await?)
    }

    async fn delete_favourite(
        &self,
        id: ObjectId,
        requester_email: &str,
    ) -> Result<DeleteOutcome, RepoError> {
        let filter = doc! { "_id": id, "requesterEmail": requester_email };
        Ok(deleted(self.favourites.delete_one(filter).await?))
    }

    async fn insert_payment(&self, mut payment: PaymentRecord) -> Result<InsertOutcome, RepoError> {
        payment.id = None;
        Ok(inserted(self.payments.insert_one(payment).await?))
    }

    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, RepoError> {
        Ok(self.payments.find(doc! {}).await?.try_collect().await?)
    }

    async fn list_payments_for(
        &self,
        requester_email: &str,
    ) -> Result<Vec<PaymentRecord>, RepoError> {
        Ok(self
            .payments
            .find(doc! { "requesterEmail": requester_email })
            .await?
            .try_collect()
            .await?)
    }

    async fn approve_payment(
        &self,
        id: ObjectId,
        at: DateTime<Utc>,
    ) -> Result<WriteOutcome, RepoError> {
        let update = doc! { "$set": { "approved": true, "approveAt": at.to_rfc3339() } };
        Ok(updated(
            self.payments.update_one(doc! { "_id": id }, update).await?,
        ))
    }

    async fn delete_payment(
        &self,
        id: ObjectId,
        requester_email: &str,
    ) -> Result<DeleteOutcome, RepoError> {
        let filter = doc! { "_id": id, "requesterEmail": requester_email };
        Ok(deleted(self.payments.delete_one(filter).await?))
    }

    async fn succeeded_revenue(&self) -> Result<f64, RepoError> {
        let pipeline = vec![
            doc! { "$match": { "paymentStatus": PAYMENT_SUCCEEDED } },
            doc! { "$group": { "_id": null, "revenue": { "$sum": "$amountPaid" } } },
        ];

        let mut cursor = self.payments.aggregate(pipeline).await?;
        Ok(match cursor.try_next().await? {
            Some(row) => number(&row, "revenue"),
            None => 0.0,
        })
    }
}
