use crate::error::RepoError;
use crate::models::{
    Account, BioData, BioDataStats, BioDataType, DeleteOutcome, Favourite, InsertOutcome,
    PAYMENT_SUCCEEDED, PaymentRecord, PremiumRequest, Review, WriteOutcome,
};
use crate::query::{BioDataFilter, Pagination, SimilarBioData, UserSearch};
use crate::repository::Repository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

#[derive(Default)]
struct Collections {
    users: Vec<Account>,
    requests: Vec<PremiumRequest>,
    reviews: Vec<Review>,
    favourites: Vec<Favourite>,
    payments: Vec<PaymentRecord>,
}

/// MemoryRepository
///
/// An in-process `Repository` used for local development without MongoDB and as the
/// test double for handler and gate tests. Filters are evaluated through the same
/// query types the MongoDB implementation renders, so both agree on semantics.
///
/// Every call counts as one store operation (see `operations`), and premium request
/// deletion can be made to fail to reproduce the approval fault window.
#[derive(Default)]
pub struct MemoryRepository {
    data: Mutex<Collections>,
    operations: AtomicUsize,
    fail_request_deletes: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations served so far.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// When set, `delete_premium_request` fails with `RepoError::Unavailable`.
    pub fn fail_premium_request_deletes(&self, fail: bool) {
        self.fail_request_deletes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepoError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        self.data
            .lock()
            .map_err(|_| RepoError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn page_of<T: Clone>(items: impl Iterator<Item = T>, page: Pagination) -> Vec<T> {
    items
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

fn with_new_id(id: &mut Option<ObjectId>) -> ObjectId {
    let new_id = ObjectId::new();
    *id = Some(new_id);
    new_id
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, RepoError> {
        let data = self.lock()?;
        Ok(data.users.iter().find(|a| a.email == email).cloned())
    }

    async fn find_account_by_id(&self, id: ObjectId) -> Result<Option<Account>, RepoError> {
        let data = self.lock()?;
        Ok(data.users.iter().find(|a| a.id == Some(id)).cloned())
    }

    async fn insert_account(&self, mut account: Account) -> Result<InsertOutcome, RepoError> {
        let mut data = self.lock()?;
        let id = with_new_id(&mut account.id);
        data.users.push(account);
        Ok(InsertOutcome::inserted(id))
    }

    async fn find_bio_data(
        &self,
        filter: &BioDataFilter,
        page: Pagination,
    ) -> Result<Vec<Account>, RepoError> {
        let data = self.lock()?;
        Ok(page_of(
            data.users.iter().filter(|a| filter.matches(a)).cloned(),
            page,
        ))
    }

    async fn count_bio_data(&self, filter: &BioDataFilter) -> Result<u64, RepoError> {
        let data = self.lock()?;
        Ok(data.users.iter().filter(|a| filter.matches(a)).count() as u64)
    }

    async fn estimated_account_count(&self) -> Result<u64, RepoError> {
        Ok(self.lock()?.users.len() as u64)
    }

    async fn find_similar(
        &self,
        similar: &SimilarBioData,
        limit: i64,
    ) -> Result<Vec<Account>, RepoError> {
        let data = self.lock()?;
        Ok(data
            .users
            .iter()
            .filter(|a| similar.matches(a))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn search_accounts(
        &self,
        search: &UserSearch,
        page: Pagination,
    ) -> Result<Vec<Account>, RepoError> {
        let data = self.lock()?;
        Ok(page_of(
            data.users.iter().filter(|a| search.matches(a)).cloned(),
            page,
        ))
    }

    async fn update_bio_data(
        &self,
        email: &str,
        bio_data: BioData,
    ) -> Result<WriteOutcome, RepoError> {
        let mut data = self.lock()?;
        Ok(match data.users.iter_mut().find(|a| a.email == email) {
            Some(account) => {
                let changed = account.bio_data.as_ref() != Some(&bio_data);
                account.bio_data = Some(bio_data);
                WriteOutcome::new(1, u64::from(changed))
            }
            None => WriteOutcome::new(0, 0),
        })
    }

    async fn set_account_flags(
        &self,
        id: ObjectId,
        is_admin: bool,
        is_premium: bool,
    ) -> Result<WriteOutcome, RepoError> {
        let mut data = self.lock()?;
        Ok(match data.users.iter_mut().find(|a| a.id == Some(id)) {
            Some(account) => {
                let changed = account.is_admin != is_admin || account.is_premium != is_premium;
                account.is_admin = is_admin;
                account.is_premium = is_premium;
                WriteOutcome::new(1, u64::from(changed))
            }
            None => WriteOutcome::new(0, 0),
        })
    }

    async fn set_premium(&self, email: &str) -> Result<WriteOutcome, RepoError> {
        let mut data = self.lock()?;
        Ok(match data.users.iter_mut().find(|a| a.email == email) {
            Some(account) => {
                let changed = !account.is_premium;
                account.is_premium = true;
                WriteOutcome::new(1, u64::from(changed))
            }
            None => WriteOutcome::new(0, 0),
        })
    }

    async fn bio_data_stats(&self) -> Result<BioDataStats, RepoError> {
        let data = self.lock()?;
        let stats = data
            .users
            .iter()
            .filter(|a| a.bio_data.is_some())
            .fold(BioDataStats::default(), |mut stats, account| {
                stats.total += 1;
                match account.bio_data.as_ref().and_then(|b| b.bio_data_type) {
                    Some(BioDataType::Male) => stats.male += 1,
                    Some(BioDataType::Female) => stats.female += 1,
                    None => {}
                }
                if account.is_premium {
                    stats.premium += 1;
                }
                stats
            });
        Ok(stats)
    }

    async fn insert_premium_request(
        &self,
        mut request: PremiumRequest,
    ) -> Result<InsertOutcome, RepoError> {
        let mut data = self.lock()?;
        let id = with_new_id(&mut request.id);
        data.requests.push(request);
        Ok(InsertOutcome::inserted(id))
    }

    async fn list_premium_requests(&self) -> Result<Vec<PremiumRequest>, RepoError> {
        Ok(self.lock()?.requests.clone())
    }

    async fn find_premium_request(
        &self,
        id: ObjectId,
    ) -> Result<Option<PremiumRequest>, RepoError> {
        let data = self.lock()?;
        Ok(data.requests.iter().find(|r| r.id == Some(id)).cloned())
    }

    async fn delete_premium_request(&self, id: ObjectId) -> Result<DeleteOutcome, RepoError> {
        let mut data = self.lock()?;
        if self.fail_request_deletes.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable(
                "simulated failure deleting premium request".to_string(),
            ));
        }
        let before = data.requests.len();
        data.requests.retain(|r| r.id != Some(id));
        Ok(DeleteOutcome::new((before - data.requests.len()) as u64))
    }

    async fn insert_review(&self, mut review: Review) -> Result<InsertOutcome, RepoError> {
        let mut data = self.lock()?;
        let id = with_new_id(&mut review.id);
        data.reviews.push(review);
        Ok(InsertOutcome::inserted(id))
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, RepoError> {
        Ok(self.lock()?.reviews.clone())
    }

    async fn insert_favourite(&self, mut favourite: Favourite) -> Result<InsertOutcome, RepoError> {
        let mut data = self.lock()?;
        let id = with_new_id(&mut favourite.id);
        data.favourites.push(favourite);
        Ok(InsertOutcome::inserted(id))
    }

    async fn list_favourites(&self, requester_email: &str) -> Result<Vec<Favourite>, RepoError> {
        let data = self.lock()?;
        Ok(data
            .favourites
            .iter()
            .filter(|f| f.requester_email == requester_email)
            .cloned()
            .collect())
    }

    async fn delete_favourite(
        &self,
        id: ObjectId,
        requester_email: &str,
    ) -> Result<DeleteOutcome, RepoError> {
        let mut data = self.lock()?;
        let before = data.favourites.len();
        data.favourites
            .retain(|f| !(f.id == Some(id) && f.requester_email == requester_email));
        Ok(DeleteOutcome::new((before - data.favourites.len()) as u64))
    }

    async fn insert_payment(&self, mut payment: PaymentRecord) -> Result<InsertOutcome, RepoError> {
        let mut data = self.lock()?;
        let id = with_new_id(&mut payment.id);
        data.payments.push(payment);
        Ok(InsertOutcome::inserted(id))
    }

    async fn list_payments(&self) -> Result<Vec<PaymentRecord>, RepoError> {
        Ok(self.lock()?.payments.clone())
    }

    async fn list_payments_for(
        &self,
        requester_email: &str,
    ) -> Result<Vec<PaymentRecord>, RepoError> {
        let data = self.lock()?;
        Ok(data
            .payments
            .iter()
            .filter(|p| p.requester_email == requester_email)
            .cloned()
            .collect())
    }

    async fn approve_payment(
        &self,
        id: ObjectId,
        at: DateTime<Utc>,
    ) -> Result<WriteOutcome, RepoError> {
        let mut data = self.lock()?;
        Ok(match data.payments.iter_mut().find(|p| p.id == Some(id)) {
            Some(payment) => {
                payment.approved = true;
                payment.approve_at = Some(at);
                WriteOutcome::new(1, 1)
            }
            None => WriteOutcome::new(0, 0),
        })
    }

    async fn delete_payment(
        &self,
        id: ObjectId,
        requester_email: &str,
    ) -> Result<DeleteOutcome, RepoError> {
        let mut data = self.lock()?;
        let before = data.payments.len();
        data.payments
            .retain(|p| !(p.id == Some(id) && p.requester_email == requester_email));
        Ok(DeleteOutcome::new((before - data.payments.len()) as u64))
    }

    async fn succeeded_revenue(&self) -> Result<f64, RepoError> {
        let data = self.lock()?;
        Ok(data
            .payments
            .iter()
            .filter(|p| p.payment_status == PAYMENT_SUCCEEDED)
            .map(|p| p.amount_paid)
            .sum())
    }
}
