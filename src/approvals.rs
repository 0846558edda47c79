use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::error::RepoError;
use crate::models::{DeleteOutcome, PremiumApproval, WriteOutcome};
use crate::repository::Repository;

/// approve_premium_request
///
/// Two independent writes, in order:
/// 1. set `isPremium = true` on the requester's account;
/// 2. delete the pending request.
///
/// There is no transaction around them. If phase 2 fails, the account is already
/// premium while the request stays in the pending list; re-approving the same request
/// is harmless and completes the cleanup.
///
/// An unknown request id is a zero-effect success.
pub async fn approve_premium_request(
    repo: &dyn Repository,
    request_id: ObjectId,
) -> Result<PremiumApproval, RepoError> {
    let Some(request) = repo.find_premium_request(request_id).await? else {
        return Ok(PremiumApproval {
            account: WriteOutcome::new(0, 0),
            request: DeleteOutcome::new(0),
        });
    };

    let account = repo.set_premium(&request.email).await?;
    tracing::info!(
        email = %request.email,
        modified = account.modified_count,
        "premium granted, removing request"
    );

    let removed = repo.delete_premium_request(request_id).await.map_err(|e| {
        tracing::error!(
            request_id = %request_id,
            email = %request.email,
            error = %e,
            "premium granted but request removal failed; request remains pending"
        );
        e
    })?;

    Ok(PremiumApproval {
        account,
        request: removed,
    })
}

/// approve_contact_request
///
/// Marks a contact payment approved and stamps `approveAt`. Both fields are set by the
/// same single-document update, so they change together.
pub async fn approve_contact_request(
    repo: &dyn Repository,
    payment_id: ObjectId,
    at: DateTime<Utc>,
) -> Result<WriteOutcome, RepoError> {
    let outcome = repo.approve_payment(payment_id, at).await?;
    if outcome.matched_count == 0 {
        tracing::debug!(payment_id = %payment_id, "approve matched no payment");
    }
    Ok(outcome)
}
