use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;

// 1. PaymentProvider Contract
/// PaymentProvider
///
/// The external payment-intent collaborator. Swappable between the real Stripe client
/// and `MockPaymentProvider` without touching the handlers.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a payment intent for `amount_minor` (cents) and returns its client secret,
    /// which the browser uses to confirm the card payment.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, String>;
}

/// to_minor_units
///
/// Converts a major-unit price into minor units (x100). Rounds instead of truncating
/// so `19.99` becomes `1999`.
pub fn to_minor_units(price: f64) -> Result<i64, AppError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::BadInput(format!("invalid price: {price}")));
    }
    Ok((price * 100.0).round() as i64)
}

// 2. The Real Implementation (Stripe)
/// StripeClient
///
/// Talks to the Stripe REST API with the account's secret key.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

#[derive(Deserialize)]
struct StripePaymentIntent {
    client_secret: String,
}

impl StripeClient {
    pub fn new(secret_key: &str) -> Self {
        Self::with_base_url(secret_key, "https://api.stripe.com")
    }

    pub fn with_base_url(secret_key: &str, api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, String> {
        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount_minor.to_string()),
                ("currency", currency.to_string()),
                ("payment_method_types[]", "card".to_string()),
            ])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("stripe responded with {}", response.status()));
        }

        let intent = response
            .json::<StripePaymentIntent>()
            .await
            .map_err(|e| e.to_string())?;
        Ok(intent.client_secret)
    }
}

// 3. The Mock Implementation (For Tests and Local Runs)
/// MockPaymentProvider
///
/// Returns a deterministic client secret, or a simulated provider failure.
#[derive(Clone, Default)]
pub struct MockPaymentProvider {
    /// When true, every call returns a simulated failure.
    pub should_fail: bool,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Payment Error: Simulation requested".to_string());
        }
        Ok(format!("pi_mock_{amount_minor}_{currency}_secret"))
    }
}

/// PaymentState
///
/// The concrete type used to share the payment provider across the application state.
pub type PaymentState = Arc<dyn PaymentProvider>;
