//! Donations through the payment provider.
//!
//! The site only creates payment intents; the client secret is handed to the
//! browser, which completes the card payment with the provider directly.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::constants::payment::{MIN_AMOUNT_CENTS, SOURCE_TAG, STRIPE_API_BASE};
use crate::error::{Error, Result};

/// A donation about to be turned into a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRequest {
    /// Amount in the currency's minor unit (cents).
    pub amount_cents: u64,
    /// Lowercase ISO currency code.
    pub currency: String,
    /// Extra key/value pairs stored with the intent.
    pub metadata: BTreeMap<String, String>,
}

impl DonationRequest {
    /// Donation of `amount_cents` in `currency`.
    pub fn new(amount_cents: u64, currency: impl Into<String>) -> Self {
        Self {
            amount_cents,
            currency: currency.into().to_lowercase(),
            metadata: BTreeMap::new(),
        }
    }

    /// Donation from a dollar amount as typed ("25", "$12.50").
    pub fn from_dollars(text: &str, currency: impl Into<String>) -> Result<Self> {
        let cents = dollars_to_cents(text)
            .ok_or_else(|| Error::payment(format!("{text:?} is not a valid amount"), None))?;
        Ok(Self::new(cents, currency))
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Reject amounts the provider would refuse.
    pub fn validate(&self) -> Result<()> {
        if self.amount_cents < MIN_AMOUNT_CENTS {
            return Err(Error::payment("Amount must be at least $0.50", Some(400)));
        }
        Ok(())
    }
}

/// Parse a dollar amount into cents, rounding half up past two decimals.
pub fn dollars_to_cents(text: &str) -> Option<u64> {
    let text = text.trim().trim_start_matches('$').replace(',', "");
    let (whole, frac) = text.split_once('.').unwrap_or((&text, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let digits: Vec<u64> = frac.chars().filter_map(|c| c.to_digit(10)).map(u64::from).collect();
    let tenths = digits.first().copied().unwrap_or(0);
    let hundredths = digits.get(1).copied().unwrap_or(0);
    let round_up = u64::from(digits.get(2).is_some_and(|&d| d >= 5));
    whole
        .checked_mul(100)?
        .checked_add(tenths * 10 + hundredths + round_up)
}

/// What the browser needs to confirm a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Secret used by the browser to confirm the payment.
    pub client_secret: String,
    /// Provider-side identifier.
    pub payment_intent_id: String,
}

/// A payment provider able to create intents.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Create a payment intent for an already validated request.
    async fn create_intent(&self, request: &DonationRequest) -> Result<PaymentIntent>;
}

/// Validate a donation, tag it with the site source, and create an intent.
pub async fn donate(service: &dyn PaymentService, request: DonationRequest) -> Result<PaymentIntent> {
    request.validate()?;
    let request = request.with_metadata("source", SOURCE_TAG);
    tracing::info!(
        "Creating payment intent for {} {}",
        request.amount_cents,
        request.currency
    );
    let intent = service.create_intent(&request).await?;
    tracing::info!("Payment intent created: {}", intent.payment_intent_id);
    Ok(intent)
}

/// Stripe client for payment intents.
#[derive(Clone)]
pub struct StripeClient {
    secret_key: String,
    base_url: String,
    client: Client,
}

impl StripeClient {
    /// Create a client from config
    pub fn new(config: &Config) -> Self {
        Self {
            secret_key: config.stripe_secret_key.clone(),
            base_url: STRIPE_API_BASE.to_string(),
            client: Client::builder()
                .timeout(config.fetch_timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Form fields for the intent request.
    fn form_fields(request: &DonationRequest) -> Vec<(String, String)> {
        let mut fields = vec![
            ("amount".to_string(), request.amount_cents.to_string()),
            ("currency".to_string(), request.currency.clone()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        fields.extend(
            request
                .metadata
                .iter()
                .map(|(k, v)| (format!("metadata[{k}]"), v.clone())),
        );
        fields
    }
}

#[async_trait]
impl PaymentService for StripeClient {
    async fn create_intent(&self, request: &DonationRequest) -> Result<PaymentIntent> {
        if self.secret_key.is_empty() {
            return Err(Error::config(
                "Payment provider not configured",
                "Set the STRIPE_SECRET_KEY environment variable",
            ));
        }

        let url = format!("{}/payment_intents", self.base_url);
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&Self::form_fields(request))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Payment intent request failed: {e}")))?;

        let status = resp.status();
        let json: Value = resp
            .json()
            .await
            .map_err(|e| Error::parse(format!("Invalid JSON from payment provider: {e}"), None))?;

        if !status.is_success() {
            let message = json["error"]["message"]
                .as_str()
                .unwrap_or("Failed to create payment intent")
                .to_string();
            return Err(Error::payment(message, Some(status.as_u16())));
        }

        let client_secret = json["client_secret"]
            .as_str()
            .ok_or_else(|| Error::parse("Missing client_secret in payment intent", None))?
            .to_string();
        let payment_intent_id = json["id"].as_str().unwrap_or_default().to_string();

        Ok(PaymentIntent { client_secret, payment_intent_id })
    }
}
