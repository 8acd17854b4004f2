use crate::config::Settings;
use crate::database::connection::DbPool;
use crate::models::donation::{
    CreateDonation, Donation, DonationError, DonationStatus, TerminalUpdate,
};
use crate::services::payhere;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const ORDER_REFERENCE_ATTEMPTS: usize = 3;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Minimum donation amount is {currency} {minimum}")]
    InvalidAmount { minimum: Decimal, currency: String },
    #[error("Could not allocate a unique order reference")]
    OrderReferenceExhausted,
    #[error(transparent)]
    Store(#[from] DonationError),
}

/// The three record operations the payment core needs from persistence.
/// Production uses [`PgDonationStore`]; tests substitute an in-memory store.
#[allow(async_fn_in_trait)]
pub trait DonationStore {
    async fn create(&self, donation: CreateDonation) -> Result<Donation, DonationError>;

    async fn find_by_order_reference(
        &self,
        order_reference: &str,
    ) -> Result<Option<Donation>, DonationError>;

    /// Atomic conditional transition out of PENDING. `None` means the record
    /// is missing or already terminal.
    async fn complete_if_pending(
        &self,
        order_reference: &str,
        update: TerminalUpdate,
    ) -> Result<Option<Donation>, DonationError>;
}

#[derive(Clone)]
pub struct PgDonationStore {
    pool: DbPool,
}

impl PgDonationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl DonationStore for PgDonationStore {
    async fn create(&self, donation: CreateDonation) -> Result<Donation, DonationError> {
        Donation::create(&self.pool, donation).await
    }

    async fn find_by_order_reference(
        &self,
        order_reference: &str,
    ) -> Result<Option<Donation>, DonationError> {
        Donation::find_by_order_reference(&self.pool, order_reference).await
    }

    async fn complete_if_pending(
        &self,
        order_reference: &str,
        update: TerminalUpdate,
    ) -> Result<Option<Donation>, DonationError> {
        Donation::complete_if_pending(&self.pool, order_reference, update).await
    }
}

/// Donor contact fields passed through to the gateway checkout form.
#[derive(Debug, Clone)]
pub struct DonorDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct InitiateDonation {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub items: Option<String>,
    pub donor: DonorDetails,
}

/// Payload the donor's browser hands to the gateway's checkout. Field names
/// follow the gateway's form contract.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPayload {
    pub sandbox: bool,
    pub merchant_id: String,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
    pub order_id: String,
    pub items: String,
    pub amount: String,
    pub currency: String,
    pub hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub donation_id: Uuid,
    pub development_mode: bool,
}

/// Webhook fields as delivered by the gateway. Everything is optional so a
/// malformed delivery still reaches the always-acknowledge path instead of
/// bouncing at deserialization.
#[derive(Debug, Clone, Default)]
pub struct NotifyPayload {
    pub order_reference: Option<String>,
    pub status_code: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub signature: Option<String>,
}

/// Domain outcome of one webhook delivery. Every variant is acknowledged
/// with transport-level success; the gateway retries anything else forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The record left PENDING as a result of this delivery.
    Completed(DonationStatus),
    /// Gateway reported the payment still in flight; nothing to record.
    StillPending,
    /// Duplicate or late delivery for a record already terminal.
    AlreadyTerminal,
    /// No record for this order reference; webhooks never create records.
    UnknownOrder,
    MissingOrderReference,
}

pub struct PaymentService<S> {
    store: S,
    settings: Settings,
}

impl<S: DonationStore> PaymentService<S> {
    pub fn new(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Creates a PENDING donation and returns the signed checkout payload.
    /// In bypass mode the record is auto-approved and the gateway is never
    /// contacted.
    pub async fn init(&self, request: InitiateDonation) -> Result<CheckoutPayload, PaymentError> {
        let minimum = self.settings.minimum_donation_amount;
        if request.amount < minimum {
            return Err(PaymentError::InvalidAmount {
                minimum,
                currency: self.settings.donation_currency.clone(),
            });
        }

        let bypass = self.settings.bypass_payment_gateway;
        let status = if bypass {
            DonationStatus::Success
        } else {
            DonationStatus::Pending
        };

        for _ in 0..ORDER_REFERENCE_ATTEMPTS {
            let order_reference = new_order_reference();
            let create = CreateDonation {
                user_id: request.user_id,
                order_reference: order_reference.clone(),
                amount: request.amount,
                currency: self.settings.donation_currency.clone(),
                status,
                address: Some(request.donor.address.clone()),
                city: Some(request.donor.city.clone()),
            };

            match self.store.create(create).await {
                Ok(donation) => {
                    if bypass {
                        info!(
                            order_reference = %donation.order_reference,
                            "Bypass mode active, donation auto-approved"
                        );
                    } else {
                        info!(
                            order_reference = %donation.order_reference,
                            amount = %donation.amount,
                            "Donation initiated"
                        );
                    }
                    return Ok(self.checkout_payload(&donation, &request));
                }
                Err(DonationError::DuplicateOrderReference) => {
                    warn!(%order_reference, "Order reference collision, regenerating");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PaymentError::OrderReferenceExhausted)
    }

    fn checkout_payload(&self, donation: &Donation, request: &InitiateDonation) -> CheckoutPayload {
        let settings = &self.settings;
        let hash = payhere::merchant_hash(
            &settings.payhere_merchant_id,
            settings.merchant_secret(),
            &donation.order_reference,
            donation.amount,
            &donation.currency,
        );

        CheckoutPayload {
            sandbox: settings.payhere_sandbox,
            merchant_id: settings.payhere_merchant_id.clone(),
            return_url: format!(
                "{}/payment/success?order_id={}",
                settings.frontend_url, donation.order_reference
            ),
            cancel_url: format!(
                "{}/payment/cancel?order_id={}",
                settings.frontend_url, donation.order_reference
            ),
            notify_url: settings.notify_url(),
            order_id: donation.order_reference.clone(),
            items: request
                .items
                .clone()
                .unwrap_or_else(|| "NGO Donation".to_string()),
            amount: payhere::format_amount(donation.amount),
            currency: donation.currency.clone(),
            hash,
            first_name: request.donor.first_name.clone(),
            last_name: request.donor.last_name.clone(),
            email: request.donor.email.clone(),
            phone: request.donor.phone.clone(),
            address: request.donor.address.clone(),
            city: request.donor.city.clone(),
            country: "Sri Lanka".to_string(),
            donation_id: donation.id,
            development_mode: settings.bypass_payment_gateway,
        }
    }

    /// Webhook reconciliation. The caller acknowledges transport-level
    /// receipt no matter what this returns; storage errors bubble up only so
    /// they can be logged before the acknowledgment goes out.
    ///
    /// Transition rules, in order:
    /// - missing order reference: nothing to do;
    /// - invalid signature: force FAILED, whatever the status code claims;
    /// - pending status code: no-op, the record stays PENDING;
    /// - success status code: re-verify amount and currency against the
    ///   stored record, mismatch forces FAILED;
    /// - anything else: FAILED.
    /// The write itself is conditional on the record still being PENDING, so
    /// duplicate and racing deliveries settle on exactly one terminal state.
    pub async fn notify(&self, payload: NotifyPayload) -> Result<NotifyOutcome, DonationError> {
        let Some(order_reference) = payload
            .order_reference
            .as_deref()
            .filter(|r| !r.is_empty())
        else {
            warn!("Webhook missing order reference");
            return Ok(NotifyOutcome::MissingOrderReference);
        };

        let amount = payload.amount.as_deref().unwrap_or("");
        let currency = payload.currency.as_deref().unwrap_or("");
        let status_code = payload.status_code.as_deref().unwrap_or("");
        let signature = payload.signature.as_deref().unwrap_or("");

        let signature_valid = if self.settings.bypass_payment_gateway {
            info!("Bypass mode active, skipping signature verification");
            true
        } else {
            let expected = payhere::notify_signature(
                &self.settings.payhere_merchant_id,
                self.settings.merchant_secret(),
                order_reference,
                amount,
                currency,
                status_code,
            );
            payhere::verify_signature(&expected, signature)
        };

        let Some(donation) = self.store.find_by_order_reference(order_reference).await? else {
            warn!(%order_reference, "Webhook for unknown order reference");
            return Ok(NotifyOutcome::UnknownOrder);
        };

        if donation.status.is_terminal() {
            info!(%order_reference, status = ?donation.status, "Webhook replay for terminal donation");
            return Ok(NotifyOutcome::AlreadyTerminal);
        }

        let (status, failure_reason) = if !signature_valid {
            warn!(%order_reference, "Invalid webhook signature");
            (DonationStatus::Failed, Some("invalid signature".to_string()))
        } else if status_code == self.settings.payhere_pending_code {
            info!(%order_reference, "Gateway reports payment still pending");
            return Ok(NotifyOutcome::StillPending);
        } else if status_code == self.settings.payhere_success_code {
            // The record's amount and currency are authoritative; a signed
            // notification asserting different ones is not a success.
            let amount_matches = amount
                .trim()
                .parse::<Decimal>()
                .map(|a| a == donation.amount)
                .unwrap_or(false);
            if amount_matches && currency == donation.currency {
                (DonationStatus::Success, None)
            } else {
                warn!(
                    %order_reference,
                    reported_amount = amount,
                    reported_currency = currency,
                    "Webhook amount or currency does not match the record"
                );
                (DonationStatus::Failed, Some("amount mismatch".to_string()))
            }
        } else {
            (DonationStatus::Failed, None)
        };

        let update = TerminalUpdate {
            status,
            failure_reason,
            verified_at: Utc::now(),
        };

        match self
            .store
            .complete_if_pending(order_reference, update)
            .await?
        {
            Some(updated) => {
                info!(%order_reference, status = ?updated.status, "Donation reconciled");
                Ok(NotifyOutcome::Completed(updated.status))
            }
            // Lost a race with a concurrent delivery between the read above
            // and the conditional write.
            None => Ok(NotifyOutcome::AlreadyTerminal),
        }
    }

    /// Cheap idempotent read for client polling. Ownership is enforced by
    /// the HTTP layer.
    pub async fn status(&self, order_reference: &str) -> Result<Option<Donation>, DonationError> {
        self.store.find_by_order_reference(order_reference).await
    }
}

fn new_order_reference() -> String {
    format!(
        "DON_{}_{:08X}",
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}
