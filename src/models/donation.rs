use crate::database::connection::DbPool;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DonationError {
    #[error("Donation {order_reference} not found")]
    NotFound { order_reference: String },
    #[error("Order reference already exists")]
    DuplicateOrderReference,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "donation_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum DonationStatus {
    Pending,
    Success,
    Failed,
}

impl DonationStatus {
    /// SUCCESS and FAILED are terminal; the webhook never moves a record
    /// out of a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationStatus::Success | DonationStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: DonationStatus,
    pub failure_reason: Option<String>,
    pub payment_method: String,
    pub transaction_date: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDonation {
    pub user_id: Uuid,
    pub order_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: DonationStatus,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Fields written when a PENDING record reaches a terminal status.
#[derive(Debug, Clone)]
pub struct TerminalUpdate {
    pub status: DonationStatus,
    pub failure_reason: Option<String>,
    pub verified_at: DateTime<Utc>,
}

/// Donation joined with donor identity, for admin listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DonationWithDonor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub donation: Donation,
    pub donor_name: String,
    pub donor_email: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DonationStats {
    pub total_donations: i64,
    pub success_count: i64,
    pub failed_count: i64,
    pub success_percentage: f64,
    pub total_amount_collected: Decimal,
}

impl Donation {
    pub async fn create(pool: &DbPool, donation: CreateDonation) -> Result<Self, DonationError> {
        let now = Utc::now();
        // Auto-approved records (bypass mode) are stamped verified at creation.
        let verified_at = donation.status.is_terminal().then_some(now);

        let created = sqlx::query_as::<_, Donation>(
            "INSERT INTO donations (id, user_id, order_reference, amount, currency, status,
                                    payment_method, verified_at, transaction_date, address, city,
                                    created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10, $11, $11)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(donation.user_id)
        .bind(&donation.order_reference)
        .bind(donation.amount)
        .bind(&donation.currency)
        .bind(donation.status)
        .bind("payhere")
        .bind(verified_at)
        .bind(donation.address)
        .bind(donation.city)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DonationError::DuplicateOrderReference
            }
            _ => DonationError::Database(e),
        })?;

        Ok(created)
    }

    pub async fn find_by_order_reference(
        pool: &DbPool,
        order_reference: &str,
    ) -> Result<Option<Self>, DonationError> {
        let donation =
            sqlx::query_as::<_, Donation>("SELECT * FROM donations WHERE order_reference = $1")
                .bind(order_reference)
                .fetch_optional(pool)
                .await?;

        Ok(donation)
    }

    pub async fn find_by_user(pool: &DbPool, user_id: Uuid) -> Result<Vec<Self>, DonationError> {
        let donations = sqlx::query_as::<_, Donation>(
            "SELECT * FROM donations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(donations)
    }

    pub async fn find_all(pool: &DbPool) -> Result<Vec<DonationWithDonor>, DonationError> {
        let donations = sqlx::query_as::<_, DonationWithDonor>(
            "SELECT d.*, u.fullname AS donor_name, u.email AS donor_email
             FROM donations d
             JOIN users u ON u.id = d.user_id
             ORDER BY d.created_at DESC",
        )
        .fetch_all(pool)
        .await?;

        Ok(donations)
    }

    pub async fn find_recent(
        pool: &DbPool,
        limit: i64,
    ) -> Result<Vec<DonationWithDonor>, DonationError> {
        let donations = sqlx::query_as::<_, DonationWithDonor>(
            "SELECT d.*, u.fullname AS donor_name, u.email AS donor_email
             FROM donations d
             JOIN users u ON u.id = d.user_id
             ORDER BY d.created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(donations)
    }

    /// Single conditional write: succeeds only while the record is still
    /// PENDING. Returns `None` when the record is missing or already
    /// terminal; the caller disambiguates with a follow-up read. This is the
    /// serialization point for concurrent duplicate webhook deliveries.
    pub async fn complete_if_pending(
        pool: &DbPool,
        order_reference: &str,
        update: TerminalUpdate,
    ) -> Result<Option<Self>, DonationError> {
        let updated = sqlx::query_as::<_, Donation>(
            "UPDATE donations
             SET status = $2,
                 failure_reason = $3,
                 verified_at = $4,
                 transaction_date = $4,
                 updated_at = $4
             WHERE order_reference = $1 AND status = $5
             RETURNING *",
        )
        .bind(order_reference)
        .bind(update.status)
        .bind(update.failure_reason)
        .bind(update.verified_at)
        .bind(DonationStatus::Pending)
        .fetch_optional(pool)
        .await?;

        Ok(updated)
    }

    /// Administrative override: unconditional status write with the acting
    /// admin recorded for the audit trail. Setting PENDING clears the
    /// verification timestamp.
    pub async fn admin_override(
        pool: &DbPool,
        order_reference: &str,
        status: DonationStatus,
        failure_reason: Option<String>,
        admin_id: Uuid,
    ) -> Result<Self, DonationError> {
        let now = Utc::now();
        let verified_at = status.is_terminal().then_some(now);
        let failure_reason = match status {
            DonationStatus::Failed => failure_reason,
            _ => None,
        };

        let updated = sqlx::query_as::<_, Donation>(
            "UPDATE donations
             SET status = $2,
                 failure_reason = $3,
                 verified_at = $4,
                 verified_by = $5,
                 updated_at = $6
             WHERE order_reference = $1
             RETURNING *",
        )
        .bind(order_reference)
        .bind(status)
        .bind(failure_reason)
        .bind(verified_at)
        .bind(admin_id)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        updated.ok_or_else(|| DonationError::NotFound {
            order_reference: order_reference.to_string(),
        })
    }

    pub async fn stats(pool: &DbPool) -> Result<DonationStats, DonationError> {
        #[derive(FromRow)]
        struct StatsRow {
            total: i64,
            success: i64,
            failed: i64,
            total_amount: Decimal,
        }

        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'success') AS success,
                    COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                    COALESCE(SUM(amount) FILTER (WHERE status = 'success'), 0::numeric) AS total_amount
             FROM donations",
        )
        .fetch_one(pool)
        .await?;

        let success_percentage = if row.total > 0 {
            (row.success as f64 / row.total as f64 * 10000.0).round() / 100.0
        } else {
            0.0
        };

        Ok(DonationStats {
            total_donations: row.total,
            success_count: row.success,
            failed_count: row.failed,
            success_percentage,
            total_amount_collected: row.total_amount,
        })
    }
}
