use crate::database::connection::DbPool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Optional 1:1 NGO-cause profile on a user, captured at sign-up.
/// Independent of any donation; never touched by the payment core.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub cause: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistration {
    pub user_id: Uuid,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub cause: Option<String>,
}

/// Registration joined with user identity, for admin listing and CSV export.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RegistrationWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub registration: Registration,
    pub fullname: String,
    pub email: String,
}

impl Registration {
    pub async fn create(
        pool: &DbPool,
        registration: CreateRegistration,
    ) -> Result<Self, RegistrationError> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Registration>(
            "INSERT INTO registrations (id, user_id, address, city, state, pincode, cause, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(registration.user_id)
        .bind(registration.address)
        .bind(registration.city)
        .bind(registration.state)
        .bind(registration.pincode)
        .bind(registration.cause)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_user(
        pool: &DbPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, RegistrationError> {
        let registration =
            sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        Ok(registration)
    }

    pub async fn find_all(pool: &DbPool) -> Result<Vec<RegistrationWithUser>, RegistrationError> {
        let registrations = sqlx::query_as::<_, RegistrationWithUser>(
            "SELECT r.*, u.fullname, u.email
             FROM registrations r
             JOIN users u ON u.id = r.user_id
             ORDER BY r.created_at DESC",
        )
        .fetch_all(pool)
        .await?;

        Ok(registrations)
    }

    pub async fn count(pool: &DbPool) -> Result<i64, RegistrationError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
