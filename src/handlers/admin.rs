use crate::{
    database::connection::DbPool,
    middleware::auth::AuthenticatedUser,
    models::{
        donation::{Donation, DonationError, DonationStatus},
        registration::Registration,
    },
    requests::payment::UpdateDonationStatusRequest,
    utils::csv::registrations_to_csv,
    utils::helpers::ApiResponse,
};
use actix_web::{HttpResponse, Result, web};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error(
        "You don't have permission to perform this action",
    ))
}

#[derive(Serialize)]
struct DashboardResponse {
    total_registrations: i64,
    total_donations: i64,
    total_amount: Decimal,
}

pub async fn dashboard(pool: web::Data<DbPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(forbidden());
    }

    let total_registrations = match Registration::count(&pool).await {
        Ok(count) => count,
        Err(e) => {
            error!("Failed to count registrations: {}", e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to load dashboard")));
        }
    };

    match Donation::stats(&pool).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(DashboardResponse {
            total_registrations,
            total_donations: stats.success_count,
            total_amount: stats.total_amount_collected,
        }))),
        Err(e) => {
            error!("Failed to load donation stats: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to load dashboard")))
        }
    }
}

pub async fn stats(pool: web::Data<DbPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(forbidden());
    }

    match Donation::stats(&pool).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => {
            error!("Failed to load donation stats: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to load stats")))
        }
    }
}

pub async fn summary(pool: web::Data<DbPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(forbidden());
    }

    match Donation::find_recent(&pool, 10).await {
        Ok(donations) => Ok(HttpResponse::Ok().json(ApiResponse::success(donations))),
        Err(e) => {
            error!("Failed to load recent donations: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to load summary")))
        }
    }
}

pub async fn all_donations(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(forbidden());
    }

    match Donation::find_all(&pool).await {
        Ok(donations) => Ok(HttpResponse::Ok().json(ApiResponse::success(donations))),
        Err(e) => {
            error!("Failed to list donations: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to retrieve donations")))
        }
    }
}

/// Manual status override, outside the webhook protocol. The acting admin is
/// recorded on the row for the audit trail.
pub async fn update_donation_status(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    request: web::Json<UpdateDonationStatusRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(forbidden());
    }

    let order_reference = path.into_inner();
    let status: DonationStatus = match request.status.to_uppercase().as_str() {
        "PENDING" => DonationStatus::Pending,
        "SUCCESS" => DonationStatus::Success,
        "FAILED" => DonationStatus::Failed,
        other => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error(format!("Invalid status: {}", other))));
        }
    };

    info!(
        "Admin {} overriding donation {} to {:?}",
        user.user_id, order_reference, status
    );

    match Donation::admin_override(
        &pool,
        &order_reference,
        status,
        request.failure_reason.clone(),
        user.user_id,
    )
    .await
    {
        Ok(donation) => Ok(HttpResponse::Ok().json(ApiResponse::success(donation))),
        Err(DonationError::NotFound { order_reference }) => Ok(HttpResponse::NotFound().json(
            ApiResponse::error(format!("Donation {} not found", order_reference)),
        )),
        Err(e) => {
            error!("Failed to override donation {}: {}", order_reference, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to update donation")))
        }
    }
}

pub async fn all_registrations(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(forbidden());
    }

    match Registration::find_all(&pool).await {
        Ok(registrations) => Ok(HttpResponse::Ok().json(ApiResponse::success(registrations))),
        Err(e) => {
            error!("Failed to list registrations: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to retrieve registrations")))
        }
    }
}

pub async fn export_registrations(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(forbidden());
    }

    let registrations = match Registration::find_all(&pool).await {
        Ok(registrations) => registrations,
        Err(e) => {
            error!("Failed to list registrations for export: {}", e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to export registrations")));
        }
    };

    match registrations_to_csv(&registrations) {
        Ok(csv) => Ok(HttpResponse::Ok()
            .content_type("text/csv")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=\"registrations.csv\"",
            ))
            .body(csv)),
        Err(e) => {
            error!("CSV rendering failed: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to export registrations")))
        }
    }
}
