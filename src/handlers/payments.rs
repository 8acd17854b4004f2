use crate::{
    middleware::auth::AuthenticatedUser,
    models::donation::DonationStatus,
    requests::payment::{InitPaymentRequest, NotifyRequest},
    services::payments::{
        DonorDetails, InitiateDonation, NotifyPayload, PaymentError, PaymentService,
        PgDonationStore,
    },
    utils::helpers::ApiResponse,
};
use actix_web::{HttpResponse, Result, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

type Payments = web::Data<PaymentService<PgDonationStore>>;

pub async fn init(
    payments: Payments,
    request: web::Json<InitPaymentRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    info!("Initiating payment for user: {}", user.user_id);

    let request = request.into_inner();
    let initiate = InitiateDonation {
        user_id: user.user_id,
        amount: request.amount,
        items: request.items,
        donor: DonorDetails {
            first_name: request.donor.first_name,
            last_name: request.donor.last_name,
            email: request.donor.email,
            phone: request.donor.phone,
            address: request.donor.address,
            city: request.donor.city,
        },
    };

    match payments.init(initiate).await {
        Ok(payload) => Ok(HttpResponse::Ok().json(ApiResponse::success(payload))),
        Err(e @ PaymentError::InvalidAmount { .. }) => {
            Ok(HttpResponse::BadRequest().json(ApiResponse::error(e.to_string())))
        }
        Err(e) => {
            error!("Payment initiation failed: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to initiate payment")))
        }
    }
}

/// Public gateway webhook. Whatever happens inside, the transport response
/// is 200 "OK": the gateway treats anything else as undelivered and retries
/// indefinitely. The idempotent conditional update protects the record.
pub async fn notify(payments: Payments, form: web::Form<NotifyRequest>) -> Result<HttpResponse> {
    let form = form.into_inner();
    info!(
        order_id = form.order_id.as_deref().unwrap_or("<missing>"),
        status_code = form.status_code.as_deref().unwrap_or("<missing>"),
        "Gateway notification received"
    );

    let payload = NotifyPayload {
        order_reference: form.order_id,
        status_code: form.status_code,
        amount: form.payhere_amount,
        currency: form.payhere_currency,
        signature: form.md5sig,
    };

    match payments.notify(payload).await {
        Ok(outcome) => info!(?outcome, "Gateway notification processed"),
        Err(e) => error!("Gateway notification failed internally: {}", e),
    }

    Ok(HttpResponse::Ok().body("OK"))
}

#[derive(Serialize)]
struct StatusResponse {
    order_reference: String,
    status: DonationStatus,
    amount: Decimal,
    currency: String,
    verified_at: Option<DateTime<Utc>>,
}

pub async fn status(
    payments: Payments,
    path: web::Path<String>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let order_reference = path.into_inner();

    match payments.status(&order_reference).await {
        Ok(Some(donation)) => {
            if donation.user_id != user.user_id && !user.is_admin() {
                return Ok(HttpResponse::Forbidden().json(ApiResponse::error("Access denied")));
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success(StatusResponse {
                order_reference: donation.order_reference,
                status: donation.status,
                amount: donation.amount,
                currency: donation.currency,
                verified_at: donation.verified_at,
            })))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error("Donation not found"))),
        Err(e) => {
            error!("Failed to fetch donation {}: {}", order_reference, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to retrieve donation")))
        }
    }
}
