use crate::{
    database::connection::DbPool,
    middleware::auth::AuthenticatedUser,
    models::{donation::Donation, registration::Registration, user::User},
    utils::helpers::ApiResponse,
};
use actix_web::{HttpResponse, Result, web};
use serde::Serialize;
use tracing::{error, info};

#[derive(Serialize)]
struct ProfileResponse {
    user: User,
    registration: Option<Registration>,
}

pub async fn profile(pool: web::Data<DbPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    let account = match User::find_by_id(&pool, user.user_id).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return Ok(
                HttpResponse::NotFound().json(ApiResponse::error("User not found"))
            );
        }
        Err(e) => {
            error!("Failed to load user {}: {}", user.user_id, e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to load profile")));
        }
    };

    let registration = match Registration::find_by_user(&pool, user.user_id).await {
        Ok(registration) => registration,
        Err(e) => {
            error!("Failed to load registration for {}: {}", user.user_id, e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to load profile")));
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(ProfileResponse {
        user: account,
        registration,
    })))
}

pub async fn list_donations(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    info!("Listing donations for user: {}", user.user_id);

    match Donation::find_by_user(&pool, user.user_id).await {
        Ok(donations) => Ok(HttpResponse::Ok().json(ApiResponse::success(donations))),
        Err(e) => {
            error!("Failed to list donations for {}: {}", user.user_id, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to retrieve donations")))
        }
    }
}
