use crate::{
    database::connection::DbPool,
    models::{
        auth::{AuthResponse, UserInfo},
        registration::{CreateRegistration, Registration},
        user::{CreateUser, User, UserError, UserRole},
    },
    requests::auth::{LoginRequest, RegisterRequest},
    services::auth::AuthService,
    utils::helpers::ApiResponse,
};
use actix_web::{HttpResponse, Result, web};
use tracing::{error, info};

pub async fn register(
    pool: web::Data<DbPool>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let auth_service = AuthService::new().map_err(|e| {
        error!("Failed to create auth service: {}", e);
        actix_web::error::ErrorInternalServerError("Authentication service error")
    })?;

    let user_role = match request.user_role.as_ref() {
        Some(role_str) => role_str.parse().unwrap_or(UserRole::Member),
        None => UserRole::Member,
    };

    let create_user = CreateUser {
        fullname: request.fullname.clone(),
        email: request.email.clone(),
        password: request.password.clone(),
        phone: request.phone.clone(),
        user_role,
    };

    let user = match User::create(&pool, create_user).await {
        Ok(user) => user,
        Err(UserError::DuplicateEmail { email }) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error(format!(
                "Email {} is already registered",
                email
            ))));
        }
        Err(e) => {
            error!("Failed to create user: {}", e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to create user")));
        }
    };

    // Registration profile is saved independently of any donation.
    if let Some(details) = &request.registration {
        let create_registration = CreateRegistration {
            user_id: user.id,
            address: details.address.clone(),
            city: details.city.clone(),
            state: details.state.clone(),
            pincode: details.pincode.clone(),
            cause: details.cause.clone(),
        };
        if let Err(e) = Registration::create(&pool, create_registration).await {
            error!("Failed to create registration profile: {}", e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error("Failed to create registration profile")));
        }
    }

    info!("Registered user {}", user.id);

    let token = auth_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        actix_web::error::ErrorInternalServerError("Failed to generate token")
    })?;

    let response = AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
            user_role: user.user_role,
        },
    };

    Ok(HttpResponse::Created().json(ApiResponse::success(response)))
}

pub async fn login(
    pool: web::Data<DbPool>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let auth_service = AuthService::new().map_err(|e| {
        error!("Failed to create auth service: {}", e);
        actix_web::error::ErrorInternalServerError("Authentication service error")
    })?;

    let user = auth_service
        .authenticate_user(&pool, &request.email, &request.password)
        .await
        .map_err(|e| {
            error!("Authentication error: {}", e);
            actix_web::error::ErrorInternalServerError("Authentication error")
        })?
        .ok_or_else(|| {
            error!("Invalid credentials for user: {}", request.email);
            actix_web::error::ErrorUnauthorized("Invalid credentials")
        })?;

    let token = auth_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        actix_web::error::ErrorInternalServerError("Failed to generate token")
    })?;

    let response = AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
            user_role: user.user_role,
        },
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}
