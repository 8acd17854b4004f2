use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, web};
use anyhow::Context;
use ngo_portal::config::Settings;
use ngo_portal::database::connection;
use ngo_portal::routes;
use ngo_portal::services::payments::{PaymentService, PgDonationStore};
use ngo_portal::utils::helpers::ApiResponse;
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(
        "NGO Registration & Donation API running",
    ))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Fails fast on a missing merchant secret or placeholder JWT secret.
    let settings = Settings::load().context("invalid configuration")?;

    let pool = connection::establish_pool(&settings.database_url)
        .await
        .context("failed to connect to database")?;
    connection::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let payments = web::Data::new(PaymentService::new(
        PgDonationStore::new(pool.clone()),
        settings.clone(),
    ));

    let port = settings.port;
    info!("Server running on http://localhost:{}", port);

    let pool = web::Data::new(pool);
    let settings = web::Data::new(settings);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(pool.clone())
            .app_data(settings.clone())
            .app_data(payments.clone())
            .route("/", web::get().to(index))
            .service(web::scope("/api").configure(routes::api::scoped_config))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
