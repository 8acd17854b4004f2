use actix_web::web;

use crate::handlers;

pub fn scoped_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(web::resource("/register").route(web::post().to(handlers::auth::register)))
            .service(web::resource("/login").route(web::post().to(handlers::auth::login))),
    )
    .service(
        web::scope("/user")
            .service(web::resource("/profile").route(web::get().to(handlers::users::profile)))
            .service(
                web::resource("/donations").route(web::get().to(handlers::users::list_donations)),
            ),
    )
    .service(
        web::scope("/payment")
            .service(web::resource("/init").route(web::post().to(handlers::payments::init)))
            // Public: the gateway posts here with no credentials.
            .service(web::resource("/notify").route(web::post().to(handlers::payments::notify)))
            .service(
                web::resource("/status/{order_reference}")
                    .route(web::get().to(handlers::payments::status)),
            ),
    )
    .service(
        web::scope("/admin")
            .service(web::resource("/dashboard").route(web::get().to(handlers::admin::dashboard)))
            .service(web::resource("/stats").route(web::get().to(handlers::admin::stats)))
            .service(web::resource("/summary").route(web::get().to(handlers::admin::summary)))
            .service(
                web::resource("/donations").route(web::get().to(handlers::admin::all_donations)),
            )
            .service(
                web::resource("/donations/{order_reference}")
                    .route(web::patch().to(handlers::admin::update_donation_status)),
            )
            .service(
                web::resource("/registrations")
                    .route(web::get().to(handlers::admin::all_registrations)),
            )
            .service(
                web::resource("/registrations/export")
                    .route(web::get().to(handlers::admin::export_registrations)),
            ),
    );
}
