use actix_web::{HttpResponse, Responder, get, web};

use crate::AppState;
use crate::error::AppError;

pub mod gamedays;
pub mod markdown;
pub mod shared;
pub mod teams;

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "backend": state.db.backend().name(),
    }))
}

/// Registers the health check and every `/api/v1` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("invalid request body: {}", err)).into()
    }))
    .service(health)
    .service(
        web::scope("/api/v1")
            .service(
                web::scope("/teams")
                    .route("/create", web::post().to(teams::create_team))
                    .route("/list", web::post().to(teams::list_teams)),
            )
            .service(
                web::scope("/gamedays")
                    .route("/create/lookup", web::post().to(gamedays::lookup_teams))
                    .route("/create", web::post().to(gamedays::create_gameday))
                    .route("/list", web::post().to(gamedays::list_gamedays))
                    .route(
                        "/{action:start|complete|cancel}/lookup",
                        web::post().to(gamedays::lookup_gamedays),
                    )
                    .route(
                        "/{action:start|complete|cancel}",
                        web::post().to(gamedays::transition_gameday),
                    )
                    .route("/{id}", web::get().to(gamedays::get_gameday)),
            ),
    );
}
