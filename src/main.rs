use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};
use anyhow::Result;

use chaos_engine::database::init_database;
use chaos_engine::handlers::{self, shared::ApiResponse};
use chaos_engine::middleware::RequestIdMiddleware;
use chaos_engine::services::{LogNotifier, SharedNotifier, WebhookNotifier};
use chaos_engine::{AppState, Config};

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    println!("🚀 Starting Chaos Engine server...");

    // Load configuration
    let config = Config::from_env()?;
    println!(
        "📋 Configuration loaded (environment: {})",
        config.environment
    );
    if config.is_local_mode() {
        log::warn!("APP_SECRET is not set, inbound calls are not verified");
    }

    // Initialize database
    let db = init_database(&config.database_url, config.db_max_connections).await?;
    println!("✅ Database initialized ({})", db.backend().name());

    let notifier: SharedNotifier = match config.notify_webhook_url.as_deref() {
        Some(url) => {
            println!("📣 Notifications go to {}", url);
            Arc::new(WebhookNotifier::new(url)?)
        }
        None => Arc::new(LogNotifier),
    };

    let app_state = web::Data::new(AppState::new(db, notifier));
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    println!("🌐 Server starting on http://{}", server_address);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(config_data.clone())
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b %T request_id=%{x-request-id}o"#,
            ))
            .configure(handlers::configure)
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(ApiResponse::<()>::error("Not found"))
            }))
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
