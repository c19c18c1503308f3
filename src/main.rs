mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use services::{CloudinaryClient, ExportTracker, MessageGateway, RequestMetrics, WhatsAppClient};
use std::io;
use std::sync::Arc;
use utils::{cache::TtlCache, AppError};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const JSON_LIMIT_BYTES: usize = 2 * 1024 * 1024;

fn cors_for(config: &config::AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
            actix_web::http::header::CACHE_CONTROL,
            actix_web::http::header::PRAGMA,
        ])
        .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
        .max_age(3600);

    if config.allows_any_origin() {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }
        cors = cors.supports_credentials();
    }
    cors
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::AppConfig::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🚀 Starting PM Connect Service...");
    log::info!("📊 Database: {}", database::database_name_from_uri(&config.database_url));

    // Initialize MongoDB connection (indexes are ensured on connect)
    let db = database::MongoDB::new(&config.database_url).await.map_err(|e| {
        log::error!("❌ Failed to connect to MongoDB: {}", e);
        io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string())
    })?;
    log::info!("✅ MongoDB connected successfully");

    // 🌱 Seed the admin account
    seeds::admin_seed::seed_admin(&db, &config).await;

    if !config.cloudinary.is_configured() {
        log::warn!("⚠️  Cloudinary credentials missing, media uploads will fail");
    }

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config.clone());
    let cache_data = web::Data::new(TtlCache::new());
    let metrics_data = web::Data::new(RequestMetrics::new());
    let exports_data = web::Data::new(ExportTracker::new());
    let cloudinary_data = web::Data::new(CloudinaryClient::new(config.cloudinary.clone()));
    let gateway: Arc<dyn MessageGateway> = Arc::new(WhatsAppClient::new(&config.whatsapp_gateway_url));
    let gateway_data: web::Data<dyn MessageGateway> = web::Data::from(gateway);

    // 📅 Background jobs
    log::info!("📅 Starting background jobs...");
    jobs::export_cleanup::start_export_cleanup(exports_data.clone(), config.export_retention_hours);
    log::info!("✅ Background jobs started");

    let (host, port) = (config.host.clone(), config.port);
    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let json_config = web::JsonConfig::default()
            .limit(JSON_LIMIT_BYTES)
            .error_handler(|err, _req| AppError::bad_request(format!("Invalid JSON body: {}", err)).into());

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(json_config)
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(cache_data.clone())
            .app_data(metrics_data.clone())
            .app_data(exports_data.clone())
            .app_data(cloudinary_data.clone())
            .app_data(gateway_data.clone())
            .wrap(cors_for(&config_data))
            .wrap(middleware::SecurityHeaders)
            .wrap(middleware::RequestTiming)
            .wrap(Logger::default())
            // Swagger UI
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            .configure(api::routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
