// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, upload storage, and start HTTP server

mod config;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{start_cleanup_task, CompareService, UploadStore};
use std::io;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting scroll-dashboard...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Prepare upload storage
    let store = Arc::new(UploadStore::from_config(&config));
    if let Err(e) = store.init().await {
        log::error!(
            "Failed to create upload directory {}: {}",
            config.upload_dir.display(),
            e
        );
        std::process::exit(1);
    }
    log::info!(
        "Upload directory: {} (limit {} MB per file)",
        config.upload_dir.display(),
        config.max_upload_bytes / (1024 * 1024)
    );

    // 5. Comparison service, shared by every worker
    let compare_service = web::Data::new(CompareService::from_config(&config));
    if let Err(e) = services::FfmpegTools::from_config(&config).check() {
        log::warn!("{} - comparisons will fail until ffmpeg is installed", e);
    }

    // Start retention sweep
    if config.upload_retention_hours > 0 {
        start_cleanup_task(
            store.clone(),
            config.cleanup_interval_secs,
            Duration::from_secs(config.upload_retention_hours * 3600),
        );
        log::info!(
            "Started upload cleanup task (retention: {}h, interval: {}s)",
            config.upload_retention_hours,
            config.cleanup_interval_secs
        );
    }

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let store_data = web::Data::from(store);

    HttpServer::new(move || {
        App::new()
            // Application state (upload store and comparison service)
            .app_data(store_data.clone())
            .app_data(compare_service.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::index_config)
            .configure(handlers::health_config)
            .configure(handlers::compare_config)
            .configure(handlers::images_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
