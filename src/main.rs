use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};

use yatube::AppServices;
use yatube::config::AppConfig;
use yatube::middleware::not_found::not_found;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("invalid configuration: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let services = AppServices::from_config(&config).await.map_err(|e| {
        error!("startup failed: {}", e);
        std::io::Error::other(e)
    })?;

    info!("Starting server on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| services.configure(cfg))
            .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
