use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod database;
mod error;
mod models;
mod routes;
mod services;
mod state;
mod store;

use config::AppConfig;
use database::Collections;
use models::user::UserAuthenticationMiddlewareFactory;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config: AppConfig = AppConfig::load().await?;
    let db: Collections = Collections::open(&config).await?;
    let bind_addr: String = config.bind_addr.clone();
    let state = web::Data::new(AppState::new(config, db));

    info!(%bind_addr, "starting mine report server");
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(UserAuthenticationMiddlewareFactory)
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
