use actix_web::{App, HttpServer, middleware::Logger, web};
use std::io;

use digital_id_wallet::config::AppConfig;
use digital_id_wallet::services::file_storage::FileStorage;
use digital_id_wallet::{db, logging, routes};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    tracing::info!("🔌 Connecting to database...");
    let db = db::establish_connection(&config).await.map_err(io::Error::other)?;
    db::init_schema(&db).await.map_err(io::Error::other)?;
    db::seed_default_admin(&db, &config).await.map_err(io::Error::other)?;
    tracing::info!("✅ Database connected!");

    let storage = FileStorage::new(config.upload_dir.clone(), config.max_upload_bytes);
    storage.ensure_dir().await.map_err(io::Error::other)?;

    let (host, port) = (config.host.clone(), config.port);
    tracing::info!("🚀 Starting server on http://{}:{}", host, port);

    let db = web::Data::new(db);
    let config = web::Data::new(config);
    let storage = web::Data::new(storage);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(storage.clone())
            .configure(routes::configure_routes)
    })
        .bind((host, port))?
        .run()
        .await
}
