use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use std::io;

use employee_manager_backend::config::AppConfig;
use employee_manager_backend::errors::AppError;
use employee_manager_backend::store::{EmployeeStore, MemoryEmployeeStore, PgEmployeeStore};
use employee_manager_backend::utils::uploads::UploadStore;
use employee_manager_backend::{db, handlers};

fn startup_error(err: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

async fn serve<S: EmployeeStore + 'static>(
    store: S,
    uploads: UploadStore,
    config: &AppConfig,
) -> io::Result<()> {
    let store = web::Data::new(store);
    let uploads = web::Data::new(uploads);

    info!("Starting server at {}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(store.clone())
            .app_data(uploads.clone())
            .configure(handlers::configure::<S>)
    })
    .bind(config.bind_address)?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(startup_error)?;
    let uploads = UploadStore::open(&config.upload_dir)
        .await
        .map_err(startup_error)?;

    match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await.map_err(startup_error)?;
            db::init_schema(&pool).await.map_err(startup_error)?;
            info!("Using PostgreSQL employee store");
            serve(PgEmployeeStore::new(pool), uploads, &config).await
        }
        None => {
            info!("DATABASE_URL not set, using in-memory employee store");
            serve(MemoryEmployeeStore::new(), uploads, &config).await
        }
    }
}
