use std::path::PathBuf;

use actix_web::{web, App, HttpServer};
use log::info;
use vidsend_server::{
    files::{serve_asset, StaticCtx},
    upload::{upload, UploadCtx},
};

const DEFAULT_PORT: u16 = 8080;
const DATA_DIR: &str = "data";
const STATIC_DIR: &str = "public";

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let data_dir = env_path("VIDSEND_DATA_DIR", DATA_DIR);
    let static_root = env_path("VIDSEND_STATIC_DIR", STATIC_DIR);
    std::fs::create_dir_all(&data_dir)?;

    info!(
        "listening on port {port}, storing uploads in {}, serving assets from {}",
        data_dir.display(),
        static_root.display()
    );
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(UploadCtx {
                data_dir: data_dir.clone(),
            }))
            .app_data(web::Data::new(StaticCtx {
                root: static_root.clone(),
            }))
            .service(upload)
            .route("/{path:.*}", web::get().to(serve_asset))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
