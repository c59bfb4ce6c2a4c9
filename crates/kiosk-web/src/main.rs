use anyhow::{Context, Result};
use tokio::net::TcpListener;

mod config;
mod render;
mod routes;
mod view;

use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    let _log_guard = kiosk_log::init(&config.log_dir, "kiosk-web.log")?;

    tracing::info!("kiosk-web starting");

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let db = tokio_rusqlite::Connection::open(&config.db_path)
        .await
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    db.call(|conn| Ok(kiosk_store::init_schema(conn)?)).await?;
    tracing::info!(path = %config.db_path.display(), "access log opened");

    let app = routes::router(AppState { db }, &config.static_dir, &config.faces_dir);

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(
        addr = %config.bind,
        static_dir = %config.static_dir.display(),
        faces_dir = %config.faces_dir.display(),
        "dashboard listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("kiosk-web shutting down");
    Ok(())
}
