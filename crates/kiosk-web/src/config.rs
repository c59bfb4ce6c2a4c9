use std::path::PathBuf;

/// Dashboard configuration, loaded from environment variables.
pub struct Config {
    /// Listen address (default: 127.0.0.1:8000).
    pub bind: String,
    pub db_path: PathBuf,
    /// Face crops written by the capture loop, served under `/faces`.
    pub faces_dir: PathBuf,
    /// Stylesheets and other assets, served under `/static`.
    pub static_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind: env_string("KIOSK_BIND", "127.0.0.1:8000"),
            db_path: env_path("KIOSK_DB_PATH", "data/access.db"),
            faces_dir: env_path("KIOSK_FACES_DIR", "data/detected_faces"),
            static_dir: env_path("KIOSK_STATIC_DIR", "app/static"),
            log_dir: env_path("KIOSK_LOG_DIR", "logs"),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env_string(key, default))
}
