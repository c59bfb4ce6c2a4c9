use kiosk_core::{MatchStrategy, ARCFACE_MODEL_FILE, DEFAULT_TOLERANCE, SCRFD_MODEL_FILE};
use std::path::PathBuf;

const DEFAULT_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Capture loop configuration, loaded from environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Images of authorized people, scanned once at startup.
    pub authorized_dir: PathBuf,
    /// Where face crops of logged accesses are written.
    pub faces_dir: PathBuf,
    /// Daily rolling log files.
    pub log_dir: PathBuf,
    /// Maximum embedding distance for a positive match.
    pub tolerance: f32,
    pub match_strategy: MatchStrategy,
    /// Minimum seconds between two logged accesses of the same person.
    pub cooldown_secs: u64,
    /// Also log faces that matched nobody.
    pub log_unknown: bool,
    /// Number of warmup frames to discard at startup (camera AGC/AE stabilization).
    pub warmup_frames: usize,
    /// TrueType font for overlay labels.
    pub font_path: PathBuf,
    /// Tesseract executable.
    pub tesseract: String,
    pub ocr_lang: String,
}

impl Config {
    /// Load configuration from `KIOSK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let match_strategy = match std::env::var("KIOSK_MATCH_STRATEGY") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to first-match strategy");
                MatchStrategy::First
            }),
            Err(_) => MatchStrategy::First,
        };

        Self {
            camera_device: env_string("KIOSK_CAMERA_DEVICE", "/dev/video0"),
            model_dir: env_path("KIOSK_MODEL_DIR", "models"),
            db_path: env_path("KIOSK_DB_PATH", "data/access.db"),
            authorized_dir: env_path("KIOSK_AUTHORIZED_DIR", "data/authorized_faces"),
            faces_dir: env_path("KIOSK_FACES_DIR", "data/detected_faces"),
            log_dir: env_path("KIOSK_LOG_DIR", "logs"),
            tolerance: env_f32("KIOSK_TOLERANCE", DEFAULT_TOLERANCE),
            match_strategy,
            cooldown_secs: env_u64("KIOSK_COOLDOWN_SECS", 600),
            log_unknown: env_flag("KIOSK_LOG_UNKNOWN", false),
            warmup_frames: env_usize("KIOSK_WARMUP_FRAMES", 4),
            font_path: env_path("KIOSK_FONT_PATH", DEFAULT_FONT),
            tesseract: env_string("KIOSK_TESSERACT", "tesseract"),
            ocr_lang: env_string("KIOSK_OCR_LANG", "eng"),
        }
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> String {
        self.model_dir.join(SCRFD_MODEL_FILE).to_string_lossy().into_owned()
    }

    /// Path to the ArcFace recognition model.
    pub fn arcface_model_path(&self) -> String {
        self.model_dir.join(ARCFACE_MODEL_FILE).to_string_lossy().into_owned()
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env_string(key, default))
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key).map(|v| v != "0").unwrap_or(default)
}
