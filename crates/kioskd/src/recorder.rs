//! Per-person cooldown and persistence of access events.

use image::{imageops, RgbImage};
use kiosk_core::{Identification, UNKNOWN};
use kiosk_store::{AccessStore, StoreError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Fraction of the face box added on every side of a saved crop.
pub const CROP_PADDING: f32 = 0.2;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("faces directory {path}: {source}")]
    FacesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to save face crop: {0}")]
    SaveCrop(#[from] image::ImageError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Cooldown bucket. Strangers share one bucket that no gallery name can collide with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CooldownKey {
    Person(String),
    Unknown,
}

/// Writes at most one access row per person per cooldown window.
pub struct AccessRecorder {
    cooldown: Duration,
    last_written: HashMap<CooldownKey, Instant>,
    faces_dir: PathBuf,
    log_unknown: bool,
}

impl AccessRecorder {
    /// Creates `faces_dir` if needed; crops are stored under its absolute path.
    pub fn new(faces_dir: &Path, cooldown: Duration, log_unknown: bool) -> Result<Self, RecorderError> {
        let dir_err = |source| RecorderError::FacesDir { path: faces_dir.to_path_buf(), source };
        std::fs::create_dir_all(faces_dir).map_err(dir_err)?;
        let faces_dir = std::fs::canonicalize(faces_dir).map_err(dir_err)?;

        Ok(Self {
            cooldown,
            last_written: HashMap::new(),
            faces_dir,
            log_unknown,
        })
    }

    pub fn faces_dir(&self) -> &Path {
        &self.faces_dir
    }

    /// True when `key` has never been written or its cooldown has elapsed at `now`.
    fn is_due(&self, key: &CooldownKey, now: Instant) -> bool {
        self.last_written
            .get(key)
            .map_or(true, |last| now.saturating_duration_since(*last) >= self.cooldown)
    }

    /// Log `face` from `frame` unless it is still cooling down.
    ///
    /// Returns the new row id when a row was written.
    pub fn record(
        &mut self,
        store: &AccessStore,
        frame: &RgbImage,
        face: &Identification,
        now: Instant,
    ) -> Result<Option<i64>, RecorderError> {
        let (name, person_id, key) = if face.is_authorized() {
            let name = face.result.name.as_str();
            (name, face.result.person_id.as_deref(), CooldownKey::Person(name.to_string()))
        } else if self.log_unknown {
            (UNKNOWN, None, CooldownKey::Unknown)
        } else {
            return Ok(None);
        };

        if !self.is_due(&key, now) {
            return Ok(None);
        }

        let crop_path = self.save_crop(frame, face, name)?;
        let crop_str = crop_path.as_ref().map(|p| p.to_string_lossy().into_owned());
        let id = store.record(name, person_id, crop_str.as_deref())?;
        self.last_written.insert(key, now);

        tracing::info!(id, name, person_id = ?person_id, distance = face.result.distance, "access logged");
        Ok(Some(id))
    }

    fn save_crop(
        &self,
        frame: &RgbImage,
        face: &Identification,
        name: &str,
    ) -> Result<Option<PathBuf>, RecorderError> {
        let Some(rect) = face.bbox.padded(CROP_PADDING, frame.width(), frame.height()) else {
            tracing::warn!(name, "face box outside frame, logging without crop");
            return Ok(None);
        };

        let crop = imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image();
        let path = self.faces_dir.join(crop_file_name(name));
        crop.save(&path)?;
        Ok(Some(path))
    }
}

/// `<name>_<8 hex>.jpg`, with anything outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn crop_file_name(name: &str) -> String {
    let mut safe: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if safe.is_empty() {
        safe.push_str("face");
    }
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{safe}_{}.jpg", &id[..8])
}
