use anyhow::{Context, Result};
use kiosk_core::{CardTextExtractor, FaceMatcher, FacePipeline, Gallery, TesseractCli};
use kiosk_hw::{Camera, Display, OverlayRenderer};
use kiosk_store::AccessStore;
use std::time::Duration;

mod config;
mod engine;
mod recorder;

use config::Config;
use engine::Engine;
use recorder::AccessRecorder;

const WINDOW_TITLE: &str = "Reconocimiento Facial";

fn main() -> Result<()> {
    let config = Config::from_env();
    let _log_guard = kiosk_log::init(&config.log_dir, "kioskd.log")?;

    tracing::info!("kioskd starting");

    let card_reader = CardTextExtractor::new(TesseractCli::new(config.tesseract.clone(), config.ocr_lang.clone()));

    let scrfd_path = config.scrfd_model_path();
    let arcface_path = config.arcface_model_path();
    let mut pipeline = FacePipeline::load(&scrfd_path, &arcface_path).context("loading face models")?;
    tracing::info!(scrfd = %scrfd_path, arcface = %arcface_path, "face models loaded");

    let gallery = Gallery::load_dir(&config.authorized_dir, &mut pipeline, &card_reader)
        .context("loading authorized faces")?;
    if gallery.is_empty() {
        tracing::warn!(dir = %config.authorized_dir.display(), "no authorized faces, every face will be unknown");
    }
    let matcher = FaceMatcher::new(gallery, config.match_strategy, config.tolerance);
    tracing::info!(strategy = ?config.match_strategy, tolerance = config.tolerance, "matcher ready");

    let store = AccessStore::open(&config.db_path).context("opening access log")?;
    let recorder = AccessRecorder::new(
        &config.faces_dir,
        Duration::from_secs(config.cooldown_secs),
        config.log_unknown,
    )?;
    tracing::info!(
        dir = %recorder.faces_dir().display(),
        cooldown_secs = config.cooldown_secs,
        log_unknown = config.log_unknown,
        "access recorder ready"
    );
    let overlay = OverlayRenderer::load(&config.font_path);

    let mut camera = Camera::open(&config.camera_device).context("opening camera")?;
    tracing::info!(
        device = %config.camera_device,
        width = camera.width,
        height = camera.height,
        fourcc = ?camera.fourcc,
        "camera opened"
    );
    if config.warmup_frames > 0 {
        tracing::info!(count = config.warmup_frames, "discarding warmup frames");
        camera.discard(config.warmup_frames);
    }

    let mut display = Display::open(WINDOW_TITLE, camera.width, camera.height)?;
    let mut engine = Engine::new(pipeline, matcher, recorder, store, overlay);

    engine::run(&mut engine, &mut camera, &mut display)?;

    tracing::info!("kioskd shutting down");
    Ok(())
}
