//! The blocking capture loop: frame → faces → access log → overlay → window.

use crate::recorder::{AccessRecorder, RecorderError, CROP_PADDING};
use image::RgbImage;
use imageproc::rect::Rect;
use kiosk_core::{FaceEncoder, FaceMatcher, Identification};
use kiosk_hw::{Camera, Display, OverlayRenderer};
use kiosk_store::AccessStore;
use std::time::Instant;
use thiserror::Error;

/// Label drawn under faces that matched nobody.
pub const UNAUTHORIZED_LABEL: &str = "No autorizado";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("recorder error: {0}")]
    Recorder(#[from] RecorderError),
    #[error("display error: {0}")]
    Display(#[from] kiosk_hw::DisplayError),
}

/// Everything needed to turn one frame into log rows and an annotated image.
pub struct Engine<E> {
    encoder: E,
    matcher: FaceMatcher,
    recorder: AccessRecorder,
    store: AccessStore,
    overlay: OverlayRenderer,
}

impl<E: FaceEncoder> Engine<E> {
    pub fn new(
        encoder: E,
        matcher: FaceMatcher,
        recorder: AccessRecorder,
        store: AccessStore,
        overlay: OverlayRenderer,
    ) -> Self {
        Self { encoder, matcher, recorder, store, overlay }
    }

    #[cfg(test)]
    pub fn store(&self) -> &AccessStore {
        &self.store
    }

    /// Identify faces in `image`, log the ones that are due, then annotate it.
    ///
    /// Inference failures drop the frame's detections; store failures propagate.
    pub fn process_frame(
        &mut self,
        image: &mut RgbImage,
        now: Instant,
    ) -> Result<Vec<Identification>, EngineError> {
        let faces = match self.matcher.process(&mut self.encoder, image) {
            Ok(faces) => faces,
            Err(e) => {
                tracing::warn!(error = %e, "face pipeline failed on frame");
                return Ok(Vec::new());
            }
        };

        // Crops are taken before any overlay is drawn.
        for face in &faces {
            self.recorder.record(&self.store, image, face, now)?;
        }

        for face in &faces {
            self.annotate(image, face);
        }

        Ok(faces)
    }

    fn annotate(&self, image: &mut RgbImage, face: &Identification) {
        let Some(rect) = face.bbox.padded(CROP_PADDING, image.width(), image.height()) else {
            return;
        };
        let label = if face.is_authorized() { face.result.name.as_str() } else { UNAUTHORIZED_LABEL };
        self.overlay.draw(
            image,
            Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height),
            label,
            face.is_authorized(),
        );
    }
}

/// Run until the user quits or the camera stops delivering frames.
pub fn run<E: FaceEncoder>(
    engine: &mut Engine<E>,
    camera: &mut Camera,
    display: &mut Display,
) -> Result<(), EngineError> {
    let mut frames: u64 = 0;

    loop {
        let frame = match camera.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(device = %camera.device_path, error = %e, "camera read failed, stopping");
                break;
            }
        };

        let timestamp = frame.timestamp;
        let mut image = frame.image;
        let faces = engine.process_frame(&mut image, timestamp)?;
        if !faces.is_empty() {
            tracing::debug!(sequence = frame.sequence, faces = faces.len(), "faces in frame");
        }

        display.show(&image)?;
        frames += 1;

        if display.quit_requested() {
            tracing::info!("quit requested");
            break;
        }
    }

    tracing::info!(frames, "capture loop finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use kiosk_core::pipeline::{EncodedFace, PipelineError};
    use kiosk_core::{BoundingBox, Embedding, Gallery, GalleryEntry, MatchStrategy, DEFAULT_TOLERANCE};
    use kiosk_hw::overlay::{AUTHORIZED_COLOR, UNAUTHORIZED_COLOR};
    use std::time::Duration;

    /// Reports the same two faces on every frame: one known, one stranger.
    struct TwoFaces;

    impl FaceEncoder for TwoFaces {
        fn encode(&mut self, _image: &RgbImage) -> Result<Vec<EncodedFace>, PipelineError> {
            let face = |x: f32, values: Vec<f32>| EncodedFace {
                bbox: BoundingBox { x, y: 20.0, width: 20.0, height: 20.0, confidence: 0.9, landmarks: None },
                embedding: Embedding::new(values),
            };
            Ok(vec![face(10.0, vec![1.0, 0.0]), face(60.0, vec![0.0, 1.0])])
        }
    }

    fn engine(dir: &std::path::Path) -> Engine<TwoFaces> {
        let mut gallery = Gallery::default();
        gallery.push(GalleryEntry {
            name: "Carlos".into(),
            person_id: "Carlos".into(),
            embedding: Embedding::new(vec![1.0, 0.0]),
        });
        Engine::new(
            TwoFaces,
            FaceMatcher::new(gallery, MatchStrategy::First, DEFAULT_TOLERANCE),
            AccessRecorder::new(dir, Duration::from_secs(600), false).unwrap(),
            AccessStore::open_in_memory().unwrap(),
            OverlayRenderer::without_font(),
        )
    }

    #[test]
    fn test_process_frame_logs_and_annotates() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path());
        let mut image = RgbImage::from_pixel(100, 80, Rgb([30, 30, 30]));

        let faces = engine.process_frame(&mut image, Instant::now()).unwrap();
        assert_eq!(faces.len(), 2);
        assert!(faces[0].is_authorized());
        assert!(!faces[1].is_authorized());

        // Boxes are padded 4 px: known face starts at x=6, stranger at x=56.
        assert_eq!(*image.get_pixel(6, 30), AUTHORIZED_COLOR);
        assert_eq!(*image.get_pixel(56, 30), UNAUTHORIZED_COLOR);

        let events = engine.store().recent(None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Carlos");
    }

    #[test]
    fn test_saved_crop_has_no_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(dir.path());
        let mut image = RgbImage::from_pixel(100, 80, Rgb([30, 30, 30]));
        engine.process_frame(&mut image, Instant::now()).unwrap();

        let path = engine.store().recent(None).unwrap()[0].face_image_path.clone().unwrap();
        let crop = image::open(path).unwrap().to_rgb8();
        let corner = crop.get_pixel(0, 0);
        // JPEG is lossy; the border would be bright green.
        assert!(corner[1] < 80, "crop corner {corner:?}");
    }
}
