//! Detection + embedding + gallery matching for whole frames.

use crate::detector::{DetectorError, FaceDetector};
use crate::gallery::Gallery;
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{BoundingBox, Embedding, MatchResult, MatchStrategy, Matcher};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// A detected face and its embedding.
#[derive(Debug, Clone)]
pub struct EncodedFace {
    pub bbox: BoundingBox,
    pub embedding: Embedding,
}

/// Turns an image into one embedding per detected face.
pub trait FaceEncoder {
    /// Faces in descending detection confidence.
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<EncodedFace>, PipelineError>;
}

/// SCRFD detector followed by ArcFace recognizer.
pub struct FacePipeline {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl FacePipeline {
    pub fn load(scrfd_path: &str, arcface_path: &str) -> Result<Self, PipelineError> {
        let detector = FaceDetector::load(scrfd_path)?;
        let recognizer = FaceRecognizer::load(arcface_path)?;
        Ok(Self { detector, recognizer })
    }
}

impl FaceEncoder for FacePipeline {
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<EncodedFace>, PipelineError> {
        let boxes = self.detector.detect(image)?;
        let mut faces = Vec::with_capacity(boxes.len());

        for bbox in boxes {
            match self.recognizer.extract(image, &bbox) {
                Ok(embedding) => faces.push(EncodedFace { bbox, embedding }),
                Err(RecognizerError::NoLandmarks) => {
                    tracing::debug!(confidence = bbox.confidence, "skipping face without landmarks");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(faces)
    }
}

/// Outcome for one face in a frame.
#[derive(Debug, Clone)]
pub struct Identification {
    pub bbox: BoundingBox,
    pub result: MatchResult,
}

impl Identification {
    pub fn is_authorized(&self) -> bool {
        self.result.matched
    }
}

/// The gallery together with the matching rule applied to it.
pub struct FaceMatcher {
    gallery: Gallery,
    matcher: Box<dyn Matcher + Send>,
    tolerance: f32,
}

impl FaceMatcher {
    pub fn new(gallery: Gallery, strategy: MatchStrategy, tolerance: f32) -> Self {
        Self { gallery, matcher: strategy.matcher(), tolerance }
    }

    /// Match every encoded face against the gallery.
    pub fn identify(&self, faces: Vec<EncodedFace>) -> Vec<Identification> {
        faces
            .into_iter()
            .map(|face| Identification {
                result: self.matcher.compare(&face.embedding, self.gallery.entries(), self.tolerance),
                bbox: face.bbox,
            })
            .collect()
    }

    /// Encode a frame and identify every face in it.
    pub fn process(
        &self,
        encoder: &mut dyn FaceEncoder,
        image: &RgbImage,
    ) -> Result<Vec<Identification>, PipelineError> {
        Ok(self.identify(encoder.encode(image)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GalleryEntry, DEFAULT_TOLERANCE, UNKNOWN};

    fn face(values: Vec<f32>) -> EncodedFace {
        EncodedFace {
            bbox: BoundingBox { x: 1.0, y: 2.0, width: 3.0, height: 4.0, confidence: 0.9, landmarks: None },
            embedding: Embedding::new(values),
        }
    }

    fn gallery() -> Gallery {
        let mut g = Gallery::default();
        g.push(GalleryEntry {
            name: "JUAN PEREZ".into(),
            person_id: "101".into(),
            embedding: Embedding::new(vec![1.0, 0.0]),
        });
        g
    }

    #[test]
    fn test_identify_each_face() {
        let matcher = FaceMatcher::new(gallery(), MatchStrategy::First, DEFAULT_TOLERANCE);
        let ids = matcher.identify(vec![face(vec![0.9, 0.1]), face(vec![-1.0, 0.0])]);

        assert_eq!(ids.len(), 2);
        assert!(ids[0].is_authorized());
        assert_eq!(ids[0].result.name, "JUAN PEREZ");
        assert_eq!(ids[0].result.person_id.as_deref(), Some("101"));
        assert_eq!(ids[0].bbox.width, 3.0);
        assert!(!ids[1].is_authorized());
        assert_eq!(ids[1].result.name, UNKNOWN);
    }

    struct FixedEncoder(Vec<EncodedFace>);

    impl FaceEncoder for FixedEncoder {
        fn encode(&mut self, _image: &RgbImage) -> Result<Vec<EncodedFace>, PipelineError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_process_runs_encoder() {
        let matcher = FaceMatcher::new(gallery(), MatchStrategy::Nearest, DEFAULT_TOLERANCE);
        let mut encoder = FixedEncoder(vec![face(vec![1.0, 0.05])]);
        let ids = matcher.process(&mut encoder, &RgbImage::new(4, 4)).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].result.name, "JUAN PEREZ");
    }
}
