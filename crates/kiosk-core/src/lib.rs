//! kiosk-core — Face recognition and ID-card reading for the access kiosk.
//!
//! Uses SCRFD for face detection and ArcFace for embeddings, both via ONNX
//! Runtime, and Tesseract for reading names off ID cards.

pub mod alignment;
pub mod card;
pub mod detector;
pub mod enhance;
pub mod gallery;
pub mod ocr;
pub mod pipeline;
pub mod recognizer;
pub mod types;

pub use card::{CardReader, CardTextExtractor};
pub use gallery::{Gallery, GalleryError};
pub use ocr::{clean_text, OcrEngine, OcrError, TesseractCli};
pub use pipeline::{FaceEncoder, FaceMatcher, FacePipeline, Identification, PipelineError};
pub use types::{
    BoundingBox, Embedding, GalleryEntry, MatchResult, MatchStrategy, Matcher, PixelRect,
    DEFAULT_TOLERANCE, UNKNOWN,
};

/// File name of the SCRFD detection model inside the model directory.
pub const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
/// File name of the ArcFace recognition model inside the model directory.
pub const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";
