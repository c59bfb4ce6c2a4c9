//! SCRFD face detector via ONNX Runtime.
//!
//! Letterboxes an RGB frame to 640×640, runs the 3-stride anchor-free SCRFD
//! head and keeps the NMS survivors in frame coordinates.

use crate::types::BoundingBox;
use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const SCRFD_INPUT_SIZE: u32 = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_CONFIDENCE_THRESHOLD: f32 = 0.5;
const SCRFD_NMS_THRESHOLD: f32 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} (set KIOSK_MODEL_DIR to the insightface model directory)")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Scale and padding applied when fitting a frame into the square model input.
#[derive(Debug, Clone, Copy)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
    new_w: u32,
    new_h: u32,
}

impl Letterbox {
    fn fit(width: u32, height: u32, target: u32) -> Self {
        let scale = (target as f32 / width as f32).min(target as f32 / height as f32);
        let new_w = ((width as f32 * scale).round() as u32).clamp(1, target);
        let new_h = ((height as f32 * scale).round() as u32).clamp(1, target);
        Self {
            scale,
            pad_x: (target - new_w) as f32 / 2.0,
            pad_y: (target - new_h) as f32 / 2.0,
            new_w,
            new_h,
        }
    }

    /// Map a point from model input space back to frame space.
    fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Output tensor indices for one stride: (score_idx, bbox_idx, kps_idx).
type StrideOutputIndices = (usize, usize, usize);

/// Raw SCRFD head outputs for one stride.
struct StrideOutputs<'a> {
    stride: usize,
    scores: &'a [f32],
    bboxes: &'a [f32],
    kps: &'a [f32],
}

/// SCRFD-based face detector.
pub struct FaceDetector {
    session: Session,
    /// Per-stride output indices for strides [8, 16, 32].
    stride_indices: [StrideOutputIndices; 3],
}

impl FaceDetector {
    /// Load the SCRFD ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(path = model_path, outputs = ?output_names, "loaded SCRFD model");

        if output_names.len() < 9 {
            return Err(DetectorError::InferenceFailed(format!(
                "SCRFD model requires 9 outputs (3 strides × score/bbox/kps), got {}",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::debug!(?stride_indices, "SCRFD output tensor mapping");

        Ok(Self { session, stride_indices })
    }

    /// Detect faces in an RGB frame, returning boxes sorted by confidence.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, DetectorError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }

        let (input, letterbox) = preprocess(image);
        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut detections = Vec::new();
        for (pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx, kps_idx) = self.stride_indices[pos];
            let extract = |idx: usize, what: &str| {
                outputs[idx]
                    .try_extract_tensor::<f32>()
                    .map(|(_, data)| data)
                    .map_err(|e| DetectorError::InferenceFailed(format!("{what} stride {stride}: {e}")))
            };

            let head = StrideOutputs {
                stride,
                scores: extract(score_idx, "scores")?,
                bboxes: extract(bbox_idx, "bboxes")?,
                kps: extract(kps_idx, "kps")?,
            };
            detections.extend(decode_stride(&head, &letterbox, SCRFD_CONFIDENCE_THRESHOLD));
        }

        // nms() returns survivors in descending confidence order.
        Ok(nms(detections, SCRFD_NMS_THRESHOLD))
    }
}

/// Letterbox an RGB frame into a normalized NCHW tensor.
fn preprocess(image: &RgbImage) -> (Array4<f32>, Letterbox) {
    let size = SCRFD_INPUT_SIZE as usize;
    let letterbox = Letterbox::fit(image.width(), image.height(), SCRFD_INPUT_SIZE);
    let resized = imageops::resize(image, letterbox.new_w, letterbox.new_h, FilterType::Triangle);

    // Padding normalizes to 0.0.
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    let x0 = letterbox.pad_x.floor() as usize;
    let y0 = letterbox.pad_y.floor() as usize;

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (tx, ty) = (x0 + x as usize, y0 + y as usize);
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = (pixel.0[c] as f32 - SCRFD_MEAN) / SCRFD_STD;
        }
    }

    (tensor, letterbox)
}

/// Map SCRFD outputs to stride slots.
///
/// Exports either name tensors "score_8", "bbox_16", "kps_32", ... or use
/// generic numeric names, in which case the standard positional layout applies:
/// [0-2] scores, [3-5] bboxes, [6-8] kps.
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| *n == target)
    };

    let named: Option<Vec<StrideOutputIndices>> = SCRFD_STRIDES
        .iter()
        .map(|&s| Some((find("score", s)?, find("bbox", s)?, find("kps", s)?)))
        .collect();

    match named {
        Some(v) => [v[0], v[1], v[2]],
        None => {
            tracing::debug!(?names, "SCRFD output names not recognized, using positional mapping");
            [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
        }
    }
}

/// Decode detections above `threshold` for a single stride level.
fn decode_stride(head: &StrideOutputs<'_>, letterbox: &Letterbox, threshold: f32) -> Vec<BoundingBox> {
    let size = SCRFD_INPUT_SIZE as usize;
    let stride = head.stride as f32;
    let grid_w = size / head.stride;
    let num_anchors = (size / head.stride) * grid_w * SCRFD_ANCHORS_PER_CELL;

    let mut detections = Vec::new();

    for idx in 0..num_anchors {
        let score = head.scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let Some(b) = head.bboxes.get(idx * 4..idx * 4 + 4) else {
            continue;
        };

        let cell = idx / SCRFD_ANCHORS_PER_CELL;
        let ax = (cell % grid_w) as f32 * stride;
        let ay = (cell / grid_w) as f32 * stride;

        let (x1, y1) = letterbox.to_frame(ax - b[0] * stride, ay - b[1] * stride);
        let (x2, y2) = letterbox.to_frame(ax + b[2] * stride, ay + b[3] * stride);

        let landmarks = head.kps.get(idx * 10..idx * 10 + 10).map(|k| {
            std::array::from_fn(|i| letterbox.to_frame(ax + k[i * 2] * stride, ay + k[i * 2 + 1] * stride))
        });

        detections.push(BoundingBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence: score,
            landmarks,
        });
    }

    detections
}

/// Greedy non-maximum suppression, highest confidence first.
fn nms(mut detections: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<BoundingBox> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(k, &det) <= iou_threshold) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection-over-Union between two bounding boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let inter_w = ((a.x + a.width).min(b.x + b.width) - a.x.max(b.x)).max(0.0);
    let inter_h = ((a.y + a.height).min(b.y + b.height) - a.y.max(b.y)).max(0.0);
    let inter = inter_w * inter_h;
    let union = a.width * a.height + b.width * b.height - inter;

    if union > 0.0 { inter / union } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn make_bbox(x: f32, y: f32, w: f32, h: f32, conf: f32) -> BoundingBox {
        BoundingBox { x, y, width: w, height: h, confidence: conf, landmarks: None }
    }

    #[test]
    fn test_iou_partial() {
        let a = make_bbox(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = make_bbox(5.0, 0.0, 10.0, 10.0, 1.0);
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let detections = vec![
            make_bbox(5.0, 5.0, 100.0, 100.0, 0.8),
            make_bbox(0.0, 0.0, 100.0, 100.0, 0.9),
            make_bbox(200.0, 200.0, 50.0, 50.0, 0.7),
        ];
        let result = nms(detections, 0.4);
        assert_eq!(result.len(), 2);
        assert!((result[0].confidence - 0.9).abs() < 1e-6);
        assert!((result[1].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_letterbox_roundtrip() {
        let lb = Letterbox::fit(320, 240, SCRFD_INPUT_SIZE);
        assert_eq!((lb.new_w, lb.new_h), (640, 480));
        assert_eq!(lb.pad_y, 80.0);

        let (x, y) = lb.to_frame(100.0 * lb.scale + lb.pad_x, 50.0 * lb.scale + lb.pad_y);
        assert!((x - 100.0).abs() < 0.1 && (y - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_preprocess_pads_with_zero() {
        let image = RgbImage::from_pixel(320, 240, Rgb([255, 255, 255]));
        let (tensor, _) = preprocess(&image);
        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        // Top padding band
        assert_eq!(tensor[[0, 0, 10, 320]], 0.0);
        // Image content
        let expected = (255.0 - SCRFD_MEAN) / SCRFD_STD;
        assert!((tensor[[0, 2, 320, 320]] - expected).abs() < 0.01);
    }

    #[test]
    fn test_decode_stride_maps_to_frame() {
        let lb = Letterbox::fit(640, 640, SCRFD_INPUT_SIZE);
        let cells = (640 / 32) * (640 / 32) * SCRFD_ANCHORS_PER_CELL;
        let mut scores = vec![0.0f32; cells];
        let mut bboxes = vec![0.0f32; cells * 4];
        let kps = vec![0.0f32; cells * 10];

        // Anchor 2 → cell 1 → (x=32, y=0) at stride 32.
        scores[2] = 0.9;
        bboxes[8..12].copy_from_slice(&[0.5, 0.0, 1.0, 2.0]);

        let head = StrideOutputs { stride: 32, scores: &scores, bboxes: &bboxes, kps: &kps };
        let dets = decode_stride(&head, &lb, 0.5);
        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert_eq!((d.x, d.y, d.width, d.height), (16.0, 0.0, 48.0, 64.0));
        assert_eq!(d.landmarks.unwrap()[0], (32.0, 0.0));
    }

    #[test]
    fn test_discover_output_indices() {
        let named: Vec<String> = [
            "bbox_8", "kps_8", "score_8",
            "bbox_16", "kps_16", "score_16",
            "bbox_32", "kps_32", "score_32",
        ].iter().map(|s| s.to_string()).collect();
        assert_eq!(discover_output_indices(&named), [(2, 0, 1), (5, 3, 4), (8, 6, 7)]);

        let generic: Vec<String> = (0..9).map(|i: usize| i.to_string()).collect();
        assert_eq!(discover_output_indices(&generic), [(0, 3, 6), (1, 4, 7), (2, 5, 8)]);
    }
}
