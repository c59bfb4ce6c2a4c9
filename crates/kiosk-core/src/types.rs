use std::str::FromStr;

/// Name reported for a face that matched no gallery entry.
pub const UNKNOWN: &str = "unknown";

/// Default maximum embedding distance for a positive match.
pub const DEFAULT_TOLERANCE: f32 = 0.6;

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

/// Integer pixel rectangle, always inside the frame it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Grow the box by `fraction` of its size on every side, clamped to the frame.
    ///
    /// Padding is truncated to whole pixels per axis. Returns `None` when the
    /// clamped region is empty (box entirely outside the frame).
    pub fn padded(&self, fraction: f32, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        let left = self.x.round() as i64;
        let top = self.y.round() as i64;
        let right = (self.x + self.width).round() as i64;
        let bottom = (self.y + self.height).round() as i64;

        let pad_h = ((right - left) as f32 * fraction) as i64;
        let pad_v = ((bottom - top) as f32 * fraction) as i64;

        let fw = frame_width as i64;
        let fh = frame_height as i64;
        let left = (left - pad_h).clamp(0, fw);
        let right = (right + pad_h).clamp(0, fw);
        let top = (top - pad_v).clamp(0, fh);
        let bottom = (bottom + pad_v).clamp(0, fh);

        if right <= left || bottom <= top {
            return None;
        }

        Some(PixelRect {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

/// Face embedding vector (512-dimensional for ArcFace).
#[derive(Debug, Clone)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Euclidean distance between two embeddings. Lower = more similar.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// One authorized person in the in-memory gallery.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    /// Display name (filename stem, or OCR text for numeric filenames).
    pub name: String,
    /// Stable identifier, the filename stem.
    pub person_id: String,
    pub embedding: Embedding,
}

/// Result of matching a probe embedding against a gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    /// Distance to the accepted entry, or to the closest entry when unmatched.
    pub distance: f32,
    /// Name of the matched entry, [`UNKNOWN`] otherwise.
    pub name: String,
    /// Person id of the matched entry.
    pub person_id: Option<String>,
}

impl MatchResult {
    fn unknown(distance: f32) -> Self {
        Self {
            matched: false,
            distance,
            name: UNKNOWN.to_string(),
            person_id: None,
        }
    }

    fn hit(entry: &GalleryEntry, distance: f32) -> Self {
        Self {
            matched: true,
            distance,
            name: entry.name.clone(),
            person_id: Some(entry.person_id.clone()),
        }
    }
}

/// Strategy for comparing a probe embedding against the gallery.
pub trait Matcher {
    fn compare(&self, probe: &Embedding, gallery: &[GalleryEntry], tolerance: f32) -> MatchResult;
}

/// Accepts the first gallery entry (in insertion order) within tolerance.
pub struct FirstMatch;

impl Matcher for FirstMatch {
    fn compare(&self, probe: &Embedding, gallery: &[GalleryEntry], tolerance: f32) -> MatchResult {
        let mut closest = f32::INFINITY;

        for entry in gallery {
            let distance = probe.euclidean_distance(&entry.embedding);
            if distance <= tolerance {
                return MatchResult::hit(entry, distance);
            }
            closest = closest.min(distance);
        }

        MatchResult::unknown(closest)
    }
}

/// Accepts the closest gallery entry, if it lies within tolerance.
///
/// Equal distances keep the earlier entry.
pub struct NearestMatch;

impl Matcher for NearestMatch {
    fn compare(&self, probe: &Embedding, gallery: &[GalleryEntry], tolerance: f32) -> MatchResult {
        let mut best: Option<(usize, f32)> = None;

        for (i, entry) in gallery.iter().enumerate() {
            let distance = probe.euclidean_distance(&entry.embedding);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }

        match best {
            Some((idx, distance)) if distance <= tolerance => MatchResult::hit(&gallery[idx], distance),
            Some((_, distance)) => MatchResult::unknown(distance),
            None => MatchResult::unknown(f32::INFINITY),
        }
    }
}

/// Configurable choice between the two matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    #[default]
    First,
    Nearest,
}

impl MatchStrategy {
    pub fn matcher(self) -> Box<dyn Matcher + Send> {
        match self {
            MatchStrategy::First => Box::new(FirstMatch),
            MatchStrategy::Nearest => Box::new(NearestMatch),
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(MatchStrategy::First),
            "nearest" | "best" => Ok(MatchStrategy::Nearest),
            other => Err(format!("unknown match strategy: {other}")),
        }
    }
}
