//! ID-card name extraction.
//!
//! Finds a bright, card-shaped quadrilateral in a still image, prepares the
//! crop for OCR and returns the cleaned text. Best effort only: every failure
//! yields an empty string.

use crate::enhance;
use crate::ocr::{clean_text, OcrEngine, PageSegMode};
use crate::types::PixelRect;
use image::imageops::{self, FilterType};
use image::{GenericImageView, GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

const WHITE_THRESHOLD: u8 = 200;
const MIN_MEAN_BRIGHTNESS: f64 = 180.0;
const MIN_ASPECT: f64 = 1.4;
const MAX_ASPECT: f64 = 1.8;
const POLY_EPSILON_FACTOR: f64 = 0.04;
const MIN_OCR_HEIGHT: u32 = 30;
const CLAHE_CLIP_LIMIT: f32 = 3.0;
const CLAHE_TILES: u32 = 8;

/// OCR attempts in order; the first non-empty cleaned result wins.
const OCR_MODES: [PageSegMode; 2] = [PageSegMode::SingleLine, PageSegMode::UniformBlock];

/// Reads a person's name off an image of their ID card.
pub trait CardReader {
    /// Cleaned upper-case name, or an empty string when nothing was read.
    fn read_name(&self, image: &RgbImage) -> String;
}

/// Card locator + preprocessing + OCR over a pluggable engine.
pub struct CardTextExtractor<E> {
    engine: E,
}

impl<E: OcrEngine> CardTextExtractor<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn extract_text(&self, image: &RgbImage) -> String {
        if image.width() == 0 || image.height() == 0 {
            return String::new();
        }

        let Some(rect) = locate_card(image) else {
            tracing::debug!("no card-shaped region found");
            return String::new();
        };

        let crop = imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
        let prepared = prepare_for_ocr(&crop);

        for mode in OCR_MODES {
            match self.engine.recognize(&prepared, mode) {
                Ok(raw) => {
                    let cleaned = clean_text(&raw);
                    if !cleaned.is_empty() {
                        tracing::debug!(psm = mode.psm(), text = %cleaned, "card text recognized");
                        return cleaned;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "OCR failed");
                    return String::new();
                }
            }
        }

        String::new()
    }
}

impl<E: OcrEngine> CardReader for CardTextExtractor<E> {
    fn read_name(&self, image: &RgbImage) -> String {
        self.extract_text(image)
    }
}

/// Locate the largest bright quadrilateral with a card-like aspect ratio.
pub fn locate_card(image: &RgbImage) -> Option<PixelRect> {
    let gray = imageops::grayscale(image);
    let mask = enhance::threshold(&gray, WHITE_THRESHOLD);

    let mut best = None;
    let mut max_area = 0.0f64;

    let contours = find_contours::<i32>(&mask);
    let outer = contours
        .iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none());

    for contour in outer {
        let points = &contour.points;
        if points.len() < 4 {
            continue;
        }

        let epsilon = POLY_EPSILON_FACTOR * arc_length(points, true);
        if approximate_closed_polygon(points, epsilon).len() != 4 {
            continue;
        }

        let area = polygon_area(points);
        let rect = bounding_rect(points);
        let aspect = rect.width as f64 / rect.height as f64;
        if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect) || area <= max_area {
            continue;
        }

        if mean_brightness(&gray, rect) > MIN_MEAN_BRIGHTNESS {
            max_area = area;
            best = Some(rect);
        }
    }

    best
}

/// Grayscale, upsample short crops, CLAHE, Otsu binarization.
pub fn prepare_for_ocr(card: &RgbImage) -> GrayImage {
    let mut gray = imageops::grayscale(card);

    if gray.height() > 0 && gray.height() < MIN_OCR_HEIGHT {
        let scale = MIN_OCR_HEIGHT as f32 / gray.height() as f32;
        let width = ((gray.width() as f32 * scale).round() as u32).max(1);
        gray = imageops::resize(&gray, width, MIN_OCR_HEIGHT, FilterType::Triangle);
    }

    enhance::clahe(&mut gray, CLAHE_TILES, CLAHE_CLIP_LIMIT);
    enhance::binarize_otsu(&gray)
}

/// Douglas–Peucker on a closed contour.
///
/// Splits the ring at the point farthest from the first one and simplifies
/// both open halves, so the seam at the start point is not kept as a vertex.
fn approximate_closed_polygon(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let points = match points.split_last() {
        Some((last, ring)) if !ring.is_empty() && *last == ring[0] => ring,
        _ => points,
    };
    let start = points[0];
    let dist2 = |p: &Point<i32>| {
        let (dx, dy) = ((p.x - start.x) as i64, (p.y - start.y) as i64);
        dx * dx + dy * dy
    };
    let far = points
        .iter()
        .enumerate()
        .max_by_key(|&(_, p)| dist2(p))
        .map(|(i, _)| i)
        .unwrap_or(0);
    if far == 0 {
        return vec![start];
    }

    let first_half = approximate_polygon_dp(&points[..=far], epsilon, false);
    let mut second: Vec<Point<i32>> = points[far..].to_vec();
    second.push(start);
    let second_half = approximate_polygon_dp(&second, epsilon, false);

    let mut polygon = first_half;
    polygon.pop();
    polygon.extend(second_half);
    polygon.pop();
    polygon
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    let twice: i64 = (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum();
    twice.abs() as f64 / 2.0
}

fn bounding_rect(points: &[Point<i32>]) -> PixelRect {
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);
    PixelRect {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    }
}

fn mean_brightness(gray: &GrayImage, rect: PixelRect) -> f64 {
    let roi = imageops::crop_imm(gray, rect.x, rect.y, rect.width, rect.height);
    let (sum, count) = roi
        .pixels()
        .fold((0u64, 0u64), |(s, n), (_, _, p)| (s + p.0[0] as u64, n + 1));
    if count == 0 { 0.0 } else { sum as f64 / count as f64 }
}
