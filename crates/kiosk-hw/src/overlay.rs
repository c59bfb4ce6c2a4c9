//! Detection overlays drawn onto live frames.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;

pub const AUTHORIZED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const UNAUTHORIZED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const BORDER_PX: u32 = 3;
const LABEL_PADDING: u32 = 6;
const DEFAULT_TEXT_PX: f32 = 22.0;

/// Draws face boxes and name labels.
///
/// Without a font only the boxes are drawn.
pub struct OverlayRenderer {
    font: Option<FontVec>,
    scale: PxScale,
}

impl OverlayRenderer {
    /// Load the label font from `font_path`; a missing or invalid font is logged
    /// and labels are skipped.
    pub fn load(font_path: &Path) -> Self {
        let font = match std::fs::read(font_path) {
            Ok(data) => match FontVec::try_from_vec(data) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::warn!(path = %font_path.display(), error = %e, "invalid font, labels disabled");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(path = %font_path.display(), error = %e, "font not readable, labels disabled");
                None
            }
        };
        Self { font, scale: PxScale::from(DEFAULT_TEXT_PX) }
    }

    pub fn without_font() -> Self {
        Self { font: None, scale: PxScale::from(DEFAULT_TEXT_PX) }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw a box around `region` and, when a font is loaded, a filled label
    /// band under it. Regions that fall outside the image are ignored.
    pub fn draw(&self, image: &mut RgbImage, region: Rect, label: &str, authorized: bool) {
        let Some(region) = clip(region, image.width(), image.height()) else {
            return;
        };
        let color = if authorized { AUTHORIZED_COLOR } else { UNAUTHORIZED_COLOR };

        draw_border(image, region, color);

        let Some(font) = &self.font else {
            return;
        };
        if label.is_empty() {
            return;
        }

        let (text_w, text_h) = text_size(self.scale, font, label);
        let band_w = (text_w + 2 * LABEL_PADDING).max(region.width());
        let band_h = text_h + 2 * LABEL_PADDING;

        let below = region.bottom() + 1;
        let band_y = if below as u32 + band_h <= image.height() {
            below
        } else {
            (region.bottom() + 1 - band_h as i32).max(0)
        };

        if let Some(band) = clip(Rect::at(region.left(), band_y).of_size(band_w, band_h), image.width(), image.height()) {
            draw_filled_rect_mut(image, band, color);
            draw_text_mut(
                image,
                TEXT_COLOR,
                band.left() + LABEL_PADDING as i32,
                band.top() + LABEL_PADDING as i32,
                self.scale,
                font,
                label,
            );
        }
    }
}

/// Nested hollow rectangles give a border `BORDER_PX` thick.
fn draw_border(image: &mut RgbImage, region: Rect, color: Rgb<u8>) {
    for t in 0..BORDER_PX {
        let (w, h) = (region.width(), region.height());
        if w <= 2 * t || h <= 2 * t {
            break;
        }
        let inner = Rect::at(region.left() + t as i32, region.top() + t as i32).of_size(w - 2 * t, h - 2 * t);
        draw_hollow_rect_mut(image, inner, color);
    }
}

/// Intersect `rect` with the image bounds; None when nothing remains.
fn clip(rect: Rect, width: u32, height: u32) -> Option<Rect> {
    let x0 = rect.left().max(0);
    let y0 = rect.top().max(0);
    let x1 = (rect.right() + 1).min(width as i32);
    let y1 = (rect.bottom() + 1).min(height as i32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect::at(x0, y0).of_size((x1 - x0) as u32, (y1 - y0) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_border_is_green() {
        let mut img = RgbImage::new(50, 50);
        OverlayRenderer::without_font().draw(&mut img, Rect::at(10, 10).of_size(20, 20), "Carlos", true);

        for t in 0..3 {
            assert_eq!(*img.get_pixel(10 + t, 20), AUTHORIZED_COLOR);
        }
        assert_eq!(*img.get_pixel(13, 20), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_unauthorized_border_is_red() {
        let mut img = RgbImage::new(50, 50);
        OverlayRenderer::without_font().draw(&mut img, Rect::at(5, 5).of_size(10, 10), "No autorizado", false);
        assert_eq!(*img.get_pixel(5, 5), UNAUTHORIZED_COLOR);
        assert_eq!(*img.get_pixel(14, 14), UNAUTHORIZED_COLOR);
    }

    #[test]
    fn test_region_outside_image_is_ignored() {
        let mut img = RgbImage::new(20, 20);
        OverlayRenderer::without_font().draw(&mut img, Rect::at(40, 40).of_size(5, 5), "x", true);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_clip_partially_outside() {
        let r = clip(Rect::at(-5, 15).of_size(10, 10), 20, 20).unwrap();
        assert_eq!((r.left(), r.top(), r.width(), r.height()), (0, 15, 5, 5));
    }

    #[test]
    fn test_missing_font_disables_labels() {
        let renderer = OverlayRenderer::load(Path::new("/nonexistent/font.ttf"));
        assert!(!renderer.has_font());
    }
}
