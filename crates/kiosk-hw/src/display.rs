//! Preview window backed by `minifb`.

use image::imageops::{self, FilterType};
use image::RgbImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),
}

pub struct Display {
    window: Window,
    buffer: Vec<u32>,
    width: u32,
    height: u32,
}

impl Display {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, DisplayError> {
        let mut window = Window::new(title, width as usize, height as usize, WindowOptions::default())?;
        window.set_target_fps(30);
        tracing::info!(title, width, height, "display window opened");
        Ok(Self {
            window,
            buffer: vec![0; (width * height) as usize],
            width,
            height,
        })
    }

    /// Present one frame, scaled to the window. Also pumps the window's event queue.
    pub fn show(&mut self, image: &RgbImage) -> Result<(), DisplayError> {
        let fitted = fit_frame(image, self.width, self.height);
        if let Cow::Owned(_) = fitted {
            tracing::trace!(
                frame_width = image.width(),
                frame_height = image.height(),
                "frame size differs from window, resizing"
            );
        }
        pack_rgb(&fitted, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, self.width as usize, self.height as usize)?;
        Ok(())
    }

    /// True once the user pressed `q` or closed the window.
    pub fn quit_requested(&self) -> bool {
        !self.window.is_open() || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
    }
}

/// `image` unchanged when it is already `width`×`height`, else a resized copy.
///
/// MJPG devices may deliver frames whose size differs from the negotiated format.
pub fn fit_frame(image: &RgbImage, width: u32, height: u32) -> Cow<'_, RgbImage> {
    if image.dimensions() == (width, height) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(image, width, height, FilterType::Triangle))
    }
}

/// Pack RGB pixels as 0x00RRGGBB, the layout minifb expects.
pub fn pack_rgb(image: &RgbImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        image
            .pixels()
            .map(|p| (p[0] as u32) << 16 | (p[1] as u32) << 8 | p[2] as u32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_pack_rgb() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0x12, 0x34, 0x56]));
        img.put_pixel(1, 0, Rgb([255, 0, 0]));

        let mut buf = vec![7; 10];
        pack_rgb(&img, &mut buf);
        assert_eq!(buf, vec![0x0012_3456, 0x00FF_0000]);
    }

    #[test]
    fn test_fit_frame_resizes_mismatched_frame() {
        let img = RgbImage::from_pixel(4, 2, Rgb([10, 20, 30]));

        let fitted = fit_frame(&img, 8, 4);
        assert!(matches!(fitted, Cow::Owned(_)));
        assert_eq!(fitted.dimensions(), (8, 4));
        assert_eq!(fitted.get_pixel(7, 3).0, [10, 20, 30]);

        let mut buf = Vec::new();
        pack_rgb(&fitted, &mut buf);
        assert_eq!(buf.len(), 8 * 4);
    }

    #[test]
    fn test_fit_frame_borrows_matching_frame() {
        let img = RgbImage::new(4, 2);
        assert!(matches!(fit_frame(&img, 4, 2), Cow::Borrowed(_)));
    }
}
