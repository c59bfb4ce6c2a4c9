//! Frame type and pixel-format conversion to RGB.

use image::{ImageFormat, Rgb, RgbImage};

/// A captured RGB camera frame.
#[derive(Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("MJPG decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

fn check_len(buf: &[u8], expected: usize) -> Result<(), FrameError> {
    if buf.len() < expected {
        return Err(FrameError::InvalidLength { expected, actual: buf.len() });
    }
    Ok(())
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// BT.601 limited-range YUV → RGB, integer arithmetic.
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> Rgb<u8> {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    Rgb([
        clamp_u8((298 * c + 409 * e + 128) >> 8),
        clamp_u8((298 * c - 100 * d - 208 * e + 128) >> 8),
        clamp_u8((298 * c + 516 * d + 128) >> 8),
    ])
}

/// Convert packed YUYV (4:2:2) to RGB.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; both pixels share U/V.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let expected = (width * height * 2) as usize;
    check_len(yuyv, expected)?;

    let mut image = RgbImage::new(width, height);
    for (i, chunk) in yuyv[..expected].chunks_exact(4).enumerate() {
        let [y0, u, y1, v] = [chunk[0], chunk[1], chunk[2], chunk[3]];
        let p = (i * 2) as u32;
        image.put_pixel(p % width, p / width, yuv_to_rgb(y0, u, v));
        image.put_pixel((p + 1) % width, (p + 1) / width, yuv_to_rgb(y1, u, v));
    }
    Ok(image)
}

/// Replicate 8-bit grayscale into three channels.
pub fn grey_to_rgb(grey: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let pixels = (width * height) as usize;
    check_len(grey, pixels)?;
    Ok(RgbImage::from_fn(width, height, |x, y| {
        let g = grey[(y * width + x) as usize];
        Rgb([g, g, g])
    }))
}

/// Packed 24-bit RGB.
pub fn rgb24_to_rgb(buf: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let expected = (width * height * 3) as usize;
    check_len(buf, expected)?;
    RgbImage::from_raw(width, height, buf[..expected].to_vec())
        .ok_or(FrameError::InvalidLength { expected, actual: buf.len() })
}

/// Decode one Motion-JPEG frame.
pub fn mjpeg_to_rgb(buf: &[u8]) -> Result<RgbImage, FrameError> {
    Ok(image::load_from_memory_with_format(buf, ImageFormat::Jpeg)?.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_white_and_black() {
        // 2x1 image sharing neutral chroma: Y=235 (white), Y=16 (black).
        let yuyv = vec![235, 128, 16, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_yuyv_wraps_rows() {
        let yuyv: Vec<u8> = [128u8, 128, 128, 128].repeat(4);
        let rgb = yuyv_to_rgb(&yuyv, 4, 2).unwrap();
        assert_eq!(rgb.dimensions(), (4, 2));
        assert_eq!(rgb.get_pixel(3, 1), rgb.get_pixel(0, 0));
    }

    #[test]
    fn test_yuyv_invalid_length() {
        assert!(matches!(
            yuyv_to_rgb(&[100, 128], 2, 1),
            Err(FrameError::InvalidLength { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_grey_to_rgb() {
        let rgb = grey_to_rgb(&[10, 20, 30, 40], 2, 2).unwrap();
        assert_eq!(rgb.get_pixel(1, 1).0, [40, 40, 40]);
        assert!(grey_to_rgb(&[1, 2, 3], 2, 2).is_err());
    }

    #[test]
    fn test_rgb24_to_rgb() {
        let rgb = rgb24_to_rgb(&[1, 2, 3, 4, 5, 6], 2, 1).unwrap();
        assert_eq!(rgb.get_pixel(1, 0).0, [4, 5, 6]);
    }

    #[test]
    fn test_mjpeg_decode() {
        let src = RgbImage::from_pixel(16, 8, Rgb([90, 90, 90]));
        let mut jpeg = Vec::new();
        src.write_to(&mut std::io::Cursor::new(&mut jpeg), ImageFormat::Jpeg).unwrap();

        let decoded = mjpeg_to_rgb(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert!(mjpeg_to_rgb(b"garbage").is_err());
    }
}
