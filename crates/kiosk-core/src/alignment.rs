//! Face alignment via 4-DOF similarity transform.
//!
//! Warps a detected face to the canonical 112×112 ArcFace position using the
//! five InsightFace reference landmarks and a least-squares fit.

use image::{Rgb, RgbImage};

/// ArcFace reference landmarks for a 112×112 output.
const REFERENCE_LANDMARKS_112: [(f32, f32); 5] = [
    (38.2946, 51.6963), // left eye
    (73.5318, 51.5014), // right eye
    (56.0252, 71.7366), // nose
    (41.5493, 92.3655), // left mouth
    (70.7299, 92.2041), // right mouth
];

pub const ALIGNED_SIZE: u32 = 112;

/// Least-squares similarity transform from `src` to `dst` landmarks.
///
/// Returns [a, -b, tx, b, a, ty] representing the matrix:
/// ```text
/// | a  -b  tx |
/// | b   a  ty |
/// ```
fn estimate_similarity_transform(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> [f32; 6] {
    // Normal equations for the overdetermined system
    //   sx * a - sy * b + tx = dx
    //   sy * a + sx * b + ty = dy
    let mut ata = [[0.0f32; 4]; 4];
    let mut atb = [0.0f32; 4];

    for ((sx, sy), (dx, dy)) in src.iter().copied().zip(dst.iter().copied()) {
        let r1 = [sx, -sy, 1.0, 0.0];
        let r2 = [sy, sx, 0.0, 1.0];

        for j in 0..4 {
            for k in 0..4 {
                ata[j][k] += r1[j] * r1[k] + r2[j] * r2[k];
            }
            atb[j] += r1[j] * dx + r2[j] * dy;
        }
    }

    let [a, b, tx, ty] = solve_4x4(ata, atb);
    [a, -b, tx, b, a, ty]
}

/// Gaussian elimination with partial pivoting.
#[allow(clippy::needless_range_loop)]
fn solve_4x4(ata: [[f32; 4]; 4], atb: [f32; 4]) -> [f32; 4] {
    let mut m = [[0.0f32; 5]; 4];
    for i in 0..4 {
        m[i][..4].copy_from_slice(&ata[i]);
        m[i][4] = atb[i];
    }

    for col in 0..4 {
        let pivot_row = (col..4)
            .max_by(|&r1, &r2| m[r1][col].abs().total_cmp(&m[r2][col].abs()))
            .unwrap_or(col);
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        if pivot.abs() < 1e-12 {
            // Degenerate landmarks: unit scale, no rotation.
            return [1.0, 0.0, 0.0, 0.0];
        }

        for row in (col + 1)..4 {
            let factor = m[row][col] / pivot;
            for j in col..5 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f32; 4];
    for i in (0..4).rev() {
        x[i] = m[i][4];
        for j in (i + 1)..4 {
            x[i] -= m[i][j] * x[j];
        }
        x[i] /= m[i][i];
    }

    x
}

/// Inverse-map every output pixel through the similarity `matrix` and sample
/// the source bilinearly. Out-of-bounds samples are black.
fn warp_affine(src: &RgbImage, matrix: &[f32; 6], out_size: u32) -> RgbImage {
    let (a, tx) = (matrix[0], matrix[2]);
    let (b, ty) = (matrix[3], matrix[5]);

    let det = a * a + b * b;
    if det.abs() < 1e-12 {
        return RgbImage::new(out_size, out_size);
    }
    let ia = a / det;
    let ib = b / det;

    let (w, h) = (src.width() as i32, src.height() as i32);
    let sample = |x: i32, y: i32| -> [f32; 3] {
        if x >= 0 && x < w && y >= 0 && y < h {
            let p = src.get_pixel(x as u32, y as u32).0;
            [p[0] as f32, p[1] as f32, p[2] as f32]
        } else {
            [0.0; 3]
        }
    };

    RgbImage::from_fn(out_size, out_size, |ox, oy| {
        let dx = ox as f32 - tx;
        let dy = oy as f32 - ty;
        let sx = ia * dx + ib * dy;
        let sy = -ib * dx + ia * dy;

        let x0 = sx.floor() as i32;
        let y0 = sy.floor() as i32;
        let fx = sx - x0 as f32;
        let fy = sy - y0 as f32;

        let tl = sample(x0, y0);
        let tr = sample(x0 + 1, y0);
        let bl = sample(x0, y0 + 1);
        let br = sample(x0 + 1, y0 + 1);

        let mut out = [0u8; 3];
        for c in 0..3 {
            let v = tl[c] * (1.0 - fx) * (1.0 - fy)
                + tr[c] * fx * (1.0 - fy)
                + bl[c] * (1.0 - fx) * fy
                + br[c] * fx * fy;
            out[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}

/// Align a detected face to a canonical 112×112 RGB crop for ArcFace.
pub fn align_face(image: &RgbImage, landmarks: &[(f32, f32); 5]) -> RgbImage {
    let matrix = estimate_similarity_transform(landmarks, &REFERENCE_LANDMARKS_112);
    warp_affine(image, &matrix, ALIGNED_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let pts = REFERENCE_LANDMARKS_112;
        let m = estimate_similarity_transform(&pts, &pts);

        assert!((m[0] - 1.0).abs() < 1e-4, "a = {}", m[0]);
        assert!(m[1].abs() < 1e-4, "-b = {}", m[1]);
        assert!(m[2].abs() < 1e-3, "tx = {}", m[2]);
        assert!(m[3].abs() < 1e-4, "b = {}", m[3]);
        assert!(m[5].abs() < 1e-3, "ty = {}", m[5]);
    }

    #[test]
    fn test_half_scale_transform() {
        let src = REFERENCE_LANDMARKS_112.map(|(x, y)| (x * 2.0, y * 2.0));
        let m = estimate_similarity_transform(&src, &REFERENCE_LANDMARKS_112);
        assert!((m[0] - 0.5).abs() < 0.05, "a = {}, expected ~0.5", m[0]);
    }

    #[test]
    fn test_align_face_output_size() {
        let frame = RgbImage::from_pixel(640, 480, Rgb([128, 128, 128]));
        let aligned = align_face(&frame, &REFERENCE_LANDMARKS_112);
        assert_eq!(aligned.dimensions(), (ALIGNED_SIZE, ALIGNED_SIZE));
        assert_eq!(aligned.get_pixel(56, 56).0, [128, 128, 128]);
    }

    #[test]
    fn test_left_eye_lands_on_reference() {
        let mut frame = RgbImage::new(200, 200);
        let src_landmarks: [(f32, f32); 5] = [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ];

        // 5x5 red patch at the left eye survives bilinear sampling.
        for y in 58..63 {
            for x in 78..83 {
                frame.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }

        let aligned = align_face(&frame, &src_landmarks);

        let ref_x = REFERENCE_LANDMARKS_112[0].0.round() as u32;
        let ref_y = REFERENCE_LANDMARKS_112[0].1.round() as u32;
        let max_red = (ref_y - 1..=ref_y + 1)
            .flat_map(|y| (ref_x - 1..=ref_x + 1).map(move |x| (x, y)))
            .map(|(x, y)| aligned.get_pixel(x, y).0[0])
            .max()
            .unwrap_or(0);
        assert!(max_red > 100, "expected red near ({ref_x}, {ref_y}), max={max_red}");
    }
}
