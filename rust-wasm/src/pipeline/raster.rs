//! Solution vector to grayscale image
//!
//! A solution of length n is shown as a √n × √n image (row-major) when n is a
//! perfect square. Intensities are min-max stretched to 0..=255.

use std::path::Path;

use image::{GrayImage, ImageFormat};
use tracing::info;

use crate::error::{ReconError, Result};

/// Side length of the square image for a vector of length `len`
pub fn square_side(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let mut side = (len as f64).sqrt() as usize;
    while side * side > len {
        side -= 1;
    }
    while (side + 1) * (side + 1) <= len {
        side += 1;
    }
    (side * side == len).then_some(side)
}

/// Min-max normalize to 8-bit intensities
///
/// The smallest finite value maps to 0 and the largest to 255, rounding to
/// nearest. A constant vector maps to all zeros; NaN and ±inf map to 0.
pub fn normalize_to_u8(values: &[f64]) -> Vec<u8> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let range = max - min;
    let scale = if range > f64::EPSILON { 255.0 / range } else { 0.0 };

    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                ((v - min) * scale).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

/// Build the normalized side × side raster
pub fn to_gray_image(values: &[f64], side: usize) -> Result<GrayImage> {
    if values.len() != side * side {
        return Err(ReconError::DimensionMismatch {
            operation: "rasterize",
            expected: side * side,
            actual: values.len(),
        });
    }
    let pixels = normalize_to_u8(values);
    GrayImage::from_raw(side as u32, side as u32, pixels).ok_or(ReconError::DimensionMismatch {
        operation: "rasterize",
        expected: side * side,
        actual: values.len(),
    })
}

/// Write the normalized raster as an 8-bit grayscale PNG
pub fn write_png(values: &[f64], side: usize, path: &Path) -> Result<()> {
    let img = to_gray_image(values, side)?;
    img.save_with_format(path, ImageFormat::Png)?;
    info!(path = %path.display(), side, "wrote reconstruction image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_square_side() {
        assert_eq!(square_side(1), Some(1));
        assert_eq!(square_side(4), Some(2));
        assert_eq!(square_side(3600), Some(60));
        assert_eq!(square_side(10), None);
        assert_eq!(square_side(0), None);
        assert_eq!(square_side(26), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_to_u8(&[-1.0, 0.0, 1.0]), vec![0, 128, 255]);
        assert_eq!(normalize_to_u8(&[2.0, 4.0, 6.0, 10.0]), vec![0, 64, 128, 255]);
    }

    #[test]
    fn test_normalize_constant_and_non_finite() {
        assert_eq!(normalize_to_u8(&[3.0, 3.0]), vec![0, 0]);
        assert_eq!(normalize_to_u8(&[0.0, f64::NAN, 1.0]), vec![0, 0, 255]);
        assert!(normalize_to_u8(&[]).is_empty());
    }

    #[test]
    fn test_to_gray_image_row_major() {
        let img = to_gray_image(&[0.0, 1.0, 2.0, 3.0], 2).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        // pixel (x=1, y=0) is the second entry
        assert_eq!(img.get_pixel(1, 0)[0], 85);
        assert_eq!(img.get_pixel(0, 1)[0], 170);
        assert!(to_gray_image(&[0.0; 5], 2).is_err());
    }

    #[test]
    fn test_write_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");
        write_png(&[0.0, 0.5, 0.5, 1.0], 2, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.get_pixel(1, 1)[0], 255);
    }
}
