//! Cropping, whitespace trimming and PNG encoding of page regions.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{imageops, ImageFormat, RgbImage};

use crate::error::Result;
use crate::model::BBox;

/// Integer pixel rectangle with exclusive right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge
    pub x1: u32,
    /// Top edge
    pub y1: u32,
    /// Right edge (exclusive)
    pub x2: u32,
    /// Bottom edge (exclusive)
    pub y2: u32,
}

impl PixelRect {
    /// Round a raster-space box and clamp it to the image.
    ///
    /// Returns `None` for non-finite coordinates or an empty rectangle.
    pub fn from_bbox(bbox: BBox, width: u32, height: u32) -> Option<Self> {
        if bbox.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let clamp = |v: f64, max: u32| v.round().clamp(0.0, f64::from(max)) as u32;
        let rect = Self {
            x1: clamp(bbox[0], width),
            y1: clamp(bbox[1], height),
            x2: clamp(bbox[2], width),
            y2: clamp(bbox[3], height),
        };

        if rect.x2 <= rect.x1 || rect.y2 <= rect.y1 {
            None
        } else {
            Some(rect)
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// Copy a region out of an image.
pub fn crop(image: &RgbImage, rect: PixelRect) -> RgbImage {
    imageops::crop_imm(image, rect.x1, rect.y1, rect.width(), rect.height()).to_image()
}

/// Trim near-white borders, keeping `margin` pixels around the content.
///
/// A pixel is content when the mean of its channels is below `threshold`.
/// An image with no content pixels is returned unchanged.
pub fn auto_trim(image: &RgbImage, threshold: u8, margin: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        let sum: u32 = pixel.0.iter().map(|&c| u32::from(c)).sum();
        if sum >= u32::from(threshold) * 3 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((cmin, rmin, cmax, rmax)) => (cmin.min(x), rmin.min(y), cmax.max(x), rmax.max(y)),
        });
    }

    let Some((cmin, rmin, cmax, rmax)) = bounds else {
        return image.clone();
    };

    let cmin = cmin.saturating_sub(margin);
    let rmin = rmin.saturating_sub(margin);
    let cmax = cmax.saturating_add(margin).min(width - 1);
    let rmax = rmax.saturating_add(margin).min(height - 1);

    imageops::crop_imm(image, cmin, rmin, cmax - cmin + 1, rmax - rmin + 1).to_image()
}

/// Encode an image as a PNG `data:` URI.
pub fn encode_png_data_uri(image: &RgbImage) -> Result<String> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(&buffer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn white(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_pixel_rect_clamps() {
        let rect = PixelRect::from_bbox([-5.0, 10.4, 120.6, 49.5], 100, 50).unwrap();
        assert_eq!(rect, PixelRect { x1: 0, y1: 10, x2: 100, y2: 50 });
        assert_eq!(rect.width(), 100);
        assert_eq!(rect.height(), 40);
    }

    #[test]
    fn test_pixel_rect_degenerate() {
        assert!(PixelRect::from_bbox([10.0, 10.0, 10.2, 20.0], 100, 100).is_none());
        assert!(PixelRect::from_bbox([50.0, 10.0, 20.0, 20.0], 100, 100).is_none());
        assert!(PixelRect::from_bbox([200.0, 10.0, 300.0, 20.0], 100, 100).is_none());
        assert!(PixelRect::from_bbox([f64::NAN, 0.0, 10.0, 10.0], 100, 100).is_none());
    }

    #[test]
    fn test_crop() {
        let mut image = white(10, 10);
        image.put_pixel(5, 5, Rgb([0, 0, 0]));
        let cropped = crop(&image, PixelRect { x1: 4, y1: 4, x2: 7, y2: 8 });
        assert_eq!(cropped.dimensions(), (3, 4));
        assert_eq!(cropped.get_pixel(1, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_auto_trim_all_white_unchanged() {
        let image = white(20, 10);
        assert_eq!(auto_trim(&image, 240, 2), image);
    }

    #[test]
    fn test_auto_trim_keeps_margin() {
        let mut image = white(20, 20);
        for x in 8..12 {
            for y in 5..7 {
                image.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }
        let trimmed = auto_trim(&image, 240, 2);
        // content spans x 8..=11, y 5..=6
        assert_eq!(trimmed.dimensions(), (8, 6));
        assert_eq!(trimmed.get_pixel(2, 2), &Rgb([10, 10, 10]));
    }

    #[test]
    fn test_auto_trim_margin_clamped_at_edges() {
        let mut image = white(5, 5);
        image.put_pixel(0, 4, Rgb([0, 0, 0]));
        let trimmed = auto_trim(&image, 240, 2);
        assert_eq!(trimmed.dimensions(), (3, 3));
    }

    #[test]
    fn test_light_gray_is_background() {
        let image = RgbImage::from_pixel(4, 4, Rgb([245, 245, 240]));
        assert_eq!(auto_trim(&image, 240, 2), image);
    }

    #[test]
    fn test_encode_png_data_uri() {
        let uri = encode_png_data_uri(&white(2, 2)).unwrap();
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
