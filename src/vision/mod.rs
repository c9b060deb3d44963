pub mod color;

use std::collections::BTreeMap;

use image::imageops::FilterType;
use image::{ DynamicImage, RgbImage };
use log::warn;
use thiserror::Error;

/// Named visual facts derived from an image, e.g. `dominant_color: blue`.
/// An empty map is valid and means no facts could be extracted.
pub type VisualFacts = BTreeMap<String, String>;

pub const FACT_DOMINANT_COLOR: &str = "dominant_color";

/// Default cap on the longest image edge before recognition.
pub const DEFAULT_MAX_EDGE: u32 = 512;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Decodes raw upload bytes into a 3-channel pixel grid. Any decode failure
/// surfaces as `InvalidImage`.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, VisionError> {
    let img = image::load_from_memory(bytes).map_err(|e| {
        VisionError::InvalidImage(e.to_string())
    })?;
    Ok(img.to_rgb8())
}

/// Downsamples so the longest edge is at most `max_edge`, preserving aspect
/// ratio. Images already within the bound are returned untouched. Bounding is
/// a transport-safety policy, not a correctness requirement.
pub fn bound_longest_edge(img: RgbImage, max_edge: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w.max(h) <= max_edge {
        return img;
    }
    DynamicImage::ImageRgb8(img)
        .resize(max_edge, max_edge, FilterType::Triangle)
        .to_rgb8()
}

/// Extracts whatever coarse facts are available from the image. Extraction
/// failure must never fail the request, so this decodes independently and
/// yields an empty map on any error.
pub fn extract_facts(bytes: &[u8]) -> VisualFacts {
    let mut facts = VisualFacts::new();
    match decode(bytes) {
        Ok(img) => {
            if let Some(name) = color::dominant_color(&img) {
                facts.insert(FACT_DOMINANT_COLOR.to_string(), name.to_string());
            }
        }
        Err(e) => {
            warn!("Skipping visual fact extraction: {}", e);
        }
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(w, h, image::Rgb(rgb));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, VisionError::InvalidImage(_)));
    }

    #[test]
    fn decode_accepts_png() {
        let img = decode(&png_bytes(8, 6, [10, 20, 30])).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
    }

    #[test]
    fn bounding_caps_longest_edge() {
        let img = RgbImage::new(1024, 256);
        let bounded = bound_longest_edge(img, 512);
        assert_eq!(bounded.dimensions().0, 512);
        assert!(bounded.dimensions().1 <= 512);
    }

    #[test]
    fn bounding_leaves_small_images_alone() {
        let img = RgbImage::new(100, 60);
        let bounded = bound_longest_edge(img, 512);
        assert_eq!(bounded.dimensions(), (100, 60));
    }

    #[test]
    fn facts_from_solid_image_contain_dominant_color() {
        let facts = extract_facts(&png_bytes(80, 80, [250, 10, 10]));
        assert_eq!(facts.get(FACT_DOMINANT_COLOR).map(String::as_str), Some("red"));
    }

    #[test]
    fn facts_from_garbage_are_empty() {
        assert!(extract_facts(b"\x00\x01\x02").is_empty());
    }

    #[test]
    fn fact_extraction_is_deterministic() {
        let bytes = png_bytes(64, 48, [30, 90, 200]);
        assert_eq!(extract_facts(&bytes), extract_facts(&bytes));
    }
}
