use std::collections::HashMap;

use image::imageops::FilterType;
use image::{ imageops, RgbImage };
use once_cell::sync::Lazy;

/// Edge length of the sampling grid used for the modal-color estimate.
const SAMPLE_EDGE: u32 = 64;

/// Channel bucket width for quantization on the 0-255 scale.
const BUCKET_WIDTH: u8 = 32;

/// The eleven named colors a dominant color is snapped to. Order matters:
/// distance ties resolve to the earlier entry.
static NAMED_COLORS: Lazy<Vec<(&'static str, [u8; 3])>> = Lazy::new(|| {
    vec![
        ("red", [255, 0, 0]),
        ("orange", [255, 165, 0]),
        ("yellow", [255, 255, 0]),
        ("green", [0, 128, 0]),
        ("blue", [0, 0, 255]),
        ("purple", [128, 0, 128]),
        ("pink", [255, 192, 203]),
        ("brown", [139, 69, 19]),
        ("black", [0, 0, 0]),
        ("white", [255, 255, 255]),
        ("gray", [128, 128, 128]),
    ]
});

fn quantize(v: u8) -> u8 {
    // Bucket midpoint, so an all-white image still lands near white.
    (v / BUCKET_WIDTH) * BUCKET_WIDTH + BUCKET_WIDTH / 2
}

fn squared_distance(a: [u8; 3], b: [u8; 3]) -> i64 {
    let dr = a[0] as i64 - b[0] as i64;
    let dg = a[1] as i64 - b[1] as i64;
    let db = a[2] as i64 - b[2] as i64;
    dr * dr + dg * dg + db * db
}

/// Snaps an RGB value to the closest named color by squared Euclidean
/// distance. Ties go to the earlier table entry.
pub fn nearest_named(rgb: [u8; 3]) -> &'static str {
    let mut best = NAMED_COLORS[0].0;
    let mut best_dist = squared_distance(rgb, NAMED_COLORS[0].1);
    for (name, reference) in NAMED_COLORS.iter().skip(1) {
        let d = squared_distance(rgb, *reference);
        if d < best_dist {
            best = name;
            best_dist = d;
        }
    }
    best
}

/// Estimates the dominant color of an image: downsample to a small grid,
/// quantize each channel into coarse buckets, take the modal quantized color,
/// and snap it to the nearest named color. Modal ties break on the smallest
/// bucket triple so identical bytes always yield the identical name.
pub fn dominant_color(img: &RgbImage) -> Option<&'static str> {
    if img.width() == 0 || img.height() == 0 {
        return None;
    }
    let small = imageops::resize(img, SAMPLE_EDGE, SAMPLE_EDGE, FilterType::Triangle);

    let mut counts: HashMap<[u8; 3], u32> = HashMap::new();
    for pixel in small.pixels() {
        let key = [quantize(pixel[0]), quantize(pixel[1]), quantize(pixel[2])];
        *counts.entry(key).or_insert(0) += 1;
    }

    let modal = counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))?
        .0;

    Some(nearest_named(modal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn solid_primaries_map_to_their_names() {
        for (rgb, expected) in [
            ([255u8, 0, 0], "red"),
            ([0, 0, 255], "blue"),
            ([0, 128, 0], "green"),
            ([255, 255, 255], "white"),
            ([0, 0, 0], "black"),
        ] {
            let img = RgbImage::from_pixel(32, 32, Rgb(rgb));
            assert_eq!(dominant_color(&img), Some(expected), "for {:?}", rgb);
        }
    }

    #[test]
    fn majority_color_wins() {
        let mut img = RgbImage::from_pixel(64, 64, Rgb([250, 10, 10]));
        for x in 0..64 {
            for y in 0..8 {
                img.put_pixel(x, y, Rgb([10, 10, 250]));
            }
        }
        assert_eq!(dominant_color(&img), Some("red"));
    }

    #[test]
    fn nearest_named_examples() {
        assert_eq!(nearest_named([128, 0, 128]), "purple");
        assert_eq!(nearest_named([255, 0, 4]), "red");
        assert_eq!(nearest_named([240, 240, 240]), "white");
        assert_eq!(nearest_named([150, 80, 30]), "brown");
    }

    #[test]
    fn dominant_color_is_deterministic() {
        let mut img = RgbImage::new(48, 48);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgb([(x * 5) as u8, (y * 3) as u8, ((x + y) * 2) as u8]);
        }
        let first = dominant_color(&img);
        for _ in 0..5 {
            assert_eq!(dominant_color(&img), first);
        }
    }

    #[test]
    fn empty_image_yields_nothing() {
        let img = RgbImage::new(0, 0);
        assert_eq!(dominant_color(&img), None);
    }

    #[test]
    fn quantization_keeps_values_in_range() {
        assert_eq!(quantize(0), 16);
        assert_eq!(quantize(255), 240);
        assert_eq!(quantize(31), 16);
        assert_eq!(quantize(32), 48);
    }
}
