//! Sampling a static RGBA image into a tile grid.
//!
//! Each tile averages the pixels of its source rectangle and takes the
//! palette biome closest to that color. Image row 0 is the top of the
//! picture; grid row 0 is the bottom of the map.

use crate::shared::Biome;

/// Pixels with alpha below this are treated as "no data".
const ALPHA_CUTOFF: u32 = 16;

/// Nearest palette biome by squared RGB distance.
pub fn nearest_biome(rgb: [u8; 3]) -> Biome {
    let mut best = Biome::Unknown;
    let mut best_d = u32::MAX;
    for biome in Biome::PALETTE {
        let c = biome.rgba();
        let d: u32 = (0..3)
            .map(|i| {
                let diff = c[i] as i32 - rgb[i] as i32;
                (diff * diff) as u32
            })
            .sum();
        if d < best_d {
            best_d = d;
            best = biome;
        }
    }
    best
}

/// Source pixel span `[start, end)` covered by tile `t` of `tiles` along an
/// axis of `pixels` length. Always at least one pixel wide.
pub fn source_span(t: usize, tiles: usize, pixels: usize) -> (usize, usize) {
    let start = t * pixels / tiles;
    let end = ((t + 1) * pixels / tiles).max(start + 1).min(pixels);
    (start.min(pixels.saturating_sub(1)), end)
}

/// Average color of a rectangle, or `None` if it is (mostly) transparent.
fn average_rgb(
    pixels: &[u8],
    img_w: usize,
    (x0, x1): (usize, usize),
    (y0, y1): (usize, usize),
) -> Option<[u8; 3]> {
    let mut sum = [0u64; 3];
    let mut alpha_sum = 0u64;
    let mut count = 0u64;
    for py in y0..y1 {
        for px in x0..x1 {
            let i = (py * img_w + px) * 4;
            let a = pixels[i + 3] as u64;
            sum[0] += pixels[i] as u64 * a;
            sum[1] += pixels[i + 1] as u64 * a;
            sum[2] += pixels[i + 2] as u64 * a;
            alpha_sum += a;
            count += 1;
        }
    }
    if count == 0 || alpha_sum < ALPHA_CUTOFF as u64 * count {
        return None;
    }
    Some([
        (sum[0] / alpha_sum) as u8,
        (sum[1] / alpha_sum) as u8,
        (sum[2] / alpha_sum) as u8,
    ])
}

/// Sample an RGBA8 buffer of `img_w × img_h` into a `grid_w × grid_h` grid.
pub fn sample_rgba(
    pixels: &[u8],
    img_w: usize,
    img_h: usize,
    grid_w: usize,
    grid_h: usize,
) -> Result<Vec<Biome>, String> {
    if img_w == 0 || img_h == 0 {
        return Err("Image has zero size".to_string());
    }
    if pixels.len() != img_w * img_h * 4 {
        return Err(format!(
            "Pixel buffer is {} bytes, expected {} for {}x{} RGBA",
            pixels.len(),
            img_w * img_h * 4,
            img_w,
            img_h
        ));
    }
    if grid_w == 0 || grid_h == 0 {
        return Ok(Vec::new());
    }

    let mut tiles = Vec::with_capacity(grid_w * grid_h);
    for ty in 0..grid_h {
        // Flip: grid row 0 samples the bottom of the image.
        let (y0, y1) = source_span(grid_h - 1 - ty, grid_h, img_h);
        for tx in 0..grid_w {
            let xs = source_span(tx, grid_w, img_w);
            let biome = average_rgb(pixels, img_w, xs, (y0, y1))
                .map(nearest_biome)
                .unwrap_or(Biome::Unknown);
            tiles.push(biome);
        }
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: usize, h: usize, rgba: [u8; 4]) -> Vec<u8> {
        rgba.iter().copied().cycle().take(w * h * 4).collect()
    }

    #[test]
    fn test_palette_colors_map_to_themselves() {
        for biome in Biome::PALETTE {
            let c = biome.rgba();
            assert_eq!(nearest_biome([c[0], c[1], c[2]]), biome);
        }
    }

    #[test]
    fn test_bad_buffer_length_is_error() {
        let err = sample_rgba(&[0u8; 10], 2, 2, 2, 2).unwrap_err();
        assert!(err.contains("expected 16"), "{err}");
        assert!(sample_rgba(&[], 0, 0, 1, 1).is_err());
    }

    #[test]
    fn test_top_of_image_is_top_of_grid() {
        // 1x2 image: top pixel snow, bottom pixel deep water.
        let mut px = Vec::new();
        px.extend_from_slice(&Biome::Snow.rgba());
        px.extend_from_slice(&Biome::DeepWater.rgba());
        let tiles = sample_rgba(&px, 1, 2, 1, 2).unwrap();
        assert_eq!(tiles, vec![Biome::DeepWater, Biome::Snow]);
    }

    #[test]
    fn test_upsampling_repeats_nearest_pixel() {
        let px = solid(2, 2, Biome::Desert.rgba());
        let tiles = sample_rgba(&px, 2, 2, 8, 8).unwrap();
        assert_eq!(tiles.len(), 64);
        assert!(tiles.iter().all(|b| *b == Biome::Desert));
    }

    #[test]
    fn test_transparent_pixels_are_unknown() {
        let px = solid(4, 4, [255, 255, 255, 0]);
        let tiles = sample_rgba(&px, 4, 4, 2, 2).unwrap();
        assert!(tiles.iter().all(|b| *b == Biome::Unknown));
    }

    #[test]
    fn test_source_span_covers_axis() {
        let mut covered = 0;
        for t in 0..3 {
            let (a, b) = source_span(t, 3, 10);
            assert!(b > a);
            covered += b - a;
        }
        assert_eq!(covered, 10);
        assert_eq!(source_span(7, 8, 2), (1, 2));
    }
}
