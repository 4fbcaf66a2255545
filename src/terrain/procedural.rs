//! Procedural biome generation.
//!
//! Three fractal noise fields (elevation, moisture, temperature) are sampled
//! per tile and classified into a `Biome`. Every noise seed is derived from
//! the master seed, so the same seed and dimensions always yield the same map.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::shared::Biome;

/// Tunables for the noise fields. `scale` is the feature size in tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainParams {
    pub scale: f64,
    pub octaves: usize,
    /// How strongly map edges are pushed toward ocean (0 disables).
    pub island_falloff: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            scale: 64.0,
            octaves: 5,
            island_falloff: 0.55,
        }
    }
}

const DEEP_WATER_LEVEL: f64 = 0.30;
const SHALLOW_WATER_LEVEL: f64 = 0.38;
const BEACH_LEVEL: f64 = 0.42;
const PEAK_LEVEL: f64 = 0.82;

/// Pick a biome from normalized elevation, moisture and temperature (all 0..=1).
pub fn classify(elevation: f64, moisture: f64, temperature: f64) -> Biome {
    if elevation < DEEP_WATER_LEVEL {
        return Biome::DeepWater;
    }
    if elevation < SHALLOW_WATER_LEVEL {
        return Biome::ShallowWater;
    }
    if elevation < BEACH_LEVEL {
        return if temperature < 0.2 { Biome::Snow } else { Biome::Beach };
    }
    if elevation > PEAK_LEVEL {
        return if temperature < 0.45 { Biome::Snow } else { Biome::Mountain };
    }

    if temperature < 0.2 {
        Biome::Snow
    } else if temperature < 0.35 {
        Biome::Tundra
    } else if temperature < 0.7 {
        // Temperate band
        if moisture < 0.35 {
            Biome::Grassland
        } else if moisture < 0.7 {
            Biome::Forest
        } else {
            Biome::Swamp
        }
    } else if moisture < 0.3 {
        Biome::Desert
    } else if moisture < 0.6 {
        Biome::Savanna
    } else {
        Biome::Jungle
    }
}

fn fbm(seed: u32, octaves: usize) -> Fbm<Perlin> {
    Fbm::<Perlin>::new(seed).set_octaves(octaves.clamp(1, 8))
}

fn normalized(noise: &Fbm<Perlin>, x: f64, y: f64) -> f64 {
    ((noise.get([x, y]) + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Generate a `width × height` row-major biome grid (row 0 at the bottom).
pub fn generate_biomes(seed: u64, width: usize, height: usize, params: TerrainParams) -> Vec<Biome> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let elevation_noise = fbm(rng.gen(), params.octaves);
    let moisture_noise = fbm(rng.gen(), params.octaves);
    let temperature_noise = fbm(rng.gen(), params.octaves.min(3));

    let scale = if params.scale > 0.0 { params.scale } else { 1.0 };
    let half_w = width as f64 * 0.5;
    let half_h = height as f64 * 0.5;

    let mut tiles = Vec::with_capacity(width * height);
    for y in 0..height {
        // Latitude: 0 at the equator (map middle), 1 at the top/bottom edge.
        let latitude = ((y as f64 + 0.5 - half_h) / half_h).abs();
        for x in 0..width {
            let nx = x as f64 / scale;
            let ny = y as f64 / scale;

            let mut elevation = normalized(&elevation_noise, nx, ny);
            if params.island_falloff > 0.0 {
                let dx = (x as f64 + 0.5 - half_w) / half_w;
                let dy = (y as f64 + 0.5 - half_h) / half_h;
                let d = (dx * dx + dy * dy).sqrt().min(1.0);
                elevation = (elevation - params.island_falloff * d.powi(3)).max(0.0);
            }

            let moisture = normalized(&moisture_noise, nx + 512.0, ny + 512.0);
            let base_temp = normalized(&temperature_noise, nx * 0.5, ny * 0.5);
            let temperature = (0.5 * base_temp + 0.5 * (1.0 - latitude)
                - 0.4 * (elevation - BEACH_LEVEL).max(0.0))
            .clamp(0.0, 1.0);

            tiles.push(classify(elevation, moisture, temperature));
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_map() {
        let a = generate_biomes(42, 48, 32, TerrainParams::default());
        let b = generate_biomes(42, 48, 32, TerrainParams::default());
        assert_eq!(a, b);
        assert_eq!(a.len(), 48 * 32);
    }

    #[test]
    fn test_different_seed_different_map() {
        let a = generate_biomes(1, 64, 64, TerrainParams::default());
        let b = generate_biomes(2, 64, 64, TerrainParams::default());
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_dimensions_empty() {
        assert!(generate_biomes(7, 0, 10, TerrainParams::default()).is_empty());
        assert!(generate_biomes(7, 10, 0, TerrainParams::default()).is_empty());
    }

    #[test]
    fn test_never_produces_unknown() {
        let tiles = generate_biomes(99, 80, 60, TerrainParams::default());
        assert!(tiles.iter().all(|b| *b != Biome::Unknown));
    }

    #[test]
    fn test_island_falloff_drowns_corners() {
        let params = TerrainParams {
            island_falloff: 1.0,
            ..TerrainParams::default()
        };
        let w = 64;
        let tiles = generate_biomes(5, w, w, params);
        for (x, y) in [(0, 0), (w - 1, 0), (0, w - 1), (w - 1, w - 1)] {
            let b = tiles[y * w + x];
            assert!(
                matches!(b, Biome::DeepWater | Biome::ShallowWater),
                "corner ({x}, {y}) should be water, got {b:?}"
            );
        }
    }

    #[test]
    fn test_classify_bands() {
        assert_eq!(classify(0.1, 0.5, 0.5), Biome::DeepWater);
        assert_eq!(classify(0.35, 0.5, 0.5), Biome::ShallowWater);
        assert_eq!(classify(0.40, 0.5, 0.5), Biome::Beach);
        assert_eq!(classify(0.9, 0.5, 0.8), Biome::Mountain);
        assert_eq!(classify(0.9, 0.5, 0.1), Biome::Snow);
        assert_eq!(classify(0.6, 0.1, 0.9), Biome::Desert);
        assert_eq!(classify(0.6, 0.9, 0.9), Biome::Jungle);
        assert_eq!(classify(0.6, 0.5, 0.5), Biome::Forest);
        assert_eq!(classify(0.6, 0.2, 0.5), Biome::Grassland);
        assert_eq!(classify(0.6, 0.5, 0.3), Biome::Tundra);
    }
}
