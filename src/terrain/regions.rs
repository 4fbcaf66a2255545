//! Polygon-based region lookup.
//!
//! A region file lists named polygons (in tile units) with the biome each
//! one paints. Lookup uses even-odd ray casting; earlier regions win where
//! polygons overlap.

use bevy::math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::shared::{Biome, MAX_MAP_EDGE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub biome: Biome,
    /// Vertices as `[x, y]` pairs, in tile units.
    pub polygon: Vec<[f32; 2]>,
}

impl RegionDef {
    pub fn contains(&self, point: Vec2) -> bool {
        point_in_polygon(point, &self.polygon)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionMap {
    pub regions: Vec<RegionDef>,
}

/// Even-odd rule. A point on a bottom edge counts as inside and one on a
/// top edge as outside, so neighbours sharing an edge never both claim it.
pub fn point_in_polygon(point: Vec2, polygon: &[[f32; 2]]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let (x, y) = (point.x, point.y);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = polygon[i];
        let [xj, yj] = polygon[j];
        if (yi > y) != (yj > y) {
            let cross_x = xi + (y - yi) * (xj - xi) / (yj - yi);
            if x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

impl RegionMap {
    pub fn from_json(json: &str) -> Result<Self, String> {
        let map: RegionMap =
            serde_json::from_str(json).map_err(|e| format!("Region file parse failed: {}", e))?;
        for region in &map.regions {
            if region.polygon.len() < 3 {
                return Err(format!(
                    "Region '{}' has {} vertices, need at least 3",
                    region.id,
                    region.polygon.len()
                ));
            }
            if region.polygon.iter().flatten().any(|v| !v.is_finite()) {
                return Err(format!("Region '{}' has a non-finite vertex", region.id));
            }
        }
        Ok(map)
    }

    pub fn region_at(&self, point: Vec2) -> Option<&RegionDef> {
        self.regions.iter().find(|r| r.contains(point))
    }

    /// Bounding box of every vertex, or `None` when there are no regions.
    pub fn bounds(&self) -> Option<Rect> {
        let mut it = self.regions.iter().flat_map(|r| r.polygon.iter());
        let [x, y] = *it.next()?;
        let mut rect = Rect::new(x, y, x, y);
        for &[x, y] in it {
            rect = rect.union_point(Vec2::new(x, y));
        }
        Some(rect)
    }

    /// Paint a grid by testing each tile center. Open sea fills the gaps.
    pub fn rasterize(&self, width: usize, height: usize) -> Vec<Biome> {
        let cells = width.saturating_mul(height).min(MAX_MAP_EDGE * MAX_MAP_EDGE);
        let mut tiles = Vec::with_capacity(cells);
        for y in 0..height {
            for x in 0..width {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                tiles.push(
                    self.region_at(center)
                        .map(|r| r.biome)
                        .unwrap_or(Biome::DeepWater),
                );
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<[f32; 2]> {
        vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    #[test]
    fn test_point_in_square() {
        let sq = square(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_polygon(Vec2::new(5.0, 5.0), &sq));
        assert!(!point_in_polygon(Vec2::new(-1.0, 5.0), &sq));
        assert!(!point_in_polygon(Vec2::new(5.0, 11.0), &sq));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        // A "U" shape opening upward: the notch (4..6, 4..10) is outside.
        let u = vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [6.0, 10.0],
            [6.0, 4.0],
            [4.0, 4.0],
            [4.0, 10.0],
            [0.0, 10.0],
        ];
        assert!(point_in_polygon(Vec2::new(2.0, 8.0), &u));
        assert!(point_in_polygon(Vec2::new(8.0, 8.0), &u));
        assert!(point_in_polygon(Vec2::new(5.0, 2.0), &u));
        assert!(!point_in_polygon(Vec2::new(5.0, 8.0), &u));
    }

    #[test]
    fn test_shared_edge_claimed_once() {
        let lower = square(0.0, 0.0, 10.0, 5.0);
        let upper = square(0.0, 5.0, 10.0, 10.0);
        let p = Vec2::new(3.0, 5.0);
        let hits = [&lower, &upper]
            .iter()
            .filter(|poly| point_in_polygon(p, poly))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        assert!(!point_in_polygon(Vec2::ZERO, &[[0.0, 0.0], [1.0, 1.0]]));
    }

    #[test]
    fn test_from_json_and_lookup_order() {
        let json = r#"{
            "regions": [
                { "id": "lake", "name": "Mirror Lake", "biome": "ShallowWater",
                  "polygon": [[2, 2], [4, 2], [4, 4], [2, 4]] },
                { "id": "vale", "name": "Green Vale", "biome": "Grassland",
                  "polygon": [[0, 0], [8, 0], [8, 8], [0, 8]] }
            ]
        }"#;
        let map = RegionMap::from_json(json).unwrap();
        assert_eq!(map.region_at(Vec2::new(3.0, 3.0)).unwrap().id, "lake");
        assert_eq!(map.region_at(Vec2::new(6.0, 6.0)).unwrap().id, "vale");
        assert!(map.region_at(Vec2::new(9.0, 9.0)).is_none());

        let tiles = map.rasterize(10, 10);
        assert_eq!(tiles[3 * 10 + 3], Biome::ShallowWater);
        assert_eq!(tiles[6 * 10 + 6], Biome::Grassland);
        assert_eq!(tiles[9 * 10 + 9], Biome::DeepWater);

        let b = map.bounds().unwrap();
        assert_eq!(b.min, Vec2::ZERO);
        assert_eq!(b.max, Vec2::new(8.0, 8.0));
    }

    #[test]
    fn test_from_json_rejects_short_polygon() {
        let json = r#"{ "regions": [ { "id": "x", "name": "X", "polygon": [[0, 0], [1, 1]] } ] }"#;
        let err = RegionMap::from_json(json).unwrap_err();
        assert!(err.contains("at least 3"), "{err}");
    }

    #[test]
    fn test_from_json_reports_parse_error() {
        let err = RegionMap::from_json("{ not json").unwrap_err();
        assert!(err.starts_with("Region file parse failed"), "{err}");
    }
}
