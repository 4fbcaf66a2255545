//! Camera/viewport transform.
//!
//! World space is measured in tiles with +Y up; tile (x, y) covers
//! `[x, x+1) × [y, y+1)`. Screen space is window pixels with the origin at
//! the top-left and +Y down, matching `Window::cursor_position`.
//!
//! All of this is plain arithmetic so it can be tested without an App.

use bevy::prelude::*;

use crate::shared::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, SCREEN_HEIGHT, SCREEN_WIDTH};

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// World point shown at the middle of the screen.
    pub center: Vec2,
    /// Screen pixels per tile.
    pub zoom: f32,
    /// Window size in logical pixels.
    pub screen: Vec2,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: DEFAULT_ZOOM,
            screen: Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Viewport {
    pub fn new(screen: Vec2, zoom: f32, min_zoom: f32, max_zoom: f32) -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: zoom.clamp(min_zoom, max_zoom),
            screen,
            min_zoom,
            max_zoom,
        }
    }

    /// How many tiles fit on screen along each axis.
    pub fn visible_tiles(&self) -> Vec2 {
        self.screen / self.zoom
    }

    /// Tile-space rectangle currently shown.
    pub fn source_rect(&self) -> Rect {
        Rect::from_center_size(self.center, self.visible_tiles())
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let rel = (world - self.center) * self.zoom;
        Vec2::new(self.screen.x * 0.5 + rel.x, self.screen.y * 0.5 - rel.y)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let rel = Vec2::new(screen.x - self.screen.x * 0.5, self.screen.y * 0.5 - screen.y);
        self.center + rel / self.zoom
    }

    pub fn screen_to_tile(&self, screen: Vec2) -> IVec2 {
        self.screen_to_world(screen).floor().as_ivec2()
    }

    /// Clamp a desired center so the source rectangle stays inside a
    /// `grid_w × grid_h` map. On an axis where the map is smaller than the
    /// view, the map is centered instead.
    pub fn clamp_center(&self, center: Vec2, grid_w: usize, grid_h: usize) -> Vec2 {
        let half = self.visible_tiles() * 0.5;
        Vec2::new(
            clamp_axis(center.x, half.x, grid_w as f32),
            clamp_axis(center.y, half.y, grid_h as f32),
        )
    }

    pub fn set_center_clamped(&mut self, center: Vec2, grid_w: usize, grid_h: usize) {
        self.center = self.clamp_center(center, grid_w, grid_h);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.set_zoom(self.zoom * factor);
    }

    /// Zoom so the world point under `anchor` (screen pixels) stays put.
    pub fn zoom_at(&mut self, factor: f32, anchor: Vec2) {
        let before = self.screen_to_world(anchor);
        self.zoom_by(factor);
        let after = self.screen_to_world(anchor);
        self.center += before - after;
    }

    /// Tiles intersecting the view, as `[min, max)` clipped to the grid.
    pub fn visible_tile_range(&self, grid_w: usize, grid_h: usize) -> (IVec2, IVec2) {
        let rect = self.source_rect();
        let min = rect.min.floor().as_ivec2().max(IVec2::ZERO);
        let max = rect
            .max
            .ceil()
            .as_ivec2()
            .min(IVec2::new(grid_w as i32, grid_h as i32));
        (min, max.max(min))
    }

    /// Orthographic projection scale for a camera whose world unit is one
    /// source pixel (`tile_pixels` per tile).
    pub fn projection_scale(&self, tile_pixels: f32) -> f32 {
        tile_pixels / self.zoom
    }
}

fn clamp_axis(value: f32, half_view: f32, extent: f32) -> f32 {
    if extent <= half_view * 2.0 {
        extent * 0.5
    } else {
        value.clamp(half_view, extent - half_view)
    }
}

/// Exponential approach used by the camera follow. `rate` of zero snaps.
pub fn follow_step(current: Vec2, target: Vec2, rate: f32, dt: f32, snap_distance: f32) -> Vec2 {
    if rate <= 0.0 || current.distance(target) > snap_distance {
        return target;
    }
    let t = (rate * dt).min(1.0);
    current + (target - current) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        let mut v = Viewport::new(Vec2::new(800.0, 600.0), 20.0, 4.0, 96.0);
        v.center = Vec2::new(50.0, 50.0);
        v
    }

    #[test]
    fn test_center_maps_to_screen_middle() {
        let v = vp();
        assert_eq!(v.world_to_screen(v.center), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_screen_y_points_down() {
        let v = vp();
        let above = v.world_to_screen(Vec2::new(50.0, 51.0));
        assert!(above.y < 300.0, "world +Y should move up the screen: {above:?}");
    }

    #[test]
    fn test_screen_world_inverse() {
        let v = vp();
        for p in [Vec2::new(0.0, 0.0), Vec2::new(37.25, 61.5), Vec2::new(99.0, 1.0)] {
            let back = v.screen_to_world(v.world_to_screen(p));
            assert!((back - p).length() < 1e-3, "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn test_screen_to_tile_floors() {
        let v = vp();
        // One pixel right and one up of the middle lands in tile (50, 50).
        assert_eq!(v.screen_to_tile(Vec2::new(401.0, 299.0)), IVec2::new(50, 50));
        // One pixel left and one down of the middle lands in tile (49, 49).
        assert_eq!(v.screen_to_tile(Vec2::new(399.0, 301.0)), IVec2::new(49, 49));
    }

    #[test]
    fn test_source_rect_size_follows_zoom() {
        let v = vp();
        let r = v.source_rect();
        assert_eq!(r.size(), Vec2::new(40.0, 30.0));
        assert_eq!(r.center(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_clamp_center_keeps_rect_inside_map() {
        let v = vp();
        // View is 40x30 tiles; map 100x80.
        let c = v.clamp_center(Vec2::new(-5.0, 500.0), 100, 80);
        assert_eq!(c, Vec2::new(20.0, 65.0));
        let mut moved = v;
        moved.center = c;
        let r = moved.source_rect();
        assert!(r.min.x >= 0.0 && r.min.y >= 0.0);
        assert!(r.max.x <= 100.0 && r.max.y <= 80.0);
    }

    #[test]
    fn test_clamp_center_centers_small_map() {
        let v = vp();
        let c = v.clamp_center(Vec2::new(3.0, 3.0), 10, 200);
        assert_eq!(c.x, 5.0);
        assert_eq!(c.y, 15.0);
    }

    #[test]
    fn test_zoom_clamped_to_limits() {
        let mut v = vp();
        for _ in 0..100 {
            v.zoom_by(1.5);
        }
        assert_eq!(v.zoom, 96.0);
        for _ in 0..100 {
            v.zoom_by(0.5);
        }
        assert_eq!(v.zoom, 4.0);
        v.set_zoom(f32::NAN);
        assert_eq!(v.zoom, 4.0);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut v = vp();
        let anchor = Vec2::new(700.0, 100.0);
        let before = v.screen_to_world(anchor);
        v.zoom_at(2.0, anchor);
        let after = v.screen_to_world(anchor);
        assert!((before - after).length() < 1e-3);
        assert_eq!(v.zoom, 40.0);
    }

    #[test]
    fn test_visible_tile_range_clipped() {
        let mut v = vp();
        v.center = Vec2::new(5.0, 5.0);
        let (min, max) = v.visible_tile_range(100, 100);
        assert_eq!(min, IVec2::ZERO);
        assert_eq!(max, IVec2::new(25, 20));
    }

    #[test]
    fn test_projection_scale() {
        let v = vp();
        assert_eq!(v.projection_scale(16.0), 0.8);
    }

    #[test]
    fn test_follow_step_snaps_when_far_or_rate_zero() {
        let a = Vec2::ZERO;
        let b = Vec2::new(100.0, 0.0);
        assert_eq!(follow_step(a, b, 5.0, 0.016, 8.0), b);
        assert_eq!(follow_step(a, Vec2::new(1.0, 0.0), 0.0, 0.016, 8.0), Vec2::new(1.0, 0.0));
        let mid = follow_step(a, Vec2::new(2.0, 0.0), 5.0, 0.1, 8.0);
        assert!((mid.x - 1.0).abs() < 1e-5);
    }
}
