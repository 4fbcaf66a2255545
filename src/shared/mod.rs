//! Shared components, resources, events, and states for Wayfarer.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain directly, except for the pure
//! math in `viewport` and the terrain helpers.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::terrain::regions::RegionMap;

// ═══════════════════════════════════════════════════════════════════════
// EXPLORER STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum ExplorerState {
    #[default]
    Loading,
    Generating,
    Exploring,
    Paused,
}

// ═══════════════════════════════════════════════════════════════════════
// BIOMES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Biome {
    DeepWater,
    ShallowWater,
    Beach,
    Grassland,
    Forest,
    Jungle,
    Savanna,
    Desert,
    Swamp,
    Tundra,
    Snow,
    Mountain,
    #[default]
    Unknown,
}

impl Biome {
    /// Every biome that has a real color on the map (excludes `Unknown`).
    pub const PALETTE: [Biome; 12] = [
        Biome::DeepWater,
        Biome::ShallowWater,
        Biome::Beach,
        Biome::Grassland,
        Biome::Forest,
        Biome::Jungle,
        Biome::Savanna,
        Biome::Desert,
        Biome::Swamp,
        Biome::Tundra,
        Biome::Snow,
        Biome::Mountain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Biome::DeepWater => "Deep Water",
            Biome::ShallowWater => "Shallows",
            Biome::Beach => "Beach",
            Biome::Grassland => "Grassland",
            Biome::Forest => "Forest",
            Biome::Jungle => "Jungle",
            Biome::Savanna => "Savanna",
            Biome::Desert => "Desert",
            Biome::Swamp => "Swamp",
            Biome::Tundra => "Tundra",
            Biome::Snow => "Snow",
            Biome::Mountain => "Mountain",
            Biome::Unknown => "Unknown",
        }
    }

    /// RGBA used by chunk textures and the minimap.
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Biome::DeepWater    => [28, 58, 128, 255],
            Biome::ShallowWater => [58, 110, 186, 255],
            Biome::Beach        => [222, 206, 150, 255],
            Biome::Grassland    => [110, 170, 72, 255],
            Biome::Forest       => [48, 112, 52, 255],
            Biome::Jungle       => [26, 90, 40, 255],
            Biome::Savanna      => [176, 168, 86, 255],
            Biome::Desert       => [232, 196, 120, 255],
            Biome::Swamp        => [78, 96, 62, 255],
            Biome::Tundra       => [150, 160, 140, 255],
            Biome::Snow         => [240, 244, 250, 255],
            Biome::Mountain     => [120, 112, 106, 255],
            Biome::Unknown      => [20, 22, 28, 255],
        }
    }

    pub fn walkable(self) -> bool {
        !matches!(self, Biome::DeepWater | Biome::Unknown)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// TILE GRID
// ═══════════════════════════════════════════════════════════════════════

/// Which kind of source produced the current grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MapSourceKind {
    #[default]
    Procedural,
    Image,
    Regions,
}

/// The discretized map. Row-major, row 0 is the bottom row (world +Y is up).
#[derive(Resource, Debug, Clone, Default)]
pub struct TileGrid {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<Biome>,
    pub source: MapSourceKind,
    /// Seed that produced the grid (procedural source or image fallback).
    pub seed: Option<u64>,
    /// Polygon regions, present only for the region source.
    pub regions: Option<RegionMap>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, tiles: Vec<Biome>, source: MapSourceKind) -> Self {
        debug_assert_eq!(tiles.len(), width * height);
        Self {
            width,
            height,
            tiles,
            source,
            seed: None,
            regions: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    pub fn get(&self, x: i32, y: i32) -> Biome {
        if self.in_bounds(x, y) {
            self.tiles[y as usize * self.width + x as usize]
        } else {
            Biome::Unknown
        }
    }

    pub fn set(&mut self, x: i32, y: i32, biome: Biome) {
        if self.in_bounds(x, y) {
            self.tiles[y as usize * self.width + x as usize] = biome;
        }
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.get(x, y).walkable()
    }

    /// Clamp a coordinate into the grid. Returns (0, 0) for an empty grid.
    pub fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        if self.is_empty() {
            return (0, 0);
        }
        (
            x.clamp(0, self.width as i32 - 1),
            y.clamp(0, self.height as i32 - 1),
        )
    }

    /// Name of the polygon region containing the center of tile (x, y).
    pub fn region_name_at(&self, x: i32, y: i32) -> Option<&str> {
        let regions = self.regions.as_ref()?;
        let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        regions.region_at(center).map(|r| r.name.as_str())
    }

    /// Find the walkable tile closest to (x, y), searching outward ring by ring.
    pub fn nearest_walkable(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        if self.is_empty() {
            return None;
        }
        let (cx, cy) = self.clamp(x, y);
        if self.is_walkable(cx, cy) {
            return Some((cx, cy));
        }
        let max_radius = self.width.max(self.height) as i32;
        for r in 1..=max_radius {
            let mut best: Option<((i32, i32), i32)> = None;
            for dy in -r..=r {
                for dx in -r..=r {
                    // Ring only
                    if dx.abs() != r && dy.abs() != r {
                        continue;
                    }
                    let (nx, ny) = (cx + dx, cy + dy);
                    if !self.is_walkable(nx, ny) {
                        continue;
                    }
                    let d = dx * dx + dy * dy;
                    if best.map_or(true, |(_, bd)| d < bd) {
                        best = Some(((nx, ny), d));
                    }
                }
            }
            if let Some((pos, _)) = best {
                return Some(pos);
            }
        }
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLAYER
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component, Debug, Default)]
pub struct Player;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World-space center of this tile, in tile units.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

/// Pointer-driven walk target. Cleared on arrival, block, or keyboard input.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct WalkTarget(pub Option<GridPosition>);

// ═══════════════════════════════════════════════════════════════════════
// INPUT
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone)]
pub struct KeyBindings {
    pub move_up: KeyCode,
    pub move_down: KeyCode,
    pub move_left: KeyCode,
    pub move_right: KeyCode,
    pub zoom_in: KeyCode,
    pub zoom_out: KeyCode,
    pub zoom_reset: KeyCode,
    pub toggle_minimap: KeyCode,
    pub toggle_grid: KeyCode,
    pub toggle_debug: KeyCode,
    pub select_region: KeyCode,
    pub reroll: KeyCode,
    pub pause: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_up: KeyCode::KeyW,
            move_down: KeyCode::KeyS,
            move_left: KeyCode::KeyA,
            move_right: KeyCode::KeyD,
            zoom_in: KeyCode::Equal,
            zoom_out: KeyCode::Minus,
            zoom_reset: KeyCode::Digit0,
            toggle_minimap: KeyCode::KeyM,
            toggle_grid: KeyCode::KeyG,
            toggle_debug: KeyCode::F3,
            select_region: KeyCode::Enter,
            reroll: KeyCode::KeyR,
            pause: KeyCode::Escape,
        }
    }
}

/// Per-frame action snapshot. Reset and refilled in PreUpdate.
#[derive(Resource, Debug, Clone, Default)]
pub struct ExplorerInput {
    /// Held direction, each axis in -1..=1. +Y is up.
    pub move_axis: IVec2,
    /// True on the frame any direction key went down.
    pub move_just_pressed: bool,
    /// Signed zoom steps this frame (wheel notches and +/- keys).
    pub zoom_steps: f32,
    /// The wheel moved this frame, so zoom about the cursor.
    pub zoom_at_cursor: bool,
    pub zoom_reset: bool,
    /// Cursor position in window coordinates (top-left origin).
    pub cursor_screen: Option<Vec2>,
    /// Window position of a left click this frame.
    pub click_screen: Option<Vec2>,
    pub toggle_minimap: bool,
    pub toggle_grid: bool,
    pub toggle_debug: bool,
    pub select_region: bool,
    pub reroll: bool,
    pub pause: bool,
}

// ═══════════════════════════════════════════════════════════════════════
// DISPLAY TOGGLES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone)]
pub struct OverlaySettings {
    pub show_minimap: bool,
    pub show_chunk_grid: bool,
    pub show_debug: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            show_minimap: true,
            show_chunk_grid: false,
            show_debug: false,
        }
    }
}

/// Screen rectangle (top-left origin) of the minimap while it is shown.
/// Pointer clicks inside it belong to the minimap, not the map.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct MinimapRect(pub Option<Rect>);

/// The region currently under the player, tracked for HUD and bridge.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct CurrentRegion {
    pub id: Option<String>,
    pub name: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone)]
pub struct PlayerMovedEvent {
    pub from: GridPosition,
    pub to: GridPosition,
}

#[derive(Event, Debug, Clone)]
pub struct RegionEnteredEvent {
    pub region: Option<String>,
}

/// Payload sent to the host when the player confirms a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSelection {
    pub region_id: String,
    pub region_name: String,
    pub biome: Biome,
    pub tile: (i32, i32),
}

#[derive(Event, Debug, Clone)]
pub struct RegionSelectedEvent {
    pub selection: RegionSelection,
}

#[derive(Event, Debug, Clone)]
pub struct GridRebuiltEvent {
    pub width: usize,
    pub height: usize,
    pub source: MapSourceKind,
}

/// Move the player to a tile directly (minimap clicks).
#[derive(Event, Debug, Clone)]
pub struct TeleportEvent {
    pub x: i32,
    pub y: i32,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

/// World units per tile.
pub const TILE_PIXELS: f32 = 16.0;
pub const SCREEN_WIDTH: f32 = 960.0;
pub const SCREEN_HEIGHT: f32 = 540.0;

/// Screen pixels per tile.
pub const DEFAULT_ZOOM: f32 = 24.0;
pub const MIN_ZOOM: f32 = 4.0;
pub const MAX_ZOOM: f32 = 96.0;
pub const ZOOM_STEP: f32 = 1.15;

/// Largest map edge in tiles, for every source.
pub const MAX_MAP_EDGE: usize = 4096;

/// Tiles per chunk edge.
pub const CHUNK_SIZE: u32 = 16;

pub const Z_TERRAIN: f32 = 0.0;
pub const Z_CHUNK_GRID: f32 = 5.0;
pub const Z_PLAYER: f32 = 10.0;
