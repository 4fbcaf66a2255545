//! World domain plugin for Wayfarer.
//!
//! Responsible for:
//! - Rendering the tile grid as chunk textures (one texel per tile,
//!   nearest sampling)
//! - Rebuilding chunks whenever the grid is rebuilt
//! - Hiding chunks outside the viewport
//! - The optional chunk-grid overlay

use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::config::ExplorerConfig;
use crate::shared::*;
use crate::viewport::Viewport;

pub mod chunk_grid;

use chunk_grid::{spawn_chunk_grid, update_chunk_grid_visibility, ChunkGridLine};

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, rebuild_chunks_on_grid_change).add_systems(
            Update,
            (cull_chunks, update_chunk_grid_visibility)
                .after(rebuild_chunks_on_grid_change)
                .run_if(in_state(ExplorerState::Exploring).or(in_state(ExplorerState::Paused))),
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

/// One square block of tiles drawn as a single sprite.
#[derive(Component, Debug, Clone, Copy)]
pub struct TerrainChunk {
    pub cx: u32,
    pub cy: u32,
    pub size: u32,
}

impl TerrainChunk {
    /// Tile range `[min, max)` covered by this chunk.
    pub fn tile_range(&self) -> (IVec2, IVec2) {
        let min = IVec2::new((self.cx * self.size) as i32, (self.cy * self.size) as i32);
        (min, min + IVec2::splat(self.size as i32))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PAINTING
// ═══════════════════════════════════════════════════════════════════════

/// Number of chunks along each axis needed to cover the grid.
pub fn chunk_counts(grid_w: usize, grid_h: usize, chunk_size: u32) -> (u32, u32) {
    let cs = chunk_size.max(1) as usize;
    (grid_w.div_ceil(cs) as u32, grid_h.div_ceil(cs) as u32)
}

/// RGBA texels for chunk (cx, cy). Texture row 0 is the top of the chunk.
/// Tiles past the grid edge are transparent.
pub fn paint_chunk(grid: &TileGrid, cx: u32, cy: u32, chunk_size: u32) -> Vec<u8> {
    let cs = chunk_size as usize;
    let mut data = vec![0u8; cs * cs * 4];
    for row in 0..cs {
        let ty = (cy as usize * cs + (cs - 1 - row)) as i32;
        for col in 0..cs {
            let tx = (cx as usize * cs + col) as i32;
            if !grid.in_bounds(tx, ty) {
                continue;
            }
            let offset = (row * cs + col) * 4;
            data[offset..offset + 4].copy_from_slice(&grid.get(tx, ty).rgba());
        }
    }
    data
}

fn chunk_image(grid: &TileGrid, cx: u32, cy: u32, chunk_size: u32) -> Image {
    let size = Extent3d {
        width: chunk_size,
        height: chunk_size,
        depth_or_array_layers: 1,
    };
    let mut image = Image::new(
        size,
        TextureDimension::D2,
        paint_chunk(grid, cx, cy, chunk_size),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    );
    image.sampler = bevy::image::ImageSampler::nearest();
    image
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Despawn every chunk and grid line and spawn fresh ones for the new grid.
pub fn rebuild_chunks_on_grid_change(
    mut commands: Commands,
    mut events: EventReader<GridRebuiltEvent>,
    grid: Res<TileGrid>,
    config: Option<Res<ExplorerConfig>>,
    images: Option<ResMut<Assets<Image>>>,
    chunk_query: Query<(Entity, &Sprite), With<TerrainChunk>>,
    line_query: Query<Entity, With<ChunkGridLine>>,
) {
    if events.read().last().is_none() {
        return;
    }
    let Some(mut images) = images else {
        return;
    };

    for (entity, sprite) in &chunk_query {
        images.remove(&sprite.image);
        commands.entity(entity).despawn();
    }
    for entity in &line_query {
        commands.entity(entity).despawn();
    }

    if grid.is_empty() {
        return;
    }

    let chunk_size = config.map(|c| c.chunk_size).unwrap_or(CHUNK_SIZE).max(1);
    let (nx, ny) = chunk_counts(grid.width, grid.height, chunk_size);
    let world_size = chunk_size as f32 * TILE_PIXELS;

    for cy in 0..ny {
        for cx in 0..nx {
            let handle = images.add(chunk_image(&grid, cx, cy, chunk_size));
            let center = Vec2::new(cx as f32 + 0.5, cy as f32 + 0.5) * world_size;
            commands.spawn((
                TerrainChunk {
                    cx,
                    cy,
                    size: chunk_size,
                },
                Sprite {
                    image: handle,
                    custom_size: Some(Vec2::splat(world_size)),
                    ..default()
                },
                Transform::from_translation(center.extend(Z_TERRAIN)),
                Visibility::default(),
            ));
        }
    }

    spawn_chunk_grid(&mut commands, &grid, chunk_size);
    info!("[World] Built {} chunks ({}x{})", nx * ny, nx, ny);
}

/// Hide chunks that do not intersect the viewport.
pub fn cull_chunks(
    viewport: Res<Viewport>,
    grid: Res<TileGrid>,
    mut chunk_query: Query<(&TerrainChunk, &mut Visibility)>,
) {
    let (vmin, vmax) = viewport.visible_tile_range(grid.width, grid.height);
    for (chunk, mut vis) in &mut chunk_query {
        let (cmin, cmax) = chunk.tile_range();
        let overlaps = cmin.x < vmax.x && cmax.x > vmin.x && cmin.y < vmax.y && cmax.y > vmin.y;
        let want = if overlaps {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if *vis != want {
            *vis = want;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_3x2() -> TileGrid {
        // Bottom row: sand, forest, snow. Top row: deep water x3.
        let tiles = vec![
            Biome::Beach,
            Biome::Forest,
            Biome::Snow,
            Biome::DeepWater,
            Biome::DeepWater,
            Biome::DeepWater,
        ];
        TileGrid::new(3, 2, tiles, MapSourceKind::Procedural)
    }

    #[test]
    fn test_chunk_counts_round_up() {
        assert_eq!(chunk_counts(3, 2, 2), (2, 1));
        assert_eq!(chunk_counts(32, 32, 16), (2, 2));
        assert_eq!(chunk_counts(0, 0, 16), (0, 0));
    }

    #[test]
    fn test_paint_chunk_flips_rows_and_clears_outside() {
        let grid = grid_3x2();
        let px = paint_chunk(&grid, 0, 0, 2);
        // Row 0 is the top of the chunk: tiles (0, 1), (1, 1).
        assert_eq!(&px[0..4], &Biome::DeepWater.rgba());
        assert_eq!(&px[4..8], &Biome::DeepWater.rgba());
        // Row 1 is the bottom: tiles (0, 0), (1, 0).
        assert_eq!(&px[8..12], &Biome::Beach.rgba());
        assert_eq!(&px[12..16], &Biome::Forest.rgba());

        // Second chunk column only has x == 2 inside the grid.
        let px = paint_chunk(&grid, 1, 0, 2);
        assert_eq!(&px[8..12], &Biome::Snow.rgba());
        assert_eq!(&px[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_chunk_tile_range() {
        let chunk = TerrainChunk { cx: 2, cy: 1, size: 16 };
        assert_eq!(chunk.tile_range(), (IVec2::new(32, 16), IVec2::new(48, 32)));
    }
}
