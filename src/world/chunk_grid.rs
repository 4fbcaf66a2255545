//! Chunk-grid overlay: thin lines along chunk boundaries, toggled with G.

use bevy::prelude::*;

use crate::shared::*;

/// Line thickness in world units (source pixels).
const LINE_WIDTH: f32 = 1.0;

#[derive(Component, Debug)]
pub struct ChunkGridLine;

/// Positions (in tiles) of the vertical and horizontal boundary lines.
pub fn boundary_positions(grid_w: usize, grid_h: usize, chunk_size: u32) -> (Vec<u32>, Vec<u32>) {
    let cs = chunk_size.max(1) as usize;
    let along = |extent: usize| -> Vec<u32> {
        let mut v: Vec<u32> = (0..=extent).step_by(cs).map(|p| p as u32).collect();
        if v.last().copied() != Some(extent as u32) {
            v.push(extent as u32);
        }
        v
    };
    (along(grid_w), along(grid_h))
}

pub fn spawn_chunk_grid(commands: &mut Commands, grid: &TileGrid, chunk_size: u32) {
    let (xs, ys) = boundary_positions(grid.width, grid.height, chunk_size);
    let map = Vec2::new(grid.width as f32, grid.height as f32) * TILE_PIXELS;
    let color = Color::srgba(1.0, 1.0, 1.0, 0.35);

    for x in xs {
        commands.spawn((
            ChunkGridLine,
            Sprite {
                color,
                custom_size: Some(Vec2::new(LINE_WIDTH, map.y)),
                ..default()
            },
            Transform::from_xyz(x as f32 * TILE_PIXELS, map.y * 0.5, Z_CHUNK_GRID),
            Visibility::Hidden,
        ));
    }
    for y in ys {
        commands.spawn((
            ChunkGridLine,
            Sprite {
                color,
                custom_size: Some(Vec2::new(map.x, LINE_WIDTH)),
                ..default()
            },
            Transform::from_xyz(map.x * 0.5, y as f32 * TILE_PIXELS, Z_CHUNK_GRID),
            Visibility::Hidden,
        ));
    }
}

pub fn update_chunk_grid_visibility(
    overlays: Res<OverlaySettings>,
    mut lines: Query<&mut Visibility, With<ChunkGridLine>>,
) {
    let want = if overlays.show_chunk_grid {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut vis in &mut lines {
        if *vis != want {
            *vis = want;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_include_both_edges() {
        let (xs, ys) = boundary_positions(40, 32, 16);
        assert_eq!(xs, vec![0, 16, 32, 40]);
        assert_eq!(ys, vec![0, 16, 32]);
    }
}
