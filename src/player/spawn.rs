use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::config::ExplorerConfig;
use crate::shared::*;
use crate::viewport::Viewport;
use super::MoveRepeat;

/// Where the player starts: the configured tile if given, else the map
/// center, nudged to the nearest walkable tile. Always in bounds.
pub fn initial_spawn(grid: &TileGrid, configured: Option<(i32, i32)>) -> GridPosition {
    let (x, y) = configured.unwrap_or((grid.width as i32 / 2, grid.height as i32 / 2));
    let (x, y) = grid
        .nearest_walkable(x, y)
        .unwrap_or_else(|| grid.clamp(x, y));
    GridPosition::new(x, y)
}

/// Spawn the player token and reset the viewport around it.
/// Runs on `OnEnter(ExplorerState::Exploring)`; no-op when returning from pause.
pub fn spawn_player(
    mut commands: Commands,
    existing: Query<Entity, With<Player>>,
    grid: Res<TileGrid>,
    config: Res<ExplorerConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<Viewport>,
) {
    // Guard: don't double-spawn if returning from Paused.
    if !existing.is_empty() {
        return;
    }

    let pos = initial_spawn(&grid, config.spawn);

    let screen = windows
        .get_single()
        .map(|w| Vec2::new(w.width(), w.height()))
        .unwrap_or(viewport.screen);
    *viewport = Viewport::new(screen, config.zoom, config.min_zoom, config.max_zoom);
    viewport.set_center_clamped(pos.center(), grid.width, grid.height);

    let world = pos.center() * TILE_PIXELS;

    commands.spawn((
        // Tag
        Player,
        pos,
        WalkTarget::default(),
        MoveRepeat::from_secs(config.move_repeat_secs),
        // Placeholder token: a red square with a white core
        Sprite {
            color: Color::srgb(0.85, 0.2, 0.2),
            custom_size: Some(Vec2::splat(TILE_PIXELS * 0.75)),
            ..default()
        },
        Transform::from_translation(world.extend(Z_PLAYER)),
        Visibility::default(),
    ))
    .with_children(|parent| {
        parent.spawn((
            Sprite {
                color: Color::WHITE,
                custom_size: Some(Vec2::splat(TILE_PIXELS * 0.3)),
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, 0.1),
        ));
    });

    info!("[Player] Spawned at ({}, {})", pos.x, pos.y);
}
