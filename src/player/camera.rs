use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::config::ExplorerConfig;
use crate::shared::*;
use crate::viewport::{follow_step, Viewport};

/// Beyond this many tiles the camera snaps instead of easing (teleports,
/// rerolls).
const SNAP_DISTANCE_TILES: f32 = 8.0;

/// How long a cursor-anchored zoom keeps the view off the player.
pub const FOLLOW_HOLD_SECS: f32 = 0.6;

/// Pauses camera follow after a wheel zoom so the point under the cursor
/// stays put. A player step ends the hold early.
#[derive(Resource, Debug, Default)]
pub struct FollowHold {
    remaining: f32,
}

impl FollowHold {
    pub fn start(&mut self) {
        self.remaining = FOLLOW_HOLD_SECS;
    }

    pub fn release(&mut self) {
        self.remaining = 0.0;
    }

    /// Count down by `dt`; true while the hold still applies.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= dt;
        true
    }
}

/// Keep the viewport's notion of the screen in step with the window.
pub fn track_window_size(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<Viewport>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let size = Vec2::new(window.width(), window.height());
    if size.x > 0.0 && size.y > 0.0 && size != viewport.screen {
        viewport.screen = size;
    }
}

/// Wheel notches zoom about the cursor, +/- keys about the screen middle;
/// `0` restores the configured zoom.
pub fn apply_zoom(
    input: Res<ExplorerInput>,
    config: Res<ExplorerConfig>,
    grid: Res<TileGrid>,
    mut viewport: ResMut<Viewport>,
    mut hold: ResMut<FollowHold>,
) {
    if input.zoom_reset {
        viewport.set_zoom(config.zoom);
        hold.release();
    }
    if input.zoom_steps != 0.0 {
        let factor = config.zoom_step.powf(input.zoom_steps);
        match input.cursor_screen.filter(|_| input.zoom_at_cursor) {
            Some(cursor) => {
                viewport.zoom_at(factor, cursor);
                hold.start();
            }
            None => {
                let middle = viewport.screen * 0.5;
                viewport.zoom_at(factor, middle);
            }
        }
    }
    if input.zoom_reset || input.zoom_steps != 0.0 {
        let center = viewport.center;
        viewport.set_center_clamped(center, grid.width, grid.height);
    }
}

/// Ease the viewport toward the player, clamped to map bounds so the view
/// never shows past the edge.
pub fn camera_follow_player(
    time: Res<Time>,
    config: Res<ExplorerConfig>,
    grid: Res<TileGrid>,
    player_query: Query<Ref<GridPosition>, With<Player>>,
    mut viewport: ResMut<Viewport>,
    mut hold: ResMut<FollowHold>,
) {
    let Ok(pos) = player_query.get_single() else {
        return;
    };
    if pos.is_changed() {
        hold.release();
    }
    if hold.tick(time.delta_secs()) {
        let center = viewport.center;
        viewport.set_center_clamped(center, grid.width, grid.height);
        return;
    }
    let target = viewport.clamp_center(pos.center(), grid.width, grid.height);
    let eased = follow_step(
        viewport.center,
        target,
        config.camera_lerp,
        time.delta_secs(),
        SNAP_DISTANCE_TILES,
    );
    viewport.set_center_clamped(eased, grid.width, grid.height);
}

/// Push the viewport into the 2D camera. One world unit is one source pixel.
pub fn sync_camera_transform(
    viewport: Res<Viewport>,
    mut camera_query: Query<(&mut Transform, &mut OrthographicProjection), With<Camera2d>>,
) {
    let Ok((mut cam_tf, mut projection)) = camera_query.get_single_mut() else {
        return;
    };
    let world = viewport.center * TILE_PIXELS;
    cam_tf.translation.x = world.x;
    cam_tf.translation.y = world.y;
    let scale = viewport.projection_scale(TILE_PIXELS);
    if projection.scale != scale {
        projection.scale = scale;
    }
}
