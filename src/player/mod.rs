mod camera;
mod movement;
mod spawn;
mod tracking;

use bevy::prelude::*;
use crate::shared::*;
use crate::viewport::Viewport;

pub use camera::{
    apply_zoom, camera_follow_player, sync_camera_transform, track_window_size, FollowHold,
    FOLLOW_HOLD_SECS,
};
pub use movement::{
    handle_teleport, player_movement, reposition_on_rebuild, step_target, step_toward,
    sync_player_transform,
};
pub use spawn::{initial_spawn, spawn_player};
pub use tracking::track_current_region;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        // -- Local resources --
        app.init_resource::<Viewport>()
            .init_resource::<FollowHold>();

        // -- Spawn player when we enter Exploring (guarded against unpause) --
        app.add_systems(OnEnter(ExplorerState::Exploring), spawn::spawn_player);

        // -- Systems that run every frame while Exploring --
        app.add_systems(
            Update,
            (
                movement::player_movement,
                movement::handle_teleport.after(movement::player_movement),
                camera::apply_zoom,
            )
                .run_if(in_state(ExplorerState::Exploring)),
        );

        // -- Grid rebuilds, tracking and camera run while paused too --
        app.add_systems(
            Update,
            (
                movement::reposition_on_rebuild,
                tracking::track_current_region,
                movement::sync_player_transform,
                camera::track_window_size,
                camera::camera_follow_player,
                camera::sync_camera_transform,
            )
                .chain()
                .after(movement::handle_teleport)
                .after(camera::apply_zoom)
                .run_if(in_state(ExplorerState::Exploring).or(in_state(ExplorerState::Paused))),
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Local components (player-domain only)
// ═══════════════════════════════════════════════════════════════════════════

/// Held-key repeat for tile stepping, also paces click-to-walk.
#[derive(Component, Debug)]
pub struct MoveRepeat {
    pub timer: Timer,
}

impl MoveRepeat {
    /// Never below 10ms so a zero config cannot spin.
    pub fn from_secs(secs: f32) -> Self {
        Self {
            timer: Timer::from_seconds(secs.max(0.01), TimerMode::Repeating),
        }
    }
}

impl Default for MoveRepeat {
    fn default() -> Self {
        Self::from_secs(0.12)
    }
}
