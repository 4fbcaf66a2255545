pub mod debug_overlay;
pub mod hud;
pub mod minimap;

use bevy::prelude::*;
use crate::shared::*;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MinimapRect>();

        // ─── SPAWN on first entry into Exploring ───
        app.add_systems(
            OnEnter(ExplorerState::Exploring),
            (
                minimap::spawn_minimap,
                hud::spawn_hud,
                debug_overlay::spawn_debug_overlay,
            ),
        );

        // ─── MINIMAP ───
        app.add_systems(
            Update,
            (
                minimap::rebuild_minimap_base,
                minimap::update_minimap,
                minimap::update_minimap_rect,
            )
                .chain()
                .run_if(in_state(ExplorerState::Exploring).or(in_state(ExplorerState::Paused))),
        );
        app.add_systems(
            Update,
            minimap::minimap_click
                .after(minimap::update_minimap_rect)
                .run_if(in_state(ExplorerState::Exploring)),
        );

        // ─── HUD & DEBUG ───
        app.add_systems(
            Update,
            (
                hud::update_location_text,
                hud::update_region_banner,
                hud::update_pause_banner,
                debug_overlay::update_debug_overlay,
            )
                .run_if(in_state(ExplorerState::Exploring).or(in_state(ExplorerState::Paused))),
        );
    }
}
