mod shared;
mod config;
mod input;
mod terrain;
mod viewport;
mod player;
mod world;
mod ui;
mod bridge;

use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};

use shared::*;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Wayfarer".into(),
                        resolution: WindowResolution::new(SCREEN_WIDTH, SCREEN_HEIGHT),
                        present_mode: PresentMode::AutoVsync,
                        resizable: true,
                        // Let the host page size the canvas on wasm.
                        fit_canvas_to_parent: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        .insert_resource(ClearColor(Color::srgb(0.06, 0.07, 0.1)))
        // Explorer state
        .init_state::<ExplorerState>()
        // Shared resources
        .init_resource::<OverlaySettings>()
        .init_resource::<CurrentRegion>()
        // Events
        .add_event::<PlayerMovedEvent>()
        .add_event::<RegionEnteredEvent>()
        .add_event::<RegionSelectedEvent>()
        .add_event::<GridRebuiltEvent>()
        .add_event::<TeleportEvent>()
        // Domain plugins
        .add_plugins(config::ConfigPlugin)
        .add_plugins(input::InputPlugin)
        .add_plugins(terrain::TerrainPlugin)
        .add_plugins(player::PlayerPlugin)
        .add_plugins(world::WorldPlugin)
        .add_plugins(ui::UiPlugin)
        .add_plugins(bridge::BridgePlugin)
        // Camera
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
