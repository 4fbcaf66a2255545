use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::shared::*;

/// Pixel-unit wheel deltas (trackpads, browsers) per zoom notch.
const PIXELS_PER_NOTCH: f32 = 100.0;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<KeyBindings>()
            .init_resource::<ExplorerInput>()
            .add_event::<MouseWheel>()
            .add_systems(PreUpdate, reset_and_read_input)
            .add_systems(Update, (toggle_pause, apply_overlay_toggles));
    }
}

/// The single point where hardware input becomes explorer actions.
pub fn reset_and_read_input(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Option<Res<ButtonInput<MouseButton>>>,
    mut wheel: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    bindings: Res<KeyBindings>,
    state: Res<State<ExplorerState>>,
    mut input: ResMut<ExplorerInput>,
) {
    *input = ExplorerInput::default();

    let wheel_steps: f32 = wheel
        .read()
        .map(|ev| match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / PIXELS_PER_NOTCH,
        })
        .sum();

    input.cursor_screen = windows.get_single().ok().and_then(|w| w.cursor_position());

    match state.get() {
        ExplorerState::Loading | ExplorerState::Generating => {}

        ExplorerState::Paused => {
            input.pause = keys.just_pressed(bindings.pause);
        }

        ExplorerState::Exploring => {
            let up = [bindings.move_up, KeyCode::ArrowUp];
            let down = [bindings.move_down, KeyCode::ArrowDown];
            let left = [bindings.move_left, KeyCode::ArrowLeft];
            let right = [bindings.move_right, KeyCode::ArrowRight];

            let mut axis = IVec2::ZERO;
            if keys.any_pressed(up) {
                axis.y += 1;
            }
            if keys.any_pressed(down) {
                axis.y -= 1;
            }
            if keys.any_pressed(left) {
                axis.x -= 1;
            }
            if keys.any_pressed(right) {
                axis.x += 1;
            }
            input.move_axis = axis;
            input.move_just_pressed = keys.any_just_pressed(up)
                || keys.any_just_pressed(down)
                || keys.any_just_pressed(left)
                || keys.any_just_pressed(right);

            let mut steps = wheel_steps;
            if keys.just_pressed(bindings.zoom_in) || keys.just_pressed(KeyCode::NumpadAdd) {
                steps += 1.0;
            }
            if keys.just_pressed(bindings.zoom_out) || keys.just_pressed(KeyCode::NumpadSubtract) {
                steps -= 1.0;
            }
            input.zoom_steps = steps;
            input.zoom_at_cursor = wheel_steps != 0.0;
            input.zoom_reset = keys.just_pressed(bindings.zoom_reset);

            if let Some(mouse) = mouse {
                if mouse.just_pressed(MouseButton::Left) {
                    input.click_screen = input.cursor_screen;
                }
            }

            input.toggle_minimap = keys.just_pressed(bindings.toggle_minimap);
            input.toggle_grid = keys.just_pressed(bindings.toggle_grid);
            input.toggle_debug = keys.just_pressed(bindings.toggle_debug);
            input.select_region = keys.just_pressed(bindings.select_region)
                || keys.just_pressed(KeyCode::NumpadEnter);
            input.reroll = keys.just_pressed(bindings.reroll);
            input.pause = keys.just_pressed(bindings.pause);
        }
    }
}

/// Escape toggles between Exploring and Paused.
pub fn toggle_pause(
    input: Res<ExplorerInput>,
    state: Res<State<ExplorerState>>,
    mut next_state: ResMut<NextState<ExplorerState>>,
) {
    if !input.pause {
        return;
    }
    match state.get() {
        ExplorerState::Exploring => next_state.set(ExplorerState::Paused),
        ExplorerState::Paused => next_state.set(ExplorerState::Exploring),
        _ => {}
    }
}

/// Flip overlay toggles requested this frame.
pub fn apply_overlay_toggles(input: Res<ExplorerInput>, mut overlays: ResMut<OverlaySettings>) {
    if input.toggle_minimap {
        overlays.show_minimap = !overlays.show_minimap;
    }
    if input.toggle_grid {
        overlays.show_chunk_grid = !overlays.show_chunk_grid;
    }
    if input.toggle_debug {
        overlays.show_debug = !overlays.show_debug;
    }
}
