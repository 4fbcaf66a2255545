use bevy::prelude::*;

use crate::shared::*;
use crate::viewport::Viewport;
use crate::world::TerrainChunk;

/// Marker for the debug overlay root node.
#[derive(Component)]
pub struct DebugOverlayRoot;

/// Marker for the debug text.
#[derive(Component)]
pub struct DebugOverlayText;

/// Spawn the debug overlay UI (hidden until F3).
pub fn spawn_debug_overlay(mut commands: Commands, existing: Query<Entity, With<DebugOverlayRoot>>) {
    if !existing.is_empty() {
        return;
    }
    commands
        .spawn((
            DebugOverlayRoot,
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(8.0),
                top: Val::Px(44.0),
                padding: UiRect::all(Val::Px(4.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
            GlobalZIndex(15),
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((
                DebugOverlayText,
                Text::new("Debug"),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.0, 1.0, 0.0)),
            ));
        });
}

pub fn debug_lines(viewport: &Viewport, grid: &TileGrid, visible_chunks: usize, total_chunks: usize) -> Vec<String> {
    let rect = viewport.source_rect();
    let mut lines = vec![
        format!("Center: ({:.2}, {:.2})", viewport.center.x, viewport.center.y),
        format!(
            "Zoom: {:.2} px/tile [{:.0}..{:.0}]",
            viewport.zoom, viewport.min_zoom, viewport.max_zoom
        ),
        format!(
            "Source: ({:.1}, {:.1}) - ({:.1}, {:.1})",
            rect.min.x, rect.min.y, rect.max.x, rect.max.y
        ),
        format!("Chunks: {}/{} visible", visible_chunks, total_chunks),
        format!("Grid: {}x{} {:?}", grid.width, grid.height, grid.source),
    ];
    match grid.seed {
        Some(seed) => lines.push(format!("Seed: {}", seed)),
        None => lines.push("Seed: -".to_string()),
    }
    lines
}

/// Update debug overlay content and visibility.
pub fn update_debug_overlay(
    overlays: Res<OverlaySettings>,
    viewport: Res<Viewport>,
    grid: Res<TileGrid>,
    mut moves: EventReader<PlayerMovedEvent>,
    mut last_move: Local<Option<PlayerMovedEvent>>,
    chunk_query: Query<&Visibility, (With<TerrainChunk>, Without<DebugOverlayRoot>)>,
    mut overlay_query: Query<&mut Visibility, With<DebugOverlayRoot>>,
    mut text_query: Query<&mut Text, With<DebugOverlayText>>,
) {
    if let Some(ev) = moves.read().last() {
        *last_move = Some(ev.clone());
    }

    let Ok(mut vis) = overlay_query.get_single_mut() else {
        return;
    };

    if !overlays.show_debug {
        *vis = Visibility::Hidden;
        return;
    }
    *vis = Visibility::Inherited;

    let Ok(mut text) = text_query.get_single_mut() else {
        return;
    };

    let total = chunk_query.iter().count();
    let visible = chunk_query
        .iter()
        .filter(|v| **v != Visibility::Hidden)
        .count();
    let mut lines = debug_lines(&viewport, &grid, visible, total);
    if let Some(ev) = last_move.as_ref() {
        lines.push(format!(
            "Last step: ({}, {}) -> ({}, {})",
            ev.from.x, ev.from.y, ev.to.x, ev.to.y
        ));
    }
    **text = lines.join("\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_lines_report_seed_and_chunks() {
        let mut grid = TileGrid::new(4, 4, vec![Biome::Grassland; 16], MapSourceKind::Procedural);
        grid.seed = Some(42);
        let mut viewport = Viewport::new(Vec2::new(960.0, 540.0), 24.0, 4.0, 96.0);
        viewport.center = Vec2::new(2.0, 2.0);
        let lines = debug_lines(&viewport, &grid, 1, 4);
        assert!(lines.iter().any(|l| l == "Chunks: 1/4 visible"));
        assert_eq!(lines.last().map(String::as_str), Some("Seed: 42"));
    }
}
