use bevy::prelude::*;

use crate::shared::*;
use crate::viewport::Viewport;
use super::MoveRepeat;

/// The tile one step from `pos` in `dir`, or `None` if it is blocked.
///
/// Diagonal steps slide along walls: when the diagonal is blocked the
/// horizontal component is tried, then the vertical.
pub fn step_target(pos: GridPosition, dir: IVec2, grid: &TileGrid) -> Option<GridPosition> {
    let dir = dir.clamp(IVec2::splat(-1), IVec2::ONE);
    if dir == IVec2::ZERO {
        return None;
    }
    let mut candidates = vec![dir];
    if dir.x != 0 && dir.y != 0 {
        candidates.push(IVec2::new(dir.x, 0));
        candidates.push(IVec2::new(0, dir.y));
    }
    candidates
        .into_iter()
        .map(|d| GridPosition::new(pos.x + d.x, pos.y + d.y))
        .find(|p| grid.is_walkable(p.x, p.y))
}

/// One step from `pos` toward `target` along the longer axis first.
/// `None` when already there or both axes are blocked.
pub fn step_toward(pos: GridPosition, target: GridPosition, grid: &TileGrid) -> Option<GridPosition> {
    let delta = IVec2::new(target.x - pos.x, target.y - pos.y);
    if delta == IVec2::ZERO {
        return None;
    }
    let sx = IVec2::new(delta.x.signum(), 0);
    let sy = IVec2::new(0, delta.y.signum());
    let order = if delta.x.abs() >= delta.y.abs() { [sx, sy] } else { [sy, sx] };
    order
        .into_iter()
        .filter(|d| *d != IVec2::ZERO)
        .map(|d| GridPosition::new(pos.x + d.x, pos.y + d.y))
        .find(|p| grid.is_walkable(p.x, p.y))
}

/// Core movement system. Keys step one tile on press and repeat while held;
/// a left click on the map sets a walk target that is followed one tile per
/// repeat interval. Any key movement cancels the walk target.
pub fn player_movement(
    time: Res<Time>,
    input: Res<ExplorerInput>,
    grid: Res<TileGrid>,
    viewport: Res<Viewport>,
    minimap: Res<MinimapRect>,
    mut query: Query<(&mut GridPosition, &mut WalkTarget, &mut MoveRepeat), With<Player>>,
    mut moved: EventWriter<PlayerMovedEvent>,
) {
    let Ok((mut pos, mut walk, mut repeat)) = query.get_single_mut() else {
        return;
    };
    if grid.is_empty() {
        return;
    }

    repeat.timer.tick(time.delta());

    // Pointer: clicks outside the minimap pick a walk target.
    let mut step_now = false;
    if let Some(click) = input.click_screen {
        let on_minimap = minimap.0.is_some_and(|r| r.contains(click));
        if !on_minimap {
            let tile = viewport.screen_to_tile(click);
            let (tx, ty) = grid.clamp(tile.x, tile.y);
            walk.0 = Some(GridPosition::new(tx, ty));
            repeat.timer.reset();
            step_now = true;
        }
    }

    let next = if input.move_axis != IVec2::ZERO {
        walk.0 = None;
        if input.move_just_pressed {
            repeat.timer.reset();
            step_target(*pos, input.move_axis, &grid)
        } else if repeat.timer.just_finished() {
            step_target(*pos, input.move_axis, &grid)
        } else {
            None
        }
    } else if let Some(target) = walk.0 {
        if step_now || repeat.timer.just_finished() {
            let step = step_toward(*pos, target, &grid);
            if step.is_none() {
                // Arrived or blocked
                walk.0 = None;
            }
            step
        } else {
            None
        }
    } else {
        None
    };

    if let Some(next) = next {
        // Walkability implies in-bounds; keep the clamp as the last word.
        let (x, y) = grid.clamp(next.x, next.y);
        let to = GridPosition::new(x, y);
        moved.send(PlayerMovedEvent { from: *pos, to });
        *pos = to;
        if walk.0 == Some(to) {
            walk.0 = None;
        }
    }
}

/// Minimap clicks jump the player straight to a tile.
pub fn handle_teleport(
    mut events: EventReader<TeleportEvent>,
    grid: Res<TileGrid>,
    mut query: Query<(&mut GridPosition, &mut WalkTarget), With<Player>>,
    mut moved: EventWriter<PlayerMovedEvent>,
) {
    let Ok((mut pos, mut walk)) = query.get_single_mut() else {
        events.clear();
        return;
    };
    for ev in events.read() {
        let (x, y) = grid
            .nearest_walkable(ev.x, ev.y)
            .unwrap_or_else(|| grid.clamp(ev.x, ev.y));
        let to = GridPosition::new(x, y);
        if to != *pos {
            moved.send(PlayerMovedEvent { from: *pos, to });
            *pos = to;
        }
        walk.0 = None;
    }
}

/// After a reroll the old position may be off-map or in the sea. The player
/// moves to the closest land, never back to the configured spawn.
pub fn reposition_on_rebuild(
    mut events: EventReader<GridRebuiltEvent>,
    grid: Res<TileGrid>,
    mut query: Query<(&mut GridPosition, &mut WalkTarget), With<Player>>,
) {
    if events.read().last().is_none() {
        return;
    }
    for (mut pos, mut walk) in &mut query {
        let keep = grid.is_walkable(pos.x, pos.y);
        if !keep {
            *pos = super::spawn::initial_spawn(&grid, Some((pos.x, pos.y)));
        }
        walk.0 = None;
    }
}

/// Keep the token sprite on its tile.
pub fn sync_player_transform(
    mut query: Query<(&GridPosition, &mut Transform), (With<Player>, Changed<GridPosition>)>,
) {
    for (pos, mut tf) in &mut query {
        let world = pos.center() * TILE_PIXELS;
        tf.translation.x = world.x;
        tf.translation.y = world.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x3 map, deep water column at x == 2 except a ford at (2, 0).
    fn strait() -> TileGrid {
        let mut tiles = vec![Biome::Grassland; 12];
        tiles[1 * 4 + 2] = Biome::DeepWater;
        tiles[2 * 4 + 2] = Biome::DeepWater;
        TileGrid::new(4, 3, tiles, MapSourceKind::Procedural)
    }

    #[test]
    fn test_step_blocked_by_edge() {
        let grid = strait();
        assert_eq!(step_target(GridPosition::new(0, 0), IVec2::new(-1, 0), &grid), None);
        assert_eq!(step_target(GridPosition::new(3, 2), IVec2::new(0, 1), &grid), None);
    }

    #[test]
    fn test_step_blocked_by_water() {
        let grid = strait();
        assert_eq!(step_target(GridPosition::new(1, 1), IVec2::new(1, 0), &grid), None);
        assert_eq!(
            step_target(GridPosition::new(1, 1), IVec2::new(0, 1), &grid),
            Some(GridPosition::new(1, 2))
        );
    }

    #[test]
    fn test_diagonal_slides_along_wall() {
        let grid = strait();
        // Up-right from (1, 0) hits water at (2, 1); slide right onto the ford.
        assert_eq!(
            step_target(GridPosition::new(1, 0), IVec2::new(1, 1), &grid),
            Some(GridPosition::new(2, 0))
        );
    }

    #[test]
    fn test_step_toward_prefers_long_axis_and_detours() {
        let grid = strait();
        assert_eq!(
            step_toward(GridPosition::new(0, 0), GridPosition::new(3, 1), &grid),
            Some(GridPosition::new(1, 0))
        );
        // From (1, 1) toward (3, 1): x is blocked by water, y delta is zero.
        assert_eq!(step_toward(GridPosition::new(1, 1), GridPosition::new(3, 1), &grid), None);
        assert_eq!(step_toward(GridPosition::new(3, 1), GridPosition::new(3, 1), &grid), None);
    }
}
