use bevy::prelude::*;

use crate::shared::*;

/// Fire `RegionEnteredEvent` whenever the region under the player changes.
pub fn track_current_region(
    grid: Res<TileGrid>,
    player_query: Query<&GridPosition, With<Player>>,
    mut current: ResMut<CurrentRegion>,
    mut entered: EventWriter<RegionEnteredEvent>,
) {
    let Ok(pos) = player_query.get_single() else {
        return;
    };

    let region = grid
        .regions
        .as_ref()
        .and_then(|map| map.region_at(pos.center()));
    let next = CurrentRegion {
        id: region.map(|r| r.id.clone()),
        name: region.map(|r| r.name.clone()),
    };

    if *current != next {
        info!("[Player] Region: {:?} -> {:?}", current.name, next.name);
        entered.send(RegionEnteredEvent {
            region: next.name.clone(),
        });
        *current = next;
    }
}
