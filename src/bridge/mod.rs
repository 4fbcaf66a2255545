//! Host bridge: hands the selected region to whatever embeds the explorer,
//! then closes the view.
//!
//! Native builds print one JSON line on stdout; wasm builds post the JSON to
//! the parent frame.

use bevy::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use std::io::Write;

use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// BRIDGE TRAIT
// ═══════════════════════════════════════════════════════════════════════

pub trait HostBridge: Send + Sync {
    fn send(&mut self, payload: &str) -> Result<(), String>;
    fn close(&mut self);
}

/// The active bridge. Replace it before startup to capture payloads.
#[derive(Resource)]
pub struct Bridge(pub Box<dyn HostBridge>);

#[cfg(not(target_arch = "wasm32"))]
impl Default for Bridge {
    fn default() -> Self {
        Self(Box::new(StdoutBridge))
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for Bridge {
    fn default() -> Self {
        Self(Box::new(ParentFrameBridge))
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub struct StdoutBridge;

#[cfg(not(target_arch = "wasm32"))]
impl HostBridge for StdoutBridge {
    fn send(&mut self, payload: &str) -> Result<(), String> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", payload).map_err(|e| format!("Write to stdout failed: {}", e))?;
        out.flush().map_err(|e| format!("Flush of stdout failed: {}", e))
    }

    fn close(&mut self) {}
}

#[cfg(target_arch = "wasm32")]
pub struct ParentFrameBridge;

#[cfg(target_arch = "wasm32")]
impl HostBridge for ParentFrameBridge {
    fn send(&mut self, payload: &str) -> Result<(), String> {
        let window = web_sys::window().ok_or_else(|| "No browser window".to_string())?;
        let target = window
            .parent()
            .map_err(|e| format!("Parent lookup failed: {:?}", e))?
            .unwrap_or(window);
        target
            .post_message(&web_sys::wasm_bindgen::JsValue::from_str(payload), "*")
            .map_err(|e| format!("postMessage failed: {:?}", e))
    }

    fn close(&mut self) {}
}

// ═══════════════════════════════════════════════════════════════════════
// PAYLOAD
// ═══════════════════════════════════════════════════════════════════════

pub fn selection_payload(selection: &RegionSelection) -> Result<String, String> {
    serde_json::to_string(selection).map_err(|e| format!("Serialization failed: {}", e))
}

/// Build the selection for a player standing at `pos`, if a region is there.
/// Reads the polygons directly so a step taken this frame is never paired
/// with last frame's region.
pub fn selection_at(grid: &TileGrid, pos: GridPosition) -> Option<RegionSelection> {
    let region = grid.regions.as_ref()?.region_at(pos.center())?;
    Some(RegionSelection {
        region_id: region.id.clone(),
        region_name: region.name.clone(),
        biome: grid.get(pos.x, pos.y),
        tile: (pos.x, pos.y),
    })
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct BridgePlugin;

impl Plugin for BridgePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Bridge>().add_systems(
            Update,
            (request_region_selection, deliver_selection)
                .chain()
                .after(crate::player::handle_teleport)
                .run_if(in_state(ExplorerState::Exploring)),
        );
    }
}

/// Enter over a region fires `RegionSelectedEvent`.
pub fn request_region_selection(
    input: Res<ExplorerInput>,
    grid: Res<TileGrid>,
    player_query: Query<&GridPosition, With<Player>>,
    mut selected: EventWriter<RegionSelectedEvent>,
) {
    if !input.select_region {
        return;
    }
    let Ok(pos) = player_query.get_single() else {
        return;
    };
    match selection_at(&grid, *pos) {
        Some(selection) => {
            selected.send(RegionSelectedEvent { selection });
        }
        None => info!("[Bridge] No region at ({}, {}); nothing to select", pos.x, pos.y),
    }
}

/// Send each selection to the host and close the view once one gets through.
pub fn deliver_selection(
    mut events: EventReader<RegionSelectedEvent>,
    mut bridge: ResMut<Bridge>,
    mut exit: EventWriter<AppExit>,
) {
    for event in events.read() {
        let result = selection_payload(&event.selection).and_then(|json| bridge.0.send(&json));
        match result {
            Ok(()) => {
                info!("[Bridge] Selected region '{}'", event.selection.region_id);
                bridge.0.close();
                exit.send(AppExit::Success);
                return;
            }
            Err(e) => error!("[Bridge] {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::regions::{RegionDef, RegionMap};

    fn grid_with_region() -> TileGrid {
        let mut grid = TileGrid::new(4, 4, vec![Biome::Forest; 16], MapSourceKind::Regions);
        grid.regions = Some(RegionMap {
            regions: vec![RegionDef {
                id: "elderwood".into(),
                name: "Elderwood".into(),
                biome: Biome::Forest,
                polygon: vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
            }],
        });
        grid
    }

    #[test]
    fn test_payload_fields() {
        let selection = RegionSelection {
            region_id: "elderwood".into(),
            region_name: "Elderwood".into(),
            biome: Biome::Forest,
            tile: (2, 3),
        };
        let json = selection_payload(&selection).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["region_id"], "elderwood");
        assert_eq!(value["region_name"], "Elderwood");
        assert_eq!(value["tile"], serde_json::json!([2, 3]));
    }

    #[test]
    fn test_selection_follows_polygons() {
        let grid = grid_with_region();
        let selection = selection_at(&grid, GridPosition { x: 1, y: 1 }).unwrap();
        assert_eq!(selection.region_id, "elderwood");
        assert_eq!(selection.region_name, "Elderwood");
        assert_eq!(selection.biome, Biome::Forest);
        assert_eq!(selection.tile, (1, 1));
    }

    #[test]
    fn test_no_selection_outside_regions() {
        let mut grid = grid_with_region();
        if let Some(map) = grid.regions.as_mut() {
            map.regions[0].polygon = vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]];
        }
        assert!(selection_at(&grid, GridPosition { x: 3, y: 3 }).is_none());

        grid.regions = None;
        assert!(selection_at(&grid, GridPosition { x: 1, y: 1 }).is_none());
    }
}
