//! Terrain domain plugin for Wayfarer.
//!
//! Responsible for:
//! - Building the `TileGrid` from the configured source (procedural noise,
//!   a sampled image, or polygon regions)
//! - Waiting on the image asset and falling back to noise if it fails
//! - Rerolling the procedural seed on request

use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;

use crate::config::{ExplorerConfig, MapSource};
use crate::shared::*;

pub mod image_sampler;
pub mod procedural;
pub mod regions;

use procedural::{generate_biomes, TerrainParams};
use regions::RegionMap;

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TileGrid>()
            .add_systems(OnEnter(ExplorerState::Generating), begin_generation)
            .add_systems(
                Update,
                poll_pending_image.run_if(in_state(ExplorerState::Generating)),
            )
            .add_systems(
                Update,
                reroll_procedural_seed.run_if(in_state(ExplorerState::Exploring)),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES
// ═══════════════════════════════════════════════════════════════════════

/// An image map that is still loading.
#[derive(Resource, Debug, Clone)]
pub struct PendingImage {
    pub handle: Handle<Image>,
    pub path: String,
    pub width: usize,
    pub height: usize,
    pub fallback_seed: u64,
}

// ═══════════════════════════════════════════════════════════════════════
// GRID BUILDERS
// ═══════════════════════════════════════════════════════════════════════

pub fn procedural_grid(seed: u64, width: usize, height: usize, params: TerrainParams) -> TileGrid {
    let tiles = generate_biomes(seed, width, height, params);
    let mut grid = TileGrid::new(width, height, tiles, MapSourceKind::Procedural);
    grid.seed = Some(seed);
    grid
}

/// Grid built from polygons. Zero dimensions size the map to the polygons.
pub fn region_grid(map: RegionMap, width: usize, height: usize) -> Result<TileGrid, String> {
    let (w, h) = if width == 0 || height == 0 {
        let (bw, bh) = map
            .bounds()
            .map(|b| (b.max.x.ceil().max(1.0), b.max.y.ceil().max(1.0)))
            .unwrap_or((1.0, 1.0));
        if bw > MAX_MAP_EDGE as f32 || bh > MAX_MAP_EDGE as f32 {
            return Err(format!(
                "Regions span {}x{} tiles, over the {} tile limit",
                bw, bh, MAX_MAP_EDGE
            ));
        }
        (bw as usize, bh as usize)
    } else {
        (width, height)
    };
    if w > MAX_MAP_EDGE || h > MAX_MAP_EDGE {
        return Err(format!("Region map {}x{} is over the {} tile limit", w, h, MAX_MAP_EDGE));
    }
    let tiles = map.rasterize(w, h);
    let mut grid = TileGrid::new(w, h, tiles, MapSourceKind::Regions);
    grid.regions = Some(map);
    Ok(grid)
}

/// Sample a loaded Bevy image. Non-RGBA8 images are converted first.
pub fn image_grid(image: &Image, width: usize, height: usize) -> Result<TileGrid, String> {
    let rgba;
    let source = match image.texture_descriptor.format {
        TextureFormat::Rgba8UnormSrgb | TextureFormat::Rgba8Unorm => image,
        other => {
            rgba = image
                .convert(TextureFormat::Rgba8UnormSrgb)
                .ok_or_else(|| format!("Unsupported image format {:?}", other))?;
            &rgba
        }
    };
    let tiles = image_sampler::sample_rgba(
        &source.data,
        source.width() as usize,
        source.height() as usize,
        width,
        height,
    )?;
    Ok(TileGrid::new(width, height, tiles, MapSourceKind::Image))
}

fn params_for(source: &MapSource) -> TerrainParams {
    match source {
        MapSource::Procedural { scale, octaves, .. } => TerrainParams {
            scale: *scale,
            octaves: *octaves as usize,
            ..TerrainParams::default()
        },
        _ => TerrainParams::default(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn read_regions(path: &str) -> Result<RegionMap, String> {
    let json = fs::read_to_string(path).map_err(|e| format!("Read failed for {}: {}", path, e))?;
    RegionMap::from_json(&json)
}

#[cfg(target_arch = "wasm32")]
pub fn read_regions(_path: &str) -> Result<RegionMap, String> {
    Err("Region files not available in browser".to_string())
}

fn install_grid(
    grid: TileGrid,
    target: &mut TileGrid,
    events: &mut EventWriter<GridRebuiltEvent>,
) {
    info!(
        "[Terrain] Grid ready: {}x{} from {:?}",
        grid.width, grid.height, grid.source
    );
    events.send(GridRebuiltEvent {
        width: grid.width,
        height: grid.height,
        source: grid.source,
    });
    *target = grid;
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Build the grid for the configured source. Image sources only start the
/// load here; `poll_pending_image` finishes them.
pub fn begin_generation(
    mut commands: Commands,
    config: Res<ExplorerConfig>,
    asset_server: Option<Res<AssetServer>>,
    mut grid: ResMut<TileGrid>,
    mut events: EventWriter<GridRebuiltEvent>,
    mut next_state: ResMut<NextState<ExplorerState>>,
) {
    let params = params_for(&config.source);
    let built = match &config.source {
        MapSource::Procedural {
            seed, width, height, ..
        } => procedural_grid(*seed, *width as usize, *height as usize, params),

        MapSource::Regions {
            path,
            width,
            height,
        } => match read_regions(path)
            .and_then(|map| region_grid(map, *width as usize, *height as usize))
        {
            Ok(built) => {
                info!("[Terrain] Built region map from {}", path);
                built
            }
            Err(e) => {
                error!("[Terrain] {}; falling back to procedural terrain", e);
                let (w, h) = fallback_size(*width, *height);
                procedural_grid(0, w, h, params)
            }
        },

        MapSource::Image {
            path,
            width,
            height,
            fallback_seed,
        } => {
            let Some(asset_server) = asset_server else {
                error!("[Terrain] No asset server to load {}; falling back", path);
                let grid_fallback =
                    procedural_grid(*fallback_seed, *width as usize, *height as usize, params);
                install_grid(grid_fallback, &mut grid, &mut events);
                next_state.set(ExplorerState::Exploring);
                return;
            };
            info!("[Terrain] Loading map image {}", path);
            commands.insert_resource(PendingImage {
                handle: asset_server.load(path.clone()),
                path: path.clone(),
                width: *width as usize,
                height: *height as usize,
                fallback_seed: *fallback_seed,
            });
            return;
        }
    };

    install_grid(built, &mut grid, &mut events);
    next_state.set(ExplorerState::Exploring);
}

fn fallback_size(width: u32, height: u32) -> (usize, usize) {
    let too_big = width as usize > MAX_MAP_EDGE || height as usize > MAX_MAP_EDGE;
    if width == 0 || height == 0 || too_big {
        (128, 128)
    } else {
        (width as usize, height as usize)
    }
}

/// Finish an image source once the asset settles.
pub fn poll_pending_image(
    mut commands: Commands,
    pending: Option<Res<PendingImage>>,
    asset_server: Option<Res<AssetServer>>,
    images: Option<Res<Assets<Image>>>,
    mut grid: ResMut<TileGrid>,
    mut events: EventWriter<GridRebuiltEvent>,
    mut next_state: ResMut<NextState<ExplorerState>>,
) {
    let (Some(pending), Some(asset_server)) = (pending, asset_server) else {
        return;
    };

    let sampled = match asset_server.load_state(pending.handle.id()) {
        LoadState::Loaded => {
            match images.as_ref().and_then(|imgs| imgs.get(&pending.handle)) {
                Some(image) => image_grid(image, pending.width, pending.height),
                None => Err(format!("Image {} loaded but missing from assets", pending.path)),
            }
        }
        LoadState::Failed(err) => Err(format!("Image load failed for {}: {}", pending.path, err)),
        _ => return,
    };

    let built = match sampled {
        Ok(g) => g,
        Err(e) => {
            error!("[Terrain] {}; falling back to procedural terrain", e);
            procedural_grid(
                pending.fallback_seed,
                pending.width,
                pending.height,
                TerrainParams::default(),
            )
        }
    };

    install_grid(built, &mut grid, &mut events);
    commands.remove_resource::<PendingImage>();
    next_state.set(ExplorerState::Exploring);
}

/// R rerolls a procedural map with the next seed.
pub fn reroll_procedural_seed(
    input: Res<ExplorerInput>,
    mut config: ResMut<ExplorerConfig>,
    mut grid: ResMut<TileGrid>,
    mut events: EventWriter<GridRebuiltEvent>,
) {
    if !input.reroll {
        return;
    }
    let params = params_for(&config.source);
    let MapSource::Procedural {
        seed, width, height, ..
    } = &mut config.source
    else {
        info!("[Terrain] Reroll only applies to procedural maps");
        return;
    };
    *seed = seed.wrapping_add(1);
    info!("[Terrain] Rerolling with seed {}", seed);
    let built = procedural_grid(*seed, *width as usize, *height as usize, params);
    install_grid(built, &mut grid, &mut events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::render_asset::RenderAssetUsages;
    use bevy::render::render_resource::{Extent3d, TextureDimension};

    #[test]
    fn test_procedural_grid_records_seed() {
        let grid = procedural_grid(11, 20, 10, TerrainParams::default());
        assert_eq!(grid.seed, Some(11));
        assert_eq!(grid.tiles.len(), 200);
        assert_eq!(grid.source, MapSourceKind::Procedural);
    }

    #[test]
    fn test_shipped_region_file_parses() {
        let map = RegionMap::from_json(include_str!("../../assets/regions/archipelago.json")).unwrap();
        assert_eq!(map.regions.len(), 6);
        let grid = region_grid(map, 0, 0).unwrap();
        assert_eq!((grid.width, grid.height), (94, 72));
        assert_eq!(grid.region_name_at(20, 25), Some("Greenhollow"));
        assert_eq!(grid.get(0, 0), Biome::DeepWater);
    }

    #[test]
    fn test_region_grid_sizes_to_bounds() {
        let map = RegionMap::from_json(
            r#"{ "regions": [ { "id": "a", "name": "A", "biome": "Forest",
                 "polygon": [[0, 0], [12.5, 0], [12.5, 7], [0, 7]] } ] }"#,
        )
        .unwrap();
        let grid = region_grid(map, 0, 0).unwrap();
        assert_eq!((grid.width, grid.height), (13, 7));
        assert_eq!(grid.get(3, 3), Biome::Forest);
        assert_eq!(grid.region_name_at(3, 3), Some("A"));
        assert_eq!(grid.region_name_at(12, 3), None);
    }

    #[test]
    fn test_image_grid_samples_rgba_image() {
        let image = Image::new_fill(
            Extent3d {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            &Biome::Savanna.rgba(),
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::MAIN_WORLD,
        );
        let grid = image_grid(&image, 2, 2).unwrap();
        assert_eq!(grid.source, MapSourceKind::Image);
        assert!(grid.tiles.iter().all(|b| *b == Biome::Savanna));
    }

    #[test]
    fn test_region_grid_rejects_huge_bounds() {
        let map = RegionMap::from_json(
            r#"{ "regions": [ { "id": "vast", "name": "Vast",
                 "polygon": [[0, 0], [1e10, 0], [1e10, 1e10], [0, 1e10]] } ] }"#,
        )
        .unwrap();
        let err = region_grid(map.clone(), 0, 0).unwrap_err();
        assert!(err.contains("tile limit"), "{err}");
        assert!(region_grid(map, MAX_MAP_EDGE + 1, 8).is_err());
    }

    #[test]
    fn test_fallback_size_defaults() {
        assert_eq!(fallback_size(0, 5), (128, 128));
        assert_eq!(fallback_size(30, 20), (30, 20));
        assert_eq!(fallback_size(100_000, 20), (128, 128));
    }
}
