//! Explorer configuration.
//!
//! Runs in OnEnter(ExplorerState::Loading): reads `assets/explorer.ron`
//! (native only), applies command-line overrides, validates, inserts the
//! `ExplorerConfig` resource and moves on to Generating. A missing or broken
//! file is logged and replaced by the defaults.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use crate::shared::*;

pub const DEFAULT_CONFIG_PATH: &str = "assets/explorer.ron";

// ═══════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapSource {
    Procedural {
        seed: u64,
        width: u32,
        height: u32,
        #[serde(default = "default_scale")]
        scale: f64,
        #[serde(default = "default_octaves")]
        octaves: u32,
    },
    /// Path is relative to the asset folder.
    Image {
        path: String,
        width: u32,
        height: u32,
        #[serde(default)]
        fallback_seed: u64,
    },
    /// Path is relative to the working directory. Zero width/height means
    /// "size to the polygons' bounding box".
    Regions {
        path: String,
        #[serde(default)]
        width: u32,
        #[serde(default)]
        height: u32,
    },
}

fn default_scale() -> f64 {
    64.0
}

fn default_octaves() -> u32 {
    5
}

impl MapSource {
    pub fn kind(&self) -> MapSourceKind {
        match self {
            MapSource::Procedural { .. } => MapSourceKind::Procedural,
            MapSource::Image { .. } => MapSourceKind::Image,
            MapSource::Regions { .. } => MapSourceKind::Regions,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub source: MapSource,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Multiplicative factor per wheel notch or +/- press.
    pub zoom_step: f32,
    /// Delay between repeated steps while a direction is held.
    pub move_repeat_secs: f32,
    /// Camera follow rate; 0 snaps.
    pub camera_lerp: f32,
    pub show_minimap: bool,
    pub show_chunk_grid: bool,
    pub chunk_size: u32,
    pub spawn: Option<(i32, i32)>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            source: MapSource::Procedural {
                seed: 1337,
                width: 256,
                height: 256,
                scale: default_scale(),
                octaves: default_octaves(),
            },
            zoom: DEFAULT_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            move_repeat_secs: 0.12,
            camera_lerp: 10.0,
            show_minimap: true,
            show_chunk_grid: false,
            chunk_size: CHUNK_SIZE,
            spawn: None,
        }
    }
}

impl ExplorerConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        let config: ExplorerConfig =
            ron::from_str(text).map_err(|e| format!("Config parse failed: {}", e))?;
        config.validate()
    }

    pub fn validate(self) -> Result<Self, String> {
        match &self.source {
            MapSource::Procedural { width, height, .. } | MapSource::Image { width, height, .. } => {
                if *width == 0 || *height == 0 {
                    return Err(format!("Map size must be non-zero, got {}x{}", width, height));
                }
                if *width as usize > MAX_MAP_EDGE || *height as usize > MAX_MAP_EDGE {
                    return Err(format!(
                        "Map size {}x{} is over the {} tile limit",
                        width, height, MAX_MAP_EDGE
                    ));
                }
            }
            MapSource::Regions { path, .. } => {
                if path.is_empty() {
                    return Err("Region source needs a path".to_string());
                }
            }
        }
        if let MapSource::Image { path, .. } = &self.source {
            if path.is_empty() {
                return Err("Image source needs a path".to_string());
            }
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.zoom && self.zoom <= self.max_zoom) {
            return Err(format!(
                "Zoom must satisfy 0 < min_zoom <= zoom <= max_zoom, got {} / {} / {}",
                self.min_zoom, self.zoom, self.max_zoom
            ));
        }
        if self.zoom_step <= 1.0 {
            return Err(format!("zoom_step must be greater than 1, got {}", self.zoom_step));
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be non-zero".to_string());
        }
        if self.move_repeat_secs < 0.0 {
            return Err("move_repeat_secs must not be negative".to_string());
        }
        Ok(self)
    }

    pub fn seed(&self) -> Option<u64> {
        match &self.source {
            MapSource::Procedural { seed, .. } => Some(*seed),
            MapSource::Image { fallback_seed, .. } => Some(*fallback_seed),
            MapSource::Regions { .. } => None,
        }
    }

    /// Apply command-line overrides in place. `--config` is ignored here.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn apply_args<I, S>(&mut self, args: I) -> Result<(), String>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        let argv = std::iter::once(std::ffi::OsString::from("wayfarer"))
            .chain(args.into_iter().map(Into::into));
        let overrides =
            CliArgs::try_parse_from(argv).map_err(|e| format!("Bad command line: {}", e))?;
        overrides.apply(self);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// COMMAND LINE
// ═══════════════════════════════════════════════════════════════════════

/// Command-line flags layered over the config file.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Default, PartialEq, Parser)]
#[command(name = "wayfarer", version, about = "Tile-map world explorer", long_about = None)]
pub struct CliArgs {
    /// RON config file to load instead of assets/explorer.ron
    #[arg(long = "config", value_name = "PATH")]
    pub config_path: Option<String>,

    /// Noise seed (procedural maps) or fallback seed (image maps)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Sample the map from this image
    #[arg(long, value_name = "PATH")]
    pub image: Option<String>,

    /// Build the map from this region JSON file
    #[arg(long, value_name = "PATH")]
    pub regions: Option<String>,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliArgs {
    /// Later flags win over the file: regions, then image, then seed.
    pub fn apply(&self, config: &mut ExplorerConfig) {
        let (w, h) = match &config.source {
            MapSource::Procedural { width, height, .. }
            | MapSource::Image { width, height, .. }
            | MapSource::Regions { width, height, .. } => (*width, *height),
        };
        if let Some(path) = &self.regions {
            config.source = MapSource::Regions {
                path: path.clone(),
                width: 0,
                height: 0,
            };
        }
        if let Some(path) = &self.image {
            config.source = MapSource::Image {
                path: path.clone(),
                width: w.max(1),
                height: h.max(1),
                fallback_seed: self.seed.unwrap_or(0),
            };
        }
        if let Some(seed) = self.seed {
            match &mut config.source {
                MapSource::Procedural { seed: s, .. } => *s = seed,
                MapSource::Image { fallback_seed, .. } => *fallback_seed = seed,
                MapSource::Regions { .. } => {}
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FILE IO
// ═══════════════════════════════════════════════════════════════════════

#[cfg(not(target_arch = "wasm32"))]
pub fn load_config(path: &Path) -> Result<ExplorerConfig, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Read failed for {}: {}", path.display(), e))?;
    ExplorerConfig::from_ron_str(&text)
}

#[cfg(target_arch = "wasm32")]
pub fn load_config(_path: &std::path::Path) -> Result<ExplorerConfig, String> {
    Err("Config files not available in browser".to_string())
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(ExplorerState::Loading), load_explorer_config);
    }
}

/// Single system that settles the config and transitions to Generating.
/// A config inserted before startup (tests, embedding) is kept as-is.
fn load_explorer_config(
    mut commands: Commands,
    existing: Option<Res<ExplorerConfig>>,
    mut overlays: ResMut<OverlaySettings>,
    mut next_state: ResMut<NextState<ExplorerState>>,
) {
    let config = match existing {
        Some(config) => config.clone(),
        None => resolve_config(),
    };

    overlays.show_minimap = config.show_minimap;
    overlays.show_chunk_grid = config.show_chunk_grid;

    info!(
        "[Config] source={:?} zoom={} chunk_size={}",
        config.source.kind(),
        config.zoom,
        config.chunk_size
    );
    commands.insert_resource(config);
    next_state.set(ExplorerState::Generating);
}

#[cfg(not(target_arch = "wasm32"))]
fn resolve_config() -> ExplorerConfig {
    // Exits with usage on a bad flag.
    let overrides = CliArgs::parse();

    let path = overrides
        .config_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let mut config = match load_config(Path::new(&path)) {
        Ok(c) => c,
        Err(e) => {
            warn!("[Config] {}; using defaults", e);
            ExplorerConfig::default()
        }
    };
    overrides.apply(&mut config);
    config
}

#[cfg(target_arch = "wasm32")]
fn resolve_config() -> ExplorerConfig {
    ExplorerConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExplorerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_partial_ron_fills_defaults() {
        let text = r#"(
            source: Procedural(seed: 7, width: 64, height: 32),
            zoom: 32.0,
            show_chunk_grid: true,
        )"#;
        let config = ExplorerConfig::from_ron_str(text).unwrap();
        assert_eq!(config.zoom, 32.0);
        assert!(config.show_chunk_grid);
        assert_eq!(config.chunk_size, CHUNK_SIZE);
        assert_eq!(
            config.source,
            MapSource::Procedural {
                seed: 7,
                width: 64,
                height: 32,
                scale: 64.0,
                octaves: 5,
            }
        );
    }

    #[test]
    fn test_parse_image_and_regions_sources() {
        let image = ExplorerConfig::from_ron_str(
            r#"(source: Image(path: "maps/world.png", width: 200, height: 100))"#,
        )
        .unwrap();
        assert_eq!(image.source.kind(), MapSourceKind::Image);
        assert_eq!(image.seed(), Some(0));

        let regions =
            ExplorerConfig::from_ron_str(r#"(source: Regions(path: "assets/regions.json"))"#)
                .unwrap();
        assert_eq!(regions.source.kind(), MapSourceKind::Regions);
        assert_eq!(regions.seed(), None);
    }

    #[test]
    fn test_validate_rejects_bad_zoom() {
        let config = ExplorerConfig {
            zoom: 200.0,
            ..ExplorerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("min_zoom"), "{err}");
    }

    #[test]
    fn test_validate_rejects_zero_size_and_chunk() {
        let zero = ExplorerConfig {
            source: MapSource::Procedural {
                seed: 1,
                width: 0,
                height: 10,
                scale: 64.0,
                octaves: 5,
            },
            ..ExplorerConfig::default()
        };
        assert!(zero.validate().is_err());

        let chunk = ExplorerConfig {
            chunk_size: 0,
            ..ExplorerConfig::default()
        };
        assert!(chunk.validate().is_err());

        let huge = ExplorerConfig {
            source: MapSource::Procedural {
                seed: 1,
                width: MAX_MAP_EDGE as u32 + 1,
                height: 10,
                scale: 64.0,
                octaves: 5,
            },
            ..ExplorerConfig::default()
        };
        assert!(huge.validate().unwrap_err().contains("tile limit"));
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = ExplorerConfig::from_ron_str(include_str!("../../assets/explorer.ron")).unwrap();
        assert_eq!(config, ExplorerConfig::default());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = ExplorerConfig::from_ron_str("(zoom: \"big\")").unwrap_err();
        assert!(err.starts_with("Config parse failed"), "{err}");
    }

    #[test]
    fn test_cli_overrides() {
        let o = CliArgs::try_parse_from(["wayfarer", "--seed", "99", "--config", "x.ron"]).unwrap();
        assert_eq!(o.seed, Some(99));
        assert_eq!(o.config_path.as_deref(), Some("x.ron"));

        let mut config = ExplorerConfig::default();
        o.apply(&mut config);
        assert_eq!(config.seed(), Some(99));

        let mut config = ExplorerConfig::default();
        config
            .apply_args(["--image", "maps/a.png", "--seed", "4"])
            .unwrap();
        assert_eq!(
            config.source,
            MapSource::Image {
                path: "maps/a.png".into(),
                width: 256,
                height: 256,
                fallback_seed: 4,
            }
        );
    }

    #[test]
    fn test_cli_rejects_unknown_and_missing_values() {
        assert!(CliArgs::try_parse_from(["wayfarer", "--bogus"]).is_err());
        assert!(CliArgs::try_parse_from(["wayfarer", "--seed"]).is_err());
        assert!(CliArgs::try_parse_from(["wayfarer", "--seed", "abc"]).is_err());
    }

    #[test]
    fn test_bad_flag_leaves_config_untouched() {
        let mut config = ExplorerConfig::default();
        let err = config.apply_args(["--seed", "5", "--verbose"]).unwrap_err();
        assert!(err.starts_with("Bad command line"), "{err}");
        assert_eq!(config, ExplorerConfig::default());
    }
}
