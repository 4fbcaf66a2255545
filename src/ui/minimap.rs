//! Minimap: a small dynamic-texture overlay in the bottom-right corner that
//! shows the whole grid downsampled, the player position (blinking dot) and
//! the viewport outline. Clicking it teleports the player.

use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::PrimaryWindow;

use crate::shared::*;
use crate::viewport::Viewport;

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

/// Largest texture edge in texels; bigger maps are downsampled.
pub const MAX_TEXELS: usize = 128;

/// Display size of the longer minimap edge in UI pixels.
pub const MINIMAP_DISPLAY: f32 = 180.0;

/// Gap between the minimap and the window edges.
pub const MINIMAP_MARGIN: f32 = 8.0;

const VOID: [u8; 4] = [20, 22, 28, 255];
const OUTLINE: [u8; 4] = [255, 255, 255, 255];

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES & COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

/// Holds the minimap's dynamic texture handle and cached base texels.
#[derive(Resource)]
pub struct MinimapState {
    pub image_handle: Handle<Image>,
    /// Pre-computed RGBA for terrain only (no player/viewport overlay).
    pub base_pixels: Vec<[u8; 4]>,
    pub tex_width: usize,
    pub tex_height: usize,
    /// Tiles per texel along both axes.
    pub step: usize,
}

/// Marker for the minimap UI node.
#[derive(Component)]
pub struct MinimapNode;

// ═══════════════════════════════════════════════════════════════════════
// PURE HELPERS
// ═══════════════════════════════════════════════════════════════════════

/// Texture size and tiles-per-texel for a grid.
pub fn minimap_dims(grid_w: usize, grid_h: usize) -> (usize, usize, usize) {
    let longest = grid_w.max(grid_h).max(1);
    let step = longest.div_ceil(MAX_TEXELS).max(1);
    (grid_w.div_ceil(step).max(1), grid_h.div_ceil(step).max(1), step)
}

/// Terrain texels, row 0 at the top of the texture.
pub fn base_pixels(grid: &TileGrid) -> (usize, usize, usize, Vec<[u8; 4]>) {
    let (w, h, step) = minimap_dims(grid.width, grid.height);
    let mut pixels = vec![VOID; w * h];
    for my in 0..h {
        let ty = ((h - 1 - my) * step) as i32;
        for mx in 0..w {
            let tx = (mx * step) as i32;
            if grid.in_bounds(tx, ty) {
                pixels[my * w + mx] = grid.get(tx, ty).rgba();
            }
        }
    }
    (w, h, step, pixels)
}

/// Texel holding tile (x, y), or `None` off the texture.
pub fn tile_to_texel(x: i32, y: i32, step: usize, tex_w: usize, tex_h: usize) -> Option<(usize, usize)> {
    if x < 0 || y < 0 {
        return None;
    }
    let mx = x as usize / step;
    let row_from_bottom = y as usize / step;
    if mx >= tex_w || row_from_bottom >= tex_h {
        return None;
    }
    Some((mx, tex_h - 1 - row_from_bottom))
}

/// UI size of the minimap node, keeping the texture aspect.
pub fn display_size(tex_w: usize, tex_h: usize) -> Vec2 {
    let longest = tex_w.max(tex_h).max(1) as f32;
    Vec2::new(tex_w as f32, tex_h as f32) / longest * MINIMAP_DISPLAY
}

/// Screen rect (top-left origin) of a node anchored bottom-right.
pub fn screen_rect(window: Vec2, size: Vec2) -> Rect {
    let max = window - Vec2::splat(MINIMAP_MARGIN);
    Rect::from_corners(max - size, max)
}

/// Tile under a click inside the minimap rect, clamped to the grid.
///
/// The texture spans `tex * step` tiles, which overshoots the grid when its
/// size is not a multiple of `step`.
pub fn click_to_tile(click: Vec2, rect: Rect, grid_w: usize, grid_h: usize) -> (i32, i32) {
    let (tex_w, tex_h, step) = minimap_dims(grid_w, grid_h);
    let span = Vec2::new((tex_w * step) as f32, (tex_h * step) as f32);
    let u = ((click.x - rect.min.x) / rect.width()).clamp(0.0, 1.0);
    let v = ((click.y - rect.min.y) / rect.height()).clamp(0.0, 1.0);
    let x = (u * span.x).floor() as i32;
    let y = ((1.0 - v) * span.y).floor() as i32;
    (
        x.clamp(0, grid_w.saturating_sub(1) as i32),
        y.clamp(0, grid_h.saturating_sub(1) as i32),
    )
}

fn put(data: &mut [u8], tex_w: usize, mx: usize, my: usize, color: [u8; 4]) {
    let offset = (my * tex_w + mx) * 4;
    data[offset..offset + 4].copy_from_slice(&color);
}

fn new_texture(w: usize, h: usize) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: w as u32,
            height: h as u32,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &VOID,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    image.sampler = bevy::image::ImageSampler::nearest();
    image
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Spawn the minimap resource and UI node. Runs on OnEnter(Exploring).
pub fn spawn_minimap(
    mut commands: Commands,
    existing: Query<Entity, With<MinimapNode>>,
    grid: Res<TileGrid>,
    mut images: ResMut<Assets<Image>>,
) {
    if !existing.is_empty() {
        return;
    }
    let (w, h, step, base) = base_pixels(&grid);
    let handle = images.add(new_texture(w, h));
    let size = display_size(w, h);

    commands.insert_resource(MinimapState {
        image_handle: handle.clone(),
        base_pixels: base,
        tex_width: w,
        tex_height: h,
        step,
    });

    commands.spawn((
        MinimapNode,
        ImageNode {
            image: handle,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(MINIMAP_MARGIN),
            bottom: Val::Px(MINIMAP_MARGIN),
            width: Val::Px(size.x),
            height: Val::Px(size.y),
            border: UiRect::all(Val::Px(2.0)),
            ..default()
        },
        BorderColor(Color::srgba(0.9, 0.85, 0.6, 0.8)),
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.4)),
        GlobalZIndex(10),
    ));
}

/// Re-cache terrain texels after a reroll; the texture may change size.
pub fn rebuild_minimap_base(
    mut events: EventReader<GridRebuiltEvent>,
    grid: Res<TileGrid>,
    minimap: Option<ResMut<MinimapState>>,
    mut images: ResMut<Assets<Image>>,
    mut node_query: Query<(&mut ImageNode, &mut Node), With<MinimapNode>>,
) {
    if events.read().last().is_none() {
        return;
    }
    let Some(mut minimap) = minimap else {
        return;
    };
    let (w, h, step, base) = base_pixels(&grid);
    if (w, h) != (minimap.tex_width, minimap.tex_height) {
        images.remove(&minimap.image_handle);
        minimap.image_handle = images.add(new_texture(w, h));
        let size = display_size(w, h);
        for (mut image_node, mut node) in &mut node_query {
            image_node.image = minimap.image_handle.clone();
            node.width = Val::Px(size.x);
            node.height = Val::Px(size.y);
        }
    }
    minimap.base_pixels = base;
    minimap.tex_width = w;
    minimap.tex_height = h;
    minimap.step = step;
}

/// Write terrain, viewport outline and player dot into the texture.
pub fn update_minimap(
    time: Res<Time>,
    viewport: Res<Viewport>,
    overlays: Res<OverlaySettings>,
    player_query: Query<&GridPosition, With<Player>>,
    minimap: Option<Res<MinimapState>>,
    mut images: ResMut<Assets<Image>>,
    mut node_query: Query<&mut Visibility, With<MinimapNode>>,
) {
    let want = if overlays.show_minimap {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut vis in &mut node_query {
        if *vis != want {
            *vis = want;
        }
    }
    if !overlays.show_minimap {
        return;
    }

    let Some(minimap) = minimap else {
        return;
    };
    let Some(image) = images.get_mut(&minimap.image_handle) else {
        return;
    };
    let (w, h, step) = (minimap.tex_width, minimap.tex_height, minimap.step);
    let data = &mut image.data;
    if data.len() != w * h * 4 {
        return;
    }

    // ── Copy base tiles ───────────────────────────────────────────────────
    for (i, pixel) in minimap.base_pixels.iter().enumerate() {
        data[i * 4..i * 4 + 4].copy_from_slice(pixel);
    }

    // ── Viewport outline ──────────────────────────────────────────────────
    let rect = viewport.source_rect();
    let to_texel = |x: f32, y: f32| -> (i32, i32) {
        let mx = (x / step as f32).floor() as i32;
        let row = (y / step as f32).floor() as i32;
        (mx, h as i32 - 1 - row)
    };
    let (x0, y_bottom) = to_texel(rect.min.x, rect.min.y);
    let (x1, y_top) = to_texel(rect.max.x - 0.001, rect.max.y - 0.001);
    let clamp_x = |v: i32| v.clamp(0, w as i32 - 1) as usize;
    let clamp_y = |v: i32| v.clamp(0, h as i32 - 1) as usize;
    for mx in clamp_x(x0)..=clamp_x(x1) {
        put(data, w, mx, clamp_y(y_top), OUTLINE);
        put(data, w, mx, clamp_y(y_bottom), OUTLINE);
    }
    for my in clamp_y(y_top)..=clamp_y(y_bottom) {
        put(data, w, clamp_x(x0), my, OUTLINE);
        put(data, w, clamp_x(x1), my, OUTLINE);
    }

    // ── Player position (blinking 3×3 dot) ────────────────────────────────
    if let Ok(pos) = player_query.get_single() {
        let blink = (time.elapsed_secs() * 4.0).sin() > 0.0;
        let color: [u8; 4] = if blink {
            [255, 255, 255, 255]
        } else {
            [230, 40, 40, 255]
        };
        if let Some((px, py)) = tile_to_texel(pos.x, pos.y, step, w, h) {
            for dy in -1..=1i32 {
                for dx in -1..=1i32 {
                    let nx = px as i32 + dx;
                    let ny = py as i32 + dy;
                    if nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h {
                        put(data, w, nx as usize, ny as usize, color);
                    }
                }
            }
        }
    }
}

/// Publish the minimap's screen rect so map clicks can ignore it.
pub fn update_minimap_rect(
    overlays: Res<OverlaySettings>,
    minimap: Option<Res<MinimapState>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut rect: ResMut<MinimapRect>,
) {
    rect.0 = match (overlays.show_minimap, minimap, windows.get_single()) {
        (true, Some(minimap), Ok(window)) => Some(screen_rect(
            Vec2::new(window.width(), window.height()),
            display_size(minimap.tex_width, minimap.tex_height),
        )),
        _ => None,
    };
}

/// Clicks on the minimap teleport the player.
pub fn minimap_click(
    input: Res<ExplorerInput>,
    rect: Res<MinimapRect>,
    grid: Res<TileGrid>,
    mut teleports: EventWriter<TeleportEvent>,
) {
    let (Some(click), Some(r)) = (input.click_screen, rect.0) else {
        return;
    };
    if !r.contains(click) || grid.is_empty() {
        return;
    }
    let (x, y) = click_to_tile(click, r, grid.width, grid.height);
    teleports.send(TeleportEvent { x, y });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_map_is_one_texel_per_tile() {
        assert_eq!(minimap_dims(64, 40), (64, 40, 1));
    }

    #[test]
    fn test_large_map_is_downsampled() {
        let (w, h, step) = minimap_dims(512, 256);
        assert_eq!(step, 4);
        assert_eq!((w, h), (128, 64));
        let (w, _, step) = minimap_dims(300, 10);
        assert!(w <= MAX_TEXELS);
        assert_eq!(step, 3);
    }

    #[test]
    fn test_base_pixels_row_zero_is_top() {
        let tiles = vec![Biome::Desert, Biome::Desert, Biome::Snow, Biome::Snow];
        let grid = TileGrid::new(2, 2, tiles, MapSourceKind::Procedural);
        let (w, h, _, px) = base_pixels(&grid);
        assert_eq!((w, h), (2, 2));
        assert_eq!(px[0], Biome::Snow.rgba());
        assert_eq!(px[2], Biome::Desert.rgba());
    }

    #[test]
    fn test_tile_to_texel_flips_and_bounds() {
        assert_eq!(tile_to_texel(0, 0, 1, 4, 4), Some((0, 3)));
        assert_eq!(tile_to_texel(7, 7, 2, 4, 4), Some((3, 0)));
        assert_eq!(tile_to_texel(8, 0, 2, 4, 4), None);
        assert_eq!(tile_to_texel(-1, 0, 1, 4, 4), None);
    }

    #[test]
    fn test_display_size_keeps_aspect() {
        assert_eq!(display_size(128, 64), Vec2::new(MINIMAP_DISPLAY, MINIMAP_DISPLAY * 0.5));
    }

    #[test]
    fn test_click_corners_map_to_grid_corners() {
        let rect = screen_rect(Vec2::new(960.0, 540.0), Vec2::new(100.0, 100.0));
        assert_eq!(rect.max, Vec2::new(952.0, 532.0));
        // Top-left of the minimap is the top-left of the map.
        assert_eq!(click_to_tile(rect.min, rect, 50, 50), (0, 49));
        // Bottom-right of the minimap is the bottom-right of the map.
        assert_eq!(click_to_tile(rect.max, rect, 50, 50), (49, 0));
        let mid = rect.center();
        assert_eq!(click_to_tile(mid, rect, 50, 50), (25, 25));
    }

    #[test]
    fn test_click_lands_in_clicked_texel_when_downsampled() {
        // 300x10 downsamples by 3 into 100x4 texels covering 300x12 tiles.
        let (tex_w, tex_h, step) = minimap_dims(300, 10);
        let rect = Rect::new(10.0, 20.0, 210.0, 28.0);
        let texel = Vec2::new(rect.width() / tex_w as f32, rect.height() / tex_h as f32);
        for mx in 0..tex_w {
            for my in 0..tex_h {
                let click = rect.min + Vec2::new(mx as f32 + 0.1, my as f32 + 0.1) * texel;
                let (x, y) = click_to_tile(click, rect, 300, 10);
                assert!(x < 300 && y < 10, "({x}, {y}) off the grid");
                assert_eq!(tile_to_texel(x, y, step, tex_w, tex_h), Some((mx, my)));
            }
        }
    }
}
