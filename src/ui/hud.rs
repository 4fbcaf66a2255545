use bevy::prelude::*;

use crate::shared::*;
use crate::viewport::Viewport;

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct HudRoot;

/// Top-left position/biome/region/zoom readout.
#[derive(Component)]
pub struct HudLocationText;

/// Marker for the region name banner at top-center.
#[derive(Component)]
pub struct HudRegionBanner;

/// Marker for the "Paused" banner.
#[derive(Component)]
pub struct HudPauseBanner;

/// Resource: tracks fade-in/out for the region name banner.
#[derive(Resource)]
pub struct RegionBannerFade {
    /// How long the name stays fully visible before fading out.
    pub display_timer: Timer,
    /// How long the fade-out takes.
    pub fade_timer: Timer,
    /// 0.0 = invisible, 1.0 = fully visible.
    pub alpha: f32,
}

impl Default for RegionBannerFade {
    fn default() -> Self {
        Self {
            display_timer: Timer::from_seconds(2.0, TimerMode::Once),
            fade_timer: Timer::from_seconds(0.8, TimerMode::Once),
            alpha: 0.0,
        }
    }
}

/// `"(x, y) Biome — Region | zoom 24.0"`; the region part is dropped when
/// the player stands outside every region.
pub fn location_label(pos: GridPosition, biome: Biome, region: Option<&str>, zoom: f32) -> String {
    match region {
        Some(name) => format!(
            "({}, {}) {} — {} | zoom {:.1}",
            pos.x,
            pos.y,
            biome.name(),
            name,
            zoom
        ),
        None => format!("({}, {}) {} | zoom {:.1}", pos.x, pos.y, biome.name(), zoom),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SPAWN
// ═══════════════════════════════════════════════════════════════════════

pub fn spawn_hud(mut commands: Commands, existing: Query<Entity, With<HudRoot>>) {
    if !existing.is_empty() {
        return;
    }

    commands
        .spawn((
            HudRoot,
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(8.0),
                left: Val::Px(8.0),
                padding: UiRect::axes(Val::Px(10.0), Val::Px(5.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.55)),
        ))
        .with_children(|parent| {
            parent.spawn((
                HudLocationText,
                Text::new(""),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.95, 0.7)),
            ));
        });

    // ─── REGION BANNER, top-center ───
    commands
        .spawn((
            HudRegionBanner,
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(48.0),
                left: Val::Percent(50.0),
                margin: UiRect::left(Val::Px(-120.0)),
                width: Val::Px(240.0),
                justify_content: JustifyContent::Center,
                padding: UiRect::axes(Val::Px(12.0), Val::Px(6.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.0)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 1.0, 1.0, 0.0)),
            ));
        });

    // ─── PAUSE BANNER ───
    commands
        .spawn((
            HudPauseBanner,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.35)),
            GlobalZIndex(20),
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Paused (Esc to resume)"),
                TextFont {
                    font_size: 28.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });

    commands.insert_resource(RegionBannerFade::default());
}

// ═══════════════════════════════════════════════════════════════════════
// UPDATES
// ═══════════════════════════════════════════════════════════════════════

pub fn update_location_text(
    grid: Res<TileGrid>,
    viewport: Res<Viewport>,
    current: Res<CurrentRegion>,
    player_query: Query<&GridPosition, With<Player>>,
    mut text_query: Query<&mut Text, With<HudLocationText>>,
) {
    let Ok(pos) = player_query.get_single() else {
        return;
    };
    let label = location_label(
        *pos,
        grid.get(pos.x, pos.y),
        current.name.as_deref(),
        viewport.zoom,
    );
    for mut text in &mut text_query {
        if text.0 != label {
            text.0 = label.clone();
        }
    }
}

/// Shows the region name on `RegionEnteredEvent`, holds it, then fades out.
pub fn update_region_banner(
    time: Res<Time>,
    mut events: EventReader<RegionEnteredEvent>,
    fade: Option<ResMut<RegionBannerFade>>,
    mut container_query: Query<(&Children, &mut BackgroundColor), With<HudRegionBanner>>,
    mut text_query: Query<(&mut Text, &mut TextColor)>,
) {
    let Some(mut fade) = fade else {
        return;
    };

    // Only entering a named region shows the banner; leaving one lets it fade.
    let entered = events.read().filter_map(|e| e.region.clone()).last();
    if entered.is_some() {
        fade.display_timer.reset();
        fade.fade_timer.reset();
        fade.alpha = 1.0;
    }

    if fade.alpha > 0.0 {
        if !fade.display_timer.finished() {
            fade.display_timer.tick(time.delta());
        } else {
            fade.fade_timer.tick(time.delta());
            let elapsed = fade.fade_timer.elapsed_secs();
            let duration = fade.fade_timer.duration().as_secs_f32();
            fade.alpha = (1.0 - elapsed / duration).clamp(0.0, 1.0);
        }
    }

    let alpha = fade.alpha;
    for (children, mut bg_color) in &mut container_query {
        bg_color.0 = Color::srgba(0.0, 0.0, 0.0, alpha * 0.65);
        for &child in children.iter() {
            if let Ok((mut text, mut tc)) = text_query.get_mut(child) {
                if let Some(name) = &entered {
                    text.0 = name.clone();
                }
                tc.0 = Color::srgba(1.0, 1.0, 1.0, alpha);
            }
        }
    }
}

pub fn update_pause_banner(
    state: Res<State<ExplorerState>>,
    mut banner_query: Query<&mut Visibility, With<HudPauseBanner>>,
) {
    let want = if *state.get() == ExplorerState::Paused {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut vis in &mut banner_query {
        if *vis != want {
            *vis = want;
        }
    }
}
