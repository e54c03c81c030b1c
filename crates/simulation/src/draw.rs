//! Draw-list assembly.
//!
//! The renderer-facing output: each tick the compositor resolves settings and
//! host state into a [`FogEnv`], runs every live particle through the color
//! functions, and publishes flat sprite lists. The host iterates the lists
//! and blits; nothing here touches a GPU.

use bevy::prelude::*;

use crate::color::{fog_particle_alpha, smoke_particle_color, FogEnv};
use crate::config::{AmbienceSettings, GROUSE_KNOCKDOWN_FLASH_SECS, SMOKE_TONE, SMOKE_TONE_LERP};
use crate::explosions::ActiveFlashes;
use crate::forecast::FogForecast;
use crate::grouse::{Grouse, GrouseAnim, GrouseState};
use crate::lights::LightSources;
use crate::particles::{FogField, SmokeField, TextureHandle};
use crate::spatial_grid::ActiveGrid;
use crate::world::{AmbientWeather, GameClock, SimElapsed};

/// Draw layers, back to front. Smoke renders over fog.
pub const LAYER_FOG: f32 = 0.80;
pub const LAYER_SMOKE: f32 = 0.85;
pub const LAYER_GROUSE: f32 = 0.50;

/// One particle sprite ready to blit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub texture: TextureHandle,
    pub position: Vec2,
    pub scale: f32,
    pub rotation: f32,
    /// Linear RGBA.
    pub color: [f32; 4],
    pub layer: f32,
}

/// One grouse sprite. The host owns the sprite sheet; it maps `frame` and
/// `state` to a source rect itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrouseDraw {
    pub position: Vec2,
    pub state: GrouseState,
    pub frame: u32,
    pub facing_left: bool,
    /// 0..1 white hit-flash overlay.
    pub flash: f32,
    /// Final opacity, including the knockdown fade.
    pub alpha: f32,
    /// 0..1 progress of the perch hide transition.
    pub hide_progress: f32,
    pub layer: f32,
}

/// The published draw lists, rebuilt every tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct DrawLists {
    pub fog: Vec<SpriteDraw>,
    pub smoke: Vec<SpriteDraw>,
    pub grouse: Vec<GrouseDraw>,
}

/// Resolve the settings toggles into a compositor environment. Disabled
/// modifiers become identity multipliers.
pub fn resolve_env(
    settings: &AmbienceSettings,
    clock: &GameClock,
    forecast: &FogForecast,
    weather: &AmbientWeather,
    elapsed: &SimElapsed,
) -> FogEnv {
    FogEnv {
        // Hour 0 sits outside the daylight window, so the dip is off.
        hour: if settings.time_modifier { clock.hour } else { 0.0 },
        daily_strength: if settings.daily_random_fog {
            forecast.daily_strength
        } else {
            1.0
        },
        weather: if settings.weather_modifier {
            weather.0
        } else {
            1.0
        },
        elapsed: elapsed.0,
        thinning_strength: settings.light_thinning.light_thinning(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn assemble_draw_lists(
    settings: Res<AmbienceSettings>,
    clock: Res<GameClock>,
    forecast: Res<FogForecast>,
    weather: Res<AmbientWeather>,
    elapsed: Res<SimElapsed>,
    grid: Res<ActiveGrid>,
    lights: Res<LightSources>,
    flashes: Res<ActiveFlashes>,
    fog: Res<FogField>,
    smoke: Res<SmokeField>,
    birds: Query<(&Grouse, &GrouseAnim)>,
    mut lists: ResMut<DrawLists>,
) {
    let env = resolve_env(&settings, &clock, &forecast, &weather, &elapsed);
    let strength_scale = settings.fog_strength.fog_alpha_scale();

    lists.fog.clear();
    for particle in &fog.0.particles {
        let cell = grid.0.cell_for_position(particle.position);
        let alpha = fog_particle_alpha(particle, cell, &env, &lights) * strength_scale;
        if alpha <= 0.0 {
            continue;
        }
        lists.fog.push(SpriteDraw {
            texture: particle.texture,
            position: particle.position,
            scale: particle.scale,
            rotation: particle.rotation,
            color: [1.0, 1.0, 1.0, alpha],
            layer: LAYER_FOG,
        });
    }

    lists.smoke.clear();
    for particle in &smoke.0.particles {
        let color = smoke_particle_color(particle, &env, &lights, &flashes.0);
        if color[3] <= 0.0 {
            continue;
        }
        lists.smoke.push(SpriteDraw {
            texture: particle.texture,
            position: particle.position,
            scale: particle.scale,
            rotation: particle.rotation,
            color,
            layer: LAYER_SMOKE,
        });
    }

    lists.grouse.clear();
    for (bird, anim) in birds.iter() {
        lists.grouse.push(GrouseDraw {
            position: bird.position,
            state: bird.state,
            frame: bird_frame(bird, anim),
            facing_left: bird.velocity.x < 0.0,
            flash: (anim.flash_timer / GROUSE_KNOCKDOWN_FLASH_SECS).clamp(0.0, 1.0),
            alpha: anim.fade.clamp(0.0, 1.0),
            hide_progress: anim.hide_progress.clamp(0.0, 1.0),
            layer: LAYER_GROUSE,
        });
    }
}

/// Sheet frame for a grouse. Looping states wrap their strip; the startle
/// plays through once and holds on its last frame until the flush begins.
fn bird_frame(bird: &Grouse, anim: &GrouseAnim) -> u32 {
    match bird.state {
        GrouseState::Perched => anim.frame % 2,
        GrouseState::Surprised => anim.frame.min(2),
        GrouseState::Flushing | GrouseState::Flying | GrouseState::Landing => anim.frame % 4,
        GrouseState::KnockedDown => 0,
    }
}

/// The dim gray smoke settles toward before flash tinting; exposed so hosts
/// can match particle colors in adjacent UI.
pub fn smoke_base_color() -> [f32; 3] {
    [
        1.0 + (SMOKE_TONE[0] - 1.0) * SMOKE_TONE_LERP,
        1.0 + (SMOKE_TONE[1] - 1.0) * SMOKE_TONE_LERP,
        1.0 + (SMOKE_TONE[2] - 1.0) * SMOKE_TONE_LERP,
    ]
}

pub struct DrawPlugin;

impl Plugin for DrawPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DrawLists>()
            .add_systems(FixedUpdate, assemble_draw_lists.in_set(crate::SimSet::Draw));
    }
}
