//! Color and opacity composition.
//!
//! Pure functions of a particle plus an environment snapshot; nothing here
//! mutates state. Colors are linear RGB arrays; the host converts to its own
//! color type at draw time.

use bevy::math::Vec2;

use crate::config::{
    BREATH_AMPLITUDE, BREATH_DESYNC, BREATH_PERIOD_SECS, DAWN_HOUR, DUSK_HOUR, EXPLOSION_TINT,
    FADE_OUT_SECS, FLASH_DURATION_SECS, FOG_BASE_ALPHA, FOG_FADE_IN_SECS, LIGHT_FLICKER_AMPLITUDE,
    LIGHT_FLICKER_RATE, NOON_MIN_MULTIPLIER, SMOKE_FADE_IN_SECS, SMOKE_GROWTH_SECS,
    SMOKE_OPACITY_FLOOR, SMOKE_TONE, SMOKE_TONE_LERP,
};
use crate::explosions::ExplosionFlash;
use crate::lights::LightSources;
use crate::particles::Particle;

/// Everything about the moment that feeds the composition, resolved from
/// settings and host state by the caller. Multipliers for disabled modifiers
/// arrive as 1.0.
#[derive(Debug, Clone, Copy)]
pub struct FogEnv {
    pub hour: f32,
    pub daily_strength: f32,
    pub weather: f32,
    /// Simulation seconds since startup; drives breathing and flicker.
    pub elapsed: f32,
    /// Light-thinning strength constant (config-selected high/low).
    pub thinning_strength: f32,
}

impl Default for FogEnv {
    fn default() -> Self {
        Self {
            hour: 6.0,
            daily_strength: 1.0,
            weather: 1.0,
            elapsed: 0.0,
            thinning_strength: 0.0,
        }
    }
}

#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Opacity multiplier over the day: 1.0 outside the daylight window, dipping
/// parabolically to `NOON_MIN_MULTIPLIER` at solar noon.
pub fn time_of_day_multiplier(hour: f32) -> f32 {
    if hour <= DAWN_HOUR || hour >= DUSK_HOUR {
        return 1.0;
    }
    let d = (hour - DAWN_HOUR) / (DUSK_HOUR - DAWN_HOUR);
    let dip = 4.0 * d * (1.0 - d);
    (1.0 - dip * (1.0 - NOON_MIN_MULTIPLIER)).clamp(NOON_MIN_MULTIPLIER, 1.0)
}

/// Stable per-cell phase offset in [0, 1).
pub fn cell_phase(col: i32, row: i32) -> f32 {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&col.to_le_bytes());
    bytes[4..].copy_from_slice(&row.to_le_bytes());
    xxhash_rust::xxh32::xxh32(&bytes, 0x5eed) as f32 / (u32::MAX as f32 + 1.0)
}

/// Slow "breathing" of each cell's opacity around 1.0, desynced per cell so
/// the whole screen never pulses in unison.
pub fn cell_breath_opacity(cell: (i32, i32), elapsed_secs: f32) -> f32 {
    let shared = elapsed_secs / BREATH_PERIOD_SECS * std::f32::consts::TAU;
    let phase = shared + cell_phase(cell.0, cell.1) * BREATH_DESYNC;
    (1.0 + phase.sin() * BREATH_AMPLITUDE).clamp(0.0, 1.0)
}

/// Fog thins near light sources: smoothstep falloff by distance with a small
/// flicker, warmth capped at 1.0, scaled by the configured strength.
pub fn light_thinning_multiplier(
    pos: Vec2,
    lights: &LightSources,
    elapsed_secs: f32,
    strength: f32,
) -> f32 {
    let mut warmth = 0.0f32;
    for light in lights.lights_reaching(pos) {
        let closeness = 1.0 - pos.distance(light.position) / light.radius_px;
        let falloff = smoothstep(closeness);
        let flicker = 1.0 + (elapsed_secs * LIGHT_FLICKER_RATE).sin() * LIGHT_FLICKER_AMPLITUDE;
        warmth += falloff * flicker;
    }
    warmth = warmth.min(1.0);
    (1.0 - warmth * strength).clamp(0.0, 1.0)
}

/// Lerp `base` toward the explosion tint by the strongest active flash
/// influence at `pos`: `((1 - distance_ratio) * time_ratio)^2`.
pub fn explosion_tint(pos: Vec2, base: [f32; 3], flashes: &[ExplosionFlash]) -> [f32; 3] {
    let mut strongest = 0.0f32;
    for flash in flashes {
        let distance = pos.distance(flash.center);
        if distance >= flash.radius_px {
            continue;
        }
        let distance_ratio = distance / flash.radius_px;
        let time_ratio = (flash.time_left / FLASH_DURATION_SECS).clamp(0.0, 1.0);
        let influence = ((1.0 - distance_ratio) * time_ratio).powi(2);
        strongest = strongest.max(influence);
    }
    lerp3(base, EXPLOSION_TINT, strongest)
}

/// Final fog particle alpha.
///
/// `base * particle.alpha * fade_in * fade_out * breath * time_of_day *
/// daily * weather`, clamped to [0, 1], then scaled down by light thinning
/// (thinning applies after the clamp — it can only darken).
pub fn fog_particle_alpha(
    particle: &Particle,
    cell: (i32, i32),
    env: &FogEnv,
    lights: &LightSources,
) -> f32 {
    let fade_in = (particle.age_secs / FOG_FADE_IN_SECS).clamp(0.0, 1.0);
    let fade_out = if particle.fading_out {
        (particle.fade_secs_left / FADE_OUT_SECS).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let composed = FOG_BASE_ALPHA
        * particle.alpha
        * fade_in
        * fade_out
        * cell_breath_opacity(cell, env.elapsed)
        * time_of_day_multiplier(env.hour)
        * env.daily_strength
        * env.weather;
    composed.clamp(0.0, 1.0)
        * light_thinning_multiplier(particle.position, lights, env.elapsed, env.thinning_strength)
}

/// Final smoke particle RGBA. Smoke smoothsteps in, settles toward an opacity
/// floor as it ages through the growth window, and its base color is
/// pre-lerped most of the way to a dim gray before flash tinting.
pub fn smoke_particle_color(
    particle: &Particle,
    env: &FogEnv,
    lights: &LightSources,
    flashes: &[ExplosionFlash],
) -> [f32; 4] {
    let fade_in = smoothstep(particle.age_secs / SMOKE_FADE_IN_SECS);
    let fade_out = if particle.fading_out {
        (particle.fade_secs_left / FADE_OUT_SECS).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let settle = smoothstep(particle.age_secs / SMOKE_GROWTH_SECS);
    let floor_ramp = 1.0 + (SMOKE_OPACITY_FLOOR - 1.0) * settle;

    let alpha = (particle.alpha * fade_in * fade_out * floor_ramp * env.weather).clamp(0.0, 1.0)
        * light_thinning_multiplier(particle.position, lights, env.elapsed, env.thinning_strength);

    let toned = lerp3([1.0, 1.0, 1.0], SMOKE_TONE, SMOKE_TONE_LERP);
    let [r, g, b] = explosion_tint(particle.position, toned, flashes);
    [r, g, b, alpha]
}
