use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// =============================================================================
// World constants
// =============================================================================

/// World pixels per map tile.
pub const TILE_SIZE: f32 = 64.0;

/// World pixels per fog cell. One cell covers a 4x4 tile patch.
pub const CELL_SIZE: f32 = 256.0;

/// Cells of padding beyond the viewport on each side, so particles drift into
/// view already populated instead of popping at the screen edge.
pub const BUFFER_CELLS: usize = 2;

// =============================================================================
// Fog field constants
// =============================================================================

/// Minimum ambient fog particles per cell. Under-populated cells are topped up
/// every tick.
pub const FOG_MIN_PER_CELL: u32 = 1;

/// Maximum eligible (non-fading) ambient fog particles per cell. Excess
/// particles start fading out, oldest first.
pub const FOG_MAX_PER_CELL: u32 = 3;

/// Base drift speed of fog particles in world px/s (before the ±10% jitter).
pub const FOG_DRIFT_SPEED: f32 = 14.0;

/// Half-angle of the wind-direction jitter applied to new fog particles.
pub const WIND_JITTER_HALF_ANGLE: f32 = 6.0 * std::f32::consts::PI / 180.0;

/// Seconds a particle takes to fade out once flagged.
pub const FADE_OUT_SECS: f32 = 4.0;

/// Fog particle base opacity range sampled at spawn.
pub const FOG_ALPHA_RANGE: (f32, f32) = (0.05, 0.6);

/// Fog particle scale range sampled at spawn.
pub const FOG_SCALE_RANGE: (f32, f32) = (2.0, 4.0);

/// Seconds over which a fog particle ramps in from zero opacity.
pub const FOG_FADE_IN_SECS: f32 = 2.0;

// =============================================================================
// Smoke field constants
// =============================================================================

/// Maximum smoke particles per cell, enforced at burst-spawn time.
pub const SMOKE_MAX_PER_CELL: u32 = 14;

/// Burst particle count is `radius * SMOKE_COUNT_PER_RADIUS`, clamped to
/// [SMOKE_BURST_MIN, SMOKE_BURST_MAX].
pub const SMOKE_COUNT_PER_RADIUS: f32 = 0.45;
pub const SMOKE_BURST_MIN: usize = 24;
pub const SMOKE_BURST_MAX: usize = 220;

/// Outward radial speed of burst smoke in world px/s (scaled by a random
/// factor per particle).
pub const SMOKE_RADIAL_SPEED: f32 = 55.0;

/// Upward drift of smoke in world px/s (negative Y is up on screen).
pub const SMOKE_UPDRAFT_SPEED: f32 = 18.0;

/// Random velocity jitter magnitude for smoke in world px/s.
pub const SMOKE_JITTER_SPEED: f32 = 10.0;

/// How hard the ambient wind carries burst smoke, in world px/s at full wind.
pub const SMOKE_WIND_CARRY: f32 = 30.0;

/// Smoke particle base opacity range sampled at spawn (wider than fog).
pub const SMOKE_ALPHA_RANGE: (f32, f32) = (0.15, 0.9);

/// Smoke particle scale range sampled at spawn.
pub const SMOKE_SCALE_RANGE: (f32, f32) = (1.5, 3.5);

/// Seconds over which a smoke particle smoothsteps in from zero opacity.
pub const SMOKE_FADE_IN_SECS: f32 = 0.35;

/// Seconds over which smoke "grows" and settles toward its opacity floor.
pub const SMOKE_GROWTH_SECS: f32 = 9.0;

/// Opacity floor smoke settles toward as it ages past the growth window.
pub const SMOKE_OPACITY_FLOOR: f32 = 0.25;

// =============================================================================
// Forecast constants
// =============================================================================

/// Daily fog strength multiplier range (lerped from the day's second draw).
pub const DAILY_FOG_MIN: f32 = 0.8;
pub const DAILY_FOG_MAX: f32 = 1.2;

/// Seasonal probability that a given day is a fog day.
pub const FOG_PROBABILITY_SPRING: f32 = 0.22;
pub const FOG_PROBABILITY_SUMMER: f32 = 0.10;
pub const FOG_PROBABILITY_AUTUMN: f32 = 0.30;
pub const FOG_PROBABILITY_WINTER: f32 = 0.18;

/// Fallback probability when no season is known.
pub const FOG_PROBABILITY_DEFAULT: f32 = 0.15;

// =============================================================================
// Compositor constants
// =============================================================================

/// Daylight window for the time-of-day opacity dip.
pub const DAWN_HOUR: f32 = 6.0;
pub const DUSK_HOUR: f32 = 20.0;

/// Opacity multiplier at solar noon (the bottom of the parabolic dip).
pub const NOON_MIN_MULTIPLIER: f32 = 0.65;

/// Cell breathing cycle period in seconds and its opacity amplitude.
pub const BREATH_PERIOD_SECS: f32 = 10.0;
pub const BREATH_AMPLITUDE: f32 = 0.18;

/// Scale applied to the per-cell phase hash so neighboring cells desync.
pub const BREATH_DESYNC: f32 = std::f32::consts::TAU;

/// Light-thinning strength selected by `AmbienceSettings::light_thinning`.
pub const LIGHT_THINNING_HIGH: f32 = 0.85;
pub const LIGHT_THINNING_LOW: f32 = 0.55;

/// Overall fog alpha scale selected by `AmbienceSettings::fog_strength`.
pub const FOG_STRENGTH_HIGH: f32 = 1.0;
pub const FOG_STRENGTH_LOW: f32 = 0.6;

/// Amplitude and rate of the light flicker term.
pub const LIGHT_FLICKER_AMPLITUDE: f32 = 0.06;
pub const LIGHT_FLICKER_RATE: f32 = 9.0;

/// Base alpha constant every fog particle's composed alpha starts from.
pub const FOG_BASE_ALPHA: f32 = 0.62;

/// Color the explosion flash tints nearby particles toward.
pub const EXPLOSION_TINT: [f32; 3] = [0.95, 0.54, 0.21];

/// How long an explosion flash keeps tinting after detonation.
pub const FLASH_DURATION_SECS: f32 = 1.6;

/// Smoke base color is pre-lerped this fraction toward `SMOKE_TONE`.
pub const SMOKE_TONE: [f32; 3] = [0.35, 0.35, 0.38];
pub const SMOKE_TONE_LERP: f32 = 0.85;

// =============================================================================
// Grouse constants
// =============================================================================

/// Independent per-tree roll for spawning a grouse at day start.
pub const GROUSE_SPAWN_PROBABILITY: f32 = 0.12;

/// Maximum grouse spawned per location per day.
pub const MAX_GROUSE_PER_LOCATION: usize = 4;

/// Player distance (world px) that startles a perched grouse.
pub const GROUSE_FLUSH_RADIUS: f32 = 160.0;

/// Seconds the startle animation holds before the flush begins.
pub const GROUSE_SURPRISE_SECS: f32 = 0.45;

/// Flush phase: duration and peak speed. Speed ramps 30% -> 100% over the
/// duration with a sinusoidal flap bob on both axes.
pub const GROUSE_FLUSH_SECS: f32 = 0.7;
pub const GROUSE_FLUSH_SPEED: f32 = 260.0;

/// Cruise speed once the grouse commits to an exit direction.
pub const GROUSE_EXIT_SPEED: f32 = 340.0;

/// Vertical bob layered on flight: amplitude (px) and angular rate (rad/s).
pub const GROUSE_BOB_AMPLITUDE: f32 = 6.0;
pub const GROUSE_BOB_RATE: f32 = 7.0;

/// Momentum-preserving steering rate while flying toward a target tree.
pub const GROUSE_TURN_RATE: f32 = 2.2;

/// Distance at which flight hands over to the landing approach, and the snap
/// distance at which the grouse re-perches.
pub const GROUSE_LANDING_DISTANCE: f32 = 96.0;
pub const GROUSE_SNAP_DISTANCE: f32 = 10.0;

/// Minimum approach speed while landing (the approach slows with distance).
pub const GROUSE_LANDING_MIN_SPEED: f32 = 70.0;

/// Knockdown: hit-flash duration, then a fade-out window before removal.
pub const GROUSE_KNOCKDOWN_FLASH_SECS: f32 = 0.8;
pub const GROUSE_KNOCKDOWN_FADE_SECS: f32 = 1.2;

/// Landing grace period: a grouse that leaves the map this long after starting
/// its approach is removed like any other flier.
pub const GROUSE_OFFMAP_GRACE_SECS: f32 = 1.5;

/// Perched hide cycle: the peek-a-boo flag toggles every this many frame
/// advances of the perch animation clock.
pub const GROUSE_HIDE_CYCLE_FRAMES: u32 = 7;

/// Hit points; each pellet takes one.
pub const GROUSE_MAX_HEALTH: i32 = 3;

// =============================================================================
// Settings
// =============================================================================

/// High/low selector for effect strength options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrengthSetting {
    Low,
    High,
}

impl StrengthSetting {
    /// Light-thinning strength constant for this setting.
    pub fn light_thinning(self) -> f32 {
        match self {
            StrengthSetting::Low => LIGHT_THINNING_LOW,
            StrengthSetting::High => LIGHT_THINNING_HIGH,
        }
    }

    /// Overall fog alpha scale for this setting.
    pub fn fog_alpha_scale(self) -> f32 {
        match self {
            StrengthSetting::Low => FOG_STRENGTH_LOW,
            StrengthSetting::High => FOG_STRENGTH_HIGH,
        }
    }
}

/// Player-facing toggles and selectors. The host's config UI writes this
/// resource; the core only reads it.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct AmbienceSettings {
    /// Enable the ambient fog field.
    pub ambient_fog: bool,
    /// Enable explosion smoke bursts.
    pub explosion_smoke: bool,
    /// Apply the daily-random fog forecast (off = every day is a fog day).
    pub daily_random_fog: bool,
    /// Apply the time-of-day opacity dip.
    pub time_modifier: bool,
    /// Apply the host-fed ambient weather multiplier.
    pub weather_modifier: bool,
    /// Overall particle strength selector.
    pub fog_strength: StrengthSetting,
    /// Light-based fog thinning strength selector.
    pub light_thinning: StrengthSetting,
    /// Enable the grouse critter simulation.
    pub grouse_enabled: bool,
    /// Pellets fired per shot when a player shoots at a grouse.
    pub pellets_per_shot: u32,
}

impl Default for AmbienceSettings {
    fn default() -> Self {
        Self {
            ambient_fog: true,
            explosion_smoke: true,
            daily_random_fog: true,
            time_modifier: true,
            weather_modifier: true,
            fog_strength: StrengthSetting::High,
            light_thinning: StrengthSetting::High,
            grouse_enabled: true,
            pellets_per_shot: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let s = AmbienceSettings::default();
        assert!(s.ambient_fog);
        assert!(s.explosion_smoke);
        assert!(s.grouse_enabled);
    }

    #[test]
    fn test_strength_selector_constants() {
        assert!(
            StrengthSetting::High.light_thinning() > StrengthSetting::Low.light_thinning(),
            "high thinning should thin more than low"
        );
    }
}
