use bevy::prelude::*;

use crate::config::{
    FADE_OUT_SECS, FOG_ALPHA_RANGE, FOG_DRIFT_SPEED, FOG_MAX_PER_CELL, FOG_MIN_PER_CELL,
    FOG_SCALE_RANGE, SMOKE_ALPHA_RANGE, SMOKE_MAX_PER_CELL, SMOKE_SCALE_RANGE,
};

/// Opaque reference to a host-loaded texture. The host maps these to real
/// GPU handles; an empty palette simply means nothing spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHandle(pub u16);

/// One fog or smoke particle. Owned exclusively by its field's collection.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub scale: f32,
    /// Kept for the draw call; the simulation never rotates particles.
    pub rotation: f32,
    /// Base opacity factor sampled at spawn.
    pub alpha: f32,
    /// Seconds since spawn.
    pub age_secs: f32,
    /// Latch: once true, never reset. The particle is removed when
    /// `fade_secs_left` runs out.
    pub fading_out: bool,
    pub fade_secs_left: f32,
    pub texture: TextureHandle,
}

/// Per-field tuning: population targets, spawn parameter ranges, and the
/// texture palette. Fog and smoke are the same machinery with different
/// parameters.
#[derive(Debug, Clone)]
pub struct FieldParams {
    /// Cells below this particle count are topped up each tick.
    pub min_per_cell: u32,
    /// Cells with more eligible (non-fading) particles than this fade their
    /// oldest down to the cap.
    pub max_per_cell: u32,
    /// Remove particles that leave the padded grid instead of letting them
    /// drift back in.
    pub cull_offscreen: bool,
    pub scale_range: (f32, f32),
    pub alpha_range: (f32, f32),
    /// Countdown installed on spawn; starts ticking when `fading_out` flips.
    pub fade_out_secs: f32,
    /// Base speed for wind-driven spawns, before the ±10% jitter.
    pub drift_speed: f32,
    pub palette: Vec<TextureHandle>,
}

impl FieldParams {
    /// Ambient fog: sparse, slow, screen-filling.
    pub fn fog(palette: Vec<TextureHandle>) -> Self {
        Self {
            min_per_cell: FOG_MIN_PER_CELL,
            max_per_cell: FOG_MAX_PER_CELL,
            cull_offscreen: true,
            scale_range: FOG_SCALE_RANGE,
            alpha_range: FOG_ALPHA_RANGE,
            fade_out_secs: FADE_OUT_SECS,
            drift_speed: FOG_DRIFT_SPEED,
            palette,
        }
    }

    /// Explosion smoke: denser cap, no ambient top-up (min 0), burst-spawned.
    pub fn smoke(palette: Vec<TextureHandle>) -> Self {
        Self {
            min_per_cell: 0,
            max_per_cell: SMOKE_MAX_PER_CELL,
            cull_offscreen: true,
            scale_range: SMOKE_SCALE_RANGE,
            alpha_range: SMOKE_ALPHA_RANGE,
            fade_out_secs: FADE_OUT_SECS,
            drift_speed: FOG_DRIFT_SPEED,
            palette,
        }
    }
}
