//! Fog and smoke particle fields.
//!
//! Two instances of the same density-controlled field: `FogField` keeps every
//! on-screen cell inside its min/max population band as the camera moves;
//! `SmokeField` holds burst-spawned explosion smoke and only ever thins.
//! The occupancy pass and the fade-out/top-up rules live in `field.rs`.

pub mod field;
mod tests;
pub mod types;

pub use field::ParticleField;
pub use types::{FieldParams, Particle, TextureHandle};

use bevy::prelude::*;

use crate::config::AmbienceSettings;
use crate::forecast::FogForecast;
use crate::sim_rng::SimRng;
use crate::spatial_grid::ActiveGrid;
use crate::world::{ActiveLocation, WindState};
use crate::SimSet;

/// Steps inside [`SimSet::Particles`], in execution order. Every step draws
/// from the shared `SimRng`, so the order is pinned here instead of left to
/// the scheduler; an ambiguous order would desync identically-seeded
/// sessions.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleStep {
    /// Explosion events burst smoke and record flashes.
    Ignite,
    /// Field advance, top-up, and thinning.
    Advance,
    /// Flash countdown and expiry.
    Expire,
}

/// Stand-in palettes the host overwrites once its textures are loaded.
fn default_palette() -> Vec<TextureHandle> {
    vec![TextureHandle(0), TextureHandle(1), TextureHandle(2)]
}

/// The ambient fog field.
#[derive(Resource)]
pub struct FogField(pub ParticleField);

impl Default for FogField {
    fn default() -> Self {
        Self(ParticleField::new(FieldParams::fog(default_palette())))
    }
}

/// The explosion smoke field.
#[derive(Resource)]
pub struct SmokeField(pub ParticleField);

impl Default for SmokeField {
    fn default() -> Self {
        Self(ParticleField::new(FieldParams::smoke(default_palette())))
    }
}

/// Ambient fog tick. Fog exists outdoors on fog days; otherwise the field is
/// emptied and the tick is skipped.
pub fn update_fog_field(
    settings: Res<AmbienceSettings>,
    forecast: Res<FogForecast>,
    location: Res<ActiveLocation>,
    grid: Res<ActiveGrid>,
    wind: Res<WindState>,
    time: Res<Time>,
    mut rng: ResMut<SimRng>,
    mut fog: ResMut<FogField>,
) {
    let fog_today = !settings.daily_random_fog || forecast.is_fog_day;
    if !settings.ambient_fog || !fog_today || !location.outdoors {
        if !fog.0.is_empty() {
            fog.0.particles.clear();
        }
        return;
    }
    fog.0.update(&grid.0, &wind, time.delta_secs(), &mut rng.0);
}

/// Smoke tick: advance and thin. Bursts are injected by the explosion
/// systems; with `min_per_cell = 0` nothing tops up here.
pub fn update_smoke_field(
    settings: Res<AmbienceSettings>,
    grid: Res<ActiveGrid>,
    wind: Res<WindState>,
    time: Res<Time>,
    mut rng: ResMut<SimRng>,
    mut smoke: ResMut<SmokeField>,
) {
    if !settings.explosion_smoke {
        if !smoke.0.is_empty() {
            smoke.0.particles.clear();
        }
        return;
    }
    smoke.0.update(&grid.0, &wind, time.delta_secs(), &mut rng.0);
}

pub struct ParticlesPlugin;

impl Plugin for ParticlesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FogField>()
            .init_resource::<SmokeField>()
            .configure_sets(
                FixedUpdate,
                (ParticleStep::Ignite, ParticleStep::Advance, ParticleStep::Expire)
                    .chain()
                    .in_set(SimSet::Particles),
            )
            .add_systems(
                FixedUpdate,
                (update_fog_field, update_smoke_field)
                    .chain()
                    .in_set(ParticleStep::Advance),
            );
    }
}
