//! Explosion flashes and smoke bursts.
//!
//! A bomb detonation produces two things: a one-shot smoke burst in the
//! smoke field and a short-lived tint flash the compositor lerps nearby
//! particles toward. Locally-detected explosions are also broadcast to the
//! rest of the session; inbound network explosions are applied by `net.rs`
//! without re-broadcasting.

use bevy::prelude::*;

use crate::config::{AmbienceSettings, FLASH_DURATION_SECS};
use crate::events::ExplosionEvent;
use crate::net::{queue_message, NetMessage, NetOutbox};
use crate::particles::{ParticleStep, SmokeField};
use crate::sim_rng::SimRng;
use crate::spatial_grid::ActiveGrid;
use crate::world::{ActiveLocation, WindState};

/// One active detonation tint. Removed when `time_left` runs out.
#[derive(Debug, Clone)]
pub struct ExplosionFlash {
    pub location: String,
    pub center: Vec2,
    pub radius_px: f32,
    pub time_left: f32,
}

/// Flashes currently tinting the active location.
#[derive(Resource, Debug, Clone, Default)]
pub struct ActiveFlashes(pub Vec<ExplosionFlash>);

/// Apply a detonation to local state: record the flash and burst smoke if
/// it happened in the active location.
pub fn apply_explosion(
    flash: ExplosionFlash,
    location: &ActiveLocation,
    flashes: &mut ActiveFlashes,
    smoke: &mut SmokeField,
    grid: &ActiveGrid,
    wind: &WindState,
    rng: &mut SimRng,
    smoke_enabled: bool,
) {
    if flash.location != location.name {
        return;
    }
    if smoke_enabled {
        smoke
            .0
            .spawn_burst(&grid.0, flash.center, flash.radius_px, wind, &mut rng.0);
    }
    flashes.0.push(flash);
}

/// Consume locally-detected explosions: apply them and broadcast to the
/// session.
#[allow(clippy::too_many_arguments)]
pub fn handle_explosion_events(
    mut events: EventReader<ExplosionEvent>,
    settings: Res<AmbienceSettings>,
    location: Res<ActiveLocation>,
    grid: Res<ActiveGrid>,
    wind: Res<WindState>,
    mut rng: ResMut<SimRng>,
    mut flashes: ResMut<ActiveFlashes>,
    mut smoke: ResMut<SmokeField>,
    mut outbox: ResMut<NetOutbox>,
) {
    for event in events.read() {
        let flash = ExplosionFlash {
            location: event.location.clone(),
            center: event.center,
            radius_px: event.radius_px,
            time_left: FLASH_DURATION_SECS,
        };
        queue_message(
            &mut outbox,
            &NetMessage::Explosion {
                location: flash.location.clone(),
                center: [flash.center.x, flash.center.y],
                radius_px: flash.radius_px,
                time_left: flash.time_left,
            },
        );
        apply_explosion(
            flash,
            &location,
            &mut flashes,
            &mut smoke,
            &grid,
            &wind,
            &mut rng,
            settings.explosion_smoke,
        );
    }
}

/// Count flashes down and drop expired ones.
pub fn tick_flashes(time: Res<Time>, mut flashes: ResMut<ActiveFlashes>) {
    let dt = time.delta_secs();
    flashes.0.retain_mut(|flash| {
        flash.time_left -= dt;
        flash.time_left > 0.0
    });
}

pub struct ExplosionsPlugin;

impl Plugin for ExplosionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveFlashes>().add_systems(
            FixedUpdate,
            (
                handle_explosion_events.in_set(ParticleStep::Ignite),
                tick_flashes.in_set(ParticleStep::Expire),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_expires() {
        let mut flashes = ActiveFlashes(vec![ExplosionFlash {
            location: "Town".to_string(),
            center: Vec2::ZERO,
            radius_px: 128.0,
            time_left: 0.05,
        }]);
        let dt = 0.1;
        flashes.0.retain_mut(|f| {
            f.time_left -= dt;
            f.time_left > 0.0
        });
        assert!(flashes.0.is_empty());
    }

    #[test]
    fn test_apply_explosion_ignores_other_locations() {
        let location = ActiveLocation {
            name: "Town".to_string(),
            size_tiles: IVec2::new(50, 50),
            outdoors: true,
        };
        let mut flashes = ActiveFlashes::default();
        let mut smoke = SmokeField::default();
        let grid = ActiveGrid::default();
        let wind = WindState::default();
        let mut rng = SimRng::from_seed_u64(1);
        apply_explosion(
            ExplosionFlash {
                location: "Desert".to_string(),
                center: Vec2::new(100.0, 100.0),
                radius_px: 128.0,
                time_left: FLASH_DURATION_SECS,
            },
            &location,
            &mut flashes,
            &mut smoke,
            &grid,
            &wind,
            &mut rng,
            true,
        );
        assert!(flashes.0.is_empty());
        assert!(smoke.0.is_empty());
    }
}
