//! Host-environment mirror resources.
//!
//! The surrounding game engine owns the clock, camera, locations, and player
//! positions. It writes these resources each frame; the core only reads them.
//! The demo app and the test harness stand in for the host here.

use bevy::prelude::*;
use rand::Rng;

use crate::config::TILE_SIZE;
use crate::sim_rng::SimRng;

/// In-game clock fed by the host. `hour` is fractional (13.5 = 1:30 PM).
#[derive(Resource, Debug, Clone)]
pub struct GameClock {
    pub day: u32,
    pub hour: f32,
}

impl Default for GameClock {
    fn default() -> Self {
        Self { day: 1, hour: 6.0 }
    }
}

/// Unique world seed shared by every client in the session.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct WorldSeed(pub u64);

/// Current camera viewport in world pixels.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Viewport {
    pub top_left: Vec2,
    pub size: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            top_left: Vec2::ZERO,
            size: Vec2::new(1280.0, 720.0),
        }
    }
}

/// The location the local player is currently in.
#[derive(Resource, Debug, Clone)]
pub struct ActiveLocation {
    pub name: String,
    /// Tile-map size of the location.
    pub size_tiles: IVec2,
    pub outdoors: bool,
}

impl Default for ActiveLocation {
    fn default() -> Self {
        Self {
            name: String::new(),
            size_tiles: IVec2::ZERO,
            outdoors: true,
        }
    }
}

impl ActiveLocation {
    /// Location bounds in world pixels. Grouse that fly past this while in a
    /// flight state are removed.
    pub fn world_bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.size_tiles.x as f32 * TILE_SIZE,
            self.size_tiles.y as f32 * TILE_SIZE,
        )
    }
}

/// World positions of players in the active location (local player first).
/// Used for the perched-grouse proximity check.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerPositions(pub Vec<Vec2>);

/// Host-fed ambient weather multiplier applied to fog opacity when the
/// weather modifier setting is on (e.g. rain damps fog, overcast boosts it).
#[derive(Resource, Debug, Clone, Copy)]
pub struct AmbientWeather(pub f32);

impl Default for AmbientWeather {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Seconds of simulation time elapsed since startup. Drives the breathing and
/// flicker phases in the compositor.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimElapsed(pub f32);

pub fn advance_sim_elapsed(time: Res<Time>, mut elapsed: ResMut<SimElapsed>) {
    elapsed.0 += time.delta_secs();
}

// =============================================================================
// Wind
// =============================================================================

/// Global wind resource. Direction is in radians [0, 2*PI): 0 = East (+X),
/// PI/2 = South (+Y, screen-down). Speed is in [0, 1].
#[derive(Resource, Debug, Clone)]
pub struct WindState {
    pub direction: f32,
    pub speed: f32,
}

impl Default for WindState {
    fn default() -> Self {
        // Gentle westerly wind (blowing toward the east).
        Self {
            direction: 0.0,
            speed: 0.3,
        }
    }
}

impl WindState {
    /// Wind velocity contribution in world px/s per unit of carry.
    pub fn vector(&self) -> Vec2 {
        Vec2::from_angle(self.direction) * self.speed
    }
}

/// Maximum wind direction wander per tick (radians) and the speed band the
/// wander stays inside.
const WIND_WANDER_RATE: f32 = 0.15;
const WIND_SPEED_MIN: f32 = 0.1;
const WIND_SPEED_MAX: f32 = 0.8;

/// Slow deterministic wind drift so fog never streams in one frozen
/// direction for a whole day.
pub fn drift_wind(time: Res<Time>, mut rng: ResMut<SimRng>, mut wind: ResMut<WindState>) {
    let dt = time.delta_secs();
    wind.direction = (wind.direction + rng.0.gen_range(-1.0..1.0) * WIND_WANDER_RATE * dt)
        .rem_euclid(std::f32::consts::TAU);
    let speed_step = rng.0.gen_range(-0.05..0.05) * dt;
    wind.speed = (wind.speed + speed_step).clamp(WIND_SPEED_MIN, WIND_SPEED_MAX);
}

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameClock>()
            .init_resource::<WorldSeed>()
            .init_resource::<Viewport>()
            .init_resource::<ActiveLocation>()
            .init_resource::<PlayerPositions>()
            .init_resource::<AmbientWeather>()
            .init_resource::<SimElapsed>()
            .init_resource::<WindState>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_world_bounds() {
        let loc = ActiveLocation {
            name: "Forest".to_string(),
            size_tiles: IVec2::new(40, 30),
            outdoors: true,
        };
        let bounds = loc.world_bounds();
        assert_eq!(bounds.max, Vec2::new(40.0 * TILE_SIZE, 30.0 * TILE_SIZE));
        assert!(bounds.contains(Vec2::new(100.0, 100.0)));
        assert!(!bounds.contains(Vec2::new(-1.0, 100.0)));
    }

    #[test]
    fn test_wind_vector_magnitude() {
        let wind = WindState {
            direction: 0.0,
            speed: 0.5,
        };
        let v = wind.vector();
        assert!((v.x - 0.5).abs() < 1e-6);
        assert!(v.y.abs() < 1e-6);
    }
}
