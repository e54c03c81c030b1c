//! Deterministic daily fog forecast.
//!
//! Every client derives the day's forecast from `(day, world_seed)` alone,
//! so the whole session agrees on fog without any network traffic. The
//! forecast is rolled once per in-game day and is immutable until the next.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{
    DAILY_FOG_MAX, DAILY_FOG_MIN, FOG_PROBABILITY_AUTUMN, FOG_PROBABILITY_DEFAULT,
    FOG_PROBABILITY_SPRING, FOG_PROBABILITY_SUMMER, FOG_PROBABILITY_WINTER,
};
use crate::events::ForecastShownEvent;
use crate::world::{GameClock, WorldSeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// 28-day seasons, four to a year.
    pub fn from_day(day: u32) -> Season {
        match (day.saturating_sub(1) / 28) % 4 {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }
}

/// Probability that a day in the given season is a fog day. `None` falls back
/// to the default (a host can run locations outside the normal calendar).
pub fn fog_probability(season: Option<Season>) -> f32 {
    match season {
        Some(Season::Spring) => FOG_PROBABILITY_SPRING,
        Some(Season::Summer) => FOG_PROBABILITY_SUMMER,
        Some(Season::Autumn) => FOG_PROBABILITY_AUTUMN,
        Some(Season::Winter) => FOG_PROBABILITY_WINTER,
        None => FOG_PROBABILITY_DEFAULT,
    }
}

/// The day's fog forecast. Rolled once per day; immutable for the day.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct FogForecast {
    pub day: u32,
    pub is_fog_day: bool,
    /// Daily strength multiplier, lerped into [DAILY_FOG_MIN, DAILY_FOG_MAX].
    pub daily_strength: f32,
    /// The seasonal probability the roll was checked against.
    pub probability_for_day: f32,
    /// The day's uniform [0,1) draw.
    pub probability_roll: f32,
    /// Set when the host reports the weather broadcast was watched; a UI
    /// layer can gate its forecast display on this.
    pub revealed: bool,
}

impl Default for FogForecast {
    fn default() -> Self {
        Self {
            day: 0,
            is_fog_day: false,
            daily_strength: 1.0,
            probability_for_day: 0.0,
            probability_roll: 1.0,
            revealed: false,
        }
    }
}

/// Roll the forecast for a day. Bit-identical for identical inputs.
pub fn compute_forecast(day: u32, world_seed: u64, season: Option<Season>) -> FogForecast {
    let seed = (day as u64) ^ (world_seed & 0x7FFF_FFFF);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let probability_roll: f32 = rng.gen();
    let probability_for_day = fog_probability(season);
    let is_fog_day = probability_roll <= probability_for_day;
    let daily_strength = DAILY_FOG_MIN + rng.gen::<f32>() * (DAILY_FOG_MAX - DAILY_FOG_MIN);

    FogForecast {
        day,
        is_fog_day,
        daily_strength,
        probability_for_day,
        probability_roll,
        revealed: false,
    }
}

/// Re-roll the forecast when the in-game day changes.
pub fn roll_forecast_on_new_day(
    clock: Res<GameClock>,
    seed: Res<WorldSeed>,
    mut forecast: ResMut<FogForecast>,
) {
    if forecast.day != clock.day {
        *forecast = compute_forecast(clock.day, seed.0, Some(Season::from_day(clock.day)));
        debug!(
            "fog forecast for day {}: fog={} strength={:.2}",
            clock.day, forecast.is_fog_day, forecast.daily_strength
        );
    }
}

/// Latch the reveal flag when the host reports the forecast broadcast.
pub fn mark_forecast_revealed(
    mut events: EventReader<ForecastShownEvent>,
    mut forecast: ResMut<FogForecast>,
) {
    if events.read().next().is_some() {
        forecast.revealed = true;
    }
}

pub struct ForecastPlugin;

impl Plugin for ForecastPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FogForecast>().add_systems(
            FixedUpdate,
            (roll_forecast_on_new_day, mark_forecast_revealed).in_set(crate::SimSet::Forecast),
        );
    }
}
