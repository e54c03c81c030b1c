//! Events at the host boundary.
//!
//! The host engine fires the inbound events directly (no method patching of
//! host internals); the core fires the outbound ones for the host to react
//! to. All are plain Bevy events.

use bevy::prelude::*;

/// Inbound: a bomb went off. Spawns smoke + a tint flash and is broadcast to
/// the other clients in the session.
#[derive(Event, Debug, Clone)]
pub struct ExplosionEvent {
    pub location: String,
    pub center: Vec2,
    pub radius_px: f32,
}

/// Inbound: a player hit or shook a tree. Startles any grouse perched on it.
#[derive(Event, Debug, Clone)]
pub struct TreeInteractionEvent {
    pub location: String,
    pub tile: IVec2,
}

/// Inbound: a player's shot connected with a grouse. Damage is one point per
/// pellet, taken from the shooter's settings.
#[derive(Event, Debug, Clone)]
pub struct GrouseHitEvent {
    pub grouse_id: u32,
}

/// Inbound: the weather forecast broadcast finished playing.
#[derive(Event, Debug, Clone, Default)]
pub struct ForecastShownEvent;

/// Outbound: a grouse landed on or burst out of a tree; the host should play
/// its tree-shake animation.
#[derive(Event, Debug, Clone)]
pub struct TreeShakeEvent {
    pub location: String,
    pub tile: IVec2,
}

pub struct EventsPlugin;

impl Plugin for EventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ExplosionEvent>()
            .add_event::<TreeInteractionEvent>()
            .add_event::<GrouseHitEvent>()
            .add_event::<ForecastShownEvent>()
            .add_event::<TreeShakeEvent>();
    }
}
