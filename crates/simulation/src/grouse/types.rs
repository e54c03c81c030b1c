use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{
    GROUSE_HIDE_CYCLE_FRAMES, GROUSE_KNOCKDOWN_FLASH_SECS, GROUSE_MAX_HEALTH,
};

/// Grouse behavior states. Replicated; everything else about presentation is
/// recomputed locally from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrouseState {
    Perched,
    Surprised,
    Flushing,
    Flying,
    Landing,
    KnockedDown,
}

/// Replicated grouse state. The authoritative copy lives on the host; state
/// changes reach other clients via the event bridge, and every field here is
/// part of that contract. Cosmetic timers live in [`GrouseAnim`] instead.
#[derive(Component, Debug, Clone)]
pub struct Grouse {
    pub id: u32,
    pub location: String,
    /// Trunk tile of the currently claimed tree.
    pub tree_tile: IVec2,
    pub state: GrouseState,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Peek-a-boo flag while perched; toggled by the local animation clock.
    pub hiding: bool,
    /// Trunk tile of the tree being flown toward, if any.
    pub target_tree: Option<IVec2>,
    pub health: i32,
}

/// Local-only animation and timer state. Never synchronized; each client
/// recomputes it from the replicated state plus local time.
#[derive(Component, Debug, Clone)]
pub struct GrouseAnim {
    pub frame: u32,
    pub frame_timer: f32,
    /// Seconds elapsed in the current state.
    pub state_timer: f32,
    /// Continuous flight clock driving the wing-bob phase.
    pub flight_timer: f32,
    /// Frame advances left until the perch hide flag toggles.
    pub hide_countdown: u32,
    /// Smoothed 0..1 visibility of the hide transition (cosmetic).
    pub hide_progress: f32,
    /// Hit-flash countdown after a knockdown.
    pub flash_timer: f32,
    /// 1..0 opacity ramp during the knockdown fade-out.
    pub fade: f32,
    /// Client-side latch: a flush request is in flight for this perch.
    /// Cleared on any state change, so the host echo re-arms it.
    pub flush_requested: bool,
}

impl Default for GrouseAnim {
    fn default() -> Self {
        Self {
            frame: 0,
            frame_timer: 0.0,
            state_timer: 0.0,
            flight_timer: 0.0,
            hide_countdown: GROUSE_HIDE_CYCLE_FRAMES,
            hide_progress: 0.0,
            flash_timer: 0.0,
            fade: 1.0,
            flush_requested: false,
        }
    }
}

impl GrouseAnim {
    /// Reset the per-state counters. Runs on every state change, without
    /// exception — no transition keeps a stale frame or timer.
    pub fn reset_state_counters(&mut self) {
        self.frame = 0;
        self.frame_timer = 0.0;
        self.state_timer = 0.0;
        self.flight_timer = 0.0;
        self.flush_requested = false;
    }
}

impl Grouse {
    /// Transition to `state`, resetting the local animation counters.
    pub fn enter(&mut self, state: GrouseState, anim: &mut GrouseAnim) {
        self.state = state;
        anim.reset_state_counters();
    }

    /// Startle a perched grouse. Idempotent: anything but Perched is a
    /// no-op, so a duplicate flush event cannot double-trigger.
    pub fn try_flush(&mut self, anim: &mut GrouseAnim) -> bool {
        if self.state != GrouseState::Perched {
            return false;
        }
        self.velocity = Vec2::ZERO;
        self.hiding = false;
        self.enter(GrouseState::Surprised, anim);
        true
    }

    /// Drop the grouse out of the air. Guarded against re-entry.
    pub fn knock_down(&mut self, anim: &mut GrouseAnim) -> bool {
        if self.state == GrouseState::KnockedDown {
            return false;
        }
        self.health = 0;
        // Forward momentum mostly dies; the rest is a tumble downward.
        self.velocity = Vec2::new(self.velocity.x * 0.3, 120.0);
        self.target_tree = None;
        self.enter(GrouseState::KnockedDown, anim);
        anim.flash_timer = GROUSE_KNOCKDOWN_FLASH_SECS;
        anim.fade = 1.0;
        true
    }

    /// Put the grouse back on its tree (a "released" catch).
    pub fn release_to(&mut self, canopy: Vec2, anim: &mut GrouseAnim) {
        self.position = canopy;
        self.velocity = Vec2::ZERO;
        self.target_tree = None;
        self.health = GROUSE_MAX_HEALTH;
        self.enter(GrouseState::Perched, anim);
    }
}

/// Stable grouse identity from `(location, day, tree tile, salt)`.
///
/// Host and clients derive the same IDs from the same daily tree scan, so no
/// ID exchange is needed. Farmer-launched grouse pass a random salt to avoid
/// colliding with natural spawns on the same tree.
pub fn deterministic_id(location: &str, day: u32, tile: IVec2, salt: Option<u32>) -> u32 {
    let mut bytes = Vec::with_capacity(location.len() + 16);
    bytes.extend_from_slice(location.as_bytes());
    bytes.extend_from_slice(&day.to_le_bytes());
    bytes.extend_from_slice(&tile.x.to_le_bytes());
    bytes.extend_from_slice(&tile.y.to_le_bytes());
    if let Some(salt) = salt {
        bytes.extend_from_slice(&salt.to_le_bytes());
    }
    xxhash_rust::xxh32::xxh32(&bytes, 0x6772)
}

/// Fixed exit direction for a flush, derived from the tree position so every
/// client agrees which way the bird bursts out.
pub fn exit_direction(tile: IVec2) -> Vec2 {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&tile.x.to_le_bytes());
    bytes[4..].copy_from_slice(&tile.y.to_le_bytes());
    let lateral = if xxhash_rust::xxh32::xxh32(&bytes, 0x77) & 1 == 0 {
        1.0
    } else {
        -1.0
    };
    // Up and out at a shallow climb.
    Vec2::new(0.8 * lateral, -0.6).normalize()
}
