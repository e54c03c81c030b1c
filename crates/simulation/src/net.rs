//! Multiplayer event bridge.
//!
//! Small structured messages over the host's reliable messaging channel.
//! The host transport drains `NetOutbox` and fills `NetInbox` with raw
//! payloads; this module owns the encoding and the application rules.
//! Messages are fire-and-forget, so every application is guarded to be
//! idempotent-safe: re-applying a flush to a bird that already flushed is a
//! no-op, and anything malformed is logged and dropped, never fatal.

use bevy::prelude::*;
use bitcode::{Decode, Encode};

use crate::config::AmbienceSettings;
use crate::explosions::{apply_explosion, ActiveFlashes, ExplosionFlash};
use crate::grouse::{Grouse, GrouseAnim};
use crate::particles::SmokeField;
use crate::sim_rng::SimRng;
use crate::spatial_grid::ActiveGrid;
use crate::trees::TreeDirectory;
use crate::world::{ActiveLocation, WindState};
use crate::TickCounter;

#[derive(Encode, Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrouseEventKind {
    Flushed,
    KnockedDown,
    Released,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq)]
pub enum NetMessage {
    Explosion {
        location: String,
        center: [f32; 2],
        radius_px: f32,
        time_left: f32,
    },
    Grouse {
        grouse_id: u32,
        event: GrouseEventKind,
        /// Sender's tick count; informational only.
        timestamp: u64,
    },
}

/// Whether this client is the session host. The host is authoritative for
/// grouse state transitions; non-hosts request them via the outbox.
#[derive(Resource, Debug, Clone, Copy)]
pub struct NetRole {
    pub is_host: bool,
}

impl Default for NetRole {
    fn default() -> Self {
        Self { is_host: true }
    }
}

/// Encoded messages waiting for the host transport to send.
#[derive(Resource, Debug, Default)]
pub struct NetOutbox(pub Vec<Vec<u8>>);

/// Raw payloads received from the host transport, applied next tick.
#[derive(Resource, Debug, Default)]
pub struct NetInbox(pub Vec<Vec<u8>>);

pub fn queue_message(outbox: &mut NetOutbox, message: &NetMessage) {
    outbox.0.push(bitcode::encode(message));
}

/// Decode a payload, logging a warning and yielding `None` on garbage.
pub fn decode_or_warn(bytes: &[u8]) -> Option<NetMessage> {
    match bitcode::decode(bytes) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!("dropping undecodable net message ({} bytes): {}", bytes.len(), e);
            None
        }
    }
}

/// Drain the inbox and apply each message to local state.
///
/// Non-hosts request grouse transitions instead of applying them, so when
/// the host applies one here it echoes the message back to the outbox. The
/// echo is what moves the requesting client and everyone else.
#[allow(clippy::too_many_arguments)]
pub fn apply_inbound_messages(
    mut inbox: ResMut<NetInbox>,
    role: Res<NetRole>,
    tick: Res<TickCounter>,
    settings: Res<AmbienceSettings>,
    location: Res<ActiveLocation>,
    grid: Res<ActiveGrid>,
    wind: Res<WindState>,
    trees: Res<TreeDirectory>,
    mut rng: ResMut<SimRng>,
    mut flashes: ResMut<ActiveFlashes>,
    mut smoke: ResMut<SmokeField>,
    mut outbox: ResMut<NetOutbox>,
    mut grouse: Query<(&mut Grouse, &mut GrouseAnim)>,
) {
    for bytes in inbox.0.drain(..) {
        let Some(message) = decode_or_warn(&bytes) else {
            continue;
        };
        match message {
            NetMessage::Explosion {
                location: loc,
                center,
                radius_px,
                time_left,
            } => {
                apply_explosion(
                    ExplosionFlash {
                        location: loc,
                        center: Vec2::new(center[0], center[1]),
                        radius_px,
                        time_left,
                    },
                    &location,
                    &mut flashes,
                    &mut smoke,
                    &grid,
                    &wind,
                    &mut rng,
                    settings.explosion_smoke,
                );
            }
            NetMessage::Grouse {
                grouse_id, event, ..
            } => {
                let Some((mut bird, mut anim)) =
                    grouse.iter_mut().find(|(g, _)| g.id == grouse_id)
                else {
                    warn!("grouse event {:?} for unknown grouse {}", event, grouse_id);
                    continue;
                };
                let applied = match event {
                    GrouseEventKind::Flushed => {
                        // No-op unless still perched.
                        bird.try_flush(&mut anim)
                    }
                    GrouseEventKind::KnockedDown => bird.knock_down(&mut anim),
                    GrouseEventKind::Released => {
                        match trees.find(&bird.location, bird.tree_tile) {
                            Some(tree) => {
                                let canopy = tree.canopy;
                                bird.release_to(canopy, &mut anim);
                                true
                            }
                            None => {
                                warn!(
                                    "released grouse {} has no tree at {:?}",
                                    grouse_id, bird.tree_tile
                                );
                                false
                            }
                        }
                    }
                };
                if applied && role.is_host {
                    queue_message(
                        &mut outbox,
                        &NetMessage::Grouse {
                            grouse_id,
                            event,
                            timestamp: tick.0,
                        },
                    );
                }
            }
        }
    }
}

pub struct NetPlugin;

impl Plugin for NetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NetRole>()
            .init_resource::<NetOutbox>()
            .init_resource::<NetInbox>()
            .add_systems(
                FixedUpdate,
                apply_inbound_messages.in_set(crate::SimSet::Net),
            );
    }
}
