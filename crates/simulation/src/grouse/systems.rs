use bevy::prelude::*;
use rand::Rng;
use std::collections::HashSet;

use crate::config::{
    AmbienceSettings, GROUSE_BOB_AMPLITUDE, GROUSE_BOB_RATE, GROUSE_EXIT_SPEED,
    GROUSE_FLUSH_RADIUS, GROUSE_FLUSH_SECS, GROUSE_FLUSH_SPEED, GROUSE_HIDE_CYCLE_FRAMES,
    GROUSE_KNOCKDOWN_FADE_SECS, GROUSE_LANDING_DISTANCE, GROUSE_LANDING_MIN_SPEED,
    GROUSE_MAX_HEALTH, GROUSE_OFFMAP_GRACE_SECS, GROUSE_SNAP_DISTANCE, GROUSE_SPAWN_PROBABILITY,
    GROUSE_SURPRISE_SECS, GROUSE_TURN_RATE, MAX_GROUSE_PER_LOCATION, TILE_SIZE,
};
use crate::events::{GrouseHitEvent, TreeInteractionEvent, TreeShakeEvent};
use crate::grouse::types::{deterministic_id, exit_direction, Grouse, GrouseAnim, GrouseState};
use crate::net::{queue_message, GrouseEventKind, NetMessage, NetOutbox, NetRole};
use crate::sim_rng::{scoped_rng, SimRng};
use crate::trees::{PerchTree, TreeDirectory};
use crate::world::{ActiveLocation, GameClock, PlayerPositions, WorldSeed};
use crate::TickCounter;

/// Smoothing rate of the cosmetic hide transition, in units per second.
const HIDE_PROGRESS_RATE: f32 = 4.0;

/// Extra margin beyond the map edge before a flier counts as gone.
const OFFMAP_MARGIN: f32 = 2.0 * TILE_SIZE;

/// Read-only surroundings for one state-machine step.
pub struct GrouseCtx<'a> {
    pub dt: f32,
    /// Perch trees in the bird's location.
    pub trees: &'a [PerchTree],
    /// Trunk tiles already claimed by any grouse (perch or flight target).
    pub claimed: &'a HashSet<IVec2>,
    /// Location bounds in world pixels.
    pub bounds: Rect,
}

/// Side effects of one step, applied by the driving system.
#[derive(Debug, Default)]
pub struct StepOutcome {
    pub remove: bool,
    /// Trunk tile whose canopy should visibly shake.
    pub shake: Option<IVec2>,
}

/// Animation frame rate per state, in frames per second. Zero freezes.
fn frame_rate(state: GrouseState) -> f32 {
    match state {
        GrouseState::Perched => 2.0,
        GrouseState::Surprised => 12.0,
        GrouseState::Flushing => 14.0,
        GrouseState::Flying | GrouseState::Landing => 10.0,
        GrouseState::KnockedDown => 0.0,
    }
}

/// Advance the frame clock, returning how many frames elapsed this step.
fn advance_frames(anim: &mut GrouseAnim, state: GrouseState, dt: f32) -> u32 {
    let rate = frame_rate(state);
    if rate <= 0.0 {
        return 0;
    }
    let period = 1.0 / rate;
    anim.frame_timer += dt;
    let mut advances = 0;
    while anim.frame_timer >= period {
        anim.frame_timer -= period;
        anim.frame = anim.frame.wrapping_add(1);
        advances += 1;
    }
    advances
}

/// Pick the next tree to fly to: any perch tree except the current one and
/// ones other grouse have claimed, weighted by squared distance so far-away
/// trees win most draws and the flock spreads out.
pub fn select_new_tree<R: Rng>(
    position: Vec2,
    current: IVec2,
    claimed: &HashSet<IVec2>,
    trees: &[PerchTree],
    rng: &mut R,
) -> Option<PerchTree> {
    let candidates: Vec<&PerchTree> = trees
        .iter()
        .filter(|t| t.tile != current && !claimed.contains(&t.tile))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let weights: Vec<f32> = candidates
        .iter()
        .map(|t| t.canopy.distance_squared(position))
        .collect();
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        // Every candidate sits on the bird; take the first.
        return Some(*candidates[0]);
    }
    let mut draw = rng.gen::<f32>() * total;
    for (tree, weight) in candidates.iter().zip(&weights) {
        draw -= weight;
        if draw <= 0.0 {
            return Some(**tree);
        }
    }
    Some(*candidates[candidates.len() - 1])
}

/// Sinusoidal flap bob, applied as a velocity offset while airborne.
fn flap_bob(flight_timer: f32) -> Vec2 {
    Vec2::new(
        (flight_timer * GROUSE_BOB_RATE * 1.3).sin(),
        (flight_timer * GROUSE_BOB_RATE).sin(),
    ) * GROUSE_BOB_AMPLITUDE
}

fn offmap(position: Vec2, bounds: Rect) -> bool {
    !Rect::from_corners(
        bounds.min - Vec2::splat(OFFMAP_MARGIN),
        bounds.max + Vec2::splat(OFFMAP_MARGIN),
    )
    .contains(position)
}

/// One fixed-timestep step of a single grouse. Pure with respect to the ECS;
/// the caller applies the returned side effects.
pub fn step_grouse<R: Rng>(
    bird: &mut Grouse,
    anim: &mut GrouseAnim,
    ctx: &GrouseCtx,
    rng: &mut R,
) -> StepOutcome {
    let dt = ctx.dt;
    let mut outcome = StepOutcome::default();
    anim.state_timer += dt;
    let advances = advance_frames(anim, bird.state, dt);

    match bird.state {
        GrouseState::Perched => {
            // Peek-a-boo: toggle the hide flag every few perch frames.
            for _ in 0..advances {
                anim.hide_countdown = anim.hide_countdown.saturating_sub(1);
                if anim.hide_countdown == 0 {
                    bird.hiding = !bird.hiding;
                    anim.hide_countdown = GROUSE_HIDE_CYCLE_FRAMES;
                }
            }
            let target = if bird.hiding { 1.0 } else { 0.0 };
            let step = HIDE_PROGRESS_RATE * dt;
            anim.hide_progress += (target - anim.hide_progress).clamp(-step, step);
        }
        GrouseState::Surprised => {
            if anim.state_timer >= GROUSE_SURPRISE_SECS {
                bird.enter(GrouseState::Flushing, anim);
                outcome.shake = Some(bird.tree_tile);
            }
        }
        GrouseState::Flushing => {
            anim.flight_timer += dt;
            let t = (anim.state_timer / GROUSE_FLUSH_SECS).min(1.0);
            let speed = GROUSE_FLUSH_SPEED * (0.3 + 0.7 * t);
            bird.velocity = exit_direction(bird.tree_tile) * speed;
            bird.position += (bird.velocity + flap_bob(anim.flight_timer)) * dt;
            if anim.state_timer >= GROUSE_FLUSH_SECS {
                bird.enter(GrouseState::Flying, anim);
            } else if offmap(bird.position, ctx.bounds) {
                outcome.remove = true;
            }
        }
        GrouseState::Flying => {
            anim.flight_timer += dt;
            if let Some(target) = bird.target_tree {
                if !ctx.trees.iter().any(|t| t.tile == target) {
                    // Target got chopped mid-flight; pick again next tick.
                    bird.target_tree = None;
                }
            }
            if bird.target_tree.is_none() {
                bird.target_tree =
                    select_new_tree(bird.position, bird.tree_tile, ctx.claimed, ctx.trees, rng)
                        .map(|t| t.tile);
            }
            let desired = match bird.target_tree.and_then(|tile| {
                ctx.trees.iter().find(|t| t.tile == tile).map(|t| t.canopy)
            }) {
                Some(canopy) => {
                    let to_target = canopy - bird.position;
                    if to_target.length() <= GROUSE_LANDING_DISTANCE {
                        bird.enter(GrouseState::Landing, anim);
                    }
                    to_target.normalize_or_zero() * GROUSE_EXIT_SPEED
                }
                // Nowhere to land: commit to the exit and leave the map.
                None => exit_direction(bird.tree_tile) * GROUSE_EXIT_SPEED,
            };
            let blend = (GROUSE_TURN_RATE * dt).min(1.0);
            bird.velocity = bird.velocity.lerp(desired, blend);
            bird.position += (bird.velocity + flap_bob(anim.flight_timer)) * dt;
            if offmap(bird.position, ctx.bounds) {
                outcome.remove = true;
            }
        }
        GrouseState::Landing => {
            anim.flight_timer += dt;
            let canopy = bird
                .target_tree
                .and_then(|tile| ctx.trees.iter().find(|t| t.tile == tile))
                .map(|t| t.canopy);
            match canopy {
                Some(canopy) => {
                    let to_target = canopy - bird.position;
                    let dist = to_target.length();
                    if dist <= GROUSE_SNAP_DISTANCE {
                        let tile = bird.target_tree.take().unwrap_or(bird.tree_tile);
                        bird.tree_tile = tile;
                        bird.position = canopy;
                        bird.velocity = Vec2::ZERO;
                        bird.hiding = false;
                        bird.enter(GrouseState::Perched, anim);
                        outcome.shake = Some(tile);
                    } else {
                        // Slow with distance but never stall short of the perch.
                        let speed = (GROUSE_EXIT_SPEED * dist / GROUSE_LANDING_DISTANCE)
                            .max(GROUSE_LANDING_MIN_SPEED);
                        bird.velocity = to_target / dist * speed;
                        bird.position += bird.velocity * dt;
                    }
                }
                None => {
                    // Perch vanished during the approach; climb back out.
                    bird.target_tree = None;
                    bird.enter(GrouseState::Flying, anim);
                }
            }
            if anim.state_timer > GROUSE_OFFMAP_GRACE_SECS && offmap(bird.position, ctx.bounds) {
                outcome.remove = true;
            }
        }
        GrouseState::KnockedDown => {
            bird.position += bird.velocity * dt;
            if anim.flash_timer > 0.0 {
                anim.flash_timer -= dt;
            } else {
                anim.fade -= dt / GROUSE_KNOCKDOWN_FADE_SECS;
                if anim.fade <= 0.0 {
                    outcome.remove = true;
                }
            }
        }
    }
    outcome
}

/// Step every grouse in the active location and apply removals and shakes.
pub fn grouse_state_machine(
    time: Res<Time>,
    location: Res<ActiveLocation>,
    trees: Res<TreeDirectory>,
    mut rng: ResMut<SimRng>,
    mut shakes: EventWriter<TreeShakeEvent>,
    mut commands: Commands,
    mut query: Query<(Entity, &mut Grouse, &mut GrouseAnim)>,
) {
    let dt = time.delta_secs();
    let claimed: HashSet<IVec2> = query
        .iter()
        .flat_map(|(_, bird, _)| {
            bird.target_tree
                .into_iter()
                .chain(std::iter::once(bird.tree_tile))
        })
        .collect();
    let ctx = GrouseCtx {
        dt,
        trees: trees.trees_in(&location.name),
        claimed: &claimed,
        bounds: location.world_bounds(),
    };
    for (entity, mut bird, mut anim) in query.iter_mut() {
        if bird.location != location.name {
            continue;
        }
        let outcome = step_grouse(&mut bird, &mut anim, &ctx, &mut rng.0);
        if let Some(tile) = outcome.shake {
            shakes.send(TreeShakeEvent {
                location: bird.location.clone(),
                tile,
            });
        }
        if outcome.remove {
            commands.entity(entity).despawn();
        }
    }
}

/// Startle perched grouse when a player walks too close. The host applies
/// the flush and broadcasts it; other clients only request it and wait for
/// the echo, so everyone animates from the same transition.
pub fn flush_by_proximity(
    role: Res<NetRole>,
    tick: Res<TickCounter>,
    location: Res<ActiveLocation>,
    players: Res<PlayerPositions>,
    mut outbox: ResMut<NetOutbox>,
    mut query: Query<(&mut Grouse, &mut GrouseAnim)>,
) {
    for (mut bird, mut anim) in query.iter_mut() {
        if bird.state != GrouseState::Perched || bird.location != location.name {
            continue;
        }
        let near = players
            .0
            .iter()
            .any(|p| p.distance(bird.position) <= GROUSE_FLUSH_RADIUS);
        if !near {
            continue;
        }
        if role.is_host {
            if bird.try_flush(&mut anim) {
                queue_message(
                    &mut outbox,
                    &NetMessage::Grouse {
                        grouse_id: bird.id,
                        event: GrouseEventKind::Flushed,
                        timestamp: tick.0,
                    },
                );
            }
        } else if !anim.flush_requested {
            // One request per perch; the bird stays Perched until the host
            // echo lands, so without the latch this would resend every tick.
            anim.flush_requested = true;
            queue_message(
                &mut outbox,
                &NetMessage::Grouse {
                    grouse_id: bird.id,
                    event: GrouseEventKind::Flushed,
                    timestamp: tick.0,
                },
            );
        }
    }
}

/// Startle grouse perched on a tree the player hit or shook.
pub fn flush_by_tree_interaction(
    role: Res<NetRole>,
    tick: Res<TickCounter>,
    mut events: EventReader<TreeInteractionEvent>,
    mut outbox: ResMut<NetOutbox>,
    mut query: Query<(&mut Grouse, &mut GrouseAnim)>,
) {
    for event in events.read() {
        for (mut bird, mut anim) in query.iter_mut() {
            if bird.location != event.location
                || bird.tree_tile != event.tile
                || bird.state != GrouseState::Perched
            {
                continue;
            }
            let applied = if role.is_host {
                bird.try_flush(&mut anim)
            } else if anim.flush_requested {
                false
            } else {
                anim.flush_requested = true;
                true
            };
            if applied {
                queue_message(
                    &mut outbox,
                    &NetMessage::Grouse {
                        grouse_id: bird.id,
                        event: GrouseEventKind::Flushed,
                        timestamp: tick.0,
                    },
                );
            }
        }
    }
}

/// Apply shot damage. The shooter is authoritative for its own hit: damage
/// lands locally and the knockdown (if any) is broadcast.
pub fn handle_grouse_hits(
    settings: Res<AmbienceSettings>,
    tick: Res<TickCounter>,
    mut events: EventReader<GrouseHitEvent>,
    mut outbox: ResMut<NetOutbox>,
    mut query: Query<(&mut Grouse, &mut GrouseAnim)>,
) {
    for event in events.read() {
        let Some((mut bird, mut anim)) =
            query.iter_mut().find(|(g, _)| g.id == event.grouse_id)
        else {
            warn!("hit event for unknown grouse {}", event.grouse_id);
            continue;
        };
        if bird.state == GrouseState::KnockedDown {
            continue;
        }
        bird.health -= settings.pellets_per_shot as i32;
        if bird.health <= 0 && bird.knock_down(&mut anim) {
            queue_message(
                &mut outbox,
                &NetMessage::Grouse {
                    grouse_id: bird.id,
                    event: GrouseEventKind::KnockedDown,
                    timestamp: tick.0,
                },
            );
        }
    }
}

/// Tracks which `(day, location)` the current grouse population belongs to.
#[derive(Resource, Debug, Clone, Default)]
pub struct GrouseSpawnState {
    pub day: u32,
    pub location: String,
}

/// Daily deterministic spawn roll.
///
/// Every client runs the same roll from the same scoped RNG stream, so the
/// same trees get the same birds with the same IDs and nothing needs to be
/// transmitted. Reruns whenever the day or location changes, replacing the
/// previous population.
pub fn spawn_daily_grouse(
    settings: Res<AmbienceSettings>,
    clock: Res<GameClock>,
    seed: Res<WorldSeed>,
    location: Res<ActiveLocation>,
    trees: Res<TreeDirectory>,
    mut state: ResMut<GrouseSpawnState>,
    mut commands: Commands,
    existing: Query<Entity, With<Grouse>>,
) {
    if state.day == clock.day && state.location == location.name {
        return;
    }
    state.day = clock.day;
    state.location = location.name.clone();
    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }
    if !settings.grouse_enabled || !location.outdoors {
        return;
    }
    let mut rng = scoped_rng(&location.name, clock.day, seed.0);
    let mut spawned = 0;
    for tree in trees.trees_in(&location.name) {
        if spawned >= MAX_GROUSE_PER_LOCATION {
            break;
        }
        if rng.gen::<f32>() >= GROUSE_SPAWN_PROBABILITY {
            continue;
        }
        let id = deterministic_id(&location.name, clock.day, tree.tile, None);
        // Desync the hide cycles so birds don't peek in lockstep.
        let offset = id % GROUSE_HIDE_CYCLE_FRAMES;
        commands.spawn((
            Grouse {
                id,
                location: location.name.clone(),
                tree_tile: tree.tile,
                state: GrouseState::Perched,
                position: tree.canopy,
                velocity: Vec2::ZERO,
                hiding: false,
                target_tree: None,
                health: GROUSE_MAX_HEALTH,
            },
            GrouseAnim {
                hide_countdown: 1 + offset,
                ..Default::default()
            },
        ));
        spawned += 1;
    }
    if spawned > 0 {
        debug!(
            "spawned {} grouse in {} for day {}",
            spawned, location.name, clock.day
        );
    }
}

/// Spawn an extra grouse outside the daily roll (a farmer releasing a caught
/// bird onto a tree). Host-invoked: the host picks the salt and calls this
/// with the same value on every client, so the bird's ID matches everywhere
/// and cannot collide with the tree's natural daily spawn.
pub fn launch_grouse(
    commands: &mut Commands,
    location: &str,
    day: u32,
    tree: &PerchTree,
    salt: u32,
) -> u32 {
    let id = deterministic_id(location, day, tree.tile, Some(salt));
    let offset = id % GROUSE_HIDE_CYCLE_FRAMES;
    commands.spawn((
        Grouse {
            id,
            location: location.to_string(),
            tree_tile: tree.tile,
            state: GrouseState::Perched,
            position: tree.canopy,
            velocity: Vec2::ZERO,
            hiding: false,
            target_tree: None,
            health: GROUSE_MAX_HEALTH,
        },
        GrouseAnim {
            hide_countdown: 1 + offset,
            ..Default::default()
        },
    ));
    id
}
