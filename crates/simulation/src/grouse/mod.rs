//! Grouse critters: a small state-machine bird that perches in trees,
//! flushes when startled, and relocates to another tree or leaves the map.
//!
//! Spawning is a deterministic daily roll shared by every client, so the
//! population and its IDs agree across the session without any exchange.
//! State transitions replicate through the event bridge.

pub mod systems;
mod tests;
pub mod types;

pub use systems::{
    flush_by_proximity, flush_by_tree_interaction, grouse_state_machine, handle_grouse_hits,
    launch_grouse, select_new_tree, spawn_daily_grouse, step_grouse, GrouseCtx, GrouseSpawnState,
    StepOutcome,
};
pub use types::{deterministic_id, exit_direction, Grouse, GrouseAnim, GrouseState};

use bevy::prelude::*;

pub struct GrousePlugin;

impl Plugin for GrousePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GrouseSpawnState>().add_systems(
            FixedUpdate,
            (
                spawn_daily_grouse,
                flush_by_proximity,
                flush_by_tree_interaction,
                handle_grouse_hits,
                grouse_state_machine,
            )
                .chain()
                .in_set(crate::SimSet::Behavior),
        );
    }
}
