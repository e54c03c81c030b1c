use bevy::prelude::*;

pub mod color;
pub mod config;
pub mod draw;
pub mod events;
pub mod explosions;
pub mod forecast;
pub mod grouse;
pub mod lights;
pub mod net;
pub mod occupancy;
pub mod particles;
pub mod sim_rng;
pub mod spatial_grid;
pub mod trees;
pub mod world;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

/// Fixed-tick phases, in execution order. Host mirror state settles before
/// the grid rebuild, fields before behavior, and the network bridge last so
/// inbound messages apply to a fully-ticked world.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Host mirror upkeep: elapsed clock, wind drift.
    Context,
    /// Viewport grid rebuild.
    Grid,
    /// Daily forecast roll.
    Forecast,
    /// Fog and smoke field ticks, explosions.
    Particles,
    /// Grouse spawning and state machine.
    Behavior,
    /// Inbound session messages.
    Net,
    /// Draw-list assembly from the settled tick.
    Draw,
}

/// Global tick counter incremented each FixedUpdate. Stamped onto outbound
/// session messages.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

pub fn advance_tick(mut tick: ResMut<TickCounter>) {
    tick.0 = tick.0.wrapping_add(1);
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>()
            .init_resource::<config::AmbienceSettings>()
            .init_resource::<lights::LightSources>()
            .init_resource::<trees::TreeDirectory>()
            .init_resource::<spatial_grid::ActiveGrid>()
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Context,
                    SimSet::Grid,
                    SimSet::Forecast,
                    SimSet::Particles,
                    SimSet::Behavior,
                    SimSet::Net,
                    SimSet::Draw,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    advance_tick,
                    world::advance_sim_elapsed,
                    world::drift_wind,
                )
                    .in_set(SimSet::Context),
            )
            .add_systems(
                FixedUpdate,
                spatial_grid::rebuild_view_grid.in_set(SimSet::Grid),
            );

        app.add_plugins((
            sim_rng::SimRngPlugin,
            world::WorldPlugin,
            events::EventsPlugin,
            forecast::ForecastPlugin,
            particles::ParticlesPlugin,
            explosions::ExplosionsPlugin,
            grouse::GrousePlugin,
            net::NetPlugin,
            draw::DrawPlugin,
        ));
    }
}
