//! # TestVale — headless integration test harness
//!
//! A fluent builder wrapping `bevy::app::App` + `SimulationPlugin` for
//! running integration tests without a window or renderer.

use bevy::app::App;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use crate::config::AmbienceSettings;
use crate::draw::DrawLists;
use crate::explosions::ActiveFlashes;
use crate::grouse::{Grouse, GrouseAnim};
use crate::net::{NetInbox, NetMessage, NetOutbox, NetRole};
use crate::particles::{FogField, SmokeField};
use crate::trees::{PerchTree, TreeDirectory};
use crate::world::{ActiveLocation, GameClock, PlayerPositions, Viewport, WorldSeed};
use crate::SimulationPlugin;

/// A headless Bevy App wrapping `SimulationPlugin` for integration testing.
///
/// Use the builder methods to describe the host world, then call `tick()` to
/// advance the simulation and assert on resources and entities.
pub struct TestVale {
    app: App,
}

impl Default for TestVale {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVale {
    /// An outdoor 100x100-tile location called "Forest" with a 1280x720
    /// viewport at the origin and no trees.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        // The simulation runs on a 100ms fixed timestep (10 Hz). Pin the
        // clock to a manual 100ms advance per update: the default strategy
        // reads the wall clock, which would make `FixedUpdate` fire on real
        // elapsed time instead of once per `tick()`.
        app.insert_resource(Time::<Fixed>::from_seconds(0.1));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)));
        app.add_plugins(SimulationPlugin);
        app.insert_resource(ActiveLocation {
            name: "Forest".to_string(),
            size_tiles: IVec2::new(100, 100),
            outdoors: true,
        });
        // Run one update so Startup and first-tick init settle.
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // World setup (builder pattern — consumes and returns Self)
    // -----------------------------------------------------------------------

    pub fn with_viewport(mut self, top_left: Vec2, size: Vec2) -> Self {
        self.app
            .world_mut()
            .insert_resource(Viewport { top_left, size });
        self
    }

    pub fn with_location(mut self, name: &str, size_tiles: IVec2, outdoors: bool) -> Self {
        self.app.world_mut().insert_resource(ActiveLocation {
            name: name.to_string(),
            size_tiles,
            outdoors,
        });
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.app.world_mut().insert_resource(WorldSeed(seed));
        self
    }

    pub fn with_day(mut self, day: u32) -> Self {
        self.app
            .world_mut()
            .resource_mut::<GameClock>()
            .day = day;
        self
    }

    pub fn with_hour(mut self, hour: f32) -> Self {
        self.app
            .world_mut()
            .resource_mut::<GameClock>()
            .hour = hour;
        self
    }

    /// Register perch trees for a location.
    pub fn with_trees(mut self, location: &str, tiles: &[IVec2]) -> Self {
        let trees: Vec<PerchTree> = tiles.iter().map(|&t| PerchTree::at_tile(t)).collect();
        self.app
            .world_mut()
            .resource_mut::<TreeDirectory>()
            .set_location(location, trees);
        self
    }

    pub fn with_players(mut self, positions: &[Vec2]) -> Self {
        self.app
            .world_mut()
            .insert_resource(PlayerPositions(positions.to_vec()));
        self
    }

    pub fn with_settings(mut self, settings: AmbienceSettings) -> Self {
        self.app.world_mut().insert_resource(settings);
        self
    }

    /// Run as a non-host session member.
    pub fn as_client(mut self) -> Self {
        self.app
            .world_mut()
            .insert_resource(NetRole { is_host: false });
        self
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Advance `n` fixed ticks of 100ms each. With the manual-duration time
    /// strategy every `update()` moves the clock exactly one fixed step, so
    /// each call here runs `FixedUpdate` exactly `n` times.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Send an event into the simulation.
    pub fn send_event<E: Event>(&mut self, event: E) {
        self.app.world_mut().send_event(event);
    }

    /// Push a session message into the inbox, as the transport would.
    pub fn push_inbound(&mut self, message: &NetMessage) {
        self.app
            .world_mut()
            .resource_mut::<NetInbox>()
            .0
            .push(bitcode::encode(message));
    }

    /// Take everything queued for the transport to send.
    pub fn drain_outbox(&mut self) -> Vec<NetMessage> {
        self.app
            .world_mut()
            .resource_mut::<NetOutbox>()
            .0
            .drain(..)
            .filter_map(|bytes| bitcode::decode(&bytes).ok())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<R: Resource>(&self) -> &R {
        self.app.world().resource::<R>()
    }

    pub fn fog_particle_count(&self) -> usize {
        self.resource::<FogField>().0.len()
    }

    pub fn smoke_particle_count(&self) -> usize {
        self.resource::<SmokeField>().0.len()
    }

    pub fn flash_count(&self) -> usize {
        self.resource::<ActiveFlashes>().0.len()
    }

    pub fn draw_lists(&self) -> &DrawLists {
        self.resource::<DrawLists>()
    }

    /// Snapshot of every grouse, in spawn order.
    pub fn grouse(&mut self) -> Vec<(Grouse, GrouseAnim)> {
        let world = self.app.world_mut();
        let mut query = world.query::<(&Grouse, &GrouseAnim)>();
        query
            .iter(world)
            .map(|(g, a)| (g.clone(), a.clone()))
            .collect()
    }
}
