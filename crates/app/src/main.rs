use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;

use simulation::config::AmbienceSettings;
use simulation::draw::DrawLists;
use simulation::events::ExplosionEvent;
use simulation::forecast::FogForecast;
use simulation::grouse::Grouse;
use simulation::trees::{PerchTree, TreeDirectory};
use simulation::world::{ActiveLocation, PlayerPositions, WorldSeed};
use simulation::{SimulationPlugin, TickCounter};

/// Ticks the headless demo runs before exiting (~60 in-game seconds).
const DEMO_TICKS: u64 = 600;

fn main() {
    let mut app = App::new();

    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(100))),
    );
    app.add_plugins(bevy::log::LogPlugin::default());
    app.insert_resource(Time::<Fixed>::from_seconds(0.1));
    app.add_plugins(SimulationPlugin);

    // A small demo world standing in for the host engine.
    app.insert_resource(WorldSeed(0xA17B));
    app.insert_resource(ActiveLocation {
        name: "Vale".to_string(),
        size_tiles: IVec2::new(120, 90),
        outdoors: true,
    });
    app.insert_resource(PlayerPositions(vec![Vec2::new(640.0, 360.0)]));
    app.insert_resource(AmbienceSettings {
        // Show the fields regardless of what today's forecast rolled.
        daily_random_fog: false,
        ..Default::default()
    });

    app.add_systems(Startup, plant_demo_trees);
    app.add_systems(Update, drive_demo);

    app.run();
}

fn plant_demo_trees(mut trees: ResMut<TreeDirectory>) {
    let tiles = [
        IVec2::new(12, 20),
        IVec2::new(30, 14),
        IVec2::new(48, 33),
        IVec2::new(70, 18),
        IVec2::new(95, 40),
        IVec2::new(55, 60),
        IVec2::new(22, 55),
        IVec2::new(84, 70),
    ];
    trees.set_location("Vale", tiles.iter().map(|&t| PerchTree::at_tile(t)).collect());
    info!("planted {} perch trees", tiles.len());
}

fn drive_demo(
    tick: Res<TickCounter>,
    forecast: Res<FogForecast>,
    lists: Res<DrawLists>,
    birds: Query<&Grouse>,
    mut explosions: EventWriter<ExplosionEvent>,
    mut exit: EventWriter<AppExit>,
    mut last_report: Local<u64>,
    mut detonated: Local<bool>,
) {
    // One detonation partway through, so smoke and flash tinting show up.
    if tick.0 >= DEMO_TICKS / 2 && !*detonated {
        *detonated = true;
        info!("demo: detonating at the vale center");
        explosions.send(ExplosionEvent {
            location: "Vale".to_string(),
            center: Vec2::new(640.0, 360.0),
            radius_px: 200.0,
        });
    }

    if tick.0 >= *last_report + 100 {
        *last_report = tick.0;
        info!(
            "tick {}: fog_day={} fog={} smoke={} grouse={}",
            tick.0,
            forecast.is_fog_day,
            lists.fog.len(),
            lists.smoke.len(),
            birds.iter().count(),
        );
    }

    if tick.0 >= DEMO_TICKS {
        info!("demo finished after {} ticks", tick.0);
        exit.send(AppExit::Success);
    }
}
