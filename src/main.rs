//! Headless auto-battle run: the autopilot plays the player side until one
//! side's health is gone.

use std::time::Duration;

use auto_skirmish::autopilot::AutopilotPlugin;
use auto_skirmish::prelude::*;
use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

/// Stop the run here even if neither side has been knocked out.
const MAX_ROUNDS: u32 = 40;

fn report_result(round: Res<RoundState>, mut exit: MessageWriter<AppExit>) {
    let result = match round.game_result() {
        Some(GameResult::PlayerWins) => "Player wins",
        Some(GameResult::OpponentWins) => "Opponent wins",
        Some(GameResult::MutualKnockout) => "Mutual knockout",
        None => "Game stopped",
    };
    info!(
        "{result} after {} rounds (health {} / {})",
        round.round, round.player.health, round.opponent.health
    );
    exit.write(AppExit::Success);
}

fn cap_rounds(round: Res<RoundState>, mut exit: MessageWriter<AppExit>) {
    if round.round > MAX_ROUNDS {
        warn!("No winner after {MAX_ROUNDS} rounds, stopping");
        exit.write(AppExit::Success);
    }
}

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
        LogPlugin::default(),
        StatesPlugin,
    ));

    // A table given on the command line replaces the built-in one.
    if let Some(path) = std::env::args().nth(1) {
        match UnitTemplates::from_path(&path) {
            Ok(templates) => {
                info!("Loaded unit templates from {path}");
                app.insert_resource(templates);
            }
            Err(err) => {
                error!("Failed to load unit templates from {path}: {err}");
                return AppExit::error();
            }
        }
    }

    app.add_plugins((auto_skirmish::plugin, AutopilotPlugin));

    // Run as fast as possible: one fixed tick per frame.
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(timestep));

    app.add_systems(OnEnter(GameState::GameOver), report_result)
        .add_systems(OnEnter(Phase::Placement), cap_rounds);

    app.run()
}
