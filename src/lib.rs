//! Round-based auto-battle simulation core.
//!
//! Units placed on a grid board autonomously acquire targets, steer, and attack
//! until one side is eliminated or the battle countdown runs out. Rendering,
//! audio, and input live outside this crate and talk to it through messages
//! (see [`gameplay::cues`] and [`gameplay::round`]).

pub mod autopilot;
pub mod gameplay;
pub mod prelude;
#[cfg(test)]
pub mod testing;

use bevy::prelude::*;

use crate::gameplay::round::{BattleClock, RoundState};

/// Simulation tick rate. Turning speeds are expressed per tick of this clock.
pub const TICK_HZ: f64 = 60.0;

/// Primary game states.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Waiting for the first `AdvancePhase`.
    #[default]
    Intro,
    /// A game is running.
    InGame,
    /// One side's cumulative health reached zero.
    GameOver,
}

/// Round phases. Only exists while `GameState::InGame` is active.
#[derive(SubStates, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[source(GameState = GameState::InGame)]
pub enum Phase {
    /// Units can be bought and placed; nothing moves.
    #[default]
    Placement,
    /// Units fight until the round resolves.
    Battle,
}

/// Per-tick battle ordering, all in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattleSet {
    /// Warm-up and countdown.
    Clock,
    /// Nearest enemy / ally resolution.
    Targeting,
    /// Facing and position updates.
    Steering,
    /// Attack timers and damage.
    Combat,
    /// Fading and removal of dead units.
    Decay,
    /// Round outcome polling.
    Resolution,
}

/// UI command handling, in `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandSet;

/// Run condition: the battle phase has started and its round is not yet resolved.
pub fn battle_in_progress(round: Res<RoundState>) -> bool {
    !round.resolved
}

/// Run condition: the battle warm-up is over and the round is still open.
/// Movement, targeting, attacks, and outcome polling only run while this holds.
pub fn battle_live(clock: Res<BattleClock>, round: Res<RoundState>) -> bool {
    clock.is_live() && !round.resolved
}

/// Adds the whole simulation core. Requires `StatesPlugin` and a time source
/// (`MinimalPlugins` or `DefaultPlugins`).
pub fn plugin(app: &mut App) {
    app.init_state::<GameState>()
        .add_sub_state::<Phase>()
        .insert_resource(Time::<Fixed>::from_hz(TICK_HZ));

    app.configure_sets(
        FixedUpdate,
        (
            BattleSet::Clock,
            BattleSet::Targeting,
            BattleSet::Steering,
            BattleSet::Combat,
            BattleSet::Decay,
            BattleSet::Resolution,
        )
            .chain(),
    );

    app.add_plugins(gameplay::plugin);
}
