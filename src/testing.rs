//! Testing utilities for the simulation.

#![cfg(test)]

use bevy::ecs::query::QueryFilter;
use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use crate::gameplay::board::{Boards, Cell};
use crate::gameplay::cues::PresentationCue;
use crate::gameplay::round::{
    AdvancePhase, BattleClock, PlacementRejected, RoundResolved,
};
use crate::gameplay::units::templates::{UnitTemplate, UnitTemplates};
use crate::gameplay::units::{Roster, spawn_unit};
use crate::{GameState, Phase, TICK_HZ};

/// Every message of type `T` seen since the app was created.
#[derive(Resource)]
pub struct MessageLog<T: Message>(Vec<T>);

impl<T: Message> Default for MessageLog<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Message> MessageLog<T> {
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

fn record_messages<T: Message + Clone>(
    mut reader: MessageReader<T>,
    mut log: ResMut<MessageLog<T>>,
) {
    log.0.extend(reader.read().cloned());
}

fn log_messages<T: Message + Clone>(app: &mut App) {
    app.init_resource::<MessageLog<T>>()
        .add_systems(Last, record_messages::<T>);
}

/// Full simulation app on a deterministic clock: every `update` after the
/// first advances exactly one fixed tick.
pub fn create_sim_test_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.add_plugins(crate::plugin);

    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(timestep));

    log_messages::<PresentationCue>(&mut app);
    log_messages::<PlacementRejected>(&mut app);
    log_messages::<RoundResolved>(&mut app);

    app.update(); // First update has a zero delta
    app
}

/// Intro → InGame, landing in `Phase::Placement` of round one.
pub fn start_game(app: &mut App) {
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::InGame);
    app.update();
}

/// Enter the battle phase with no opponent wave and the warm-up already over.
pub fn enter_empty_battle(app: &mut App) {
    app.world_mut().resource_mut::<Boards>().hidden.clear();
    app.world_mut()
        .resource_mut::<NextState<Phase>>()
        .set(Phase::Battle);
    app.update();
    app.world_mut().resource_mut::<BattleClock>().skip_warmup();
}

/// Send `AdvancePhase` and let the resulting transition apply.
pub fn advance_phase(app: &mut App) {
    app.world_mut().write_message(AdvancePhase);
    app.update();
    app.update();
}

/// Spawn a unit on `cell`; its faction follows the cell's row.
pub fn spawn_test_unit(app: &mut App, template: UnitTemplate, cell: Cell) -> Entity {
    app.world_mut()
        .run_system_once(
            move |mut commands: Commands,
                  mut roster: ResMut<Roster>,
                  templates: Res<UnitTemplates>| {
                spawn_unit(
                    &mut commands,
                    &mut roster,
                    &templates,
                    template,
                    cell.faction(),
                    cell,
                )
            },
        )
        .expect("spawn system should run")
}

/// Helper to advance the app by multiple frames.
pub fn tick_multiple(app: &mut App, count: usize) {
    for _ in 0..count {
        app.update();
    }
}

/// Advance enough fixed ticks to cover `seconds` of simulated time.
pub fn tick_seconds(app: &mut App, seconds: f32) {
    let ticks = (f64::from(seconds) * TICK_HZ).ceil() as usize;
    tick_multiple(app, ticks);
}

/// Assert how many entities match the query filter `F`.
pub fn assert_entity_count<F: QueryFilter>(app: &mut App, expected: usize) {
    let count = app
        .world_mut()
        .query_filtered::<Entity, F>()
        .iter(app.world())
        .count();
    assert_eq!(count, expected, "entity count mismatch");
}
