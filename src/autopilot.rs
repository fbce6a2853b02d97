//! Scripted player for headless runs: buys random units each placement phase
//! and advances through every round until the game ends.

use bevy::prelude::*;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::gameplay::board::{BOARD_WIDTH, Boards, Cell, PLAYER_PLACEMENT_ROWS};
use crate::gameplay::round::{AdvancePhase, PlaceUnit, RoundResolved, RoundState, enter_placement};
use crate::gameplay::units::templates::{UnitTemplate, UnitTemplates};
use crate::{CommandSet, GameState, Phase};

/// Rows the autopilot deploys into, closest to the front line.
const DEPLOY_ROWS: std::ops::Range<u32> = 10..PLAYER_PLACEMENT_ROWS;

/// Give up looking for a free cell after this many random picks.
const MAX_CELL_ATTEMPTS: usize = 64;

fn start_game(mut advance: MessageWriter<AdvancePhase>) {
    advance.write(AdvancePhase);
}

/// Spend the player's funds on random affordable templates, then start the battle.
fn plan_purchases(
    round: Res<RoundState>,
    boards: Res<Boards>,
    templates: Res<UnitTemplates>,
    mut place: MessageWriter<PlaceUnit>,
    mut advance: MessageWriter<AdvancePhase>,
) {
    let mut rng = rand::rng();
    let mut funds = round.player.funds.0;
    let mut taken: Vec<Cell> = Vec::new();

    while funds >= templates.cheapest_cost() {
        let affordable: Vec<UnitTemplate> = UnitTemplate::ALL
            .iter()
            .copied()
            .filter(|&template| templates.get(template).cost <= funds)
            .collect();
        let Some(&template) = affordable.choose(&mut rng) else {
            break;
        };

        let cell = (0..MAX_CELL_ATTEMPTS)
            .map(|_| {
                Cell::new(
                    rng.random_range(DEPLOY_ROWS),
                    rng.random_range(0..BOARD_WIDTH),
                )
            })
            .find(|cell| boards.visible.is_empty(*cell) && !taken.contains(cell));
        let Some(cell) = cell else {
            break;
        };

        funds -= templates.get(template).cost;
        taken.push(cell);
        place.write(PlaceUnit { template, cell });
    }

    info!("Autopilot places {} units in round {}", taken.len(), round.round);
    advance.write(AdvancePhase);
}

fn continue_after_round(
    mut resolved: MessageReader<RoundResolved>,
    mut advance: MessageWriter<AdvancePhase>,
) {
    if resolved.read().any(|message| !message.game_over) {
        advance.write(AdvancePhase);
    }
}

/// Drives the simulation without input. Add after [`crate::plugin`].
pub struct AutopilotPlugin;

impl Plugin for AutopilotPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Intro), start_game);
        app.add_systems(
            OnEnter(Phase::Placement),
            plan_purchases.after(enter_placement),
        );
        app.add_systems(Update, continue_after_round.before(CommandSet));
    }
}
