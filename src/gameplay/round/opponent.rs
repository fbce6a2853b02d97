//! Opponent wave planner: random reservations on the hidden board.

use std::ops::Range;

use rand::Rng;

use super::Funds;
use crate::gameplay::board::{BOARD_DEPTH, BOARD_WIDTH, Boards, Cell};
use crate::gameplay::units::templates::{UnitTemplate, UnitTemplates};

/// Row bands the opponent deploys into. One is picked per round.
const DEPTH_BANDS: [Range<u32>; 3] = [20..27, 27..33, 33..BOARD_DEPTH];

/// Per-cell roll chances, with the first round each template becomes available.
const WAVE_ROLLS: [(UnitTemplate, f64, u32); 3] = [
    (UnitTemplate::LightInfantry, 0.02, 1),
    (UnitTemplate::Armor, 0.01, 2),
    (UnitTemplate::Flyer, 0.01, 4),
];

/// Reserve a random opponent wave on the hidden board, paying from `funds`.
///
/// Cells already reserved on either board are skipped. At most one template is
/// placed per cell: rolls are tried in order and the first success wins.
/// Returns the templates placed, in placement order.
pub fn plan_opponent_wave(
    boards: &mut Boards,
    funds: &mut Funds,
    round: u32,
    templates: &UnitTemplates,
    rng: &mut impl Rng,
) -> Vec<UnitTemplate> {
    let band = DEPTH_BANDS[rng.random_range(0..DEPTH_BANDS.len())].clone();
    let mut wave = Vec::new();

    for row in band {
        for col in 0..BOARD_WIDTH {
            let cell = Cell::new(row, col);
            if !boards.visible.is_empty(cell) || !boards.hidden.is_empty(cell) {
                continue;
            }
            for &(template, chance, first_round) in &WAVE_ROLLS {
                if !rng.random_bool(chance) {
                    continue;
                }
                let cost = templates.get(template).cost;
                if round < first_round || funds.try_spend(cost).is_err() {
                    continue;
                }
                if boards.hidden.place(cell, template).is_ok() {
                    wave.push(template);
                }
                break;
            }
        }
    }

    wave
}
