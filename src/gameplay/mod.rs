//! Gameplay domain plugins: units, combat, board, rounds, and presentation cues.

pub mod board;
pub mod combat;
pub mod cues;
pub mod round;
pub mod units;

use bevy::prelude::*;

pub use board::{Board, Boards, Cell};
pub use combat::AttackState;
pub use cues::{AnimationCue, PresentationCue};
pub use units::templates::{TargetCapability, TemplateError, UnitTemplate, UnitTemplates};
pub use units::{
    Airborne, BoardPosition, CombatStats, Facing, Faction, Health, HomeCell, Mobility, Roster,
    Status, Targeting, Unit,
};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        cues::plugin,
        units::plugin,
        combat::plugin,
        board::plugin,
        round::plugin,
    ));
}
