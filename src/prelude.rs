//! Common imports for the entire crate.

pub use bevy::prelude::*;

pub use crate::gameplay::round::{
    AdvancePhase, GameResult, PlaceUnit, PlacementRejected, RoundOutcome, RoundResolved, RoundState,
};
pub use crate::gameplay::*;
pub use crate::{BattleSet, CommandSet, GameState, Phase};
