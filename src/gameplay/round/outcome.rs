//! Round outcome rules.

use bevy::prelude::*;

/// Living units per side at the moment of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Census {
    pub player: u32,
    pub opponent: u32,
}

/// How a round ended and what each side loses in cumulative health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum RoundOutcome {
    /// Every player unit died.
    OpponentWins { player_loss: u32 },
    /// Every opponent unit died.
    PlayerWins { opponent_loss: u32 },
    /// The countdown ran out with both sides standing.
    Draw { player_loss: u32, opponent_loss: u32 },
}

impl RoundOutcome {
    #[must_use]
    pub const fn player_loss(self) -> u32 {
        match self {
            Self::OpponentWins { player_loss } | Self::Draw { player_loss, .. } => player_loss,
            Self::PlayerWins { .. } => 0,
        }
    }

    #[must_use]
    pub const fn opponent_loss(self) -> u32 {
        match self {
            Self::PlayerWins { opponent_loss } | Self::Draw { opponent_loss, .. } => opponent_loss,
            Self::OpponentWins { .. } => 0,
        }
    }
}

/// Decide the round, if it is over. Player elimination is checked first, then
/// opponent elimination, then the countdown. Each side loses one health per
/// enemy unit still alive.
#[must_use]
pub const fn evaluate_outcome(census: Census, countdown_expired: bool) -> Option<RoundOutcome> {
    if census.player == 0 {
        Some(RoundOutcome::OpponentWins {
            player_loss: census.opponent,
        })
    } else if census.opponent == 0 {
        Some(RoundOutcome::PlayerWins {
            opponent_loss: census.player,
        })
    } else if countdown_expired {
        Some(RoundOutcome::Draw {
            player_loss: census.opponent,
            opponent_loss: census.player,
        })
    } else {
        None
    }
}
