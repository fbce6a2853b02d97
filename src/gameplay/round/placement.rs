//! Player placement commands: validation, spending, and materializing the unit.

use std::fmt;

use bevy::prelude::*;

use super::{PlaceUnit, PlacementRejected, RoundState};
use crate::Phase;
use crate::gameplay::board::{Boards, Cell};
use crate::gameplay::units::templates::UnitTemplates;
use crate::gameplay::units::{Faction, Roster, spawn_unit};

/// Why a placement command was refused. Refusals never change any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    /// Placement is only open during `Phase::Placement`.
    WrongPhase,
    OutOfBounds(Cell),
    /// The cell is on the board but not in the player's rows.
    OutsidePlayerZone(Cell),
    Occupied(Cell),
    InsufficientFunds {
        cost: u32,
        available: u32,
    },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPhase => f.write_str("units can only be placed during the placement phase"),
            Self::OutOfBounds(cell) => write!(f, "cell {cell} is off the board"),
            Self::OutsidePlayerZone(cell) => write!(f, "cell {cell} is outside the player zone"),
            Self::Occupied(cell) => write!(f, "cell {cell} is already occupied"),
            Self::InsufficientFunds { cost, available } => {
                write!(f, "not enough funds: costs {cost}, have {available}")
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// Check a placement without touching any state.
pub fn validate_placement(
    phase: Option<Phase>,
    boards: &Boards,
    available: u32,
    cell: Cell,
    cost: u32,
) -> Result<(), PlacementError> {
    if phase != Some(Phase::Placement) {
        return Err(PlacementError::WrongPhase);
    }
    if !cell.in_bounds() {
        return Err(PlacementError::OutOfBounds(cell));
    }
    if !cell.in_player_zone() {
        return Err(PlacementError::OutsidePlayerZone(cell));
    }
    if !boards.visible.is_empty(cell) {
        return Err(PlacementError::Occupied(cell));
    }
    if cost > available {
        return Err(PlacementError::InsufficientFunds { cost, available });
    }
    Ok(())
}

/// Applies `PlaceUnit` commands in arrival order. Runs in `CommandSet`.
pub(super) fn handle_place_unit(
    mut commands: Commands,
    mut requests: MessageReader<PlaceUnit>,
    phase: Option<Res<State<Phase>>>,
    templates: Res<UnitTemplates>,
    mut boards: ResMut<Boards>,
    mut round: ResMut<RoundState>,
    mut roster: ResMut<Roster>,
    mut rejected: MessageWriter<PlacementRejected>,
) {
    let phase = phase.map(|phase| *phase.get());

    for &PlaceUnit { template, cell } in requests.read() {
        let cost = templates.get(template).cost;
        let placed = validate_placement(phase, &boards, round.player.funds.0, cell, cost)
            .and_then(|()| round.player.funds.try_spend(cost))
            .and_then(|()| boards.visible.place(cell, template));

        match placed {
            Ok(()) => {
                spawn_unit(
                    &mut commands,
                    &mut roster,
                    &templates,
                    template,
                    Faction::Player,
                    cell,
                );
                debug!("Placed {template} at {cell}, {} funds left", round.player.funds.0);
            }
            Err(error) => {
                warn!("Rejected {template} at {cell}: {error}");
                rejected.write(PlacementRejected {
                    template,
                    cell,
                    error,
                });
            }
        }
    }
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::gameplay::units::templates::UnitTemplate;
    use crate::testing::{MessageLog, create_sim_test_app, start_game};
    use pretty_assertions::assert_eq;

    fn place(app: &mut App, template: UnitTemplate, cell: Cell) {
        app.world_mut().write_message(PlaceUnit { template, cell });
        app.update();
    }

    #[test]
    fn placement_spends_funds_and_spawns_unit() {
        let mut app = create_sim_test_app();
        start_game(&mut app);
        let funds = app.world().resource::<RoundState>().player.funds.0;

        place(&mut app, UnitTemplate::LightInfantry, Cell::new(5, 5));

        let world = app.world();
        assert_eq!(world.resource::<RoundState>().player.funds.0, funds - 50);
        assert_eq!(
            world.resource::<Boards>().visible.get(Cell::new(5, 5)),
            Some(UnitTemplate::LightInfantry)
        );
        assert_eq!(world.resource::<Roster>().len(), 1);
    }

    #[test]
    fn rejected_placement_changes_nothing() {
        let mut app = create_sim_test_app();
        start_game(&mut app);
        let funds = app.world().resource::<RoundState>().player.funds.0;

        // Round one grants 150: a siege costs 500.
        place(&mut app, UnitTemplate::Siege, Cell::new(5, 5));

        let world = app.world();
        assert_eq!(world.resource::<RoundState>().player.funds.0, funds);
        assert!(world.resource::<Boards>().visible.is_empty(Cell::new(5, 5)));
        assert!(world.resource::<Roster>().is_empty());
        let rejected: Vec<_> = world
            .resource::<MessageLog<PlacementRejected>>()
            .iter()
            .cloned()
            .collect();
        assert_eq!(
            rejected,
            vec![PlacementRejected {
                template: UnitTemplate::Siege,
                cell: Cell::new(5, 5),
                error: PlacementError::InsufficientFunds {
                    cost: 500,
                    available: funds
                },
            }]
        );
    }

    #[test]
    fn second_unit_on_same_cell_is_rejected() {
        let mut app = create_sim_test_app();
        start_game(&mut app);

        place(&mut app, UnitTemplate::LightInfantry, Cell::new(5, 5));
        place(&mut app, UnitTemplate::LightInfantry, Cell::new(5, 5));

        assert_eq!(app.world().resource::<Roster>().len(), 1);
        assert_eq!(
            app.world().resource::<MessageLog<PlacementRejected>>().len(),
            1
        );
    }
}
