//! Targeting: nearest valid enemy and nearest ally for every living unit.

use bevy::prelude::*;

use super::templates::TargetCapability;
use super::{Airborne, BoardPosition, CombatStats, Faction, Roster, Status, Targeting, Unit};
use crate::gameplay::combat::AttackState;

/// Snapshot of one roster entry as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub entity: Entity,
    pub faction: Faction,
    pub position: Vec2,
    pub alive: bool,
    pub airborne: bool,
}

/// Result of one scan. Either side may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub enemy: Option<Entity>,
    pub ally: Option<Entity>,
}

/// Single linear scan over `roster` for the unit `me`.
///
/// Dead units and `me` itself are skipped. A `Ground` unit ignores airborne
/// enemies entirely. Ties keep the first candidate in roster order. The ally
/// search ignores capability.
#[must_use]
pub fn nearest_enemy_and_ally(
    me: &TargetCandidate,
    capability: TargetCapability,
    roster: &[TargetCandidate],
) -> Resolution {
    let mut enemy: Option<(Entity, f32)> = None;
    let mut ally: Option<(Entity, f32)> = None;

    for candidate in roster {
        if candidate.entity == me.entity || !candidate.alive {
            continue;
        }
        let dist = me.position.distance_squared(candidate.position);

        if candidate.faction == me.faction {
            if ally.is_none_or(|(_, d)| dist < d) {
                ally = Some((candidate.entity, dist));
            }
        } else if candidate.faction == me.faction.opponent()
            && capability.can_hit(candidate.airborne)
            && enemy.is_none_or(|(_, d)| dist < d)
        {
            enemy = Some((candidate.entity, dist));
        }
    }

    Resolution {
        enemy: enemy.map(|(e, _)| e),
        ally: ally.map(|(e, _)| e),
    }
}

/// Re-resolves every living unit's target and nearest ally. Runs in `BattleSet::Targeting`.
///
/// A changed enemy moves the old target into `last_target` and drops any
/// in-flight attack so the unit re-engages from scratch.
pub(super) fn resolve_targets(
    roster: Res<Roster>,
    mut units: Query<
        (
            &Faction,
            &BoardPosition,
            &Status,
            Has<Airborne>,
            &CombatStats,
            &mut Targeting,
            &mut AttackState,
        ),
        With<Unit>,
    >,
) {
    let candidates: Vec<TargetCandidate> = roster
        .iter()
        .filter_map(|entity| {
            let (faction, position, status, airborne, ..) = units.get(entity).ok()?;
            Some(TargetCandidate {
                entity,
                faction: *faction,
                position: position.0,
                alive: status.is_alive(),
                airborne,
            })
        })
        .collect();

    for me in candidates.iter().filter(|c| c.alive) {
        let Ok((_, _, _, _, stats, mut targeting, mut attack)) = units.get_mut(me.entity) else {
            continue;
        };
        let resolution = nearest_enemy_and_ally(me, stats.capability, &candidates);

        targeting.nearest_ally = resolution.ally;
        if resolution.enemy != targeting.target {
            targeting.last_target = targeting.target;
            targeting.target = resolution.enemy;
            attack.disengage();
        }
    }
}
