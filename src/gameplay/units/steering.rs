//! Steering: turn toward the target, keep clear of allies, close to engagement range.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

use super::{BoardPosition, CombatStats, Facing, Faction, Mobility, Roster, Status, Targeting, Unit};
use crate::gameplay::combat::AttackState;
use crate::gameplay::cues::{AnimationCue, PresentationCue};

// === Constants ===

/// Below this angular error a unit snaps straight to its desired facing.
const SNAP_THRESHOLD: f32 = PI / 180.0;

/// Separation nudge speed as a fraction of the unit's own speed.
const SEPARATION_SPEED_FACTOR: f32 = 2.0 / 3.0;

// === Angles ===

/// Wrap any angle into `[-π, π)`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Signed shortest rotation from `from` to `to`.
#[must_use]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Facing that points a unit of `faction` at `to` from `from`.
#[must_use]
pub fn desired_facing(from: Vec2, to: Vec2, faction: Faction) -> f32 {
    let d = to - from;
    wrap_angle(d.x.atan2(d.y) + faction.facing_offset())
}

/// Rotate `current` toward `desired` by at most `turning_speed` degrees, or
/// snap once within [`SNAP_THRESHOLD`].
#[must_use]
pub fn turn_toward(current: f32, desired: f32, turning_speed: f32) -> f32 {
    let delta = angle_delta(current, desired);
    if delta.abs() <= SNAP_THRESHOLD {
        return wrap_angle(desired);
    }
    let max_step = turning_speed.to_radians();
    wrap_angle(current + delta.clamp(-max_step, max_step))
}

/// Whether `desired` lies strictly inside the `field_of_view` half-angle (degrees) of `facing`.
#[must_use]
pub fn in_field_of_view(facing: f32, desired: f32, field_of_view: f32) -> bool {
    angle_delta(facing, desired).abs() < field_of_view.to_radians()
}

// === Steering Model ===

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerInput {
    pub position: Vec2,
    pub facing: f32,
    pub faction: Faction,
    pub target: Vec2,
    pub range: f32,
    pub speed: f32,
    pub turning_speed: f32,
    pub size: f32,
    /// Nearest ally position and size.
    pub ally: Option<(Vec2, f32)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerOutput {
    pub position: Vec2,
    pub facing: f32,
    /// Whether the unit closed distance toward its target this tick.
    pub advanced: bool,
}

/// Advance one unit by `dt` seconds.
#[must_use]
pub fn steer(input: &SteerInput, dt: f32) -> SteerOutput {
    let desired = desired_facing(input.position, input.target, input.faction);
    let facing = turn_toward(input.facing, desired, input.turning_speed);

    let to_target = input.target - input.position;
    let distance = to_target.length();
    if distance <= input.range {
        return SteerOutput {
            position: input.position,
            facing,
            advanced: false,
        };
    }

    let mut position = input.position;

    if let Some((ally_position, ally_size)) = input.ally {
        let away = input.position - ally_position;
        if away.length() <= input.size + ally_size {
            position += away.normalize_or_zero() * input.speed * SEPARATION_SPEED_FACTOR * dt;
        }
    }

    let step = (input.speed * dt).min(distance);
    position += to_target / distance * step;

    SteerOutput {
        position,
        facing,
        advanced: step > 0.0,
    }
}

// === Systems ===

/// Turns and moves every living unit toward its target, in roster order.
/// Lingering killers hold position. Runs in `BattleSet::Steering`.
pub(super) fn steer_units(
    time: Res<Time>,
    roster: Res<Roster>,
    mut units: Query<
        (
            &Faction,
            &Status,
            &Targeting,
            &CombatStats,
            &Mobility,
            &AttackState,
            &mut Facing,
            &mut BoardPosition,
        ),
        With<Unit>,
    >,
    mut cues: MessageWriter<PresentationCue>,
) {
    let dt = time.delta_secs();

    for entity in roster.iter() {
        let Ok((_, status, targeting, _, _, attack, _, _)) = units.get(entity) else {
            continue;
        };
        if !status.is_alive() || attack.is_lingering() {
            continue;
        }
        let Some(target) = targeting.target else {
            continue;
        };
        let nearest_ally = targeting.nearest_ally;

        let Ok((.., target_position)) = units.get(target) else {
            continue;
        };
        let target_position = target_position.0;
        let ally = nearest_ally.and_then(|ally| {
            units
                .get(ally)
                .ok()
                .map(|(_, _, _, _, mobility, _, _, position)| (position.0, mobility.size))
        });

        let Ok((faction, _, _, stats, mobility, _, mut facing, mut position)) =
            units.get_mut(entity)
        else {
            continue;
        };
        let output = steer(
            &SteerInput {
                position: position.0,
                facing: facing.0,
                faction: *faction,
                target: target_position,
                range: stats.range,
                speed: mobility.speed,
                turning_speed: mobility.turning_speed,
                size: mobility.size,
                ally,
            },
            dt,
        );

        facing.0 = output.facing;
        position.0 = output.position;
        if output.advanced {
            cues.write(PresentationCue::Animation {
                unit: entity,
                cue: AnimationCue::Move,
            });
        }
    }
}
