//! Combat: per-unit attack state machine, damage resolution, and dead-unit fading.

mod attack;
mod death;

use std::time::Duration;

use bevy::prelude::*;

use crate::{BattleSet, Phase, battle_live};

pub use death::{FADE_SECONDS, Fading};

// === Components ===

/// Attack/cooldown state for one unit.
///
/// `idle` while `timer` is `None`; `engaging` while it runs. Engaging applies one
/// hit immediately and then one per elapsed `attack_interval`. `ready_at` gates
/// re-engagement after the unit's target was killed, and `linger` holds a killer
/// in place for its template's kill linger.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AttackState {
    timer: Option<Timer>,
    ready_at: f32,
    linger: Option<Timer>,
}

impl AttackState {
    /// Start engaging at simulated time `now`. Returns `true` when a new
    /// engagement began and the caller owes the immediate hit.
    pub fn engage(&mut self, now: f32, interval: f32) -> bool {
        if self.timer.is_some() || now < self.ready_at {
            return false;
        }
        self.timer = Some(Timer::from_seconds(interval, TimerMode::Repeating));
        true
    }

    /// Advance the attack timer. Returns the number of periodic hits due.
    pub fn tick(&mut self, delta: Duration) -> u32 {
        self.timer
            .as_mut()
            .map_or(0, |timer| timer.tick(delta).times_finished_this_tick())
    }

    /// Stop the attack timer. Safe to call any number of times.
    pub fn disengage(&mut self) {
        self.timer = None;
    }

    /// Block re-engagement until `now + interval` and stop any running attack.
    pub fn impose_cooldown(&mut self, now: f32, interval: f32) {
        self.ready_at = now + interval;
        self.disengage();
    }

    pub fn start_linger(&mut self, seconds: f32) {
        self.linger = (seconds > 0.0).then(|| Timer::from_seconds(seconds, TimerMode::Once));
    }

    /// Advance the linger timer. Returns whether the unit is still lingering.
    pub fn tick_linger(&mut self, delta: Duration) -> bool {
        let finished = self
            .linger
            .as_mut()
            .is_some_and(|linger| linger.tick(delta).just_finished());
        if finished {
            self.linger = None;
        }
        self.is_lingering()
    }

    #[must_use]
    pub const fn is_lingering(&self) -> bool {
        self.linger.is_some()
    }

    #[must_use]
    pub const fn is_engaging(&self) -> bool {
        self.timer.is_some()
    }

    #[must_use]
    pub const fn ready_at(&self) -> f32 {
        self.ready_at
    }

    /// Back to a fresh idle state, clearing cooldown and linger.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Damage after flat armor reduction. Never negative.
#[must_use]
pub fn net_damage(damage: f32, armor: f32) -> f32 {
    (damage - armor).max(0.0)
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<AttackState>()
        .register_type::<Fading>();

    app.add_systems(
        FixedUpdate,
        attack::resolve_attacks
            .in_set(BattleSet::Combat)
            .run_if(in_state(Phase::Battle).and(battle_live)),
    );
    app.add_systems(
        FixedUpdate,
        death::fade_out_dead
            .in_set(BattleSet::Decay)
            .run_if(in_state(Phase::Battle)),
    );
}
