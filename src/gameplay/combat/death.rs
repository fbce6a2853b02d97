//! Dead units fade out, then leave the roster for good.

use bevy::prelude::*;

use crate::gameplay::cues::PresentationCue;
use crate::gameplay::units::Roster;

/// Seconds a dead unit lingers on the board before it is despawned.
pub const FADE_SECONDS: f32 = 3.6;

/// Fade-out countdown on a dead unit.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Fading(pub Timer);

impl Default for Fading {
    fn default() -> Self {
        Self(Timer::from_seconds(FADE_SECONDS, TimerMode::Once))
    }
}

/// Despawns units whose fade finished, drops them from the roster and
/// releases their visuals. Runs in `BattleSet::Decay`.
pub(super) fn fade_out_dead(
    time: Res<Time>,
    mut commands: Commands,
    mut roster: ResMut<Roster>,
    mut fading: Query<(Entity, &mut Fading)>,
    mut cues: MessageWriter<PresentationCue>,
) {
    for (entity, mut fade) in &mut fading {
        if !fade.0.tick(time.delta()).just_finished() {
            continue;
        }
        roster.remove(entity);
        commands.entity(entity).despawn();
        cues.write(PresentationCue::Release { unit: entity });
    }
}
