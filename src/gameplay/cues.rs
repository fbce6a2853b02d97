//! Fire-and-forget cues for the presentation layer.
//!
//! The simulation never waits on these. A renderer or audio backend reads
//! [`PresentationCue`] messages each frame; headless runs simply ignore them.

use bevy::prelude::*;

use super::units::templates::UnitTemplate;

/// Animation clips the simulation asks a unit's visual to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationCue {
    /// Looping approach animation. Sent every tick the unit advances;
    /// replaying an already running loop is expected to be a no-op.
    Move,
    /// One-shot firing animation.
    Attack,
    /// One-shot death animation, clamped on its last frame.
    Death,
}

#[derive(Message, Debug, Clone, PartialEq)]
pub enum PresentationCue {
    Animation {
        unit: Entity,
        cue: AnimationCue,
    },
    /// Projectile or muzzle effect travelling from `origin` along `direction`.
    Impact {
        origin: Vec2,
        direction: Vec2,
        template: UnitTemplate,
    },
    Sound {
        id: String,
        position: Vec2,
    },
    /// The unit finished fading out and was despawned; its visuals can be freed.
    Release {
        unit: Entity,
    },
}

pub(super) fn plugin(app: &mut App) {
    app.add_message::<PresentationCue>();
}
