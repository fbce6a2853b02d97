//! Attack resolution: engagement gate, periodic hits, and kill bookkeeping.

use bevy::prelude::*;

use super::death::Fading;
use super::{AttackState, net_damage};
use crate::gameplay::cues::{AnimationCue, PresentationCue};
use crate::gameplay::units::steering::{desired_facing, in_field_of_view};
use crate::gameplay::units::templates::{UnitTemplate, UnitTemplates};
use crate::gameplay::units::{
    BoardPosition, CombatStats, Facing, Faction, Health, Roster, Status, Targeting, Unit,
};

/// One damage application owed this tick.
#[derive(Debug, Clone, Copy)]
struct Hit {
    attacker: Entity,
    target: Entity,
}

/// Advances every unit's attack state and applies damage. Runs in `BattleSet::Combat`.
///
/// Hits are collected in roster order first, then applied one by one, so an
/// attacker killed earlier in the tick no longer lands its own hit and nobody
/// hits a unit that already died this tick.
pub(super) fn resolve_attacks(
    time: Res<Time>,
    roster: Res<Roster>,
    templates: Res<UnitTemplates>,
    mut units: Query<
        (
            &UnitTemplate,
            &Faction,
            &CombatStats,
            &Facing,
            &BoardPosition,
            &Targeting,
            &mut Status,
            &mut Health,
            &mut AttackState,
        ),
        With<Unit>,
    >,
    mut commands: Commands,
    mut cues: MessageWriter<PresentationCue>,
) {
    let now = time.elapsed_secs();
    let delta = time.delta();

    let mut hits = Vec::new();
    for entity in roster.iter() {
        let Ok((_, faction, stats, facing, position, targeting, status, ..)) = units.get(entity)
        else {
            continue;
        };
        if !status.is_alive() {
            continue;
        }
        let (faction, stats, facing, position, target) =
            (*faction, *stats, facing.0, position.0, targeting.target);
        let target_position = target
            .and_then(|target| units.get(target).ok())
            .filter(|(.., status, _, _)| status.is_alive())
            .map(|(_, _, _, _, position, ..)| position.0);

        let Ok((.., mut attack)) = units.get_mut(entity) else {
            continue;
        };
        if attack.tick_linger(delta) {
            continue;
        }
        let Some(target) = target else {
            continue;
        };

        if attack.is_engaging() {
            for _ in 0..attack.tick(delta) {
                hits.push(Hit {
                    attacker: entity,
                    target,
                });
            }
        } else if let Some(target_position) = target_position {
            let in_range = position.distance(target_position) <= stats.range;
            let desired = desired_facing(position, target_position, faction);
            if in_range
                && in_field_of_view(facing, desired, stats.field_of_view)
                && attack.engage(now, stats.attack_interval)
            {
                hits.push(Hit {
                    attacker: entity,
                    target,
                });
            }
        }
    }

    for Hit { attacker, target } in hits {
        let Ok((&template, _, stats, _, origin, _, status, ..)) = units.get(attacker) else {
            continue;
        };
        if !status.is_alive() {
            continue;
        }
        let (damage, kill_linger, origin) = (stats.damage, stats.kill_linger, origin.0);

        let Ok((_, _, target_stats, _, target_position, _, mut target_status, mut health, mut target_attack)) =
            units.get_mut(target)
        else {
            continue;
        };
        if !target_status.is_alive() {
            continue;
        }

        health.apply_damage(net_damage(damage, target_stats.armor));
        let killed = health.is_depleted() && target_status.kill();
        if killed {
            target_attack.reset();
        }
        let direction = (target_position.0 - origin).normalize_or_zero();

        let stats = templates.get(template);
        cues.write(PresentationCue::Animation {
            unit: attacker,
            cue: AnimationCue::Attack,
        });
        if stats.projectile {
            cues.write(PresentationCue::Impact {
                origin,
                direction,
                template,
            });
        }
        cues.write(PresentationCue::Sound {
            id: stats.attack_sound.clone(),
            position: origin,
        });

        if !killed {
            continue;
        }

        debug!("{template} {attacker} killed {target}");
        commands.entity(target).insert(Fading::default());
        cues.write(PresentationCue::Animation {
            unit: target,
            cue: AnimationCue::Death,
        });

        for entity in roster.iter() {
            let Ok((_, _, stats, _, _, targeting, status, _, mut attack)) = units.get_mut(entity)
            else {
                continue;
            };
            if status.is_alive() && targeting.target == Some(target) {
                attack.impose_cooldown(now, stats.attack_interval);
            }
        }
        if let Ok((.., mut attack)) = units.get_mut(attacker) {
            attack.start_linger(kill_linger);
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::gameplay::board::Cell;
    use crate::testing::{
        MessageLog, create_sim_test_app, enter_empty_battle, spawn_test_unit, start_game,
        tick_multiple,
    };
    use pretty_assertions::assert_eq;

    fn battle_app() -> App {
        let mut app = create_sim_test_app();
        start_game(&mut app);
        enter_empty_battle(&mut app);
        app
    }

    fn place_at(app: &mut App, entity: Entity, position: Vec2) {
        app.world_mut().get_mut::<BoardPosition>(entity).unwrap().0 = position;
    }

    fn health(app: &App, entity: Entity) -> f32 {
        app.world().get::<Health>(entity).unwrap().current
    }

    fn status(app: &App, entity: Entity) -> Status {
        *app.world().get::<Status>(entity).unwrap()
    }

    #[test]
    fn first_hit_is_immediate_and_second_follows_interval() {
        let mut app = battle_app();
        // Armor: 30 damage every 2 s. Light infantry: 40 health, no armor.
        let attacker = spawn_test_unit(&mut app, UnitTemplate::Armor, Cell::new(0, 10));
        let target = spawn_test_unit(&mut app, UnitTemplate::LightInfantry, Cell::new(20, 10));
        place_at(&mut app, target, Vec2::new(10.0, -5.0));

        app.update();
        assert_eq!(health(&app, target), 10.0);

        for _ in 0..119 {
            app.update();
        }
        assert_eq!(status(&app, target), Status::Alive);

        for _ in 0..3 {
            app.update();
        }
        assert_eq!(status(&app, target), Status::Dead);
        assert_eq!(health(&app, target), 0.0);
        assert!(app.world().get::<Fading>(target).is_some());
        assert_eq!(status(&app, attacker), Status::Alive);
    }

    #[test]
    fn ground_unit_ignores_nearby_flyer() {
        let mut app = battle_app();
        let armor = spawn_test_unit(&mut app, UnitTemplate::Armor, Cell::new(0, 10));
        let flyer = spawn_test_unit(&mut app, UnitTemplate::Flyer, Cell::new(20, 10));
        place_at(&mut app, flyer, Vec2::new(10.0, -2.0));
        let flyer_health = health(&app, flyer);

        for _ in 0..120 {
            app.update();
            let attack = app.world().get::<AttackState>(armor).unwrap();
            assert!(!attack.is_engaging());
        }

        assert_eq!(app.world().get::<Targeting>(armor).unwrap().target, None);
        assert_eq!(health(&app, flyer), flyer_health);
    }

    #[test]
    fn out_of_sight_target_is_not_attacked() {
        let mut app = battle_app();
        // Armor has a 5° field of view and turns a quarter degree per tick.
        let armor = spawn_test_unit(&mut app, UnitTemplate::Armor, Cell::new(0, 10));
        let target = spawn_test_unit(&mut app, UnitTemplate::Siege, Cell::new(20, 10));
        place_at(&mut app, target, Vec2::new(16.0, 0.0));
        let full = health(&app, target);

        app.update();
        assert_eq!(health(&app, target), full);
        assert!(!app.world().get::<AttackState>(armor).unwrap().is_engaging());
    }

    #[test]
    fn kill_imposes_cooldown_on_every_attacker_of_the_victim() {
        let mut app = battle_app();
        let killer = spawn_test_unit(&mut app, UnitTemplate::Siege, Cell::new(0, 10));
        let bystander = spawn_test_unit(&mut app, UnitTemplate::Siege, Cell::new(0, 12));
        let victim = spawn_test_unit(&mut app, UnitTemplate::LightInfantry, Cell::new(20, 11));
        place_at(&mut app, victim, Vec2::new(11.0, -3.0));
        app.world_mut().get_mut::<Facing>(killer).unwrap().0 = desired_facing(
            Vec2::new(10.0, 0.0),
            Vec2::new(11.0, -3.0),
            Faction::Player,
        );

        app.update();

        assert_eq!(status(&app, victim), Status::Dead);
        let now = app.world().resource::<Time<Fixed>>().elapsed_secs();
        let killer_attack = app.world().get::<AttackState>(killer).unwrap();
        assert!(killer_attack.is_lingering());
        assert!(killer_attack.ready_at() > now);
        let bystander_attack = app.world().get::<AttackState>(bystander).unwrap();
        assert!(bystander_attack.ready_at() > now);
        assert!(!bystander_attack.is_engaging());
    }

    #[test]
    fn cooldown_delays_engagement_of_a_fresh_target() {
        let mut app = battle_app();
        let siege = spawn_test_unit(&mut app, UnitTemplate::Siege, Cell::new(0, 10));
        let target = spawn_test_unit(&mut app, UnitTemplate::Armor, Cell::new(20, 10));
        place_at(&mut app, target, Vec2::new(10.0, -3.0));
        let full = health(&app, target);

        let now = app.world().resource::<Time<Fixed>>().elapsed_secs();
        app.world_mut()
            .get_mut::<AttackState>(siege)
            .unwrap()
            .impose_cooldown(now, 1.0);

        // Half a second in: in range and in sight, but still cooling down.
        tick_multiple(&mut app, 30);
        assert_eq!(health(&app, target), full);
        assert!(!app.world().get::<AttackState>(siege).unwrap().is_engaging());

        tick_multiple(&mut app, 40);
        assert!(health(&app, target) < full);
        assert!(app.world().get::<AttackState>(siege).unwrap().is_engaging());
    }

    #[test]
    fn hit_sends_presentation_cues() {
        let mut app = battle_app();
        let attacker = spawn_test_unit(&mut app, UnitTemplate::Armor, Cell::new(0, 10));
        let target = spawn_test_unit(&mut app, UnitTemplate::Siege, Cell::new(20, 10));
        place_at(&mut app, target, Vec2::new(10.0, -5.0));

        app.update();

        let cues = app.world().resource::<MessageLog<PresentationCue>>();
        assert!(cues.iter().any(|cue| *cue
            == PresentationCue::Animation {
                unit: attacker,
                cue: AnimationCue::Attack,
            }));
        assert!(cues.iter().any(|cue| *cue
            == PresentationCue::Impact {
                origin: Vec2::new(10.0, 0.0),
                direction: Vec2::new(0.0, -1.0),
                template: UnitTemplate::Armor,
            }));
        assert!(cues.iter().any(|cue| matches!(
            cue,
            PresentationCue::Sound { id, .. } if id == "armor-fire"
        )));
    }

    #[test]
    fn siege_hits_without_impact_cue() {
        let mut app = battle_app();
        let _siege = spawn_test_unit(&mut app, UnitTemplate::Siege, Cell::new(0, 10));
        let target = spawn_test_unit(&mut app, UnitTemplate::Armor, Cell::new(20, 10));
        place_at(&mut app, target, Vec2::new(10.0, -3.0));

        app.update();

        assert!(health(&app, target) < 150.0);
        let cues = app.world().resource::<MessageLog<PresentationCue>>();
        assert!(!cues.iter().any(|cue| matches!(
            cue,
            PresentationCue::Impact { template: UnitTemplate::Siege, .. }
        )));
    }
}
