//! Unit components and the single spawn path for the unit archetype.

pub mod steering;
pub mod targeting;
pub mod templates;

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::gameplay::board::Cell;
use crate::gameplay::combat::AttackState;
use crate::{BattleSet, GameState, Phase, battle_live};

use self::templates::{TargetCapability, UnitTemplate, UnitTemplates};

// === Components ===

/// Marker for unit entities.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Unit;

/// Which side a unit fights for.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Component)]
pub enum Faction {
    Player,
    Opponent,
}

impl Faction {
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Opponent,
            Self::Opponent => Self::Player,
        }
    }

    /// Half-turn applied to player facings so both sides face each other with
    /// mirrored model orientation.
    #[must_use]
    pub const fn facing_offset(self) -> f32 {
        match self {
            Self::Player => PI,
            Self::Opponent => 0.0,
        }
    }
}

/// Marker for units that only `Both`-capable enemies can target.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Airborne;

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Subtract `amount` (never heals), floored at zero.
    pub fn apply_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Life status. `Dead` is terminal.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum Status {
    #[default]
    Alive,
    Dead,
}

impl Status {
    #[must_use]
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }

    /// Transition to `Dead`. Returns `true` only for the first transition.
    pub fn kill(&mut self) -> bool {
        let was_alive = self.is_alive();
        *self = Self::Dead;
        was_alive
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CombatStats {
    pub damage: f32,
    /// Seconds between hits.
    pub attack_interval: f32,
    pub armor: f32,
    pub range: f32,
    /// Half-angle in degrees.
    pub field_of_view: f32,
    pub capability: TargetCapability,
    /// Seconds to hold still after a killing blow.
    pub kill_linger: f32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Mobility {
    /// Board units per second.
    pub speed: f32,
    /// Degrees per tick.
    pub turning_speed: f32,
    /// Separation radius.
    pub size: f32,
}

/// Facing angle in radians, kept in `[-π, π)`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct Facing(pub f32);

/// Position on the board plane.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct BoardPosition(pub Vec2);

/// Cell the unit was placed on. Survivors are re-reserved here each placement phase.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct HomeCell(pub Cell);

/// Targeting state, refreshed every tick by the resolver.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub struct Targeting {
    pub target: Option<Entity>,
    pub last_target: Option<Entity>,
    pub nearest_ally: Option<Entity>,
}

// === Resources ===

/// Active units in insertion order. Scan order for targeting ties.
#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct Roster(Vec<Entity>);

impl Roster {
    pub fn push(&mut self, entity: Entity) {
        self.0.push(entity);
    }

    pub fn remove(&mut self, entity: Entity) {
        self.0.retain(|&e| e != entity);
    }

    pub fn retain(&mut self, keep: impl FnMut(&Entity) -> bool) {
        self.0.retain(keep);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.0.contains(&entity)
    }
}

// === Spawning ===

/// Spawn a unit entity with all required components and append it to the roster.
/// Single source of truth for the unit archetype.
pub fn spawn_unit(
    commands: &mut Commands,
    roster: &mut Roster,
    templates: &UnitTemplates,
    template: UnitTemplate,
    faction: Faction,
    cell: Cell,
) -> Entity {
    let stats = templates.get(template);

    let mut unit = commands.spawn((
        Name::new(format!("{faction:?} {template}")),
        Unit,
        template,
        faction,
        Status::Alive,
        Health::new(stats.health),
        CombatStats {
            damage: stats.damage,
            attack_interval: stats.attack_interval,
            armor: stats.armor,
            range: stats.range,
            field_of_view: stats.field_of_view,
            capability: stats.capability,
            kill_linger: stats.kill_linger,
        },
        Mobility {
            speed: stats.speed,
            turning_speed: stats.turning_speed,
            size: stats.size,
        },
        Facing(0.0),
        BoardPosition(cell.to_position()),
        HomeCell(cell),
        Targeting::default(),
        AttackState::default(),
        DespawnOnExit(GameState::InGame),
    ));
    if stats.airborne {
        unit.insert(Airborne);
    }

    let entity = unit.id();
    roster.push(entity);
    entity
}

fn insert_default_templates(app: &mut App) {
    if app.world().contains_resource::<UnitTemplates>() {
        return;
    }
    match UnitTemplates::embedded() {
        Ok(templates) => {
            app.insert_resource(templates);
        }
        Err(err) => panic!("embedded unit template table is invalid: {err}"),
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    insert_default_templates(app);
    app.register_type::<Unit>()
        .register_type::<UnitTemplate>()
        .register_type::<Faction>()
        .register_type::<Airborne>()
        .register_type::<Health>()
        .register_type::<Status>()
        .register_type::<CombatStats>()
        .register_type::<Mobility>()
        .register_type::<Facing>()
        .register_type::<BoardPosition>()
        .register_type::<HomeCell>()
        .register_type::<Targeting>()
        .register_type::<Roster>()
        .init_resource::<Roster>();

    app.add_systems(
        FixedUpdate,
        (
            targeting::resolve_targets.in_set(BattleSet::Targeting),
            steering::steer_units.in_set(BattleSet::Steering),
        )
            .run_if(in_state(Phase::Battle).and(battle_live)),
    );
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::testing::{create_sim_test_app, spawn_test_unit};
    use pretty_assertions::assert_eq;

    #[test]
    fn spawned_unit_carries_template_stats() {
        let mut app = create_sim_test_app();
        let entity = spawn_test_unit(&mut app, UnitTemplate::Armor, Cell::new(2, 6));

        let world = app.world();
        let stats = world.resource::<UnitTemplates>().get(UnitTemplate::Armor).clone();
        assert_eq!(world.get::<Health>(entity), Some(&Health::new(stats.health)));
        assert_eq!(world.get::<Faction>(entity), Some(&Faction::Player));
        assert_eq!(
            world.get::<BoardPosition>(entity),
            Some(&BoardPosition(Vec2::new(6.0, -2.0)))
        );
        assert_eq!(world.get::<CombatStats>(entity).map(|c| c.armor), Some(stats.armor));
        assert!(world.get::<Airborne>(entity).is_none());
        assert!(world.resource::<Roster>().contains(entity));
    }

    #[test]
    fn flyer_spawns_airborne_for_opponent_rows() {
        let mut app = create_sim_test_app();
        let entity = spawn_test_unit(&mut app, UnitTemplate::Flyer, Cell::new(30, 6));

        let world = app.world();
        assert!(world.get::<Airborne>(entity).is_some());
        assert_eq!(world.get::<Faction>(entity), Some(&Faction::Opponent));
    }

    #[test]
    fn custom_template_table_is_kept() {
        // Light infantry is the first entry in the table.
        let source =
            include_str!("../../../assets/data/units.ron").replacen("cost: 50,", "cost: 60,", 1);
        let templates = UnitTemplates::from_ron(&source).unwrap();
        assert_eq!(templates.get(UnitTemplate::LightInfantry).cost, 60);

        let mut app = App::new();
        app.insert_resource(templates);
        plugin(&mut app);

        let cost = app
            .world()
            .resource::<UnitTemplates>()
            .get(UnitTemplate::LightInfantry)
            .cost;
        assert_eq!(cost, 60);
    }
}
