//! Unit template table: static stat blocks loaded from RON and validated once.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bevy::prelude::*;
use serde::Deserialize;

/// Embedded default template table.
const DEFAULT_UNITS_RON: &str = include_str!("../../../assets/data/units.ron");

// === Template Ids ===

/// Types of units that can be placed on the board.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Reflect)]
#[reflect(Component)]
pub enum UnitTemplate {
    LightInfantry,
    Armor,
    Flyer,
    Siege,
}

impl UnitTemplate {
    /// All templates, in table order.
    pub const ALL: &[Self] = &[Self::LightInfantry, Self::Armor, Self::Flyer, Self::Siege];

    /// Stable identifier used by UI commands and logs.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::LightInfantry => "light-infantry",
            Self::Armor => "armor",
            Self::Flyer => "flyer",
            Self::Siege => "siege",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::LightInfantry => 0,
            Self::Armor => 1,
            Self::Flyer => 2,
            Self::Siege => 3,
        }
    }
}

impl fmt::Display for UnitTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for UnitTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|template| template.id() == s)
            .ok_or_else(|| TemplateError::Unknown(s.to_string()))
    }
}

/// Which enemies a unit is able to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Reflect)]
pub enum TargetCapability {
    /// Ground units only; airborne enemies are invisible to the targeting scan.
    Ground,
    /// Ground and airborne units.
    Both,
}

impl TargetCapability {
    #[must_use]
    pub const fn can_hit(self, airborne: bool) -> bool {
        match self {
            Self::Both => true,
            Self::Ground => !airborne,
        }
    }
}

// === Stat Blocks ===

/// Stats for one template, as declared in the table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateStats {
    pub id: UnitTemplate,
    /// Placement price in funds.
    pub cost: u32,
    pub health: f32,
    /// Damage per hit before armor.
    pub damage: f32,
    /// Seconds between hits while engaging.
    pub attack_interval: f32,
    /// Flat damage reduction applied to every incoming hit.
    pub armor: f32,
    /// Maximum engagement distance.
    pub range: f32,
    /// Board units per second.
    pub speed: f32,
    /// Degrees per simulation tick.
    pub turning_speed: f32,
    /// Engagement half-angle in degrees.
    pub field_of_view: f32,
    /// Radius used for ally separation.
    pub size: f32,
    pub airborne: bool,
    pub capability: TargetCapability,
    /// Seconds the unit holds still after landing a killing blow.
    pub kill_linger: f32,
    pub attack_sound: String,
    /// Whether hits send an `Impact` cue.
    pub projectile: bool,
}

impl TemplateStats {
    fn validate(&self) -> Result<(), TemplateError> {
        let checks: [(&'static str, bool); 10] = [
            ("health", self.health > 0.0),
            ("damage", self.damage >= 0.0),
            ("attack_interval", self.attack_interval > 0.0),
            ("armor", self.armor >= 0.0),
            ("range", self.range > 0.0),
            ("speed", self.speed >= 0.0),
            ("turning_speed", self.turning_speed > 0.0),
            (
                "field_of_view",
                self.field_of_view > 0.0 && self.field_of_view <= 180.0,
            ),
            ("size", self.size > 0.0),
            ("kill_linger", self.kill_linger >= 0.0),
        ];
        match checks.iter().find(|(_, ok)| !ok) {
            Some((field, _)) => Err(TemplateError::InvalidStat {
                template: self.id,
                field,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    templates: Vec<TemplateStats>,
}

// === Errors ===

/// Failure to load the template table. Always fatal: the table is static.
#[derive(Debug)]
pub enum TemplateError {
    Io(std::io::Error),
    Parse(ron::error::SpannedError),
    Unknown(String),
    Duplicate(UnitTemplate),
    Missing(UnitTemplate),
    InvalidStat {
        template: UnitTemplate,
        field: &'static str,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "could not read template table: {err}"),
            Self::Parse(err) => write!(f, "malformed template table: {err}"),
            Self::Unknown(id) => write!(f, "unknown unit template `{id}`"),
            Self::Duplicate(template) => write!(f, "template `{template}` is declared twice"),
            Self::Missing(template) => write!(f, "template `{template}` is missing"),
            Self::InvalidStat { template, field } => {
                write!(f, "template `{template}` has an invalid `{field}`")
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TemplateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ron::error::SpannedError> for TemplateError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::Parse(err)
    }
}

// === Resource ===

/// Validated template table. Every [`UnitTemplate`] has exactly one entry.
#[derive(Resource, Debug, Clone)]
pub struct UnitTemplates {
    stats: Vec<TemplateStats>,
}

impl UnitTemplates {
    /// Parse and validate a RON template table.
    pub fn from_ron(source: &str) -> Result<Self, TemplateError> {
        let file: TemplateFile = ron::from_str(source)?;

        let mut slots: Vec<Option<TemplateStats>> = vec![None; UnitTemplate::ALL.len()];
        for stats in file.templates {
            stats.validate()?;
            let slot = &mut slots[stats.id.index()];
            if slot.is_some() {
                return Err(TemplateError::Duplicate(stats.id));
            }
            *slot = Some(stats);
        }

        let stats = UnitTemplate::ALL
            .iter()
            .zip(slots)
            .map(|(&template, slot)| slot.ok_or(TemplateError::Missing(template)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stats })
    }

    /// Read and validate a RON template table from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron(&source)
    }

    /// The table compiled into the crate.
    pub fn embedded() -> Result<Self, TemplateError> {
        Self::from_ron(DEFAULT_UNITS_RON)
    }

    #[must_use]
    pub fn get(&self, template: UnitTemplate) -> &TemplateStats {
        &self.stats[template.index()]
    }

    /// Cheapest placement price across all templates.
    #[must_use]
    pub fn cheapest_cost(&self) -> u32 {
        self.stats.iter().map(|stats| stats.cost).min().unwrap_or(0)
    }
}
