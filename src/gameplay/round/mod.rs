//! Round controller: placement and battle phases, funds, health, and outcome polling.

pub mod opponent;
pub mod outcome;
pub mod placement;

use std::time::Duration;

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::gameplay::board::{Boards, Cell};
use crate::gameplay::combat::AttackState;
use crate::gameplay::cues::PresentationCue;
use crate::gameplay::units::templates::{UnitTemplate, UnitTemplates};
use crate::gameplay::units::{
    BoardPosition, Faction, HomeCell, Roster, Status, Targeting, Unit, spawn_unit,
};
use crate::{BattleSet, CommandSet, GameState, Phase, battle_in_progress, battle_live};

pub use outcome::{Census, RoundOutcome, evaluate_outcome};
pub use placement::PlacementError;

// === Constants ===

/// Cumulative health each side starts a game with.
pub const STARTING_HEALTH: i32 = 50;

/// Delay between battle entry and the first simulated tick.
pub const BATTLE_WARMUP_SECS: f32 = 0.5;

/// Battle length before an undecided round becomes a draw.
pub const BATTLE_COUNTDOWN_SECS: f32 = 30.0;

/// Interval between round outcome checks.
pub const OUTCOME_POLL_SECS: f32 = 1.0;

/// Funds granted to both sides when round `round` enters placement.
#[must_use]
pub const fn round_grant(round: u32) -> u32 {
    round * 50 + 100
}

// === Resources ===

/// A side's spendable pool. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub struct Funds(pub u32);

impl Funds {
    /// Deduct `cost`, or leave the pool untouched if it is short.
    pub const fn try_spend(&mut self, cost: u32) -> Result<(), PlacementError> {
        if cost > self.0 {
            return Err(PlacementError::InsufficientFunds {
                cost,
                available: self.0,
            });
        }
        self.0 -= cost;
        Ok(())
    }

    pub const fn grant(&mut self, amount: u32) {
        self.0 = self.0.saturating_add(amount);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct SideState {
    /// Cumulative health; the game ends when either side reaches zero.
    pub health: i32,
    pub funds: Funds,
}

impl Default for SideState {
    fn default() -> Self {
        Self {
            health: STARTING_HEALTH,
            funds: Funds::default(),
        }
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    PlayerWins,
    OpponentWins,
    /// A draw took both sides to zero health in the same round.
    MutualKnockout,
}

/// Round counter, per-side pools, and the once-per-round resolution guard.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Reflect)]
#[reflect(Resource)]
pub struct RoundState {
    pub round: u32,
    pub player: SideState,
    pub opponent: SideState,
    /// Set once the current battle has an outcome.
    pub resolved: bool,
    pub last_outcome: Option<RoundOutcome>,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            round: 1,
            player: SideState::default(),
            opponent: SideState::default(),
            resolved: false,
            last_outcome: None,
        }
    }
}

impl RoundState {
    /// Apply `outcome` to both sides' health. Only the first call per round has
    /// any effect; later calls return `false`.
    pub fn resolve(&mut self, outcome: RoundOutcome) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        self.player.health -= outcome.player_loss() as i32;
        self.opponent.health -= outcome.opponent_loss() as i32;
        self.last_outcome = Some(outcome);
        true
    }

    /// Final result, once either side's health is gone.
    #[must_use]
    pub const fn game_result(&self) -> Option<GameResult> {
        match (self.player.health <= 0, self.opponent.health <= 0) {
            (true, true) => Some(GameResult::MutualKnockout),
            (true, false) => Some(GameResult::OpponentWins),
            (false, true) => Some(GameResult::PlayerWins),
            (false, false) => None,
        }
    }

    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_result().is_some()
    }
}

/// Battle timing: warm-up, countdown, and the outcome poll.
#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct BattleClock {
    warmup: Timer,
    countdown: Timer,
    outcome_check: Timer,
}

impl Default for BattleClock {
    fn default() -> Self {
        Self {
            warmup: Timer::from_seconds(BATTLE_WARMUP_SECS, TimerMode::Once),
            countdown: Timer::from_seconds(BATTLE_COUNTDOWN_SECS, TimerMode::Once),
            outcome_check: Timer::from_seconds(OUTCOME_POLL_SECS, TimerMode::Repeating),
        }
    }
}

impl BattleClock {
    /// Restart every timer for a new battle.
    pub fn start(&mut self) {
        *self = Self::default();
    }

    /// End the warm-up immediately.
    pub fn skip_warmup(&mut self) {
        let duration = self.warmup.duration();
        self.warmup.set_elapsed(duration);
    }

    /// Whether the warm-up is over.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.warmup.remaining().is_zero()
    }

    #[must_use]
    pub fn countdown_expired(&self) -> bool {
        self.countdown.remaining().is_zero()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> f32 {
        self.countdown.remaining_secs()
    }

    /// Advance the warm-up, or the countdown once live.
    pub fn tick(&mut self, delta: Duration) {
        if self.is_live() {
            self.countdown.tick(delta);
        } else {
            self.warmup.tick(delta);
        }
    }

    /// Advance the outcome poll. Returns `true` when a check is due.
    pub fn poll(&mut self, delta: Duration) -> bool {
        self.outcome_check.tick(delta).just_finished()
    }

    pub fn stop_polling(&mut self) {
        self.outcome_check.pause();
    }
}

/// Templates the opponent deploys this round, shown during placement.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq, Reflect)]
#[reflect(Resource)]
pub struct OpponentPreview(pub Vec<UnitTemplate>);

/// Random source for opponent waves. Replace with a seeded one for reproducible runs.
#[derive(Resource, Debug)]
pub struct OpponentRng(pub StdRng);

impl Default for OpponentRng {
    fn default() -> Self {
        Self(StdRng::from_os_rng())
    }
}

// === Messages ===

/// Buy `template` and reserve `cell` for it.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceUnit {
    pub template: UnitTemplate,
    pub cell: Cell,
}

/// Move the game forward: start a game, start the battle, or continue to the
/// next round.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvancePhase;

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRejected {
    pub template: UnitTemplate,
    pub cell: Cell,
    pub error: PlacementError,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundResolved {
    pub round: u32,
    pub outcome: RoundOutcome,
    pub game_over: bool,
}

// === Systems ===

fn reset_game(
    mut round: ResMut<RoundState>,
    mut clock: ResMut<BattleClock>,
    mut preview: ResMut<OpponentPreview>,
) {
    *round = RoundState::default();
    clock.start();
    preview.0.clear();
    info!("New game");
}

fn clear_battlefield(mut roster: ResMut<Roster>, mut boards: ResMut<Boards>) {
    roster.clear();
    boards.clear();
}

/// Placement entry: grant funds, flush the previous battle onto the board, and
/// plan the opponent's hidden wave.
pub(crate) fn enter_placement(
    mut commands: Commands,
    mut round: ResMut<RoundState>,
    mut roster: ResMut<Roster>,
    mut boards: ResMut<Boards>,
    mut preview: ResMut<OpponentPreview>,
    mut rng: ResMut<OpponentRng>,
    templates: Res<UnitTemplates>,
    mut units: Query<
        (
            &UnitTemplate,
            &Status,
            &BoardPosition,
            &mut HomeCell,
            &mut Targeting,
            &mut AttackState,
        ),
        With<Unit>,
    >,
    mut cues: MessageWriter<PresentationCue>,
) {
    let grant = round_grant(round.round);
    round.player.funds.grant(grant);
    round.opponent.funds = Funds(grant);

    boards.clear();
    let mut survivors = Vec::new();
    for entity in roster.iter() {
        let Ok((&template, status, position, mut home, mut targeting, mut attack)) =
            units.get_mut(entity)
        else {
            continue;
        };
        if !status.is_alive() {
            commands.entity(entity).despawn();
            cues.write(PresentationCue::Release { unit: entity });
            continue;
        }

        *targeting = Targeting::default();
        attack.reset();
        let cell = Cell::nearest_to(position.0);
        if boards.visible.place(cell, template).is_ok() {
            home.0 = cell;
        } else {
            debug!("Survivor {entity} keeps {} off the board", home.0);
        }
        survivors.push(entity);
    }
    roster.retain(|entity| survivors.contains(entity));

    let RoundState {
        round: round_number,
        opponent,
        ..
    } = &mut *round;
    preview.0 = opponent::plan_opponent_wave(
        &mut boards,
        &mut opponent.funds,
        *round_number,
        &templates,
        &mut rng.0,
    );

    info!(
        "Round {} placement: {} funds, {} survivors, opponent fields {} units",
        round.round,
        round.player.funds.0,
        survivors.len(),
        preview.0.len()
    );
}

/// Battle entry: reveal the opponent's wave and start the clock.
fn enter_battle(
    mut commands: Commands,
    mut round: ResMut<RoundState>,
    mut roster: ResMut<Roster>,
    mut boards: ResMut<Boards>,
    mut preview: ResMut<OpponentPreview>,
    mut clock: ResMut<BattleClock>,
    templates: Res<UnitTemplates>,
) {
    for (cell, template) in boards.reveal() {
        spawn_unit(
            &mut commands,
            &mut roster,
            &templates,
            template,
            cell.faction(),
            cell,
        );
    }
    preview.0.clear();
    round.resolved = false;
    clock.start();

    info!("Round {} battle: {} units on the board", round.round, roster.len());
}

fn stop_all_attacks(mut attacks: Query<&mut AttackState>) {
    for mut attack in &mut attacks {
        attack.disengage();
    }
}

fn handle_advance_phase(
    mut requests: MessageReader<AdvancePhase>,
    game: Res<State<GameState>>,
    phase: Option<Res<State<Phase>>>,
    mut round: ResMut<RoundState>,
    mut next_game: ResMut<NextState<GameState>>,
    mut next_phase: ResMut<NextState<Phase>>,
) {
    // Several requests in one frame still advance only once.
    if requests.read().count() == 0 {
        return;
    }

    match (*game.get(), phase.map(|phase| *phase.get())) {
        (GameState::Intro | GameState::GameOver, _) => next_game.set(GameState::InGame),
        (GameState::InGame, Some(Phase::Placement)) => next_phase.set(Phase::Battle),
        (GameState::InGame, Some(Phase::Battle)) if round.resolved && !round.is_game_over() => {
            round.round += 1;
            next_phase.set(Phase::Placement);
        }
        _ => debug!("Ignoring advance while the battle is still running"),
    }
}

fn tick_battle_clock(time: Res<Time>, mut clock: ResMut<BattleClock>) {
    let was_live = clock.is_live();
    clock.tick(time.delta());
    if !was_live && clock.is_live() {
        debug!("Battle warm-up over");
    }
}

/// Checks the round outcome once per poll interval. Runs in `BattleSet::Resolution`.
fn poll_round_outcome(
    time: Res<Time>,
    roster: Res<Roster>,
    mut clock: ResMut<BattleClock>,
    mut round: ResMut<RoundState>,
    units: Query<(&Faction, &Status), With<Unit>>,
    mut attacks: Query<&mut AttackState>,
    mut resolved: MessageWriter<RoundResolved>,
    mut next_game: ResMut<NextState<GameState>>,
) {
    if !clock.poll(time.delta()) {
        return;
    }

    let mut census = Census::default();
    for (faction, _) in roster
        .iter()
        .filter_map(|entity| units.get(entity).ok())
        .filter(|(_, status)| status.is_alive())
    {
        match faction {
            Faction::Player => census.player += 1,
            Faction::Opponent => census.opponent += 1,
        }
    }

    let Some(outcome) = evaluate_outcome(census, clock.countdown_expired()) else {
        return;
    };
    if !round.resolve(outcome) {
        return;
    }

    clock.stop_polling();
    for mut attack in &mut attacks {
        attack.disengage();
    }

    let game_over = round.is_game_over();
    info!(
        "Round {} resolved: {outcome:?} (health {} / {})",
        round.round, round.player.health, round.opponent.health
    );
    resolved.write(RoundResolved {
        round: round.round,
        outcome,
        game_over,
    });
    if game_over {
        info!("Game over after round {}", round.round);
        next_game.set(GameState::GameOver);
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<RoundState>()
        .register_type::<BattleClock>()
        .register_type::<OpponentPreview>()
        .init_resource::<RoundState>()
        .init_resource::<BattleClock>()
        .init_resource::<OpponentPreview>()
        .init_resource::<OpponentRng>();

    app.add_message::<PlaceUnit>()
        .add_message::<AdvancePhase>()
        .add_message::<PlacementRejected>()
        .add_message::<RoundResolved>();

    app.add_systems(OnEnter(GameState::InGame), reset_game);
    app.add_systems(OnExit(GameState::InGame), clear_battlefield);
    app.add_systems(OnEnter(Phase::Placement), enter_placement);
    app.add_systems(OnEnter(Phase::Battle), enter_battle);
    app.add_systems(OnExit(Phase::Battle), stop_all_attacks);

    app.add_systems(
        Update,
        (placement::handle_place_unit, handle_advance_phase)
            .chain()
            .in_set(CommandSet),
    );

    app.add_systems(
        FixedUpdate,
        tick_battle_clock
            .in_set(BattleSet::Clock)
            .run_if(in_state(Phase::Battle).and(battle_in_progress)),
    );
    app.add_systems(
        FixedUpdate,
        poll_round_outcome
            .in_set(BattleSet::Resolution)
            .run_if(in_state(Phase::Battle).and(battle_live)),
    );
}
