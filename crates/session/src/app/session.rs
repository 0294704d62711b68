use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use super::actor::{ActorRef, ActorRegistry};
use super::facade::SessionAuthority;
use super::level::LevelBuilder;
use super::phase::{Phase, TransitionError};
use super::scheduler::{RunToken, TurnScheduler};
use super::score::{ScoreRecord, ScoreTracker};
use super::ui::SessionUi;
use crate::storage::PrefsStore;

const FIRST_LEVEL: u32 = 1;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub level_start_delay: Duration,
    pub turn_delay: Duration,
    pub starting_food_points: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            level_start_delay: Duration::from_secs(2),
            turn_delay: Duration::from_millis(100),
            starting_food_points: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session cannot start without a {missing}; inject it through SessionBuilder")]
    Configuration { missing: &'static str },
    #[error("a session is already live on this thread; drop it before building another")]
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub levels_started: u64,
    pub enemy_turns_started: u64,
    pub enemy_turns_completed: u64,
    pub actor_moves_scheduled: u64,
    pub stale_completions: u64,
    pub games_over: u64,
    pub restarts: u64,
}

#[derive(Debug, Default)]
pub struct TickPlan {
    pub run: Option<RunToken>,
    pub enemy_turn_started: bool,
    pub moves: Vec<ActorRef>,
    pub run_finished: bool,
}

pub struct SessionBuilder {
    config: SessionConfig,
    level_builder: Option<Box<dyn LevelBuilder>>,
    ui: Option<Box<dyn SessionUi>>,
    prefs: Option<Box<dyn PrefsStore>>,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            level_builder: None,
            ui: None,
            prefs: None,
        }
    }

    pub fn level_builder(mut self, level_builder: impl LevelBuilder + 'static) -> Self {
        self.level_builder = Some(Box::new(level_builder));
        self
    }

    pub fn ui(mut self, ui: impl SessionUi + 'static) -> Self {
        self.ui = Some(Box::new(ui));
        self
    }

    pub fn prefs(mut self, prefs: impl PrefsStore + 'static) -> Self {
        self.prefs = Some(Box::new(prefs));
        self
    }

    pub fn build(self) -> Result<Session, SessionError> {
        let level_builder = self.level_builder.ok_or(SessionError::Configuration {
            missing: "level builder",
        })?;
        let ui = self
            .ui
            .ok_or(SessionError::Configuration { missing: "session ui" })?;
        let prefs = self.prefs.ok_or(SessionError::Configuration {
            missing: "prefs store",
        })?;
        let authority = SessionAuthority::claim()?;

        let mut session = Session {
            scheduler: TurnScheduler::new(self.config.turn_delay),
            food_points: self.config.starting_food_points,
            config: self.config,
            level: FIRST_LEVEL,
            phase: Phase::Setup,
            registry: ActorRegistry::default(),
            score: ScoreTracker::new(prefs),
            level_builder,
            ui,
            setup_remaining: None,
            active_run: None,
            initialized_level: None,
            stats: SessionStats::default(),
            _authority: authority,
        };
        session.begin_level_setup(FIRST_LEVEL);
        Ok(session)
    }
}

/// Turn-based session state machine.
///
/// ```text
/// Setup -> PlayerTurn <-> EnemyTurn
///   any -> GameOver -> (restart) -> Setup
/// ```
pub struct Session {
    config: SessionConfig,
    level: u32,
    food_points: i32,
    phase: Phase,
    registry: ActorRegistry,
    scheduler: TurnScheduler,
    score: ScoreTracker,
    level_builder: Box<dyn LevelBuilder>,
    ui: Box<dyn SessionUi>,
    setup_remaining: Option<Duration>,
    active_run: Option<RunToken>,
    initialized_level: Option<u32>,
    stats: SessionStats,
    _authority: SessionAuthority,
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn food_points(&self) -> i32 {
        self.food_points
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn high_score(&self) -> u32 {
        self.score.high_score()
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn accepts_player_input(&self) -> bool {
        self.phase.accepts_player_input()
    }

    pub fn is_setup_pending(&self) -> bool {
        self.setup_remaining.is_some()
    }

    pub fn active_run(&self) -> Option<RunToken> {
        self.active_run
    }

    pub fn is_current_run(&self, token: RunToken) -> bool {
        self.active_run == Some(token)
    }

    pub fn init_level(&mut self, level: u32) -> Result<(), TransitionError> {
        self.ensure(
            "init_level",
            level >= FIRST_LEVEL && self.phase != Phase::GameOver && !self.is_setup_pending(),
        )?;
        if self.initialized_level == Some(level) {
            debug!(level, "init_level_already_done");
            return Ok(());
        }
        self.begin_level_setup(level);
        Ok(())
    }

    pub fn on_level_loaded(&mut self) -> Result<(), TransitionError> {
        self.ensure(
            "on_level_loaded",
            self.phase != Phase::GameOver && !self.is_setup_pending(),
        )?;
        let next_level = self.level.saturating_add(1);
        self.init_level(next_level)
    }

    pub fn register_actor(&mut self, actor: ActorRef) -> Result<(), TransitionError> {
        self.ensure("register_actor", self.phase.accepts_actor_registration())?;
        self.registry.register(actor);
        Ok(())
    }

    pub fn tick(&mut self, dt: Duration) -> TickPlan {
        match self.phase {
            Phase::GameOver => TickPlan::default(),
            Phase::Setup => {
                self.pump_level_start(dt);
                TickPlan::default()
            }
            Phase::PlayerTurn => match self.start_enemy_turn() {
                Ok(token) => TickPlan {
                    run: Some(token),
                    enemy_turn_started: true,
                    ..TickPlan::default()
                },
                Err(error) => {
                    debug!(error = %error, "enemy_turn_not_started");
                    TickPlan::default()
                }
            },
            Phase::EnemyTurn => {
                let Some(token) = self.active_run else {
                    return TickPlan::default();
                };
                let progress = self.scheduler.advance(dt, &self.registry);
                self.stats.actor_moves_scheduled = self
                    .stats
                    .actor_moves_scheduled
                    .saturating_add(progress.moves.len() as u64);
                TickPlan {
                    run: Some(token),
                    enemy_turn_started: false,
                    run_finished: progress.completed == Some(token),
                    moves: progress.moves,
                }
            }
        }
    }

    pub fn on_enemy_turn_complete(&mut self, token: RunToken) -> Result<(), TransitionError> {
        if !self.is_current_run(token) || self.phase != Phase::EnemyTurn {
            self.stats.stale_completions = self.stats.stale_completions.saturating_add(1);
            return Err(TransitionError::StalePromise {
                token,
                current: self.active_run,
            });
        }
        self.active_run = None;
        self.phase = Phase::PlayerTurn;
        self.stats.enemy_turns_completed = self.stats.enemy_turns_completed.saturating_add(1);
        debug!(run = token.0, level = self.level, "enemy_turn_completed");
        Ok(())
    }

    pub fn report_game_over(&mut self) -> Result<ScoreRecord, TransitionError> {
        self.ensure("report_game_over", self.phase != Phase::GameOver)?;
        self.cancel_active_run();
        self.setup_remaining = None;
        self.phase = Phase::GameOver;

        let level = self.level;
        self.ui
            .set_level_text(&format!("After {level} days, you starved."));
        let record = self.score.record(level);
        let score_text = if record.is_new_high_score {
            format!("New high score\n{} days", record.display_score)
        } else {
            format!("High score\n{} days", record.display_score)
        };
        self.ui.set_score_text(&score_text);
        self.ui.set_retry_visible(true);
        self.ui.set_level_image_visible(true);

        self.stats.games_over = self.stats.games_over.saturating_add(1);
        info!(
            level,
            food_points = self.food_points,
            high_score = record.display_score,
            new_high_score = record.is_new_high_score,
            "game_over"
        );
        Ok(record)
    }

    pub fn restart(&mut self) {
        self.cancel_active_run();
        self.setup_remaining = None;
        self.initialized_level = None;
        self.food_points = self.config.starting_food_points;
        self.stats.restarts = self.stats.restarts.saturating_add(1);
        info!(from_phase = %self.phase, from_level = self.level, "session_restart");
        self.begin_level_setup(FIRST_LEVEL);
    }

    pub fn spend_food(&mut self, amount: u32) -> Result<i32, TransitionError> {
        self.ensure("spend_food", self.phase.allows_food_change())?;
        self.food_points = self.food_points.saturating_sub_unsigned(amount);
        if self.food_points <= 0 {
            self.report_game_over()?;
        }
        Ok(self.food_points)
    }

    pub fn gain_food(&mut self, amount: u32) -> Result<i32, TransitionError> {
        self.ensure("gain_food", self.phase.allows_food_change())?;
        self.food_points = self.food_points.saturating_add_unsigned(amount);
        Ok(self.food_points)
    }

    pub fn reset_high_score(&mut self) {
        self.score.reset();
    }

    fn ensure(&self, operation: &'static str, allowed: bool) -> Result<(), TransitionError> {
        if allowed {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                operation,
                phase: self.phase,
            })
        }
    }

    fn begin_level_setup(&mut self, level: u32) {
        self.cancel_active_run();
        self.phase = Phase::Setup;
        self.level = level;
        self.initialized_level = Some(level);
        let high_score = self.score.load();

        self.ui.set_level_text(&format!("Day {level}"));
        self.ui.set_score_text("");
        self.ui.set_retry_visible(false);
        self.ui.set_level_image_visible(true);

        self.registry.clear();
        self.level_builder.setup_scene(level, &mut self.registry);
        self.setup_remaining = Some(self.config.level_start_delay);
        self.stats.levels_started = self.stats.levels_started.saturating_add(1);
        info!(
            level,
            food_points = self.food_points,
            high_score,
            enemy_count = self.registry.len(),
            "level_setup_started"
        );
    }

    fn pump_level_start(&mut self, dt: Duration) {
        let Some(remaining) = self.setup_remaining else {
            return;
        };
        let remaining = remaining.saturating_sub(dt);
        if !remaining.is_zero() {
            self.setup_remaining = Some(remaining);
            return;
        }
        self.setup_remaining = None;
        self.ui.set_level_image_visible(false);
        self.phase = Phase::PlayerTurn;
        info!(level = self.level, "level_started");
    }

    fn start_enemy_turn(&mut self) -> Result<RunToken, TransitionError> {
        self.ensure(
            "start_enemy_turn",
            self.phase == Phase::PlayerTurn
                && self.active_run.is_none()
                && !self.is_setup_pending(),
        )?;
        let Some(token) = self.scheduler.start() else {
            return Err(TransitionError::InvalidTransition {
                operation: "start_enemy_turn",
                phase: self.phase,
            });
        };
        self.active_run = Some(token);
        self.phase = Phase::EnemyTurn;
        self.stats.enemy_turns_started = self.stats.enemy_turns_started.saturating_add(1);
        debug!(
            run = token.0,
            enemy_count = self.registry.len(),
            "enemy_turn_started"
        );
        Ok(token)
    }

    fn cancel_active_run(&mut self) {
        self.scheduler.cancel();
        if let Some(token) = self.active_run.take() {
            debug!(run = token.0, phase = %self.phase, "enemy_turn_invalidated");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("level", &self.level)
            .field("food_points", &self.food_points)
            .field("phase", &self.phase)
            .field("high_score", &self.score.high_score())
            .field("registered_actors", &self.registry.len())
            .field("active_run", &self.active_run)
            .finish_non_exhaustive()
    }
}
