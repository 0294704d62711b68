use serde::Deserialize;
use session::{FrameDriver, Phase, SessionHandle, TickReport};
use tracing::{debug, info};

use super::enemy::DamageQueue;
use super::ui::LogUi;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerConfig {
    pub(crate) move_cost: u32,
    /// Every n-th move lands on food; 0 means never.
    pub(crate) food_pickup_every: u32,
    pub(crate) food_pickup_amount: u32,
    /// Moves needed to reach the exit of a level.
    pub(crate) moves_per_level: u32,
    /// Retry presses after a game over before the run ends.
    pub(crate) max_restarts: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_cost: 1,
            food_pickup_every: 4,
            food_pickup_amount: 10,
            moves_per_level: 12,
            max_restarts: 1,
        }
    }
}

/// Plays the game without a human: one move per player turn, the exit after
/// a fixed number of moves, and the retry button while retries last.
pub(crate) struct ScriptedPlayer {
    config: PlayerConfig,
    hits: DamageQueue,
    ui: LogUi,
    moves_this_level: u32,
    total_moves: u64,
    restarts_used: u32,
    finished: bool,
}

impl ScriptedPlayer {
    pub(crate) fn new(config: PlayerConfig, hits: DamageQueue, ui: LogUi) -> Self {
        Self {
            config,
            hits,
            ui,
            moves_this_level: 0,
            total_moves: 0,
            restarts_used: 0,
            finished: false,
        }
    }

    pub(crate) fn total_moves(&self) -> u64 {
        self.total_moves
    }

    pub(crate) fn restarts_used(&self) -> u32 {
        self.restarts_used
    }

    fn handle_game_over(&mut self, session: &SessionHandle) {
        if !self.ui.retry_visible() {
            return;
        }
        if self.restarts_used >= self.config.max_restarts {
            let score_text = self.ui.snapshot().score_text;
            info!(
                level = session.level(),
                score = score_text.as_str(),
                "player_gave_up"
            );
            self.finished = true;
            return;
        }
        self.restarts_used += 1;
        self.moves_this_level = 0;
        info!(attempt = self.restarts_used, "retry_pressed");
        session.restart();
    }

    fn take_turn(&mut self, session: &SessionHandle) {
        self.total_moves = self.total_moves.saturating_add(1);
        self.moves_this_level = self.moves_this_level.saturating_add(1);

        if self.total_moves.checked_rem(u64::from(self.config.food_pickup_every)) == Some(0) {
            session.gain_food(self.config.food_pickup_amount);
        }
        let Some(food) = session.spend_food(self.config.move_cost) else {
            return;
        };
        debug!(food, level = session.level(), "player_moved");
        if session.phase() == Phase::GameOver {
            return;
        }

        if self.moves_this_level >= self.config.moves_per_level {
            self.moves_this_level = 0;
            session.on_level_loaded();
        }
    }
}

impl FrameDriver for ScriptedPlayer {
    fn before_tick(&mut self, session: &SessionHandle) {
        if session.phase() == Phase::GameOver {
            self.handle_game_over(session);
            return;
        }
        if session.accepts_player_input() {
            self.take_turn(session);
        }
    }

    fn after_tick(&mut self, session: &SessionHandle, _report: &TickReport) {
        let damage = self.hits.take();
        if damage > 0 {
            session.spend_food(damage);
        }
    }

    fn should_exit(&self, _session: &SessionHandle) -> bool {
        self.finished
    }
}
