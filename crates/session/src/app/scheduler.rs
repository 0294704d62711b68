use std::time::Duration;

use tracing::debug;

use super::actor::{ActorRef, ActorRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStage {
    Settle,
    EmptyPad,
    AfterMove { index: usize },
}

#[derive(Debug, Clone)]
struct ActiveRun {
    token: RunToken,
    stage: RunStage,
    remaining: Duration,
}

#[derive(Debug, Default)]
pub struct TurnProgress {
    pub moves: Vec<ActorRef>,
    pub completed: Option<RunToken>,
}

impl TurnProgress {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.completed.is_none()
    }
}

#[derive(Debug)]
pub struct TurnScheduler {
    turn_delay: Duration,
    next_generation: u64,
    run: Option<ActiveRun>,
}

impl TurnScheduler {
    pub fn new(turn_delay: Duration) -> Self {
        Self {
            turn_delay,
            next_generation: 0,
            run: None,
        }
    }

    pub fn turn_delay(&self) -> Duration {
        self.turn_delay
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn current_token(&self) -> Option<RunToken> {
        self.run.as_ref().map(|run| run.token)
    }

    pub fn is_current(&self, token: RunToken) -> bool {
        self.current_token() == Some(token)
    }

    pub fn start(&mut self) -> Option<RunToken> {
        if self.run.is_some() {
            return None;
        }
        let token = RunToken(self.next_generation);
        self.next_generation = self.next_generation.saturating_add(1);
        self.run = Some(ActiveRun {
            token,
            stage: RunStage::Settle,
            remaining: self.turn_delay,
        });
        Some(token)
    }

    pub fn cancel(&mut self) -> Option<RunToken> {
        let cancelled = self.run.take().map(|run| run.token);
        if let Some(token) = cancelled {
            debug!(run = token.0, "enemy_turn_cancelled");
        }
        cancelled
    }

    // Leftover time from a finished wait carries into the next one.
    pub fn advance(&mut self, dt: Duration, registry: &ActorRegistry) -> TurnProgress {
        let mut progress = TurnProgress::default();
        let Some(run) = self.run.as_mut() else {
            return progress;
        };

        let mut budget = dt;
        loop {
            if budget < run.remaining {
                run.remaining -= budget;
                return progress;
            }
            budget -= run.remaining;
            run.remaining = Duration::ZERO;

            let next_index = match run.stage {
                RunStage::Settle if registry.is_empty() => {
                    run.stage = RunStage::EmptyPad;
                    run.remaining = self.turn_delay;
                    continue;
                }
                RunStage::Settle => 0,
                RunStage::EmptyPad => registry.len(),
                RunStage::AfterMove { index } => index + 1,
            };

            match registry.get(next_index) {
                Some(actor) if !actor.is_alive() => {
                    run.stage = RunStage::AfterMove { index: next_index };
                }
                Some(actor) => {
                    progress.moves.push(actor.clone());
                    run.stage = RunStage::AfterMove { index: next_index };
                    run.remaining = actor.move_delay();
                }
                None => {
                    let token = run.token;
                    self.run = None;
                    progress.completed = Some(token);
                    return progress;
                }
            }
        }
    }
}
