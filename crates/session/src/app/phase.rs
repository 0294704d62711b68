use std::fmt;

use thiserror::Error;

use super::scheduler::RunToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    PlayerTurn,
    EnemyTurn,
    GameOver,
}

impl Phase {
    pub fn accepts_player_input(self) -> bool {
        self == Phase::PlayerTurn
    }

    pub fn accepts_actor_registration(self) -> bool {
        self != Phase::GameOver
    }

    pub fn allows_food_change(self) -> bool {
        matches!(self, Phase::PlayerTurn | Phase::EnemyTurn)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Setup => "setup",
            Phase::PlayerTurn => "player_turn",
            Phase::EnemyTurn => "enemy_turn",
            Phase::GameOver => "game_over",
        };
        f.write_str(label)
    }
}

/// Non-fatal; session state is unchanged when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{operation} is not allowed during {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },
    #[error("discarded completion for run {token:?}; current run is {current:?}")]
    StalePromise {
        token: RunToken,
        current: Option<RunToken>,
    },
}
