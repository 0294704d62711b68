mod actor;
mod facade;
mod level;
mod loop_runner;
mod metrics;
mod phase;
mod scheduler;
mod score;
mod session;
#[cfg(test)]
mod testing;
mod ui;

pub use actor::{ActorRef, ActorRegistry, EnemyActor};
pub use facade::{SessionHandle, TickReport};
pub use level::LevelBuilder;
pub use loop_runner::{
    plan_sim_steps, run_loop, run_loop_with_metrics, AppError, FrameDriver, FrameSource,
    LoopConfig, LoopExit, LoopSummary, StepPlan,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use phase::{Phase, TransitionError};
pub use scheduler::{RunToken, TurnProgress, TurnScheduler};
pub use score::{ScoreRecord, ScoreTracker};
pub use session::{Session, SessionBuilder, SessionConfig, SessionError, SessionStats, TickPlan};
pub use ui::SessionUi;
