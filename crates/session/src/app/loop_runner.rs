use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::StartupError;

use super::facade::{SessionHandle, TickReport};
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::session::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    Realtime,
    Simulated { frame_dt: Duration },
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub frame_source: FrameSource,
    pub max_frames: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            frame_source: FrameSource::Realtime,
            max_frames: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub trait FrameDriver {
    fn before_tick(&mut self, session: &SessionHandle);
    fn after_tick(&mut self, _session: &SessionHandle, _report: &TickReport) {}
    fn should_exit(&self, session: &SessionHandle) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    DriverRequested,
    FrameBudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub ticks: u64,
    pub exit: LoopExit,
}

pub fn run_loop(
    config: &LoopConfig,
    session: &SessionHandle,
    driver: &mut dyn FrameDriver,
) -> LoopSummary {
    run_loop_with_metrics(config, session, driver, &MetricsHandle::default())
}

pub fn run_loop_with_metrics(
    config: &LoopConfig,
    session: &SessionHandle,
    driver: &mut dyn FrameDriver,
    metrics_handle: &MetricsHandle,
) -> LoopSummary {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let mut clock = FrameClock::new(config.frame_source, fixed_dt);

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        frame_source = ?config.frame_source,
        max_frames = ?config.max_frames,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut frames = 0u64;
    let mut ticks = 0u64;

    let exit = loop {
        if driver.should_exit(session) {
            break LoopExit::DriverRequested;
        }
        if config.max_frames.is_some_and(|max_frames| frames >= max_frames) {
            warn!(frames, "frame_budget_exhausted");
            break LoopExit::FrameBudgetExhausted;
        }

        let raw_frame_dt = clock.next_frame();
        accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            driver.before_tick(session);
            let report = session.tick(fixed_dt);
            driver.after_tick(session, &report);
            metrics_accumulator.record_tick(&report);
            ticks = ticks.saturating_add(1);
        }
        accumulator = step_plan.remaining_accumulator;

        if step_plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        metrics_accumulator.record_frame(raw_frame_dt);
        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(clock.elapsed()) {
            metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                enemy_turns = snapshot.enemy_turns_completed,
                actor_moves = snapshot.actor_moves,
                level = session.level(),
                phase = %session.phase(),
                "loop_metrics"
            );
        }
        frames = frames.saturating_add(1);
    };

    info!(frames, ticks, exit = ?exit, level = session.level(), "loop_stopped");
    LoopSummary {
        frames,
        ticks,
        exit,
    }
}

#[derive(Debug)]
struct FrameClock {
    source: FrameSource,
    min_frame: Duration,
    started: Instant,
    last_frame: Instant,
    simulated_elapsed: Duration,
}

impl FrameClock {
    fn new(source: FrameSource, min_frame: Duration) -> Self {
        let now = Instant::now();
        Self {
            source,
            min_frame,
            started: now,
            last_frame: now,
            simulated_elapsed: Duration::ZERO,
        }
    }

    fn next_frame(&mut self) -> Duration {
        match self.source {
            FrameSource::Simulated { frame_dt } => {
                self.simulated_elapsed = self.simulated_elapsed.saturating_add(frame_dt);
                frame_dt
            }
            FrameSource::Realtime => {
                let since_last = Instant::now().saturating_duration_since(self.last_frame);
                let sleep = compute_cap_sleep(since_last, self.min_frame);
                if sleep > Duration::ZERO {
                    thread::sleep(sleep);
                }
                let now = Instant::now();
                let frame_dt = now.saturating_duration_since(self.last_frame);
                self.last_frame = now;
                frame_dt
            }
        }
    }

    fn elapsed(&self) -> Duration {
        match self.source {
            FrameSource::Simulated { .. } => self.simulated_elapsed,
            FrameSource::Realtime => self.started.elapsed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

pub fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_cap_sleep(elapsed: Duration, target: Duration) -> Duration {
    if elapsed < target {
        target - elapsed
    } else {
        Duration::ZERO
    }
}
