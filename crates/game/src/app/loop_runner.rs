use std::process::ExitCode;

use session::{run_loop_with_metrics, MetricsHandle};
use tracing::{error, info};

use super::bootstrap::build_app;

pub(crate) fn run() -> ExitCode {
    let mut app = match build_app() {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let metrics = MetricsHandle::default();
    let summary =
        run_loop_with_metrics(&app.loop_config, &app.session, &mut app.player, &metrics);
    let stats = app.session.stats();
    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        exit = ?summary.exit,
        levels_started = stats.levels_started,
        games_over = stats.games_over,
        restarts = stats.restarts,
        high_score = app.session.high_score(),
        player_moves = app.player.total_moves(),
        retries = app.player.restarts_used(),
        "run_finished"
    );

    ExitCode::SUCCESS
}
