use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod storage;

pub use app::{
    plan_sim_steps, run_loop, run_loop_with_metrics, ActorRef, ActorRegistry, AppError,
    EnemyActor, FrameDriver, FrameSource, LevelBuilder, LoopConfig, LoopExit, LoopMetricsSnapshot,
    LoopSummary, MetricsHandle, Phase, RunToken, ScoreRecord, ScoreTracker, Session,
    SessionBuilder, SessionConfig, SessionError, SessionHandle, SessionStats, SessionUi, StepPlan,
    TickPlan, TickReport, TransitionError, TurnProgress, TurnScheduler,
};
pub use storage::{JsonFilePrefs, MemoryPrefs, PrefsStore, StoreError, HIGH_SCORE_KEY};

pub const DATA_DIR_ENV_VAR: &str = "SURVIVAL_DATA_DIR";
pub const DEFAULT_DATA_DIR_NAME: &str = ".survival";
pub const PREFS_FILE_NAME: &str = "prefs.json";

#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
    pub prefs_file: PathBuf,
}

impl DataPaths {
    pub fn under(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            prefs_file: root.join(PREFS_FILE_NAME),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("failed to create data directory at {path}: {source}")]
    CreateDataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{env_var} is set but points at a file, not a directory: {path}\n\
Set {env_var} to a writable directory, for example:\n\
Bash/zsh: export {env_var}=\"$HOME/.local/share/survival\""
    )]
    DataDirIsFile {
        path: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_data_paths() -> Result<DataPaths, StartupError> {
    let root = resolve_data_root()?;
    if root.is_file() {
        return Err(StartupError::DataDirIsFile {
            path: root,
            env_var: DATA_DIR_ENV_VAR,
        });
    }

    fs::create_dir_all(&root).map_err(|source| StartupError::CreateDataDir {
        path: root.clone(),
        source,
    })?;

    Ok(DataPaths::under(&normalize_path(&root)))
}

fn resolve_data_root() -> Result<PathBuf, StartupError> {
    match env::var(DATA_DIR_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value.trim())),
        Ok(_) | Err(env::VarError::NotPresent) => {
            let cwd = env::current_dir().map_err(StartupError::CurrentDir)?;
            Ok(cwd.join(DEFAULT_DATA_DIR_NAME))
        }
        Err(source) => Err(StartupError::EnvVar {
            var: DATA_DIR_ENV_VAR,
            source,
        }),
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
