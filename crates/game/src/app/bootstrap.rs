use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use session::{
    resolve_data_paths, AppError, DataPaths, FrameSource, JsonFilePrefs, LoopConfig, PrefsStore,
    Session, SessionConfig, SessionHandle,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::{BoardBuilder, DamageQueue, EnemyConfig, LogUi, PlayerConfig, ScriptedPlayer};

pub(crate) const CONFIG_ENV_VAR: &str = "SURVIVAL_CONFIG";
pub(crate) const MAX_FRAMES_ENV_VAR: &str = "SURVIVAL_MAX_FRAMES";
const DEFAULT_CONFIG_FILE_NAME: &str = "survival.json";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub(crate) enum GameError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Tunables read from the optional JSON config file. Every field may be
/// omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) level_start_delay_ms: u64,
    pub(crate) turn_delay_ms: u64,
    pub(crate) starting_food_points: i32,
    pub(crate) target_tps: u32,
    /// Pace frames by the wall clock instead of simulating them back to back.
    pub(crate) realtime: bool,
    pub(crate) max_frames: Option<u64>,
    pub(crate) player: PlayerConfig,
    pub(crate) enemy: EnemyConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            level_start_delay_ms: duration_ms(session.level_start_delay),
            turn_delay_ms: duration_ms(session.turn_delay),
            starting_food_points: session.starting_food_points,
            target_tps: LoopConfig::default().target_tps,
            realtime: false,
            max_frames: None,
            player: PlayerConfig::default(),
            enemy: EnemyConfig::default(),
        }
    }
}

impl GameConfig {
    pub(crate) fn session_config(&self) -> SessionConfig {
        SessionConfig {
            level_start_delay: Duration::from_millis(self.level_start_delay_ms),
            turn_delay: Duration::from_millis(self.turn_delay_ms),
            starting_food_points: self.starting_food_points,
        }
    }

    pub(crate) fn loop_config(&self) -> LoopConfig {
        let target_tps = self.target_tps.max(1);
        let frame_source = if self.realtime {
            FrameSource::Realtime
        } else {
            FrameSource::Simulated {
                frame_dt: Duration::from_secs_f64(1.0 / target_tps as f64),
            }
        };
        LoopConfig {
            target_tps,
            frame_source,
            max_frames: self.max_frames,
            ..LoopConfig::default()
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) session: SessionHandle,
    pub(crate) player: ScriptedPlayer,
}

pub(crate) fn build_app() -> Result<AppWiring, GameError> {
    init_tracing();
    info!("=== Survival Startup ===");

    let paths = resolve_data_paths().map_err(AppError::from)?;
    let config_path = resolve_config_path(&paths);
    let mut config = load_config(&config_path)?;
    config.max_frames = resolve_max_frames(config.max_frames);
    info!(
        data_dir = %paths.root.display(),
        prefs_file = %paths.prefs_file.display(),
        config_file = %config_path.display(),
        "paths_resolved"
    );

    wire(config, JsonFilePrefs::new(&paths.prefs_file))
}

/// Builds the session and the scripted player around `prefs`.
pub(crate) fn wire(
    config: GameConfig,
    prefs: impl PrefsStore + 'static,
) -> Result<AppWiring, GameError> {
    let hits = DamageQueue::default();
    let ui = LogUi::default();
    let board = BoardBuilder::new(config.enemy.clone(), hits.clone());

    let session = Session::builder(config.session_config())
        .level_builder(board)
        .ui(ui.clone())
        .prefs(prefs)
        .build()
        .map_err(AppError::from)?;

    Ok(AppWiring {
        loop_config: config.loop_config(),
        session: SessionHandle::new(session),
        player: ScriptedPlayer::new(config.player.clone(), hits, ui),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_config_path(paths: &DataPaths) -> PathBuf {
    match env::var(CONFIG_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => paths.root.join(DEFAULT_CONFIG_FILE_NAME),
    }
}

pub(crate) fn load_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "config_file_missing; using defaults");
            return Ok(GameConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_config_json(&raw).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_config_json(raw: &str) -> Result<GameConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {path}: {source}"))
            }
        }
    }
}

fn resolve_max_frames(config_max_frames: Option<u64>) -> Option<u64> {
    match env::var(MAX_FRAMES_ENV_VAR) {
        Ok(value) => parse_max_frames(&value).or_else(|| {
            warn!(
                env_var = MAX_FRAMES_ENV_VAR,
                value = value.as_str(),
                "invalid max-frames env var value; falling back to config"
            );
            config_max_frames
        }),
        Err(env::VarError::NotPresent) => config_max_frames,
        Err(err) => {
            warn!(
                env_var = MAX_FRAMES_ENV_VAR,
                error = %err,
                "unable to read max-frames env var; falling back to config"
            );
            config_max_frames
        }
    }
}

fn parse_max_frames(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|frames| *frames > 0)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let temp = TempDir::new().expect("temp");
        let config = load_config(&temp.path().join("absent.json")).expect("defaults");

        assert_eq!(config.level_start_delay_ms, 2_000);
        assert_eq!(config.turn_delay_ms, 100);
        assert_eq!(config.starting_food_points, 100);
        assert!(!config.realtime);
    }

    #[test]
    fn partial_config_keeps_defaults_for_omitted_fields() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("survival.json");
        fs::write(
            &path,
            r#"{ "turn_delay_ms": 250, "player": { "moves_per_level": 3 } }"#,
        )
        .expect("write");

        let config = load_config(&path).expect("parse");

        assert_eq!(config.turn_delay_ms, 250);
        assert_eq!(config.player.moves_per_level, 3);
        assert_eq!(config.player.move_cost, PlayerConfig::default().move_cost);
        assert_eq!(
            config.session_config().turn_delay,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn config_errors_name_the_failing_field() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("survival.json");
        fs::write(&path, r#"{ "enemy": { "attack_damage": "lots" } }"#).expect("write");

        let err = load_config(&path).expect_err("bad field");
        let message = err.to_string();

        assert!(message.contains("enemy.attack_damage"), "{message}");
        assert!(message.contains("survival.json"), "{message}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_config_json(r#"{ "food": 5 }"#).expect_err("unknown field");
        assert!(err.contains("food"), "{err}");
    }

    #[test]
    fn max_frames_parsing_rejects_zero_and_garbage() {
        assert_eq!(parse_max_frames(" 600 "), Some(600));
        assert_eq!(parse_max_frames("0"), None);
        assert_eq!(parse_max_frames("soon"), None);
    }

    #[test]
    fn simulated_loop_config_matches_tick_rate() {
        let config = GameConfig {
            target_tps: 50,
            max_frames: Some(10),
            ..GameConfig::default()
        };

        let loop_config = config.loop_config();

        assert_eq!(
            loop_config.frame_source,
            FrameSource::Simulated {
                frame_dt: Duration::from_millis(20)
            }
        );
        assert_eq!(loop_config.max_frames, Some(10));
    }
}
