mod board;
mod enemy;
mod player;
mod ui;

pub(crate) use board::BoardBuilder;
pub(crate) use enemy::{DamageQueue, EnemyConfig};
pub(crate) use player::{PlayerConfig, ScriptedPlayer};
pub(crate) use ui::LogUi;
