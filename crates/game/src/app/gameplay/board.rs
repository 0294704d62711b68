use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use session::{ActorRegistry, LevelBuilder};
use tracing::info;

use super::enemy::{DamageQueue, EnemyConfig, ScriptedEnemy};

/// Enemies on a level: `floor(log2(level))`, so none on day one.
pub(crate) fn enemy_count_for_level(level: u32) -> u32 {
    level.checked_ilog2().unwrap_or(0)
}

/// Owns the enemies of the level in play; the session only keeps weak
/// references to them.
pub(crate) struct BoardBuilder {
    config: EnemyConfig,
    hits: DamageQueue,
    enemies: Vec<Rc<RefCell<ScriptedEnemy>>>,
}

impl BoardBuilder {
    pub(crate) fn new(config: EnemyConfig, hits: DamageQueue) -> Self {
        Self {
            config,
            hits,
            enemies: Vec::new(),
        }
    }
}

impl LevelBuilder for BoardBuilder {
    fn setup_scene(&mut self, level: u32, actors: &mut ActorRegistry) {
        self.enemies.clear();
        let move_delay = Duration::from_millis(self.config.move_delay_ms);
        for index in 0..enemy_count_for_level(level) {
            let enemy = Rc::new(RefCell::new(ScriptedEnemy::new(
                format!("enemy-{level}-{index}"),
                &self.config,
                self.hits.clone(),
            )));
            actors.register_actor(&enemy, move_delay);
            self.enemies.push(enemy);
        }
        info!(level, enemy_count = self.enemies.len(), "board_ready");
    }
}
