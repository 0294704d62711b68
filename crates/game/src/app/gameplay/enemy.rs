use std::cell::Cell;
use std::rc::Rc;

use serde::Deserialize;
use session::EnemyActor;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EnemyConfig {
    /// Every n-th move is an attack; 0 disables attacks.
    pub(crate) attack_every: u32,
    pub(crate) attack_damage: u32,
    pub(crate) move_delay_ms: u64,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            attack_every: 2,
            attack_damage: 10,
            move_delay_ms: 100,
        }
    }
}

/// Damage dealt by enemies, waiting for the driver to charge it to the
/// player once the tick that produced it returns.
#[derive(Debug, Clone, Default)]
pub(crate) struct DamageQueue {
    pending: Rc<Cell<u32>>,
}

impl DamageQueue {
    pub(crate) fn hit(&self, amount: u32) {
        self.pending.set(self.pending.get().saturating_add(amount));
    }

    pub(crate) fn take(&self) -> u32 {
        self.pending.replace(0)
    }
}

pub(crate) struct ScriptedEnemy {
    name: String,
    attack_every: u32,
    attack_damage: u32,
    moves: u32,
    hits: DamageQueue,
}

impl ScriptedEnemy {
    pub(crate) fn new(name: String, config: &EnemyConfig, hits: DamageQueue) -> Self {
        Self {
            name,
            attack_every: config.attack_every,
            attack_damage: config.attack_damage,
            moves: 0,
            hits,
        }
    }
}

impl EnemyActor for ScriptedEnemy {
    fn move_enemy(&mut self) {
        self.moves = self.moves.saturating_add(1);
        if self.moves.checked_rem(self.attack_every) == Some(0) {
            self.hits.hit(self.attack_damage);
            debug!(enemy = %self.name, damage = self.attack_damage, "enemy_attacked");
        }
    }

    fn debug_name(&self) -> &str {
        &self.name
    }
}
