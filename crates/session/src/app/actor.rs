use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::warn;

pub trait EnemyActor {
    fn move_enemy(&mut self);
    fn debug_name(&self) -> &str {
        "enemy"
    }
}

#[derive(Clone)]
pub struct ActorRef {
    actor: Weak<RefCell<dyn EnemyActor>>,
    move_delay: Duration,
}

impl ActorRef {
    pub fn new<A: EnemyActor + 'static>(actor: &Rc<RefCell<A>>, move_delay: Duration) -> Self {
        let erased: Rc<RefCell<dyn EnemyActor>> = actor.clone();
        Self {
            actor: Rc::downgrade(&erased),
            move_delay,
        }
    }

    /// Negative or non-finite seconds clamp to zero.
    pub fn from_secs<A: EnemyActor + 'static>(actor: &Rc<RefCell<A>>, move_delay_secs: f32) -> Self {
        Self::new(actor, duration_from_secs_clamped(move_delay_secs))
    }

    pub fn move_delay(&self) -> Duration {
        self.move_delay
    }

    pub fn is_alive(&self) -> bool {
        self.actor.strong_count() > 0
    }

    /// `false` when the actor was dropped or is mid-borrow.
    pub fn perform_move(&self) -> bool {
        let Some(actor) = self.actor.upgrade() else {
            return false;
        };
        let Ok(mut actor) = actor.try_borrow_mut() else {
            warn!("enemy_move_skipped_actor_busy");
            return false;
        };
        actor.move_enemy();
        true
    }

    pub fn debug_name(&self) -> String {
        let Some(actor) = self.actor.upgrade() else {
            return "<dropped>".to_string();
        };
        let name = match actor.try_borrow() {
            Ok(actor) => actor.debug_name().to_string(),
            Err(_) => "<busy>".to_string(),
        };
        name
    }
}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("actor", &self.debug_name())
            .field("move_delay", &self.move_delay)
            .finish()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ActorRegistry {
    entries: Vec<ActorRef>,
}

impl ActorRegistry {
    pub fn register(&mut self, actor: ActorRef) {
        self.entries.push(actor);
    }

    pub fn register_actor<A: EnemyActor + 'static>(
        &mut self,
        actor: &Rc<RefCell<A>>,
        move_delay: Duration,
    ) {
        self.register(ActorRef::new(actor, move_delay));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ActorRef> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorRef> {
        self.entries.iter()
    }
}

pub(crate) fn duration_from_secs_clamped(secs: f32) -> Duration {
    if !secs.is_finite() || secs < 0.0 {
        warn!(secs, "invalid move delay; clamping to zero");
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO)
}
