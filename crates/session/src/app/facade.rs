use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use super::actor::{ActorRef, EnemyActor};
use super::phase::Phase;
use super::scheduler::RunToken;
use super::score::ScoreRecord;
use super::session::{Session, SessionError, SessionStats};

thread_local! {
    static SESSION_AUTHORITY_HELD: Cell<bool> = const { Cell::new(false) };
}

/// One live session per thread; released on drop.
#[derive(Debug)]
pub(crate) struct SessionAuthority {
    _private: (),
}

impl SessionAuthority {
    pub(crate) fn claim() -> Result<Self, SessionError> {
        SESSION_AUTHORITY_HELD.with(|held| {
            if held.replace(true) {
                Err(SessionError::AlreadyActive)
            } else {
                Ok(Self { _private: () })
            }
        })
    }
}

impl Drop for SessionAuthority {
    fn drop(&mut self) {
        SESSION_AUTHORITY_HELD.with(|held| held.set(false));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub enemy_turn_started: bool,
    pub moves_performed: usize,
    pub turn_completed: bool,
    pub stale_completion_discarded: bool,
}

/// Enemy moves run with no session borrow held, so `move_enemy` may call
/// back into the handle.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session: Rc<RefCell<Session>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            session: Rc::new(RefCell::new(session)),
        }
    }

    pub fn tick(&self, dt: Duration) -> TickReport {
        let plan = self.session.borrow_mut().tick(dt);
        let mut report = TickReport {
            enemy_turn_started: plan.enemy_turn_started,
            ..TickReport::default()
        };
        let Some(token) = plan.run else {
            return report;
        };

        for actor in &plan.moves {
            if !self.is_current_run(token) {
                debug!(run = token.0, "enemy_turn_abandoned_mid_run");
                break;
            }
            if actor.perform_move() {
                report.moves_performed += 1;
                debug!(run = token.0, actor = %actor.debug_name(), "enemy_moved");
            }
        }

        if plan.run_finished {
            match self.session.borrow_mut().on_enemy_turn_complete(token) {
                Ok(()) => report.turn_completed = true,
                Err(error) => {
                    debug!(error = %error, "enemy_turn_completion_discarded");
                    report.stale_completion_discarded = true;
                }
            }
        }
        report
    }

    pub fn register_actor<A: EnemyActor + 'static>(
        &self,
        actor: &Rc<RefCell<A>>,
        move_delay: Duration,
    ) -> bool {
        self.register(ActorRef::new(actor, move_delay))
    }

    pub fn register_actor_secs<A: EnemyActor + 'static>(
        &self,
        actor: &Rc<RefCell<A>>,
        move_delay_secs: f32,
    ) -> bool {
        self.register(ActorRef::from_secs(actor, move_delay_secs))
    }

    fn register(&self, actor: ActorRef) -> bool {
        match self.session.borrow_mut().register_actor(actor) {
            Ok(()) => true,
            Err(error) => {
                debug!(error = %error, "register_actor_ignored");
                false
            }
        }
    }

    pub fn report_game_over(&self) -> Option<ScoreRecord> {
        match self.session.borrow_mut().report_game_over() {
            Ok(record) => Some(record),
            Err(error) => {
                debug!(error = %error, "report_game_over_ignored");
                None
            }
        }
    }

    pub fn restart(&self) {
        self.session.borrow_mut().restart();
    }

    pub fn on_level_loaded(&self) -> bool {
        match self.session.borrow_mut().on_level_loaded() {
            Ok(()) => true,
            Err(error) => {
                debug!(error = %error, "level_loaded_ignored");
                false
            }
        }
    }

    pub fn spend_food(&self, amount: u32) -> Option<i32> {
        match self.session.borrow_mut().spend_food(amount) {
            Ok(food) => Some(food),
            Err(error) => {
                debug!(error = %error, "spend_food_ignored");
                None
            }
        }
    }

    pub fn gain_food(&self, amount: u32) -> Option<i32> {
        match self.session.borrow_mut().gain_food(amount) {
            Ok(food) => Some(food),
            Err(error) => {
                debug!(error = %error, "gain_food_ignored");
                None
            }
        }
    }

    pub fn reset_high_score(&self) {
        self.session.borrow_mut().reset_high_score();
    }

    pub fn phase(&self) -> Phase {
        self.session.borrow().phase()
    }

    pub fn level(&self) -> u32 {
        self.session.borrow().level()
    }

    pub fn food_points(&self) -> i32 {
        self.session.borrow().food_points()
    }

    pub fn high_score(&self) -> u32 {
        self.session.borrow().high_score()
    }

    pub fn stats(&self) -> SessionStats {
        self.session.borrow().stats()
    }

    pub fn accepts_player_input(&self) -> bool {
        self.session.borrow().accepts_player_input()
    }

    pub fn is_current_run(&self, token: RunToken) -> bool {
        self.session.borrow().is_current_run(token)
    }

    pub fn with_session<R>(&self, read: impl FnOnce(&Session) -> R) -> R {
        read(&self.session.borrow())
    }
}
