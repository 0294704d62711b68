//! Shared fakes for session tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::actor::{ActorRegistry, EnemyActor};
use super::facade::SessionHandle;
use super::level::LevelBuilder;
use super::session::{Session, SessionConfig};
use super::ui::SessionUi;
use crate::storage::{MemoryPrefs, PrefsStore, StoreError};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct UiState {
    pub level_text: String,
    pub score_text: String,
    pub retry_visible: bool,
    pub level_image_visible: bool,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingUi {
    state: Rc<RefCell<UiState>>,
}

impl RecordingUi {
    pub fn state(&self) -> UiState {
        self.state.borrow().clone()
    }
}

impl SessionUi for RecordingUi {
    fn set_level_text(&mut self, text: &str) {
        self.state.borrow_mut().level_text = text.to_string();
    }

    fn set_score_text(&mut self, text: &str) {
        self.state.borrow_mut().score_text = text.to_string();
    }

    fn set_retry_visible(&mut self, visible: bool) {
        self.state.borrow_mut().retry_visible = visible;
    }

    fn set_level_image_visible(&mut self, visible: bool) {
        self.state.borrow_mut().level_image_visible = visible;
    }
}

pub(crate) struct LoggingActor {
    name: String,
    log: Rc<RefCell<Vec<String>>>,
}

impl LoggingActor {
    pub fn shared(name: &str, log: &Rc<RefCell<Vec<String>>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            name: name.to_string(),
            log: Rc::clone(log),
        }))
    }
}

impl EnemyActor for LoggingActor {
    fn move_enemy(&mut self) {
        self.log.borrow_mut().push(self.name.clone());
    }

    fn debug_name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedBoard {
    roster: Vec<(&'static str, Duration)>,
    spawned: Rc<RefCell<Vec<Rc<RefCell<LoggingActor>>>>>,
    moves: Rc<RefCell<Vec<String>>>,
    levels_built: Rc<RefCell<Vec<u32>>>,
}

impl ScriptedBoard {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_enemies(roster: &[(&'static str, u64)]) -> Self {
        Self {
            roster: roster
                .iter()
                .map(|(name, delay_ms)| (*name, Duration::from_millis(*delay_ms)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn moves(&self) -> Vec<String> {
        self.moves.borrow().clone()
    }

    pub fn levels_built(&self) -> Vec<u32> {
        self.levels_built.borrow().clone()
    }

    pub fn despawn(&self, name: &str) {
        self.spawned
            .borrow_mut()
            .retain(|actor| actor.borrow().name != name);
    }
}

impl LevelBuilder for ScriptedBoard {
    fn setup_scene(&mut self, level: u32, actors: &mut ActorRegistry) {
        self.levels_built.borrow_mut().push(level);
        let mut spawned = self.spawned.borrow_mut();
        spawned.clear();
        for (name, delay) in &self.roster {
            let actor = LoggingActor::shared(name, &self.moves);
            actors.register_actor(&actor, *delay);
            spawned.push(actor);
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct SharedPrefs {
    inner: Rc<RefCell<MemoryPrefs>>,
}

impl SharedPrefs {
    pub fn seeded(key: &str, value: f32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoryPrefs::new().with_entry(key, value))),
        }
    }

    pub fn read(&self, key: &str) -> Option<f32> {
        self.inner.borrow_mut().get_float(key).ok().flatten()
    }
}

impl PrefsStore for SharedPrefs {
    fn get_float(&mut self, key: &str) -> Result<Option<f32>, StoreError> {
        self.inner.borrow_mut().get_float(key)
    }

    fn set_float(&mut self, key: &str, value: f32) -> Result<(), StoreError> {
        self.inner.borrow_mut().set_float(key, value)
    }

    fn delete_key(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.borrow_mut().delete_key(key)
    }
}

pub(crate) fn build_session(board: ScriptedBoard, ui: RecordingUi, prefs: SharedPrefs) -> Session {
    Session::builder(SessionConfig::default())
        .level_builder(board)
        .ui(ui)
        .prefs(prefs)
        .build()
        .expect("session should build")
}

pub(crate) fn build_handle(board: ScriptedBoard, ui: RecordingUi) -> (SessionHandle, RecordingUi) {
    let session = build_session(board, ui.clone(), SharedPrefs::default());
    (SessionHandle::new(session), ui)
}

pub(crate) fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}
