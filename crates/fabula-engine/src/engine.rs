//! The story engine: drives one session's coroutine and hands events to the host.

use std::rc::Rc;

use fabula_core::StoryEvent;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::classify::Classified;
use crate::config::EngineConfig;
use crate::dispatch::{EventDispatcher, StoryHandler};
use crate::error::{StoryError, StoryResult};
use crate::session::{Session, SessionRecord, Step};
use crate::source::ScriptSource;

/// Where the engine is in a story's life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// No story has been started.
    Uninitialized,
    /// The coroutine is executing.
    Running,
    /// The coroutine is paused on an event, waiting for the host.
    Suspended(StoryEvent),
    /// The story ended or was terminated. Resuming is an error.
    Terminated,
}

/// Runs story scripts and turns what they yield into host events.
///
/// # Example
///
/// ```
/// use fabula_engine::{EngineConfig, MemorySource, StoryEngine};
///
/// let source = MemorySource::new().with_file("res://main.lua", r#"say("Hello")"#);
/// let mut engine = StoryEngine::new(EngineConfig::default(), source);
///
/// let event = engine.eval_file("main").unwrap();
/// assert_eq!(event.map(|e| e.kind()), Some("voice_line"));
/// assert_eq!(engine.resume().unwrap(), None);
/// assert!(engine.is_finished());
/// ```
pub struct StoryEngine {
    config: EngineConfig,
    source: Rc<dyn ScriptSource>,
    dispatcher: EventDispatcher,
    session: Option<Session>,
    record: SessionRecord,
    state: EngineState,
}

impl StoryEngine {
    /// Create an engine reading modules from `source`.
    pub fn new(config: EngineConfig, source: impl ScriptSource + 'static) -> Self {
        Self {
            config,
            source: Rc::new(source),
            dispatcher: EventDispatcher::new(),
            session: None,
            record: SessionRecord::default(),
            state: EngineState::Uninitialized,
        }
    }

    /// Subscribe a handler to every future event.
    pub fn subscribe(&mut self, handler: impl StoryHandler + 'static) {
        self.dispatcher.subscribe(handler);
    }

    /// Start a new session on the entry script at `path`.
    ///
    /// Any running session is terminated first. Returns the first host-facing
    /// event, or `None` if the story finished without producing one.
    ///
    /// # Errors
    ///
    /// [`StoryError::Init`] if the interpreter cannot be set up, and
    /// [`StoryError::ResourceRead`], [`StoryError::Compile`] or
    /// [`StoryError::Path`] if the entry script itself cannot be loaded.
    /// The engine is [`EngineState::Terminated`] afterwards.
    pub fn eval_file(&mut self, path: &str) -> StoryResult<Option<StoryEvent>> {
        self.close_session();
        self.record = SessionRecord::default();

        let mut session = match Session::open(&self.config, Rc::clone(&self.source)) {
            Ok(session) => session,
            Err(e) => {
                error!("{e}");
                self.state = EngineState::Terminated;
                return Err(e);
            }
        };
        if let Err(e) = session.start(path) {
            self.record = session.close();
            self.state = EngineState::Terminated;
            return Err(e);
        }

        self.session = Some(session);
        self.drive(None)
    }

    /// Resume a suspended story with no input.
    ///
    /// # Errors
    ///
    /// [`StoryError::NotRunning`] unless the engine is suspended.
    pub fn resume(&mut self) -> StoryResult<Option<StoryEvent>> {
        if !matches!(self.state, EngineState::Suspended(_)) {
            return Err(StoryError::NotRunning);
        }
        self.drive(None)
    }

    /// Resume a suspended story with the chosen option id.
    ///
    /// When the pending event is a [`fabula_core::Choice`] the id is checked
    /// against its options first; on failure the story stays suspended.
    ///
    /// # Errors
    ///
    /// [`StoryError::NotRunning`] unless the engine is suspended,
    /// [`StoryError::UnknownOption`] or [`StoryError::OptionUnavailable`] for
    /// an invalid option.
    pub fn choose(&mut self, option_id: &str) -> StoryResult<Option<StoryEvent>> {
        let EngineState::Suspended(pending) = &self.state else {
            return Err(StoryError::NotRunning);
        };
        if let StoryEvent::Choice(choice) = pending {
            match choice.option(option_id) {
                None => {
                    return Err(StoryError::UnknownOption {
                        choice: choice.id.clone(),
                        option: option_id.to_string(),
                    });
                }
                Some(option) if !option.available => {
                    return Err(StoryError::OptionUnavailable {
                        choice: choice.id.clone(),
                        option: option_id.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        self.drive(Some(option_id))
    }

    /// Tear down the current session immediately. Idempotent.
    pub fn terminate(&mut self) {
        if self.session.is_some() {
            info!("terminating story");
        }
        self.close_session();
        self.state = EngineState::Terminated;
    }

    /// Resume until the coroutine yields a host-facing event or dies.
    fn drive(&mut self, input: Option<&str>) -> StoryResult<Option<StoryEvent>> {
        let Some(session) = self.session.as_mut() else {
            self.state = EngineState::Terminated;
            return Err(StoryError::NotRunning);
        };
        self.state = EngineState::Running;

        let mut input = input;
        loop {
            let step = match session.resume(input.take()) {
                Ok(step) => step,
                Err(e) => {
                    self.close_session();
                    self.state = EngineState::Terminated;
                    return Err(e);
                }
            };
            match step {
                Step::Finished => {
                    info!("story finished");
                    self.close_session();
                    self.state = EngineState::Terminated;
                    return Ok(None);
                }
                Step::Yielded(Classified::Continue) => {
                    debug!("nothing to dispatch, continuing");
                }
                Step::Yielded(Classified::Unrecognized(description)) => {
                    warn!("unrecognized story result: {description}");
                }
                Step::Yielded(Classified::Event(event)) => {
                    debug!(kind = event.kind(), "dispatching story event");
                    self.dispatcher.dispatch(&event);
                    self.state = EngineState::Suspended(event.clone());
                    return Ok(Some(event));
                }
            }
        }
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.record = session.close();
        }
    }

    /// Current state.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// The event the story is suspended on, if any.
    pub fn pending(&self) -> Option<&StoryEvent> {
        match &self.state {
            EngineState::Suspended(event) => Some(event),
            _ => None,
        }
    }

    /// Whether the last story ended or was terminated.
    pub fn is_finished(&self) -> bool {
        self.state == EngineState::Terminated
    }

    /// Id of the live session, if one is open.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(Session::id)
    }

    /// Sorted canonical paths loaded by the live or last session.
    pub fn loaded_modules(&self) -> Vec<String> {
        match &self.session {
            Some(session) => session.loaded_modules(),
            None => self.record.loaded.clone(),
        }
    }

    /// Every error reported by the live or last session, in order.
    pub fn diagnostics(&self) -> Vec<String> {
        match &self.session {
            Some(session) => session.diagnostics(),
            None => self.record.diagnostics.clone(),
        }
    }
}
