//! Host-facing event notifications.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use fabula_core::{Character, Choice, StoryEvent, VoiceLine};

/// Receives story events as the engine produces them.
///
/// Every method has an empty default, so a handler only implements the
/// notifications it cares about.
pub trait StoryHandler {
    /// A line of dialogue or narration.
    fn on_say(&mut self, _line: &VoiceLine) {}

    /// A choice the player must answer with [`crate::StoryEngine::choose`].
    fn on_choice(&mut self, _choice: &Choice) {}

    /// A character entering the stage or changing emotion.
    fn on_show_character(&mut self, _character: &Character) {}

    /// A scene transition.
    fn on_show_scene(&mut self, _name: &str) {}
}

/// Fans each event out to every subscribed handler, in subscription order.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Box<dyn StoryHandler>>,
}

impl EventDispatcher {
    /// Create a dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler.
    pub fn subscribe(&mut self, handler: impl StoryHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Deliver one event to every handler.
    pub fn dispatch(&mut self, event: &StoryEvent) {
        for handler in &mut self.handlers {
            match event {
                StoryEvent::VoiceLine(line) => handler.on_say(line),
                StoryEvent::Choice(choice) => handler.on_choice(choice),
                StoryEvent::Character(character) => handler.on_show_character(character),
                StoryEvent::SceneChange { name } => handler.on_show_scene(name),
            }
        }
    }

    /// Number of subscribed handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is subscribed.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A handler that records every event it receives.
///
/// Clones share the same log, so one clone can be subscribed while another
/// is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<StoryEvent>>>,
}

impl EventRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order.
    pub fn events(&self) -> Vec<StoryEvent> {
        self.events.borrow().clone()
    }

    /// Number of events received.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing was received.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget every recorded event.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn record(&self, event: StoryEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl StoryHandler for EventRecorder {
    fn on_say(&mut self, line: &VoiceLine) {
        self.record(StoryEvent::VoiceLine(line.clone()));
    }

    fn on_choice(&mut self, choice: &Choice) {
        self.record(StoryEvent::Choice(choice.clone()));
    }

    fn on_show_character(&mut self, character: &Character) {
        self.record(StoryEvent::Character(character.clone()));
    }

    fn on_show_scene(&mut self, name: &str) {
        self.record(StoryEvent::SceneChange {
            name: name.to_string(),
        });
    }
}
