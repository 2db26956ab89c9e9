//! Story events produced by a running story script.
//!
//! Every type here is an immutable snapshot: the engine copies interpreter-side
//! fields into these structs at classification time, so the host can keep them
//! after the script object has been mutated or collected.

use serde::{Deserialize, Serialize};

/// A character as shown on stage, with its current emotion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Character identifier.
    pub id: String,
    /// Emotion name (empty when the script set none).
    pub emotion: String,
}

impl Character {
    /// Create a character snapshot.
    pub fn new(id: impl Into<String>, emotion: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            emotion: emotion.into(),
        }
    }
}

/// A line of dialogue, optionally spoken by a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceLine {
    /// The speaker at the time the line was yielded, if any.
    pub character: Option<Character>,
    /// The spoken text.
    pub text: String,
}

impl VoiceLine {
    /// Create a narration line with no speaker.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            character: None,
            text: text.into(),
        }
    }

    /// Set the speaker.
    pub fn with_character(mut self, character: Character) -> Self {
        self.character = Some(character);
        self
    }
}

/// A single option of a [`Choice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOption {
    /// Option identifier sent back to the script when chosen.
    pub id: String,
    /// Text shown to the player.
    pub text: String,
    /// Whether the option's condition held when the choice was yielded.
    pub available: bool,
}

impl StoryOption {
    /// Create an available option.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            available: true,
        }
    }

    /// Set availability.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

/// A player decision point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Choice identifier.
    pub id: String,
    /// The question put to the player.
    pub question: String,
    /// Options in script order.
    pub options: Vec<StoryOption>,
}

impl Choice {
    /// Create a choice with no options.
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            options: Vec::new(),
        }
    }

    /// Add an option.
    pub fn with_option(mut self, option: StoryOption) -> Self {
        self.options.push(option);
        self
    }

    /// Look up an option by id.
    pub fn option(&self, id: &str) -> Option<&StoryOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Iterate over the options whose condition held.
    pub fn available_options(&self) -> impl Iterator<Item = &StoryOption> {
        self.options.iter().filter(|o| o.available)
    }
}

/// A host-facing notification derived from a value the story yielded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoryEvent {
    /// A line of dialogue or narration.
    VoiceLine(VoiceLine),
    /// A decision the player must make before the story continues.
    Choice(Choice),
    /// A character entering the stage or changing emotion.
    Character(Character),
    /// A scene transition.
    SceneChange {
        /// Scene name.
        name: String,
    },
}

impl StoryEvent {
    /// Short name of the event kind, used for logging and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            StoryEvent::VoiceLine(_) => "voice_line",
            StoryEvent::Choice(_) => "choice",
            StoryEvent::Character(_) => "character",
            StoryEvent::SceneChange { .. } => "scene_change",
        }
    }

    /// The choice carried by this event, if it is one.
    pub fn as_choice(&self) -> Option<&Choice> {
        match self {
            StoryEvent::Choice(choice) => Some(choice),
            _ => None,
        }
    }
}
