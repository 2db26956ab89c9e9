//! Lua story orchestration for Fabula.
//!
//! A [`StoryEngine`] opens one Lua interpreter per session, runs the built-in
//! story vocabulary, and compiles an entry script into a coroutine. Each time
//! the coroutine yields, the yielded object is classified into a
//! [`StoryEvent`](fabula_core::StoryEvent) and handed to the host; the host
//! answers with [`StoryEngine::resume`] or [`StoryEngine::choose`].
//!
//! Scripts load other scripts with `require` and `require_relative`; each
//! module runs at most once per session. Script errors are logged and never
//! escape into the host.
//!
//! Yields must happen in functions called from the entry script, not in the
//! top-level body of a required module: `require` is a host function and a
//! coroutine cannot yield across it.

/// Built-in modules run at the start of every session.
pub mod bootstrap;
mod classify;
/// Engine configuration.
pub mod config;
/// Host-facing event handlers.
pub mod dispatch;
/// The story engine.
pub mod engine;
/// Error types used throughout the crate.
pub mod error;
mod host;
mod loader;
mod session;
/// Module text sources.
pub mod source;
mod value;

/// Re-export the bootstrap module list.
pub use bootstrap::bootstrap_modules;
/// Re-export configuration.
pub use config::EngineConfig;
/// Re-export event handler types.
pub use dispatch::{EventDispatcher, EventRecorder, StoryHandler};
/// Re-export the engine.
pub use engine::{EngineState, StoryEngine};
/// Re-export error types.
pub use error::{StoryError, StoryResult};
/// Re-export module sources.
pub use source::{DirSource, MemorySource, ScriptSource, SourceError};
