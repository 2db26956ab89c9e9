//! Core types for Fabula: story events, module paths, and call frames.
//!
//! This crate defines the host-facing data model that the engine classifies
//! coroutine output into, plus the pure path rules used to turn script
//! identifiers into canonical module paths. It has no interpreter dependency,
//! so hosts can consume [`StoryEvent`]s without linking Lua.

/// Error types used throughout the crate.
pub mod error;
/// Story events and the snapshots they carry.
pub mod event;
/// Call-frame snapshots used for relative module resolution.
pub mod frame;
/// Canonical module path rules.
pub mod path;

/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export story event types.
pub use event::{Character, Choice, StoryEvent, StoryOption, VoiceLine};
/// Re-export call-frame types.
pub use frame::{CallFrame, nearest_script_file};
/// Re-export path rules.
pub use path::PathRules;
