//! Error types for the story engine.

use miette::Diagnostic;
use thiserror::Error;

use crate::source::SourceError;

/// Result type for engine operations.
pub type StoryResult<T> = Result<T, StoryError>;

/// Errors that can occur while running a story.
///
/// Everything raised by script code is logged and turned into a degraded
/// but continuing control flow; only the variants documented on
/// [`crate::StoryEngine`] methods reach the host as `Err`.
#[derive(Debug, Error, Diagnostic)]
pub enum StoryError {
    /// The interpreter could not be opened or bootstrapped.
    #[error("failed to initialize interpreter: {0}")]
    #[diagnostic(code(fabula::init))]
    Init(String),

    /// A module's text could not be read from the host.
    #[error("cannot read script {path}: {source}")]
    #[diagnostic(
        code(fabula::resource_read),
        help("check that the module exists under the script root")
    )]
    ResourceRead {
        /// Canonical path that was requested.
        path: String,
        /// Underlying read failure.
        #[source]
        source: SourceError,
    },

    /// A module failed to parse.
    #[error("failed to compile {path}: {message}")]
    #[diagnostic(code(fabula::compile))]
    Compile {
        /// Canonical path of the module.
        path: String,
        /// Interpreter message.
        message: String,
    },

    /// Script code raised an error while running.
    #[error("script error in {path}: {message}")]
    #[diagnostic(code(fabula::runtime))]
    Runtime {
        /// Canonical path of the module or entry script.
        path: String,
        /// Interpreter message, including its traceback.
        message: String,
    },

    /// `require_relative` found no calling frame backed by a script file.
    #[error("require_relative(\"{0}\") called from unknown location")]
    #[diagnostic(
        code(fabula::unresolved_relative_require),
        help("require_relative only works from code loaded from a script file")
    )]
    UnresolvedRelativeRequire(String),

    /// A resume or choice was issued while no story is suspended.
    #[error("no story is running")]
    #[diagnostic(code(fabula::not_running))]
    NotRunning,

    /// The chosen option is not part of the pending choice.
    #[error("choice \"{choice}\" has no option \"{option}\"")]
    #[diagnostic(code(fabula::unknown_option))]
    UnknownOption {
        /// Pending choice id.
        choice: String,
        /// Requested option id.
        option: String,
    },

    /// The chosen option's condition did not hold.
    #[error("option \"{option}\" of choice \"{choice}\" is not available")]
    #[diagnostic(code(fabula::option_unavailable))]
    OptionUnavailable {
        /// Pending choice id.
        choice: String,
        /// Requested option id.
        option: String,
    },

    /// Engine configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    #[diagnostic(code(fabula::config))]
    Config(String),

    /// Module identifier could not be resolved.
    #[error(transparent)]
    #[diagnostic(code(fabula::path))]
    Path(#[from] fabula_core::CoreError),

    /// Interpreter API failure outside of script code.
    #[error("interpreter error: {0}")]
    #[diagnostic(code(fabula::lua))]
    Lua(#[from] mlua::Error),
}
