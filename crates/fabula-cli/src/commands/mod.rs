pub mod check;
pub mod play;
pub mod resolve;

use std::path::Path;

use fabula_engine::{DirSource, EngineConfig, StoryEngine, StoryError};
use miette::Diagnostic;

/// Load the engine configuration, or the defaults when no file is given.
fn load_config(config: Option<&Path>) -> Result<EngineConfig, String> {
    match config {
        Some(path) => EngineConfig::from_json_file(path).map_err(describe),
        None => Ok(EngineConfig::default()),
    }
}

/// Build an engine serving scripts from `dir`.
fn engine_for(dir: &Path, config: Option<&Path>) -> Result<StoryEngine, String> {
    if !dir.is_dir() {
        return Err(format!("'{}' is not a directory", dir.display()));
    }
    let config = load_config(config)?;
    let source = DirSource::new(dir, config.paths.clone());
    Ok(StoryEngine::new(config, source))
}

/// One-line rendering of an engine error with its diagnostic code and help.
fn describe(err: StoryError) -> String {
    let code = err
        .code()
        .map(|code| format!("[{code}] "))
        .unwrap_or_default();
    match err.help() {
        Some(help) => format!("{code}{err} (help: {help})"),
        None => format!("{code}{err}"),
    }
}
