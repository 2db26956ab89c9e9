//! Host functions installed into the script environment.
//!
//! - `require(id)` loads a module by identifier, once per session.
//! - `require_relative(id)` resolves `id` against the directory of the
//!   nearest calling script file.
//! - `print(...)` is redirected into the host log.
//!
//! Failures inside these functions are logged and recorded, never raised
//! into the script: `require` returns `nil` and the story keeps running.

use fabula_core::{CallFrame, nearest_script_file};
use mlua::{Lua, Value, Variadic};
use tracing::info;

use crate::error::{StoryError, StoryResult};
use crate::loader::{self, LoadOutcome};
use crate::value::{display_value, field_string};

/// Install `require`, `require_relative` and (optionally) `print`.
pub(crate) fn install(lua: &Lua, redirect_print: bool) -> StoryResult<()> {
    let globals = lua.globals();

    let require = lua.create_function(|lua, raw: Value| {
        let raw = field_string(lua, raw);
        info!("require(\"{raw}\")");
        Ok(require_module(lua, &raw))
    })?;
    globals.set("require", require)?;

    let require_relative = lua.create_function(|lua, raw: Value| {
        let raw = field_string(lua, raw);
        Ok(require_relative_module(lua, &raw))
    })?;
    globals.set("require_relative", require_relative)?;

    if redirect_print {
        let print = lua.create_function(|lua, args: Variadic<Value>| {
            let line = args
                .iter()
                .map(|value| display_value(lua, value.clone()))
                .collect::<Vec<_>>()
                .join("\t");
            info!(target: "fabula::script", "{line}");
            Ok(())
        })?;
        globals.set("print", print)?;
    }

    Ok(())
}

/// Script-facing result of a load: `true` ran, `false` already loaded,
/// `nil` failed.
fn outcome(lua: &Lua, result: StoryResult<LoadOutcome>) -> Option<bool> {
    match result {
        Ok(LoadOutcome::Executed) => Some(true),
        Ok(LoadOutcome::AlreadyLoaded) => Some(false),
        Err(err) => {
            loader::report(lua, err);
            None
        }
    }
}

fn require_module(lua: &Lua, raw: &str) -> Option<bool> {
    let result = loader::canonical_path(lua, raw)
        .and_then(|canonical| loader::load_module(lua, &canonical));
    outcome(lua, result)
}

fn require_relative_module(lua: &Lua, raw: &str) -> Option<bool> {
    let frames = call_stack(lua);
    let Some(calling_file) = nearest_script_file(&frames) else {
        info!("require_relative(\"{raw}\") from unknown location");
        loader::report(lua, StoryError::UnresolvedRelativeRequire(raw.to_string()));
        return None;
    };
    info!("require_relative(\"{raw}\") from \"{calling_file}\"");

    let result = loader::relative_path(lua, calling_file, raw)
        .and_then(|canonical| loader::load_module(lua, &canonical));
    outcome(lua, result)
}

/// Snapshot of the active call stack, innermost first.
///
/// Only chunks named `@<path>` are backed by a script file; built-in and
/// string chunks use other prefixes.
pub(crate) fn call_stack(lua: &Lua) -> Vec<CallFrame> {
    let mut frames = Vec::new();
    let mut level = 0;
    while let Some(debug) = lua.inspect_stack(level) {
        let source = debug.source();
        let frame = if source.what == "C" {
            CallFrame::native()
        } else {
            CallFrame {
                source: source
                    .source
                    .as_deref()
                    .and_then(|s| s.strip_prefix('@'))
                    .map(str::to_string),
                native: false,
                line: u32::try_from(debug.curr_line()).ok(),
            }
        };
        frames.push(frame);
        level += 1;
    }
    frames
}
