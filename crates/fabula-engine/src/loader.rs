//! Module loading with once-per-session semantics.
//!
//! The session's [`HostContext`] lives in the interpreter's app-data slot, so
//! host callbacks installed into the interpreter recover it from the `Lua`
//! handle they are called with. Borrows of the context are always released
//! before script code runs, because that code may call back into `require`.

use std::collections::BTreeSet;
use std::rc::Rc;

use fabula_core::PathRules;
use mlua::{Function, Lua};
use tracing::{debug, error};

use crate::error::{StoryError, StoryResult};
use crate::source::ScriptSource;

/// Per-session state reachable from host callbacks.
pub(crate) struct HostContext {
    rules: PathRules,
    source: Rc<dyn ScriptSource>,
    loaded: BTreeSet<String>,
    diagnostics: Vec<String>,
}

impl HostContext {
    pub(crate) fn new(rules: PathRules, source: Rc<dyn ScriptSource>) -> Self {
        Self {
            rules,
            source,
            loaded: BTreeSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn loaded(&self) -> &BTreeSet<String> {
        &self.loaded
    }

    pub(crate) fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

/// What a successful load request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadOutcome {
    /// The module had been loaded earlier in this session; nothing ran.
    AlreadyLoaded,
    /// The module's top-level code ran.
    Executed,
}

/// Run `f` against the session context.
pub(crate) fn with_context<R>(lua: &Lua, f: impl FnOnce(&HostContext) -> R) -> StoryResult<R> {
    let ctx = lua
        .app_data_ref::<HostContext>()
        .ok_or_else(|| StoryError::Init("session context is not installed".to_string()))?;
    Ok(f(&ctx))
}

fn with_context_mut<R>(lua: &Lua, f: impl FnOnce(&mut HostContext) -> R) -> StoryResult<R> {
    let mut ctx = lua
        .app_data_mut::<HostContext>()
        .ok_or_else(|| StoryError::Init("session context is not installed".to_string()))?;
    Ok(f(&mut ctx))
}

/// Log an error and record it in the session diagnostics.
pub(crate) fn report(lua: &Lua, err: StoryError) -> StoryError {
    error!("{err}");
    let message = err.to_string();
    // A session without context has nowhere to record; the log line stands.
    let _ = with_context_mut(lua, |ctx| ctx.diagnostics.push(message));
    err
}

/// Canonical path for a raw identifier under the session's rules.
pub(crate) fn canonical_path(lua: &Lua, raw: &str) -> StoryResult<String> {
    with_context(lua, |ctx| ctx.rules.canonicalize(raw))?.map_err(StoryError::from)
}

/// Canonical path for `raw` relative to `calling_file`.
pub(crate) fn relative_path(lua: &Lua, calling_file: &str, raw: &str) -> StoryResult<String> {
    with_context(lua, |ctx| ctx.rules.resolve_relative(calling_file, raw))?
        .map_err(StoryError::from)
}

/// Record `canonical` as loaded. Returns `false` if it already was.
pub(crate) fn mark_loaded(lua: &Lua, canonical: &str) -> StoryResult<bool> {
    with_context_mut(lua, |ctx| ctx.loaded.insert(canonical.to_string()))
}

/// Read a module's text through the host resource collaborator.
pub(crate) fn read_module(lua: &Lua, canonical: &str) -> StoryResult<String> {
    let source = with_context(lua, |ctx| Rc::clone(&ctx.source))?;
    source
        .read_text(canonical)
        .map_err(|source| StoryError::ResourceRead {
            path: canonical.to_string(),
            source,
        })
}

/// Compile module text into a function without running it.
///
/// The chunk is named `@<canonical>` so call frames inside it report the
/// module as their source file.
pub(crate) fn compile<'lua>(
    lua: &'lua Lua,
    canonical: &str,
    text: &str,
) -> StoryResult<Function<'lua>> {
    lua.load(text)
        .set_name(format!("@{canonical}"))
        .into_function()
        .map_err(|e| StoryError::Compile {
            path: canonical.to_string(),
            message: e.to_string(),
        })
}

/// Load and execute the module at `canonical` unless it already ran.
///
/// A read failure leaves the module unmarked so a later attempt can retry.
/// Otherwise the module is marked before its body runs, so a module that
/// requires itself sees [`LoadOutcome::AlreadyLoaded`].
pub(crate) fn load_module(lua: &Lua, canonical: &str) -> StoryResult<LoadOutcome> {
    if with_context(lua, |ctx| ctx.loaded.contains(canonical))? {
        debug!(path = canonical, "module already loaded");
        return Ok(LoadOutcome::AlreadyLoaded);
    }

    let text = read_module(lua, canonical)?;
    debug!(path = canonical, "loading module");
    mark_loaded(lua, canonical)?;

    let chunk = compile(lua, canonical, &text)?;
    chunk
        .call::<_, ()>(())
        .map_err(|e| StoryError::Runtime {
            path: canonical.to_string(),
            message: e.to_string(),
        })?;
    Ok(LoadOutcome::Executed)
}
