//! One interpreter plus its root story coroutine.

use std::rc::Rc;

use mlua::{Lua, LuaOptions, RegistryKey, StdLib, Thread, ThreadStatus, Value};
use tracing::{Span, debug, info, info_span};
use uuid::Uuid;

use crate::bootstrap;
use crate::classify::{Classified, classify};
use crate::config::EngineConfig;
use crate::error::{StoryError, StoryResult};
use crate::host;
use crate::loader::{self, HostContext};
use crate::source::ScriptSource;

/// Result of one resume of the story coroutine.
#[derive(Debug)]
pub(crate) enum Step {
    /// The coroutine suspended with a value.
    Yielded(Classified),
    /// The coroutine returned or died; its handle has been released.
    Finished,
}

/// What survives a closed session.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionRecord {
    pub(crate) loaded: Vec<String>,
    pub(crate) diagnostics: Vec<String>,
}

/// A live story session.
///
/// The session owns its interpreter exclusively; the coroutine handle lives
/// in the interpreter's registry and is released as soon as the coroutine
/// stops being resumable.
pub(crate) struct Session {
    id: Uuid,
    span: Span,
    lua: Lua,
    entry: Option<String>,
    fiber: Option<RegistryKey>,
}

impl Session {
    /// Open an interpreter, run the bootstrap sequence, install host
    /// functions and load the configured preload modules.
    pub(crate) fn open(config: &EngineConfig, source: Rc<dyn ScriptSource>) -> StoryResult<Self> {
        let id = Uuid::new_v4();
        let span = info_span!("session", id = %id);
        let lua = span.in_scope(|| -> StoryResult<Lua> {
            let lua = Lua::new_with(StdLib::ALL_SAFE, LuaOptions::default())
                .map_err(|e| StoryError::Init(e.to_string()))?;
            lua.set_app_data(HostContext::new(config.paths.clone(), source));
            bootstrap::run(&lua)?;
            host::install(&lua, config.redirect_print)
                .map_err(|e| StoryError::Init(format!("cannot install host functions: {e}")))?;

            for raw in &config.preload {
                debug!(module = raw.as_str(), "preloading");
                let result = loader::canonical_path(&lua, raw)
                    .and_then(|canonical| loader::load_module(&lua, &canonical));
                if let Err(e) = result {
                    loader::report(&lua, e);
                }
            }
            info!("session opened");
            Ok(lua)
        })?;

        Ok(Self {
            id,
            span,
            lua,
            entry: None,
            fiber: None,
        })
    }

    /// Compile the entry script into the root coroutine without running it.
    ///
    /// The entry counts as loaded from here on.
    pub(crate) fn start(&mut self, entry: &str) -> StoryResult<()> {
        let span = self.span.clone();
        let _guard = span.enter();
        self.load_entry(entry)
            .map_err(|e| loader::report(&self.lua, e))
    }

    fn load_entry(&mut self, entry: &str) -> StoryResult<()> {
        let canonical = loader::canonical_path(&self.lua, entry)?;
        let text = loader::read_module(&self.lua, &canonical)?;
        loader::mark_loaded(&self.lua, &canonical)?;
        let chunk = loader::compile(&self.lua, &canonical, &text)?;
        let thread = self.lua.create_thread(chunk)?;
        self.fiber = Some(self.lua.create_registry_value(thread)?);
        info!(entry = canonical.as_str(), "story started");
        self.entry = Some(canonical);
        Ok(())
    }

    /// Resume the coroutine with zero or one input value.
    ///
    /// A runtime error inside the coroutine is reported and ends it.
    pub(crate) fn resume(&mut self, input: Option<&str>) -> StoryResult<Step> {
        let span = self.span.clone();
        let _guard = span.enter();

        let Some(key) = self.fiber.as_ref() else {
            return Err(StoryError::NotRunning);
        };
        let yielded = {
            let thread: Thread = self.lua.registry_value(key)?;
            if matches!(thread.status(), ThreadStatus::Resumable) {
                let result = match input {
                    Some(value) => thread.resume::<_, Value>(value),
                    None => thread.resume::<_, Value>(()),
                };
                match result {
                    Ok(value) if matches!(thread.status(), ThreadStatus::Resumable) => {
                        Some(classify(&self.lua, value))
                    }
                    Ok(_) => None,
                    Err(e) => {
                        loader::report(
                            &self.lua,
                            StoryError::Runtime {
                                path: self.entry.clone().unwrap_or_default(),
                                message: e.to_string(),
                            },
                        );
                        None
                    }
                }
            } else {
                None
            }
        };

        match yielded {
            Some(classified) => Ok(Step::Yielded(classified)),
            None => {
                self.release_fiber()?;
                Ok(Step::Finished)
            }
        }
    }

    fn release_fiber(&mut self) -> StoryResult<()> {
        if let Some(key) = self.fiber.take() {
            self.lua.remove_registry_value(key)?;
        }
        Ok(())
    }

    /// Session identifier, also recorded on the session's log span.
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Sorted canonical paths of every module loaded so far.
    pub(crate) fn loaded_modules(&self) -> Vec<String> {
        loader::with_context(&self.lua, |ctx| ctx.loaded().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every error message reported so far, in order.
    pub(crate) fn diagnostics(&self) -> Vec<String> {
        loader::with_context(&self.lua, |ctx| ctx.diagnostics().to_vec()).unwrap_or_default()
    }

    /// Tear the session down, keeping what the host may still ask about.
    pub(crate) fn close(mut self) -> SessionRecord {
        let span = self.span.clone();
        let _guard = span.enter();
        // The interpreter is dropped right after; a failed release leaks nothing.
        let _ = self.release_fiber();
        info!("session closed");
        SessionRecord {
            loaded: self.loaded_modules(),
            diagnostics: self.diagnostics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use fabula_core::StoryEvent;

    fn open(source: MemorySource) -> Session {
        Session::open(&EngineConfig::default(), Rc::new(source)).unwrap()
    }

    #[test]
    fn steps_until_finished() {
        let mut session = open(MemorySource::new().with_file(
            "res://main.lua",
            r#"
            local answer = choose("c", "?", { { id = "a", text = "A" } })
            say("picked " .. tostring(answer))
            "#,
        ));
        session.start("main").unwrap();

        let Step::Yielded(Classified::Event(StoryEvent::Choice(_))) = session.resume(None).unwrap()
        else {
            panic!("expected a choice");
        };
        let Step::Yielded(Classified::Event(StoryEvent::VoiceLine(line))) =
            session.resume(Some("a")).unwrap()
        else {
            panic!("expected a voice line");
        };
        assert_eq!(line.text, "picked a");
        assert!(matches!(session.resume(None).unwrap(), Step::Finished));
        assert!(matches!(session.resume(None), Err(StoryError::NotRunning)));
    }

    #[test]
    fn runtime_error_finishes_and_is_recorded() {
        let mut session = open(
            MemorySource::new().with_file("res://main.lua", "say('one') error('broken')"),
        );
        session.start("main").unwrap();
        assert!(matches!(session.resume(None).unwrap(), Step::Yielded(_)));
        assert!(matches!(session.resume(None).unwrap(), Step::Finished));

        let record = session.close();
        assert_eq!(record.diagnostics.len(), 1);
        assert!(record.diagnostics[0].contains("broken"));
        assert_eq!(record.loaded, vec!["res://main.lua"]);
    }

    #[test]
    fn preload_failures_do_not_stop_the_session() {
        let config = EngineConfig::default()
            .with_preload("helpers")
            .with_preload("missing");
        let source = MemorySource::new()
            .with_file("res://helpers.lua", "GREETING = 'hi'")
            .with_file("res://main.lua", "say(GREETING)");
        let mut session = Session::open(&config, Rc::new(source)).unwrap();
        session.start("main").unwrap();

        assert_eq!(session.diagnostics().len(), 1);
        assert_eq!(
            session.loaded_modules(),
            vec!["res://helpers.lua", "res://main.lua"]
        );
        let Step::Yielded(Classified::Event(StoryEvent::VoiceLine(line))) =
            session.resume(None).unwrap()
        else {
            panic!("expected a voice line");
        };
        assert_eq!(line.text, "hi");
    }

    #[test]
    fn missing_entry_is_an_error() {
        let mut session = open(MemorySource::new());
        assert!(matches!(
            session.start("nowhere"),
            Err(StoryError::ResourceRead { .. })
        ));
        assert!(session.loaded_modules().is_empty());
    }
}
