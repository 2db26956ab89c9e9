//! The fixed bootstrap sequence run once per session.

use mlua::Lua;
use tracing::debug;

use crate::error::{StoryError, StoryResult};

struct BuiltinModule {
    name: &'static str,
    source: &'static str,
}

/// Order matters: `story` builds on the `class` primitive.
const MODULES: &[BuiltinModule] = &[
    BuiltinModule {
        name: "class",
        source: include_str!("lua/class.lua"),
    },
    BuiltinModule {
        name: "story",
        source: include_str!("lua/story.lua"),
    },
];

/// Names of the built-in modules, in execution order.
pub fn bootstrap_modules() -> impl Iterator<Item = &'static str> {
    MODULES.iter().map(|m| m.name)
}

/// Execute every built-in module against `lua`.
///
/// Chunks are named `=fabula/<name>` so they never anchor a relative require.
pub(crate) fn run(lua: &Lua) -> StoryResult<()> {
    for module in MODULES {
        debug!(module = module.name, "running bootstrap module");
        lua.load(module.source)
            .set_name(format!("=fabula/{}", module.name))
            .exec()
            .map_err(|e| {
                StoryError::Init(format!("bootstrap module {} failed: {e}", module.name))
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_order() {
        let names: Vec<_> = bootstrap_modules().collect();
        assert_eq!(names, vec!["class", "story"]);
    }

    #[test]
    fn bootstrap_defines_story_classes() {
        let lua = Lua::new();
        run(&lua).unwrap();

        let names: Vec<String> = lua
            .load(
                r#"
                local npc = character("NPC1", "happy")
                local line = VoiceLine.new(npc, "Hello")
                local pick = Choice.new("c", "?", { { id = "a", text = "A" } })
                return class_name(npc), class_name(line), class_name(pick),
                    class_name(pick.options[1]), class_name(Scene.new("x"))
                "#,
            )
            .eval::<(String, String, String, String, String)>()
            .map(|(a, b, c, d, e)| vec![a, b, c, d, e])
            .unwrap();
        assert_eq!(
            names,
            vec!["Character", "VoiceLine", "Choice", "Option", "Scene"]
        );
    }

    #[test]
    fn class_inheritance() {
        let lua = Lua::new();
        run(&lua).unwrap();

        let (is_base, is_child, name): (bool, bool, String) = lua
            .load(
                r#"
                local Base = class("Base")
                function Base:init(v) self.v = v end
                local Child = class("Child", Base)
                local c = Child.new(3)
                return is_a(c, Base), is_a(c, Child), class_name(c) .. c.v
                "#,
            )
            .eval()
            .unwrap();
        assert!(is_base);
        assert!(is_child);
        assert_eq!(name, "Child3");
    }
}
