//! Classification of values yielded by the story coroutine.
//!
//! A yielded object is dispatched on its class name (the `__name` of its
//! metatable) into a closed set of story classes. Fields are copied out by
//! value, so the resulting [`StoryEvent`] is independent of the live object.

use fabula_core::{Character, Choice, StoryEvent, StoryOption, VoiceLine};
use mlua::{Lua, Table, Value};
use tracing::{debug, error, warn};

use crate::value::{display_value, field_string, raw_field, truthy};

/// What the orchestrator should do with a yielded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classified {
    /// Nothing for the host; resume again.
    Continue,
    /// A host-facing event; suspend until the host answers.
    Event(StoryEvent),
    /// A value of unknown shape, described for the warning log.
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoryClass {
    VoiceLine,
    Choice,
    Character,
    Scene,
}

impl StoryClass {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "VoiceLine" => Some(Self::VoiceLine),
            "Choice" => Some(Self::Choice),
            "Character" => Some(Self::Character),
            "Scene" => Some(Self::Scene),
            _ => None,
        }
    }
}

/// Classify one yielded value.
pub(crate) fn classify<'lua>(lua: &'lua Lua, value: Value<'lua>) -> Classified {
    match value {
        Value::Nil => Classified::Continue,
        Value::Table(table) => classify_table(lua, table),
        other => {
            let type_name = other.type_name();
            Classified::Unrecognized(format!("{type_name} {}", display_value(lua, other)))
        }
    }
}

/// The runtime class name of a value, if it is a class instance.
pub(crate) fn class_name(table: &Table<'_>) -> Option<String> {
    let metatable = table.get_metatable()?;
    metatable.raw_get::<_, Option<String>>("__name").ok().flatten()
}

fn classify_table<'lua>(lua: &'lua Lua, table: Table<'lua>) -> Classified {
    if let Some(name) = class_name(&table) {
        return match StoryClass::from_name(&name) {
            Some(class) => Classified::Event(extract(lua, class, &table)),
            None => Classified::Unrecognized(format!("object of class {name}")),
        };
    }

    let len = table.raw_len();
    if len > 0 {
        debug!(len, "yielded batch, nothing to dispatch");
        return Classified::Continue;
    }
    Classified::Unrecognized(format!("table {}", display_value(lua, Value::Table(table))))
}

fn extract<'lua>(lua: &'lua Lua, class: StoryClass, table: &Table<'lua>) -> StoryEvent {
    match class {
        StoryClass::Character => StoryEvent::Character(character(lua, table)),
        StoryClass::VoiceLine => StoryEvent::VoiceLine(voice_line(lua, table)),
        StoryClass::Choice => StoryEvent::Choice(choice(lua, table)),
        StoryClass::Scene => StoryEvent::SceneChange {
            name: field_string(lua, raw_field(table, "name")),
        },
    }
}

fn character<'lua>(lua: &'lua Lua, table: &Table<'lua>) -> Character {
    Character::new(
        field_string(lua, raw_field(table, "id")),
        field_string(lua, raw_field(table, "emotion")),
    )
}

fn voice_line<'lua>(lua: &'lua Lua, table: &Table<'lua>) -> VoiceLine {
    let line = VoiceLine::new(field_string(lua, raw_field(table, "text")));
    match raw_field(table, "character") {
        Value::Table(speaker) => line.with_character(character(lua, &speaker)),
        _ => line,
    }
}

fn choice<'lua>(lua: &'lua Lua, table: &Table<'lua>) -> Choice {
    let mut choice = Choice::new(
        field_string(lua, raw_field(table, "id")),
        field_string(lua, raw_field(table, "question")),
    );
    if let Value::Table(options) = raw_field(table, "options") {
        choice.options = options_in_order(lua, &choice.id, options)
            .into_iter()
            .filter_map(|(key, value)| option(lua, key, value))
            .collect();
    }
    choice
}

/// Option entries paired with a fallback id, in script order.
///
/// A sequence is read in index order. A keyed table has no order of its
/// own, so its entries are sorted by key text.
fn options_in_order<'lua>(
    lua: &'lua Lua,
    choice_id: &str,
    options: Table<'lua>,
) -> Vec<(String, Value<'lua>)> {
    if options.raw_len() > 0 {
        return options
            .sequence_values::<Value>()
            .filter_map(Result::ok)
            .map(|value| (String::new(), value))
            .collect();
    }

    let mut entries: Vec<(String, Value<'lua>)> = options
        .pairs::<Value, Value>()
        .filter_map(Result::ok)
        .map(|(key, value)| (display_value(lua, key), value))
        .collect();
    if !entries.is_empty() {
        warn!(
            choice = choice_id,
            "options are not a sequence; ordering them by key"
        );
    }
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

fn option<'lua>(lua: &'lua Lua, key: String, value: Value<'lua>) -> Option<StoryOption> {
    let Value::Table(table) = value else {
        warn!(
            entry = %display_value(lua, value),
            "skipping option that is not an object"
        );
        return None;
    };

    let mut id = field_string(lua, raw_field(&table, "id"));
    if id.is_empty() {
        id = key;
    }
    let text = field_string(lua, raw_field(&table, "text"));
    let available = condition_holds(&id, raw_field(&table, "condition"));
    Some(StoryOption::new(id, text).with_available(available))
}

fn condition_holds(option_id: &str, condition: Value<'_>) -> bool {
    match condition {
        Value::Nil => true,
        Value::Function(check) => match check.call::<_, Value>(()) {
            Ok(result) => truthy(&result),
            Err(e) => {
                error!(option = option_id, "option condition failed: {e}");
                false
            }
        },
        other => truthy(&other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;

    fn lua() -> Lua {
        let lua = Lua::new();
        bootstrap::run(&lua).unwrap();
        lua
    }

    fn classify_src(lua: &Lua, src: &str) -> Classified {
        let value: Value = lua.load(src).eval().unwrap();
        classify(lua, value)
    }

    #[test]
    fn nil_continues() {
        let lua = lua();
        assert_eq!(classify(&lua, Value::Nil), Classified::Continue);
    }

    #[test]
    fn batch_continues() {
        let lua = lua();
        assert_eq!(classify_src(&lua, "return { 1, 2, 3 }"), Classified::Continue);
    }

    #[test]
    fn primitives_and_unknown_classes_are_unrecognized() {
        let lua = lua();
        assert!(matches!(
            classify_src(&lua, "return 42"),
            Classified::Unrecognized(desc) if desc == "integer 42"
        ));
        assert!(matches!(
            classify_src(&lua, r#"return class("Weather").new()"#),
            Classified::Unrecognized(desc) if desc.contains("Weather")
        ));
        assert!(matches!(
            classify_src(&lua, "return {}"),
            Classified::Unrecognized(_)
        ));
    }

    #[test]
    fn character_and_scene() {
        let lua = lua();
        assert_eq!(
            classify_src(&lua, r#"return character("NPC1", "happy")"#),
            Classified::Event(StoryEvent::Character(Character::new("NPC1", "happy")))
        );
        assert_eq!(
            classify_src(&lua, r#"return Scene.new("harbor")"#),
            Classified::Event(StoryEvent::SceneChange {
                name: "harbor".to_string()
            })
        );
    }

    #[test]
    fn voice_line_with_and_without_speaker() {
        let lua = lua();
        assert_eq!(
            classify_src(&lua, r#"return VoiceLine.new(character("NPC1", "sad"), "Hi")"#),
            Classified::Event(StoryEvent::VoiceLine(
                VoiceLine::new("Hi").with_character(Character::new("NPC1", "sad"))
            ))
        );
        assert_eq!(
            classify_src(&lua, r#"return VoiceLine.new(nil, "Rain falls.")"#),
            Classified::Event(StoryEvent::VoiceLine(VoiceLine::new("Rain falls.")))
        );
    }

    #[test]
    fn non_string_fields_become_text() {
        let lua = lua();
        assert_eq!(
            classify_src(&lua, "return character(7, true)"),
            Classified::Event(StoryEvent::Character(Character::new("7", "true")))
        );
    }

    #[test]
    fn choice_keeps_script_order_and_conditions() {
        let lua = lua();
        let classified = classify_src(
            &lua,
            r#"
            has_key = false
            return Choice.new("door", "Open it?", {
                { id = "push", text = "Push" },
                { id = "key", text = "Unlock", condition = function() return has_key end },
                { id = "knock", text = "Knock", condition = true },
                { id = "kick", text = "Kick", condition = false },
                { "wait", "Wait" },
            })
            "#,
        );
        let Classified::Event(StoryEvent::Choice(choice)) = classified else {
            panic!("expected a choice, got {classified:?}");
        };
        assert_eq!(choice.id, "door");
        assert_eq!(choice.question, "Open it?");
        let summary: Vec<_> = choice
            .options
            .iter()
            .map(|o| (o.id.as_str(), o.text.as_str(), o.available))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("push", "Push", true),
                ("key", "Unlock", false),
                ("knock", "Knock", true),
                ("kick", "Kick", false),
                ("wait", "Wait", true),
            ]
        );
    }

    #[test]
    fn failing_condition_makes_option_unavailable() {
        let lua = lua();
        let classified = classify_src(
            &lua,
            r#"return Choice.new("c", "?", {
                { id = "a", text = "A", condition = function() error("nope") end },
            })"#,
        );
        let Classified::Event(StoryEvent::Choice(choice)) = classified else {
            panic!("expected a choice");
        };
        assert_eq!(choice.option("a").map(|o| o.available), Some(false));
    }

    #[test]
    fn keyed_options_are_sorted_by_key() {
        let lua = lua();
        let classified = classify_src(
            &lua,
            r#"
            local c = Choice.new("c", "?", {})
            c.options = { zed = { text = "Z" }, alpha = { text = "A" } }
            return c
            "#,
        );
        let Classified::Event(StoryEvent::Choice(choice)) = classified else {
            panic!("expected a choice");
        };
        let ids: Vec<_> = choice.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zed"]);
    }
}
