//! Conversions from interpreter values to host strings.

use mlua::{Function, Lua, Table, Value};

/// Lua truthiness: everything but `nil` and `false`.
pub(crate) fn truthy(value: &Value<'_>) -> bool {
    !matches!(value, Value::Nil | Value::Boolean(false))
}

/// Text form of a value as the script's `tostring` would render it.
pub(crate) fn display_value<'lua>(lua: &'lua Lua, value: Value<'lua>) -> String {
    if let Value::String(s) = &value {
        return s.to_string_lossy().into_owned();
    }
    let type_name = value.type_name();
    lua.globals()
        .get::<_, Function>("tostring")
        .and_then(|tostring| tostring.call::<_, String>(value))
        .unwrap_or_else(|_| type_name.to_string())
}

/// Text form of an object field: `nil` becomes the empty string.
pub(crate) fn field_string<'lua>(lua: &'lua Lua, value: Value<'lua>) -> String {
    match value {
        Value::Nil => String::new(),
        other => display_value(lua, other),
    }
}

/// An instance-level field, ignoring metamethods and class defaults.
pub(crate) fn raw_field<'lua>(table: &Table<'lua>, key: &str) -> Value<'lua> {
    table.raw_get(key).unwrap_or(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_fields_become_text() {
        let lua = Lua::new();
        assert_eq!(field_string(&lua, Value::Nil), "");
        assert_eq!(field_string(&lua, Value::Integer(7)), "7");
        assert_eq!(field_string(&lua, Value::Boolean(true)), "true");
        let s = lua.create_string("happy").unwrap();
        assert_eq!(field_string(&lua, Value::String(s)), "happy");
    }

    #[test]
    fn display_uses_tostring() {
        let lua = Lua::new();
        assert_eq!(display_value(&lua, Value::Nil), "nil");
        let table: Table = lua
            .load(r#"return setmetatable({}, { __tostring = function() return "obj" end })"#)
            .eval()
            .unwrap();
        assert_eq!(display_value(&lua, Value::Table(table)), "obj");
    }

    #[test]
    fn truthiness() {
        assert!(!truthy(&Value::Nil));
        assert!(!truthy(&Value::Boolean(false)));
        assert!(truthy(&Value::Boolean(true)));
        assert!(truthy(&Value::Integer(0)));
    }

    #[test]
    fn raw_field_ignores_class_defaults() {
        let lua = Lua::new();
        let table: Table = lua
            .load(r#"return setmetatable({ own = 1 }, { __index = { inherited = 2 } })"#)
            .eval()
            .unwrap();
        assert!(matches!(raw_field(&table, "own"), Value::Integer(1)));
        assert!(matches!(raw_field(&table, "inherited"), Value::Nil));
    }
}
