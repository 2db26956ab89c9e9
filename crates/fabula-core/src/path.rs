//! Canonical module path rules.
//!
//! A canonical path is the cache key for once-only module loading: it always
//! starts with the script root, has `.` / `..` segments resolved, and carries
//! the required source extension. Opaque identifiers (content-addressed ids)
//! are never rewritten.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Rules for turning raw script identifiers into canonical module paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathRules {
    /// Virtual prefix every canonical path starts with.
    pub root: String,
    /// Required source extension, without the leading dot.
    pub extension: String,
    /// Marker for identifiers that pass through untouched.
    pub opaque_prefix: String,
}

impl Default for PathRules {
    fn default() -> Self {
        Self {
            root: "res://".to_string(),
            extension: "lua".to_string(),
            opaque_prefix: "uid://".to_string(),
        }
    }
}

impl PathRules {
    /// Set the script root.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the required extension (a leading dot is ignored).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set the opaque identifier marker.
    pub fn with_opaque_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.opaque_prefix = prefix.into();
        self
    }

    /// Whether `raw` is an opaque identifier.
    pub fn is_opaque(&self, raw: &str) -> bool {
        !self.opaque_prefix.is_empty() && raw.starts_with(&self.opaque_prefix)
    }

    /// Whether `raw` already starts with the script root.
    pub fn is_rooted(&self, raw: &str) -> bool {
        raw.starts_with(&self.root)
    }

    /// Resolve an identifier to its canonical path.
    ///
    /// `"foo/bar"`, `"foo/bar.lua"` and `"res://foo/bar.lua"` all resolve to
    /// `"res://foo/bar.lua"` under the default rules.
    pub fn canonicalize(&self, raw: &str) -> CoreResult<String> {
        if self.is_opaque(raw) {
            return Ok(raw.to_string());
        }

        let relative = raw.strip_prefix(self.root.as_str()).unwrap_or(raw);
        let segments = normalize_segments(relative)
            .map_err(|_| CoreError::EscapesRoot(raw.to_string()))?;
        if segments.is_empty() {
            return Err(CoreError::EmptyIdentifier);
        }

        let mut path = format!("{}{}", self.root, segments.join("/"));
        if !self.has_extension(&path) {
            path.push('.');
            path.push_str(&self.extension);
        }
        Ok(path)
    }

    /// Resolve `raw` relative to the directory of `calling_file`.
    ///
    /// Opaque, rooted and `/`-prefixed identifiers ignore the calling file.
    /// A calling file outside the root (an opaque id) resolves against the
    /// root itself.
    pub fn resolve_relative(&self, calling_file: &str, raw: &str) -> CoreResult<String> {
        if self.is_opaque(raw) || self.is_rooted(raw) || raw.starts_with('/') {
            return self.canonicalize(raw);
        }

        let dir = calling_file
            .strip_prefix(self.root.as_str())
            .and_then(|rel| rel.rsplit_once('/'))
            .map(|(dir, _)| dir)
            .unwrap_or("");

        self.canonicalize(&format!("{dir}/{raw}"))
    }

    /// The path relative to the root, if `canonical` is rooted.
    pub fn strip_root<'a>(&self, canonical: &'a str) -> Option<&'a str> {
        canonical.strip_prefix(self.root.as_str())
    }

    fn has_extension(&self, path: &str) -> bool {
        if self.extension.is_empty() {
            return true;
        }
        let last = path.rsplit('/').next().unwrap_or(path);
        last.strip_suffix(self.extension.as_str())
            .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
    }
}

/// Split on `/`, dropping empty and `.` segments and resolving `..`.
fn normalize_segments(path: &str) -> Result<Vec<&str>, ()> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or(())?;
            }
            other => segments.push(other),
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_names_are_rooted_and_extended() {
        let rules = PathRules::default();
        assert_eq!(rules.canonicalize("foo/bar").unwrap(), "res://foo/bar.lua");
        assert_eq!(rules.canonicalize("foo/bar.lua").unwrap(), "res://foo/bar.lua");
        assert_eq!(
            rules.canonicalize("res://foo/bar.lua").unwrap(),
            "res://foo/bar.lua"
        );
        assert_eq!(rules.canonicalize("res://foo/bar").unwrap(), "res://foo/bar.lua");
    }

    #[test]
    fn opaque_identifiers_pass_through() {
        let rules = PathRules::default();
        assert_eq!(rules.canonicalize("uid://c8x2k").unwrap(), "uid://c8x2k");
        assert_eq!(
            rules.resolve_relative("res://a/b.lua", "uid://c8x2k").unwrap(),
            "uid://c8x2k"
        );
    }

    #[test]
    fn dot_segments_collapse() {
        let rules = PathRules::default();
        assert_eq!(rules.canonicalize("./a//b/../c").unwrap(), "res://a/c.lua");
        assert_eq!(rules.canonicalize("/intro").unwrap(), "res://intro.lua");
    }

    #[test]
    fn escaping_the_root_is_an_error() {
        let rules = PathRules::default();
        assert_eq!(
            rules.canonicalize("../secrets"),
            Err(CoreError::EscapesRoot("../secrets".to_string()))
        );
    }

    #[test]
    fn empty_identifier_is_an_error() {
        let rules = PathRules::default();
        assert_eq!(rules.canonicalize(""), Err(CoreError::EmptyIdentifier));
        assert_eq!(rules.canonicalize("res://"), Err(CoreError::EmptyIdentifier));
    }

    #[test]
    fn extension_must_be_a_real_suffix() {
        let rules = PathRules::default();
        // "hula" ends in "lua" but has no ".lua" extension.
        assert_eq!(rules.canonicalize("hula").unwrap(), "res://hula.lua");
        assert_eq!(rules.canonicalize("a.lua/b").unwrap(), "res://a.lua/b.lua");
    }

    #[test]
    fn relative_to_calling_file() {
        let rules = PathRules::default();
        assert_eq!(
            rules.resolve_relative("res://a/b.lua", "c").unwrap(),
            "res://a/c.lua"
        );
        assert_eq!(
            rules.resolve_relative("res://a/b.lua", "../d").unwrap(),
            "res://d.lua"
        );
        assert_eq!(
            rules.resolve_relative("res://top.lua", "c").unwrap(),
            "res://c.lua"
        );
        assert_eq!(
            rules.resolve_relative("res://a/b.lua", "res://x/y").unwrap(),
            "res://x/y.lua"
        );
        assert_eq!(
            rules.resolve_relative("uid://abc", "c").unwrap(),
            "res://c.lua"
        );
    }

    #[test]
    fn custom_rules() {
        let rules = PathRules::default()
            .with_root("story://")
            .with_extension(".rb")
            .with_opaque_prefix("cas:");
        assert_eq!(rules.canonicalize("intro").unwrap(), "story://intro.rb");
        assert_eq!(rules.canonicalize("cas:1234").unwrap(), "cas:1234");
        assert_eq!(rules.strip_root("story://intro.rb"), Some("intro.rb"));
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(raw in "[a-z]{1,8}(/[a-z]{1,8}){0,3}") {
            let rules = PathRules::default();
            let once = rules.canonicalize(&raw).unwrap();
            let twice = rules.canonicalize(&once).unwrap();
            prop_assert_eq!(&once, &twice);
        }

        #[test]
        fn spellings_of_one_module_agree(raw in "[a-z]{1,8}(/[a-z]{1,8}){0,3}") {
            let rules = PathRules::default();
            let bare = rules.canonicalize(&raw).unwrap();
            let extended = rules.canonicalize(&format!("{raw}.lua")).unwrap();
            let rooted = rules.canonicalize(&format!("res://{raw}.lua")).unwrap();
            prop_assert_eq!(&bare, &extended);
            prop_assert_eq!(&bare, &rooted);
        }
    }
}
