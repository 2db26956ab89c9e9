//! Call-frame snapshots.
//!
//! The interpreter's call stack is copied into a plain list of [`CallFrame`]s,
//! innermost first, so relative resolution can be decided without touching
//! interpreter internals.

/// One frame of the interpreter's call stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFrame {
    /// Source file backing the frame, when it runs script code loaded from a file.
    pub source: Option<String>,
    /// Whether the frame is a host-native callback.
    pub native: bool,
    /// Current line, when position info is available.
    pub line: Option<u32>,
}

impl CallFrame {
    /// A frame executing script code from `source` at `line`.
    pub fn script(source: impl Into<String>, line: u32) -> Self {
        Self {
            source: Some(source.into()),
            native: false,
            line: Some(line),
        }
    }

    /// A host-native callback frame.
    pub fn native() -> Self {
        Self {
            source: None,
            native: true,
            line: None,
        }
    }

    /// Whether this frame can anchor a relative require.
    pub fn is_script_source(&self) -> bool {
        !self.native && self.source.is_some() && self.line.is_some()
    }
}

/// Source file of the innermost frame backed by real script source.
pub fn nearest_script_file(frames: &[CallFrame]) -> Option<&str> {
    frames
        .iter()
        .find(|frame| frame.is_script_source())
        .and_then(|frame| frame.source.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_native_and_sourceless_frames() {
        let frames = vec![
            CallFrame::native(),
            CallFrame {
                source: None,
                native: false,
                line: Some(3),
            },
            CallFrame {
                source: Some("res://a/no_line.lua".to_string()),
                native: false,
                line: None,
            },
            CallFrame::script("res://a/b.lua", 12),
            CallFrame::script("res://main.lua", 1),
        ];
        assert_eq!(nearest_script_file(&frames), Some("res://a/b.lua"));
    }

    #[test]
    fn no_qualifying_frame() {
        assert_eq!(nearest_script_file(&[]), None);
        assert_eq!(nearest_script_file(&[CallFrame::native()]), None);
    }
}
