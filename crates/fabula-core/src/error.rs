/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when resolving module identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The identifier was empty (or only separators).
    #[error("empty module identifier")]
    EmptyIdentifier,

    /// A `..` segment would climb above the script root.
    #[error("module path escapes the script root: \"{0}\"")]
    EscapesRoot(String),
}
