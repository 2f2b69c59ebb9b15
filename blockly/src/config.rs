use serde::Deserialize;

/// How repeated attribute keys on a single tag are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateAttributes {
    /// The last occurrence of a key overwrites earlier ones.
    #[default]
    LastWins,
    /// A repeated key fails the parse.
    Reject,
}

/// Parser settings. Every key is optional when deserialized.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Maximum element nesting accepted by the tree builder and the binder.
    pub max_depth: usize,
    pub duplicate_attributes: DuplicateAttributes,
    /// Bind a `shadow` block in a value slot that has no real `block`.
    pub bind_shadows: bool,
    /// codespan file id stamped on every error.
    pub file_id: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: 256,
            duplicate_attributes: DuplicateAttributes::LastWins,
            bind_shadows: true,
            file_id: 0,
        }
    }
}
