use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// Category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("malformed input")]
    MalformedInput,
    #[error("duplicate attribute")]
    DuplicateAttribute,
    #[error("nesting too deep")]
    DepthLimitExceeded,
    #[error("unknown block type")]
    UnknownBlockType,
    #[error("unknown field")]
    UnknownField,
    #[error("value coercion failed")]
    ValueCoercion,
    #[error("missing nested block")]
    MissingNestedBlock,
    #[error("unexpected root type")]
    UnexpectedRootType,
}

impl ErrorKind {
    /// Stable identifier, as used in test fixtures.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "MalformedInput",
            ErrorKind::DuplicateAttribute => "DuplicateAttribute",
            ErrorKind::DepthLimitExceeded => "DepthLimitExceeded",
            ErrorKind::UnknownBlockType => "UnknownBlockType",
            ErrorKind::UnknownField => "UnknownField",
            ErrorKind::ValueCoercion => "ValueCoercion",
            ErrorKind::MissingNestedBlock => "MissingNestedBlock",
            ErrorKind::UnexpectedRootType => "UnexpectedRootType",
        }
    }
}

/// Parse errors with source location information.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// Byte span of the offending tag. Empty when no position is known.
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            span,
            file_id,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Error)
            .with_message(&self.message)
            .with_code(self.kind.name())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
