use std::collections::BTreeMap;
use std::ops::Range;

use log::trace;
use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};

use crate::config::DuplicateAttributes;
use crate::parser::error::{ErrorKind, ParseError};

// ---------------------------------------------------------------------------
// Lexical patterns
// ---------------------------------------------------------------------------

/// A whole tag followed by the text running up to the next `<`.
///
/// Groups: 1 = closing slash, 2 = tag name, 3 = raw attribute text,
/// 4 = self-closing slash, 5 = trailing text.
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/)?([A-Za-z_][\w:.\-]*)([^<>]*?)(/)?>([^<]*)"#).expect("valid tag pattern")
});

/// `key="value"`, the value being any run of non-quote characters.
static ATTRIBUTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.\-]*)\s*=\s*"([^"]*)""#).expect("valid attribute pattern")
});

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Open {
        name: String,
        attributes: BTreeMap<String, String>,
        /// Text between this tag and the next one; empty if none.
        text: String,
        self_closing: bool,
        span: Range<usize>,
    },
    Close {
        name: String,
        span: Range<usize>,
    },
}

impl Token {
    pub fn name(&self) -> &str {
        match self {
            Token::Open { name, .. } | Token::Close { name, .. } => name,
        }
    }

    pub fn span(&self) -> Range<usize> {
        match self {
            Token::Open { span, .. } | Token::Close { span, .. } => span.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Lazy scan of the source into open/close tag events.
///
/// Anything that does not look like a tag (prologues, comments, stray text)
/// is skipped without error.
pub struct Tokenizer<'a> {
    matches: CaptureMatches<'static, 'a>,
    duplicates: DuplicateAttributes,
    file_id: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str, duplicates: DuplicateAttributes, file_id: usize) -> Self {
        let pattern: &'static Regex = &TAG_PATTERN;
        Tokenizer {
            matches: pattern.captures_iter(source),
            duplicates,
            file_id,
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.matches.next()?;
        let name = caps[2].to_string();

        // The span covers the tag only, not the trailing text.
        let start = caps.get(0).map_or(0, |m| m.start());
        let end = caps.get(5).map_or(start, |m| m.start());
        let span = start..end;

        let token = if caps.get(1).is_some() {
            Token::Close { name, span }
        } else {
            let raw = caps.get(3).map_or("", |m| m.as_str());
            let attributes = match parse_attributes(raw, self.duplicates) {
                Ok(attributes) => attributes,
                Err(key) => {
                    return Some(Err(ParseError::new(
                        ErrorKind::DuplicateAttribute,
                        format!("attribute '{}' repeated on <{}>", key, name),
                        span,
                        self.file_id,
                    )));
                }
            };
            Token::Open {
                name,
                attributes,
                text: caps.get(5).map_or("", |m| m.as_str()).to_string(),
                self_closing: caps.get(4).is_some(),
                span,
            }
        };

        trace!("token {:?}", token);
        Some(Ok(token))
    }
}

/// Extract every `key="value"` pair from the raw inside of an opening tag.
/// On a rejected duplicate, returns the repeated key.
pub fn parse_attributes(
    raw: &str,
    duplicates: DuplicateAttributes,
) -> Result<BTreeMap<String, String>, String> {
    let mut attributes = BTreeMap::new();
    for caps in ATTRIBUTE_PATTERN.captures_iter(raw) {
        let key = caps[1].to_string();
        let value = caps[2].to_string();
        if attributes.insert(key.clone(), value).is_some()
            && duplicates == DuplicateAttributes::Reject
        {
            return Err(key);
        }
    }
    Ok(attributes)
}
