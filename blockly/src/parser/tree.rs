use std::ops::Range;

use log::debug;

use crate::config::ParserConfig;
use crate::node::Node;
use crate::parser::error::{ErrorKind, ParseError};
use crate::parser::tokenizer::{Token, Tokenizer};

const NEXT: &str = "next";
const BLOCK: &str = "block";
const FIELD: &str = "field";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the tag tree for `source`, returning every top-level node in order.
pub fn build_tree(source: &str, config: &ParserConfig) -> Result<Vec<Node>, ParseError> {
    let tokens = Tokenizer::new(source, config.duplicate_attributes, config.file_id);
    let mut state = BuildState::new(config, source.len());
    for token in tokens {
        state.process(token?)?;
    }
    state.finalize()
}

/// Pick the block to bind from the top-level nodes: the first top-level
/// `block`, or the first `block` inside a top-level wrapper such as `<xml>`.
pub fn root_block(roots: &[Node]) -> Option<&Node> {
    roots.iter().find_map(|root| {
        if root.is(BLOCK) {
            Some(root)
        } else {
            root.children_named(BLOCK).next()
        }
    })
}

/// Every top-level block, looking through wrappers, in document order.
pub fn top_level_blocks(roots: &[Node]) -> Vec<&Node> {
    roots
        .iter()
        .flat_map(|root| {
            if root.is(BLOCK) {
                vec![root]
            } else {
                root.children_named(BLOCK).collect()
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Build state
// ---------------------------------------------------------------------------

enum Frame {
    /// A node still collecting children.
    Element(Node),
    /// A block already handed to its parent by a `next` opened inside it.
    /// Its closing tag has not been seen yet.
    Continued,
    /// An open `next` marker.
    Next,
}

struct BuildState<'c> {
    config: &'c ParserConfig,
    source_len: usize,
    stack: Vec<Frame>,
    /// Number of `Element` frames on the stack.
    depth: usize,
    /// Completed top-level nodes.
    roots: Vec<Node>,
    tokens: usize,
}

impl<'c> BuildState<'c> {
    fn new(config: &'c ParserConfig, source_len: usize) -> Self {
        BuildState {
            config,
            source_len,
            stack: Vec::new(),
            depth: 0,
            roots: Vec::new(),
            tokens: 0,
        }
    }

    fn process(&mut self, token: Token) -> Result<(), ParseError> {
        self.tokens += 1;
        match token {
            Token::Open {
                name,
                span,
                self_closing,
                ..
            } if name == NEXT => {
                self.open_next();
                if self_closing {
                    self.close(NEXT, span)?;
                }
            }
            Token::Open {
                name,
                attributes,
                text,
                self_closing,
                span,
            } => {
                let keep_text = if name == FIELD {
                    !text.is_empty()
                } else {
                    !text.trim().is_empty()
                };
                let node = Node {
                    name,
                    attributes,
                    text: keep_text.then_some(text),
                    children: Vec::new(),
                    span: span.clone(),
                };
                let name = node.name.clone();
                self.push(node)?;
                if self_closing {
                    self.close(&name, span)?;
                }
            }
            Token::Close { name, span } => self.close(&name, span)?,
        }
        Ok(())
    }

    /// A `next` inside a block finishes that block: it moves to its parent
    /// now, and the blocks chained under `next` become its later siblings.
    fn open_next(&mut self) {
        let top_is_block = matches!(self.stack.last(), Some(Frame::Element(node)) if node.is(BLOCK));
        if top_is_block {
            if let Some(Frame::Element(block)) = self.stack.pop() {
                self.depth -= 1;
                self.attach(block);
            }
            self.stack.push(Frame::Continued);
        }
        self.stack.push(Frame::Next);
    }

    fn push(&mut self, node: Node) -> Result<(), ParseError> {
        if self.depth >= self.config.max_depth {
            return Err(self.error(
                ErrorKind::DepthLimitExceeded,
                format!(
                    "<{}> nested deeper than the limit of {}",
                    node.name, self.config.max_depth
                ),
                node.span,
            ));
        }
        self.depth += 1;
        self.stack.push(Frame::Element(node));
        Ok(())
    }

    fn close(&mut self, name: &str, span: Range<usize>) -> Result<(), ParseError> {
        match self.stack.pop() {
            Some(Frame::Element(node)) => {
                if node.name != name {
                    return Err(self
                        .error(
                            ErrorKind::MalformedInput,
                            format!("</{}> does not close <{}>", name, node.name),
                            span,
                        )
                        .with_note(format!("<{}> opened at byte {}", node.name, node.span.start)));
                }
                self.depth -= 1;
                self.attach(node);
                Ok(())
            }
            Some(Frame::Next) if name == NEXT => Ok(()),
            Some(Frame::Continued) if name == BLOCK => Ok(()),
            Some(Frame::Next) => Err(self.error(
                ErrorKind::MalformedInput,
                format!("</{}> inside an open <next>", name),
                span,
            )),
            Some(Frame::Continued) => Err(self.error(
                ErrorKind::MalformedInput,
                format!("</{}> where </block> was expected after <next>", name),
                span,
            )),
            None => Err(self.error(
                ErrorKind::MalformedInput,
                format!("</{}> has no matching opening tag", name),
                span,
            )),
        }
    }

    /// Append a finished node to the nearest enclosing element, or record it
    /// as a top-level node when nothing encloses it.
    fn attach(&mut self, node: Node) {
        let parent = self.stack.iter_mut().rev().find_map(|frame| match frame {
            Frame::Element(parent) => Some(parent),
            _ => None,
        });
        match parent {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn finalize(self) -> Result<Vec<Node>, ParseError> {
        let unclosed = self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Element(node) => Some((node.name.clone(), node.span.clone())),
            Frame::Next => Some((NEXT.to_string(), self.source_len..self.source_len)),
            Frame::Continued => Some((BLOCK.to_string(), self.source_len..self.source_len)),
        });
        if let Some((name, span)) = unclosed {
            return Err(self.error(
                ErrorKind::MalformedInput,
                format!("<{}> is never closed", name),
                span,
            ));
        }
        if self.roots.is_empty() {
            return Err(self.error(
                ErrorKind::MalformedInput,
                "no element found in input",
                0..self.source_len,
            ));
        }
        debug!(
            "built tree from {} tokens: {} top-level node(s), {} node(s) total",
            self.tokens,
            self.roots.len(),
            self.roots.iter().map(Node::count).sum::<usize>()
        );
        Ok(self.roots)
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>, span: Range<usize>) -> ParseError {
        ParseError::new(kind, message, span, self.config.file_id)
    }
}
