use log::{trace, warn};

use crate::block::Block;
use crate::config::ParserConfig;
use crate::node::Node;
use crate::parser::error::{ErrorKind, ParseError};
use crate::registry::{CoercionError, Registry};

const BLOCK: &str = "block";
const SHADOW: &str = "shadow";

/// Materializes domain objects from a node tree using the registry.
pub struct Binder<'r> {
    registry: &'r Registry,
    config: &'r ParserConfig,
}

impl<'r> Binder<'r> {
    pub fn new(registry: &'r Registry, config: &'r ParserConfig) -> Self {
        Binder { registry, config }
    }

    /// Bind a `block` (or `shadow`) node and everything nested inside it.
    pub fn bind(&self, node: &Node) -> Result<Box<dyn Block>, ParseError> {
        self.bind_at(node, 0)
    }

    fn bind_at(&self, node: &Node, depth: usize) -> Result<Box<dyn Block>, ParseError> {
        if depth >= self.config.max_depth {
            return Err(self.error(
                ErrorKind::DepthLimitExceeded,
                format!("blocks nested deeper than the limit of {}", self.config.max_depth),
                node,
            ));
        }

        let Some(tag) = node.attribute("type") else {
            return Err(self.error(
                ErrorKind::UnknownBlockType,
                format!("<{}> has no type attribute", node.name),
                node,
            ));
        };
        let Some(descriptor) = self.registry.lookup(tag) else {
            return Err(self
                .error(
                    ErrorKind::UnknownBlockType,
                    format!("no block with type '{}' registered", tag),
                    node,
                )
                .with_note(format!("{} block type(s) registered", self.registry.len())));
        };

        trace!("binding '{}' at depth {}", tag, depth);
        descriptor.bind(node, self, depth + 1)
    }

    /// The nested block of a `value` slot.
    ///
    /// The first `block` child wins; without one, the first `shadow` child is
    /// used when shadow binding is enabled.
    pub fn bind_value(
        &self,
        slot: &Node,
        tag: &str,
        member: &str,
        depth: usize,
    ) -> Result<Box<dyn Block>, ParseError> {
        let mut blocks = slot.children_named(BLOCK);
        let nested = match blocks.next() {
            Some(block) => {
                let extra = blocks.count();
                if extra > 0 {
                    warn!(
                        "block '{}': value '{}' holds {} extra block(s), using the first",
                        tag, member, extra
                    );
                }
                Some(block)
            }
            None if self.config.bind_shadows => slot.children_named(SHADOW).next(),
            None => None,
        };

        match nested {
            Some(node) => self.bind_at(node, depth),
            None => Err(self.error(
                ErrorKind::MissingNestedBlock,
                format!("block '{}': value '{}' contains no block", tag, member),
                slot,
            )),
        }
    }

    /// Every nested block of a `statement` slot, in document order.
    pub fn bind_statement(
        &self,
        slot: &Node,
        depth: usize,
    ) -> Result<Vec<Box<dyn Block>>, ParseError> {
        slot.children_named(BLOCK)
            .map(|node| self.bind_at(node, depth))
            .collect()
    }

    /// The `name` attribute of a `field`, `value` or `statement` node.
    pub fn member_name<'n>(&self, slot: &'n Node, tag: &str) -> Result<&'n str, ParseError> {
        slot.attribute("name").ok_or_else(|| {
            self.error(
                ErrorKind::UnknownField,
                format!("block '{}': <{}> has no name attribute", tag, slot.name),
                slot,
            )
        })
    }

    pub fn unknown_member(&self, slot: &Node, tag: &str, member: &str) -> ParseError {
        self.error(
            ErrorKind::UnknownField,
            format!("block '{}' has no {} named '{}'", tag, slot.name, member),
            slot,
        )
    }

    pub fn coercion_error(
        &self,
        slot: &Node,
        tag: &str,
        member: &str,
        err: CoercionError,
    ) -> ParseError {
        self.error(
            ErrorKind::ValueCoercion,
            format!("block '{}': field '{}': {}", tag, member, err),
            slot,
        )
    }

    fn error(&self, kind: ErrorKind, message: String, node: &Node) -> ParseError {
        ParseError::new(kind, message, node.span.clone(), self.config.file_id)
    }
}
