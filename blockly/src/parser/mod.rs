pub mod error;
pub mod tokenizer;
pub mod tree;

pub use error::{ErrorKind, ParseError};

use log::{debug, warn};

use crate::binder::Binder;
use crate::block::Block;
use crate::config::ParserConfig;
use crate::node::Node;
use crate::registry::Registry;

/// Parser entry point.
pub struct Parser<'r> {
    registry: &'r Registry,
    config: ParserConfig,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Parser::with_config(registry, ParserConfig::default())
    }

    pub fn with_config(registry: &'r Registry, config: ParserConfig) -> Self {
        Parser { registry, config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse the source into the node tree only, without binding.
    pub fn parse_tree(&self, source: &str) -> Result<Vec<Node>, ParseError> {
        tree::build_tree(source, &self.config)
    }

    /// Parse the source and bind its root block.
    pub fn parse(&self, source: &str) -> Result<Box<dyn Block>, ParseError> {
        let roots = self.parse_tree(source)?;
        let blocks = tree::top_level_blocks(&roots);
        let Some(root) = tree::root_block(&roots) else {
            return Err(self.no_block_error(source));
        };
        if blocks.len() > 1 {
            warn!(
                "{} top-level blocks found, binding only the first",
                blocks.len()
            );
        }
        debug!("binding root block {:?}", root.attribute("type"));
        Binder::new(self.registry, &self.config).bind(root)
    }

    /// Parse the source and downcast the root block to `T`.
    pub fn parse_as<T: Block>(&self, source: &str) -> Result<Box<T>, ParseError> {
        self.parse(source)?.downcast::<T>().ok_or_else(|| {
            ParseError::new(
                ErrorKind::UnexpectedRootType,
                format!("root block is not a {}", std::any::type_name::<T>()),
                0..0,
                self.config.file_id,
            )
        })
    }

    /// Parse the source and bind every top-level block, in document order.
    pub fn parse_all(&self, source: &str) -> Result<Vec<Box<dyn Block>>, ParseError> {
        let roots = self.parse_tree(source)?;
        let blocks = tree::top_level_blocks(&roots);
        if blocks.is_empty() {
            return Err(self.no_block_error(source));
        }
        let binder = Binder::new(self.registry, &self.config);
        blocks.into_iter().map(|node| binder.bind(node)).collect()
    }

    fn no_block_error(&self, source: &str) -> ParseError {
        ParseError::new(
            ErrorKind::MalformedInput,
            "no top-level <block> found",
            0..source.len(),
            self.config.file_id,
        )
    }
}
