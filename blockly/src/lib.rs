pub mod binder;
pub mod block;
pub mod config;
pub mod node;
pub mod parser;
pub mod registry;

pub use block::Block;
pub use config::{DuplicateAttributes, ParserConfig};
pub use node::Node;
pub use parser::{ErrorKind, ParseError, Parser};
pub use registry::{BlockType, Registry, RegistryError, Scalar, ScalarKind};
