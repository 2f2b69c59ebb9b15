pub mod descriptor;
pub mod scalar;

use std::collections::HashMap;
use std::fmt;

use log::debug;
use thiserror::Error;

use crate::block::Block;

pub use descriptor::{BlockType, Descriptor};
pub use scalar::{CoercionError, Scalar, ScalarKind};

/// Registration failures, raised before any parsing happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("block type {type_name} registered with an empty tag")]
    InvalidTag { type_name: &'static str },

    #[error("block tag '{tag}' is already registered to {existing}")]
    DuplicateTag { tag: String, existing: &'static str },

    #[error("block '{tag}': member '{member}' {reason}")]
    InvalidField {
        tag: String,
        member: String,
        reason: &'static str,
    },
}

/// Tag name → block descriptor.
///
/// Fill it during startup, then share it read-only with every [`Parser`].
///
/// [`Parser`]: crate::parser::Parser
#[derive(Default)]
pub struct Registry {
    descriptors: HashMap<String, Box<dyn Descriptor>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Add a block type. A tag that is already taken keeps its first
    /// registration.
    pub fn register<T: Block>(&mut self, block: BlockType<T>) -> Result<(), RegistryError> {
        let tag = block.tag().to_string();
        if tag.is_empty() {
            return Err(RegistryError::InvalidTag {
                type_name: block.type_name(),
            });
        }
        if let Some(existing) = self.descriptors.get(&tag) {
            return Err(RegistryError::DuplicateTag {
                tag,
                existing: existing.type_name(),
            });
        }
        if let Some(member) = block.conflicts().first() {
            let reason = if member.is_empty() {
                "has an empty name"
            } else {
                "is declared more than once"
            };
            return Err(RegistryError::InvalidField {
                tag,
                member: member.clone(),
                reason,
            });
        }

        debug!("registered block '{}' as {}", tag, block.type_name());
        self.descriptors.insert(tag, Box::new(block));
        Ok(())
    }

    pub fn lookup(&self, tag: &str) -> Option<&dyn Descriptor> {
        self.descriptors.get(tag).map(|descriptor| descriptor.as_ref())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.descriptors.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags())
            .finish()
    }
}
