pub mod logic;
pub mod loops;
pub mod math;
pub mod procedures;
pub mod text;
pub mod variables;

use blockly::{Registry, RegistryError};
use log::debug;

/// Register every block in this catalogue.
pub fn register_standard_blocks(registry: &mut Registry) -> Result<(), RegistryError> {
    logic::register(registry)?;
    loops::register(registry)?;
    math::register(registry)?;
    procedures::register(registry)?;
    text::register(registry)?;
    variables::register(registry)?;
    debug!("standard catalogue: {} block types", registry.len());
    Ok(())
}

/// A registry holding only the standard catalogue.
pub fn standard_registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    register_standard_blocks(&mut registry)?;
    Ok(registry)
}
