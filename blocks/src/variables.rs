use blockly::{Block, BlockType, Registry, RegistryError};

#[derive(Debug, Default, PartialEq)]
pub struct VariablesGet {
    pub var: String,
}

impl Block for VariablesGet {}

#[derive(Debug, Default)]
pub struct VariablesSet {
    pub var: String,
    pub value: Option<Box<dyn Block>>,
}

impl Block for VariablesSet {}

/// `VAR += DELTA`.
#[derive(Debug, Default)]
pub struct MathChange {
    pub var: String,
    pub delta: Option<Box<dyn Block>>,
}

impl Block for MathChange {}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(BlockType::<VariablesGet>::new("variables_get").field("VAR", |b, v: String| b.var = v))?;
    registry.register(
        BlockType::<VariablesSet>::new("variables_set")
            .field("VAR", |b, v: String| b.var = v)
            .value("VALUE", |b, v| b.value = Some(v)),
    )?;
    registry.register(
        BlockType::<MathChange>::new("math_change")
            .field("VAR", |b, v: String| b.var = v)
            .value("DELTA", |b, v| b.delta = Some(v)),
    )
}
