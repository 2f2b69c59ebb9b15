use blockly::{Block, BlockType, Registry, RegistryError};

/// A numeric literal.
#[derive(Debug, Default, PartialEq)]
pub struct MathNumber {
    pub value: f64,
}

impl Block for MathNumber {}

/// `A OP B` where OP is one of `ADD`, `MINUS`, `MULTIPLY`, `DIVIDE`, `POWER`.
#[derive(Debug, Default)]
pub struct MathArithmetic {
    pub op: String,
    pub a: Option<Box<dyn Block>>,
    pub b: Option<Box<dyn Block>>,
}

impl Block for MathArithmetic {}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(BlockType::<MathNumber>::new("math_number").field("NUM", |b, v: f64| b.value = v))?;
    registry.register(
        BlockType::<MathArithmetic>::new("math_arithmetic")
            .field("OP", |b, v: String| b.op = v)
            .value("A", |b, v| b.a = Some(v))
            .value("B", |b, v| b.b = Some(v)),
    )
}
