use blockly::{Block, BlockType, Registry, RegistryError};

/// A named procedure without a return value.
#[derive(Debug, Default)]
pub struct ProcedureDef {
    pub name: String,
    pub body: Vec<Box<dyn Block>>,
}

impl Block for ProcedureDef {}

/// A named procedure whose body is followed by a returned expression.
#[derive(Debug, Default)]
pub struct ProcedureDefReturn {
    pub name: String,
    pub body: Vec<Box<dyn Block>>,
    pub result: Option<Box<dyn Block>>,
}

impl Block for ProcedureDefReturn {}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        BlockType::<ProcedureDef>::new("procedures_defnoreturn")
            .field("NAME", |b, v: String| b.name = v)
            .statement("STACK", |b, v| b.body = v),
    )?;
    registry.register(
        BlockType::<ProcedureDefReturn>::new("procedures_defreturn")
            .field("NAME", |b, v: String| b.name = v)
            .statement("STACK", |b, v| b.body = v)
            .value("RETURN", |b, v| b.result = Some(v)),
    )
}
