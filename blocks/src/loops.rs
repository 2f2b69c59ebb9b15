use blockly::{Block, BlockType, Registry, RegistryError};

/// Repeat with a fixed count typed into the block.
#[derive(Debug, Default)]
pub struct ControlsRepeat {
    pub times: u32,
    pub body: Vec<Box<dyn Block>>,
}

impl Block for ControlsRepeat {}

/// Repeat with the count supplied by a nested expression.
#[derive(Debug, Default)]
pub struct ControlsRepeatExt {
    pub times: Option<Box<dyn Block>>,
    pub body: Vec<Box<dyn Block>>,
}

impl Block for ControlsRepeatExt {}

#[derive(Debug, Default)]
pub struct ControlsWhileUntil {
    /// `WHILE` or `UNTIL`.
    pub mode: String,
    pub condition: Option<Box<dyn Block>>,
    pub body: Vec<Box<dyn Block>>,
}

impl Block for ControlsWhileUntil {}

/// Counting loop: `for VAR from FROM to TO by BY`.
#[derive(Debug, Default)]
pub struct ControlsFor {
    pub var: String,
    pub from: Option<Box<dyn Block>>,
    pub to: Option<Box<dyn Block>>,
    pub by: Option<Box<dyn Block>>,
    pub body: Vec<Box<dyn Block>>,
}

impl Block for ControlsFor {}

/// `break` or `continue`, selected by `FLOW`.
#[derive(Debug, Default, PartialEq)]
pub struct FlowStatement {
    pub flow: String,
}

impl Block for FlowStatement {}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        BlockType::<ControlsRepeat>::new("controls_repeat")
            .field("TIMES", |b, v: u32| b.times = v)
            .statement("DO", |b, v| b.body = v),
    )?;
    registry.register(
        BlockType::<ControlsRepeatExt>::new("controls_repeat_ext")
            .value("TIMES", |b, v| b.times = Some(v))
            .statement("DO", |b, v| b.body = v),
    )?;
    registry.register(
        BlockType::<ControlsWhileUntil>::new("controls_whileUntil")
            .field("MODE", |b, v: String| b.mode = v)
            .value("BOOL", |b, v| b.condition = Some(v))
            .statement("DO", |b, v| b.body = v),
    )?;
    registry.register(
        BlockType::<ControlsFor>::new("controls_for")
            .field("VAR", |b, v: String| b.var = v)
            .value("FROM", |b, v| b.from = Some(v))
            .value("TO", |b, v| b.to = Some(v))
            .value("BY", |b, v| b.by = Some(v))
            .statement("DO", |b, v| b.body = v),
    )?;
    registry.register(
        BlockType::<FlowStatement>::new("controls_flow_statements").field("FLOW", |b, v: String| b.flow = v),
    )
}
