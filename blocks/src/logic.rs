use blockly::{Block, BlockType, Registry, RegistryError};

#[derive(Debug, Default, PartialEq)]
pub struct LogicBoolean {
    pub value: bool,
}

impl Block for LogicBoolean {}

/// `A OP B` where OP is one of `EQ`, `NEQ`, `LT`, `LTE`, `GT`, `GTE`.
#[derive(Debug, Default)]
pub struct LogicCompare {
    pub op: String,
    pub a: Option<Box<dyn Block>>,
    pub b: Option<Box<dyn Block>>,
}

impl Block for LogicCompare {}

/// `A AND B` or `A OR B`.
#[derive(Debug, Default)]
pub struct LogicOperation {
    pub op: String,
    pub a: Option<Box<dyn Block>>,
    pub b: Option<Box<dyn Block>>,
}

impl Block for LogicOperation {}

#[derive(Debug, Default)]
pub struct LogicNegate {
    pub operand: Option<Box<dyn Block>>,
}

impl Block for LogicNegate {}

/// One `IFn` / `DOn` pair of an if-block.
#[derive(Debug, Default)]
pub struct IfBranch {
    pub condition: Option<Box<dyn Block>>,
    pub body: Vec<Box<dyn Block>>,
}

/// `if` / `else if` chain with an optional `else`.
#[derive(Debug, Default)]
pub struct ControlsIf {
    pub branches: Vec<IfBranch>,
    pub otherwise: Vec<Box<dyn Block>>,
}

impl Block for ControlsIf {}

impl ControlsIf {
    fn branch(&mut self, index: usize) -> &mut IfBranch {
        if self.branches.len() <= index {
            self.branches.resize_with(index + 1, IfBranch::default);
        }
        &mut self.branches[index]
    }
}

/// `IFn`/`DOn` pairs declared for `controls_if`.
pub const MAX_IF_BRANCHES: usize = 16;

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(BlockType::<LogicBoolean>::new("logic_boolean").field("BOOL", |b, v: bool| b.value = v))?;
    registry.register(
        BlockType::<LogicCompare>::new("logic_compare")
            .field("OP", |b, v: String| b.op = v)
            .value("A", |b, v| b.a = Some(v))
            .value("B", |b, v| b.b = Some(v)),
    )?;
    registry.register(
        BlockType::<LogicOperation>::new("logic_operation")
            .field("OP", |b, v: String| b.op = v)
            .value("A", |b, v| b.a = Some(v))
            .value("B", |b, v| b.b = Some(v)),
    )?;
    registry.register(BlockType::<LogicNegate>::new("logic_negate").value("BOOL", |b, v| b.operand = Some(v)))?;

    let mut controls_if = BlockType::<ControlsIf>::new("controls_if")
        .statement("ELSE", |b, v| b.otherwise = v);
    for index in 0..MAX_IF_BRANCHES {
        controls_if = controls_if
            .value(&format!("IF{}", index), move |b, v| b.branch(index).condition = Some(v))
            .statement(&format!("DO{}", index), move |b, v| b.branch(index).body = v);
    }
    registry.register(controls_if)
}
