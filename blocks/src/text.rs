use blockly::{Block, BlockType, Registry, RegistryError};

/// A string literal.
#[derive(Debug, Default, PartialEq)]
pub struct Text {
    pub text: String,
}

impl Block for Text {}

#[derive(Debug, Default)]
pub struct TextPrint {
    pub text: Option<Box<dyn Block>>,
}

impl Block for TextPrint {}

/// Concatenation of `ADD0`..`ADDn`.
#[derive(Debug, Default)]
pub struct TextJoin {
    pub items: Vec<Option<Box<dyn Block>>>,
}

impl Block for TextJoin {}

impl TextJoin {
    fn set_item(&mut self, index: usize, item: Box<dyn Block>) {
        if self.items.len() <= index {
            self.items.resize_with(index + 1, || None);
        }
        self.items[index] = Some(item);
    }
}

/// Inputs declared for `text_join`.
pub const MAX_JOIN_ITEMS: usize = 16;

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(BlockType::<Text>::new("text").field("TEXT", |b, v: String| b.text = v))?;
    registry.register(BlockType::<TextPrint>::new("text_print").value("TEXT", |b, v| b.text = Some(v)))?;

    let mut join = BlockType::<TextJoin>::new("text_join");
    for index in 0..MAX_JOIN_ITEMS {
        join = join.value(&format!("ADD{}", index), move |b, v| b.set_item(index, v));
    }
    registry.register(join)
}
