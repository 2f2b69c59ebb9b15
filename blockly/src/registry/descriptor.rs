use std::collections::HashMap;

use log::trace;

use crate::binder::Binder;
use crate::block::Block;
use crate::node::Node;
use crate::parser::error::ParseError;
use crate::registry::scalar::{CoercionError, Scalar, ScalarKind};

const FIELD: &str = "field";
const VALUE: &str = "value";
const STATEMENT: &str = "statement";

type FieldSetter<T> = Box<dyn Fn(&mut T, &str) -> Result<(), CoercionError> + Send + Sync>;
type ValueSetter<T> = Box<dyn Fn(&mut T, Box<dyn Block>) + Send + Sync>;
type StatementSetter<T> = Box<dyn Fn(&mut T, Vec<Box<dyn Block>>) + Send + Sync>;

struct FieldBinding<T> {
    kind: ScalarKind,
    set: FieldSetter<T>,
}

/// Type-erased view of a registered block type.
pub trait Descriptor: Send + Sync {
    /// The `type` attribute value this descriptor is registered under.
    fn tag(&self) -> &str;

    /// Rust type name of the domain type, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Field members and their scalar kinds, sorted by name.
    fn fields(&self) -> Vec<(&str, ScalarKind)>;

    /// Value members, sorted by name.
    fn values(&self) -> Vec<&str>;

    /// Statement members, sorted by name.
    fn statements(&self) -> Vec<&str>;

    /// A fresh default instance.
    fn instantiate(&self) -> Box<dyn Block>;

    /// Build an instance from `node`, binding nested blocks through `binder`.
    fn bind(&self, node: &Node, binder: &Binder<'_>, depth: usize)
    -> Result<Box<dyn Block>, ParseError>;
}

/// Declaration of how domain type `T` maps onto a block tag.
///
/// ```ignore
/// BlockType::<MathNumber>::new("math_number")
///     .field("NUM", |block, value: f64| block.value = value)
/// ```
pub struct BlockType<T> {
    tag: String,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    fields: HashMap<String, FieldBinding<T>>,
    values: HashMap<String, ValueSetter<T>>,
    statements: HashMap<String, StatementSetter<T>>,
    /// Member names that were empty or declared twice.
    conflicts: Vec<String>,
}

impl<T: Block + Default> BlockType<T> {
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_factory(tag, T::default)
    }
}

impl<T: Block> BlockType<T> {
    pub fn with_factory(tag: impl Into<String>, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        BlockType {
            tag: tag.into(),
            factory: Box::new(factory),
            fields: HashMap::new(),
            values: HashMap::new(),
            statements: HashMap::new(),
            conflicts: Vec::new(),
        }
    }

    /// Declare a scalar member filled from `<field name="...">text</field>`.
    pub fn field<S: Scalar>(
        mut self,
        name: &str,
        set: impl Fn(&mut T, S) + Send + Sync + 'static,
    ) -> Self {
        self.claim(name);
        let setter: FieldSetter<T> = Box::new(move |target, text| {
            set(target, S::coerce(text)?);
            Ok(())
        });
        self.fields.insert(
            name.to_string(),
            FieldBinding {
                kind: S::KIND,
                set: setter,
            },
        );
        self
    }

    /// Declare a member holding the single block inside `<value name="...">`.
    pub fn value(
        mut self,
        name: &str,
        set: impl Fn(&mut T, Box<dyn Block>) + Send + Sync + 'static,
    ) -> Self {
        self.claim(name);
        self.values.insert(name.to_string(), Box::new(set));
        self
    }

    /// Declare a member holding the ordered blocks inside `<statement name="...">`.
    pub fn statement(
        mut self,
        name: &str,
        set: impl Fn(&mut T, Vec<Box<dyn Block>>) + Send + Sync + 'static,
    ) -> Self {
        self.claim(name);
        self.statements.insert(name.to_string(), Box::new(set));
        self
    }

    pub(crate) fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    fn claim(&mut self, name: &str) {
        let taken = self.fields.contains_key(name)
            || self.values.contains_key(name)
            || self.statements.contains_key(name);
        if name.is_empty() || taken {
            self.conflicts.push(name.to_string());
        }
    }
}

fn sorted<'a>(names: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut names: Vec<&str> = names.map(String::as_str).collect();
    names.sort_unstable();
    names
}

impl<T: Block> Descriptor for BlockType<T> {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn fields(&self) -> Vec<(&str, ScalarKind)> {
        sorted(self.fields.keys())
            .into_iter()
            .filter_map(|name| self.fields.get(name).map(|binding| (name, binding.kind)))
            .collect()
    }

    fn values(&self) -> Vec<&str> {
        sorted(self.values.keys())
    }

    fn statements(&self) -> Vec<&str> {
        sorted(self.statements.keys())
    }

    fn instantiate(&self) -> Box<dyn Block> {
        Box::new((self.factory)())
    }

    fn bind(
        &self,
        node: &Node,
        binder: &Binder<'_>,
        depth: usize,
    ) -> Result<Box<dyn Block>, ParseError> {
        let mut instance = (self.factory)();

        for child in &node.children {
            match child.name.as_str() {
                FIELD => {
                    let name = binder.member_name(child, &self.tag)?;
                    let binding = self
                        .fields
                        .get(name)
                        .ok_or_else(|| binder.unknown_member(child, &self.tag, name))?;
                    trace!("{}: field {} = {:?}", self.tag, name, child.text());
                    (binding.set)(&mut instance, child.text())
                        .map_err(|err| binder.coercion_error(child, &self.tag, name, err))?;
                }
                VALUE => {
                    let name = binder.member_name(child, &self.tag)?;
                    let set = self
                        .values
                        .get(name)
                        .ok_or_else(|| binder.unknown_member(child, &self.tag, name))?;
                    let nested = binder.bind_value(child, &self.tag, name, depth)?;
                    set(&mut instance, nested);
                }
                STATEMENT => {
                    let name = binder.member_name(child, &self.tag)?;
                    let set = self
                        .statements
                        .get(name)
                        .ok_or_else(|| binder.unknown_member(child, &self.tag, name))?;
                    let nested = binder.bind_statement(child, depth)?;
                    set(&mut instance, nested);
                }
                _ => {}
            }
        }

        Ok(Box::new(instance))
    }
}
