use std::any::Any;
use std::fmt;

/// Object-safe access to `Any` for every `'static` type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A domain type that can be materialized from a `block` node.
///
/// Implementing this marker is what allows a type to be registered and to
/// appear in value and statement members of other blocks.
pub trait Block: AsAny + fmt::Debug + 'static {}

impl dyn Block {
    /// True if the concrete type behind this block is `T`.
    pub fn is<T: Block>(&self) -> bool {
        AsAny::as_any(self).is::<T>()
    }

    pub fn downcast_ref<T: Block>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Block>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(self).downcast_mut::<T>()
    }

    /// Recover the owned concrete block. The box is dropped on mismatch, so
    /// check with [`is`](Self::is) first when the block is still needed.
    pub fn downcast<T: Block>(self: Box<Self>) -> Option<Box<T>> {
        AsAny::into_any(self).downcast::<T>().ok()
    }
}
