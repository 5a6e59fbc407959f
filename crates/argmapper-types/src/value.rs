//! Type-erased argument values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::key::TypeDescriptor;

/// A shared, type-erased value.
///
/// Cloning a `Value` clones the `Arc`, never the payload, so environments can
/// be copied into each chain attempt without duplicating user data. Two clones
/// of the same value share an identity, see [`Value::identity`].
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    ty: TypeDescriptor,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            ty: TypeDescriptor::of::<T>(),
        }
    }

    pub fn type_descriptor(&self) -> TypeDescriptor {
        self.ty
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone the payload out as a `T`.
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Address of the shared payload. Stable for as long as any clone of this
    /// value is alive.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        self.identity() == other.identity()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>@{:#x}", self.ty, self.identity())
    }
}
