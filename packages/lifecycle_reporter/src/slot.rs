use std::mem;
use std::ptr;

use crate::Value;

/// Exclusive, heap-allocated storage for the value held by a reporter.
///
/// A slot is either valid (owns a boxed value) or invalidated (the value was
/// moved out or released). Every operation is defined for both states.
#[derive(Debug)]
pub(crate) enum Slot<T> {
    Valid(Box<T>),
    Invalidated,
}

impl<T: Value> Slot<T> {
    pub(crate) fn new(value: T) -> Self {
        Self::Valid(Box::new(value))
    }

    pub(crate) fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub(crate) fn get(&self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(**value),
            Self::Invalidated => None,
        }
    }

    /// Address of the storage, or zero for an invalidated slot.
    pub(crate) fn address(&self) -> usize {
        match self {
            Self::Valid(value) => ptr::from_ref::<T>(&**value).addr(),
            Self::Invalidated => 0,
        }
    }

    /// The value as rendered in a diagnostic line, or zero for an invalidated slot.
    pub(crate) fn record_value(&self) -> u64 {
        self.get().map_or(0, Value::to_record)
    }

    /// Moves the storage out, leaving this slot invalidated.
    pub(crate) fn take(&mut self) -> Self {
        mem::replace(self, Self::Invalidated)
    }

    /// Overwrites the value, reusing the existing storage if there is any.
    pub(crate) fn overwrite(&mut self, value: T) {
        match self {
            Self::Valid(existing) => **existing = value,
            Self::Invalidated => *self = Self::new(value),
        }
    }

    /// Resets the value to its sentinel and releases the storage.
    pub(crate) fn release(&mut self) {
        if let Self::Valid(mut value) = self.take() {
            *value = T::sentinel();
            drop(value);
        }
    }
}
