use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::slot::Slot;
use crate::{Error, Operation, Qualifier, Registry, Sink, Value};

/// Holds a heap-allocated value and reports every lifecycle event and every call made on it.
///
/// Each reporter is assigned a unique id by its [`Registry`] when constructed and starts
/// out holding a value created from that id. Every construction, copy, move, assignment,
/// call and destruction writes one line to the sink the reporter is bound to:
///
/// ```text
/// [<type-hash>, <thread-hash>, <id>, 0x<address>, <value>]: <operation>
/// ```
///
/// A reporter that has been moved from (via [`take()`][Self::take] or
/// [`try_assign_take()`][Self::try_assign_take]) is invalidated: it keeps its id and can
/// still be called and dropped, reporting a null address and a zero value, but it can no
/// longer be the source of a copy or move.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use lifecycle_reporter::{MemorySink, Registry};
///
/// let sink = Arc::new(MemorySink::new());
/// let registry = Registry::<u64>::builder().default_sink(sink.clone()).build();
///
/// let mut r1 = registry.reporter();
/// let r2 = r1.clone();
/// let r3 = r1.take();
///
/// assert_eq!(r2.value(), Some(1));
/// assert_eq!(r3.value(), Some(1));
/// assert_eq!(r1.value(), None);
///
/// r1.call(());
///
/// assert!(sink.lines().last().unwrap().contains(", 00000]: Reporter::call(&self)"));
/// ```
///
/// # Thread safety
///
/// This type is thread-safe. All reporters of a registry serialize their operations on the
/// registry lock, so lines from different threads never interleave.
pub struct Reporter<T: Value = u64> {
    id: u64,
    slot: Slot<T>,
    sink: Arc<dyn Sink>,
    registry: Registry<T>,
}

impl<T: Value> Reporter<T> {
    /// Creates a reporter in the process-wide registry for `T`, writing to standard error.
    ///
    /// # Examples
    ///
    /// ```
    /// use lifecycle_reporter::Reporter;
    ///
    /// let reporter = Reporter::<u64>::new();
    /// reporter.call(());
    /// ```
    #[expect(
        clippy::new_without_default,
        reason = "construction has an observable side effect, which Default does not suggest"
    )]
    #[must_use]
    pub fn new() -> Self {
        Registry::global().reporter()
    }

    /// Creates a reporter in the process-wide registry for `T`, writing to `sink`.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn Sink>) -> Self {
        Registry::global().reporter_with_sink(sink)
    }

    pub(crate) fn construct(
        registry: Registry<T>,
        sink: Arc<dyn Sink>,
        operation: Operation,
    ) -> Self {
        let mut guard = registry.lock();

        let id = guard.next_id();
        let slot = Slot::new(T::from_id(id));
        guard.emit(&*sink, id, &slot, operation);
        drop(guard);

        Self {
            id,
            slot,
            sink,
            registry,
        }
    }

    /// The id assigned to this reporter at construction.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The value currently held, or `None` if this reporter has been moved from.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.slot.get()
    }

    /// Whether this reporter still holds a value.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.slot.is_valid()
    }

    /// The registry this reporter belongs to.
    #[must_use]
    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    /// The sink this reporter writes to.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Copy-constructs a new reporter holding an independent copy of this reporter's value.
    ///
    /// The copy gets a new id and is bound to the same registry and sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalidated`] if this reporter has been moved from. In that case no
    /// id is allocated and nothing is written to the sink.
    pub fn try_clone(&self) -> Result<Self> {
        let value = self.valid_value(Operation::Clone)?;

        let mut guard = self.registry.lock();

        let id = guard.next_id();
        let slot = Slot::new(value);
        guard.emit(&*self.sink, id, &slot, Operation::Clone);
        drop(guard);

        Ok(Self {
            id,
            slot,
            sink: Arc::clone(&self.sink),
            registry: self.registry.clone(),
        })
    }

    /// Move-constructs a new reporter that takes over this reporter's value.
    ///
    /// The storage is transferred, not copied. The new reporter gets a new id and is bound
    /// to the same registry and sink. This reporter is left invalidated; it keeps its id and
    /// may still be called or dropped.
    ///
    /// Taking from an already invalidated reporter yields another invalidated reporter.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let mut guard = self.registry.lock();

        let id = guard.next_id();
        let slot = self.slot.take();
        guard.emit(&*self.sink, id, &slot, Operation::Take);
        drop(guard);

        Self {
            id,
            slot,
            sink: Arc::clone(&self.sink),
            registry: self.registry.clone(),
        }
    }

    /// Copy-assigns the value of `source` into this reporter.
    ///
    /// The id of this reporter does not change and its existing storage is reused. If this
    /// reporter was invalidated, fresh storage is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalidated`] if `source` has been moved from. In that case this
    /// reporter is left unchanged and nothing is written to the sink.
    pub fn try_assign(&mut self, source: &Self) -> Result<()> {
        let value = source.valid_value(Operation::Assign)?;

        let mut guard = self.registry.lock();

        self.slot.overwrite(value);
        guard.emit(&*self.sink, self.id, &self.slot, Operation::Assign);

        Ok(())
    }

    /// Move-assigns the value of `source` into this reporter, invalidating `source`.
    ///
    /// The value is written into the existing storage of this reporter, whose id does not
    /// change. The storage of `source` is released; `source` keeps its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalidated`] if `source` has been moved from. In that case neither
    /// reporter is changed and nothing is written to the sink.
    pub fn try_assign_take(&mut self, source: &mut Self) -> Result<()> {
        let value = source.valid_value(Operation::AssignTake)?;

        let mut guard = self.registry.lock();

        self.slot.overwrite(value);
        source.slot.release();
        guard.emit(&*self.sink, self.id, &self.slot, Operation::AssignTake);

        Ok(())
    }

    /// Calls the reporter through a shared reference.
    ///
    /// The arguments are accepted and discarded; pass a tuple for several arguments and
    /// `()` for none. Only a diagnostic line is produced.
    pub fn call<A>(&self, args: A) {
        self.invoke(Qualifier::READ_ONLY, args);
    }

    /// Calls the reporter through an exclusive reference.
    ///
    /// The arguments are accepted and discarded.
    pub fn call_mut<A>(&mut self, args: A) {
        self.invoke(Qualifier::MUTABLE, args);
    }

    /// Calls the reporter by value, consuming it.
    ///
    /// The arguments are accepted and discarded. The call is followed by the destruction
    /// of the reporter, which is reported as usual.
    pub fn call_once<A>(self, args: A) {
        self.invoke(Qualifier::MUTABLE_FINAL, args);
    }

    /// Calls the reporter with an explicit qualifier combination.
    ///
    /// This is the single entry point behind [`call()`][Self::call],
    /// [`call_mut()`][Self::call_mut] and [`call_once()`][Self::call_once], and can express
    /// every combination of [`Access`][crate::Access] and [`Category`][crate::Category].
    /// The arguments are accepted and discarded.
    pub fn invoke<A>(&self, qualifier: Qualifier, _args: A) {
        let mut guard = self.registry.lock();
        guard.emit(&*self.sink, self.id, &self.slot, Operation::Call(qualifier));
    }

    fn valid_value(&self, operation: Operation) -> Result<T> {
        self.slot.get().ok_or(Error::Invalidated {
            id: self.id,
            operation,
        })
    }
}

impl<T: Value> Clone for Reporter<T> {
    /// Copy-constructs a new reporter. See [`try_clone()`][Self::try_clone].
    ///
    /// # Panics
    ///
    /// Panics if this reporter has been moved from.
    fn clone(&self) -> Self {
        self.try_clone()
            .expect("cannot clone a reporter that has been moved from")
    }

    /// Copy-assigns the value of `source` into this reporter. See
    /// [`try_assign()`][Self::try_assign].
    ///
    /// # Panics
    ///
    /// Panics if `source` has been moved from.
    fn clone_from(&mut self, source: &Self) {
        self.try_assign(source)
            .expect("cannot assign from a reporter that has been moved from");
    }
}

impl<T: Value> Drop for Reporter<T> {
    fn drop(&mut self) {
        let mut guard = self.registry.lock();

        // Reported before the value is released, so the line shows what was destroyed.
        guard.emit(&*self.sink, self.id, &self.slot, Operation::Drop);
        self.slot.release();
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl<T: Value> fmt::Debug for Reporter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("id", &self.id)
            .field("value", &self.slot.get().map(Value::to_record))
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}
