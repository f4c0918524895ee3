use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use foldhash::{HashMap, HashMapExt};

use crate::record::{self, Record};
use crate::slot::Slot;
use crate::{Operation, Reporter, Sink, StderrSink, Value};

// One lazily created registry per element type, never torn down. Registries are stored
// type-erased because a generic static cannot exist per `T`.
static GLOBAL_REGISTRIES: LazyLock<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// State shared by every reporter of a registry. Only accessed under the registry lock.
#[derive(Debug, Default)]
struct State {
    /// Number of ids issued so far. The most recently issued id equals this value.
    issued: u64,

    /// Number of lines a sink failed to accept.
    write_failures: u64,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    default_sink: Arc<dyn Sink>,
    type_hash: u16,
}

/// Shared id counter, lock and default sink for reporters of element type `T`.
///
/// Every [`Reporter`] belongs to exactly one registry. The registry lock serializes all id
/// allocation and all diagnostic output of its reporters, so lines never interleave and ids
/// are never duplicated, no matter how many threads operate on the reporters.
///
/// Cloning a registry yields another handle to the same shared state.
///
/// [`Reporter::new()`] uses the process-wide registry for `T`, obtained via
/// [`Registry::global()`]. Creating a separate registry isolates its ids and output from
/// everything else in the process, which is mostly useful in tests.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use lifecycle_reporter::{MemorySink, Registry};
///
/// let sink = Arc::new(MemorySink::new());
/// let registry = Registry::<u32>::builder().default_sink(sink.clone()).build();
///
/// let first = registry.reporter();
/// let second = registry.reporter();
///
/// assert_eq!(first.id(), 1);
/// assert_eq!(second.id(), 2);
/// assert_eq!(registry.issued(), 2);
/// ```
pub struct Registry<T> {
    inner: Arc<Inner>,

    _value: PhantomData<fn() -> T>,
}

impl<T: Value> Registry<T> {
    /// Creates an isolated registry whose reporters write to standard error by default.
    #[expect(
        clippy::new_without_default,
        reason = "to avoid ambiguity with the process-wide registry returned by global()"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for a registry with a custom configuration.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Gets replaced with itself by different name, bad mutation.
    pub fn builder() -> RegistryBuilder<T> {
        RegistryBuilder::new()
    }

    /// Returns the process-wide registry for `T`, creating it on first use.
    ///
    /// All calls for the same `T` return handles to the same shared state.
    #[must_use]
    pub fn global() -> Self {
        let mut registries = GLOBAL_REGISTRIES
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let entry = registries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Self::new()));

        (**entry)
            .downcast_ref::<Self>()
            .expect("registries are keyed by the TypeId of their element type")
            .clone()
    }

    /// Creates a reporter bound to this registry and its default sink.
    #[must_use]
    pub fn reporter(&self) -> Reporter<T> {
        Reporter::construct(
            self.clone(),
            Arc::clone(&self.inner.default_sink),
            Operation::New,
        )
    }

    /// Creates a reporter bound to this registry and the given sink.
    #[must_use]
    pub fn reporter_with_sink(&self, sink: Arc<dyn Sink>) -> Reporter<T> {
        Reporter::construct(self.clone(), sink, Operation::WithSink)
    }

    /// Number of ids issued so far by this registry.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.lock().state.issued
    }

    /// Number of diagnostic lines that a sink failed to accept.
    ///
    /// Reporter operations cannot fail because of their output, so failed writes are
    /// counted here instead of being reported to the caller.
    #[must_use]
    pub fn write_failures(&self) -> u64 {
        self.lock().state.write_failures
    }

    /// Whether two handles refer to the same registry.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn lock(&self) -> RegistryGuard<'_, T> {
        RegistryGuard {
            // The guarded counters are updated by single statements that cannot panic
            // halfway, and destruction must be able to log even after a panic elsewhere.
            state: self
                .inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
            type_hash: self.inner.type_hash,
            _value: PhantomData,
        }
    }
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _value: PhantomData,
        }
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("value_type", &std::any::type_name::<T>())
            .field("inner", &self.inner)
            .finish()
    }
}

/// Exclusive access to a registry. Held for the full duration of every reporter operation.
pub(crate) struct RegistryGuard<'a, T> {
    state: MutexGuard<'a, State>,
    type_hash: u16,

    _value: PhantomData<fn() -> T>,
}

impl<T: Value> RegistryGuard<'_, T> {
    /// Allocates the next id. Ids start at 1 and strictly increase.
    pub(crate) fn next_id(&mut self) -> u64 {
        self.state.issued = self
            .state
            .issued
            .checked_add(1)
            .expect("reporter id overflows u64 - this indicates an unrealistic scenario");

        self.state.issued
    }

    /// Writes one diagnostic line describing `slot` of reporter `id` to `sink`.
    pub(crate) fn emit(&mut self, sink: &dyn Sink, id: u64, slot: &Slot<T>, operation: Operation) {
        let record = Record {
            type_hash: self.type_hash,
            thread_hash: record::current_thread_hash(),
            id,
            address: slot.address(),
            value: slot.record_value(),
            operation,
        };

        if sink.write_line(&record.to_string()).is_err() {
            self.state.write_failures = self.state.write_failures.wrapping_add(1);
        }
    }
}

/// Creates instances of [`Registry`].
///
/// Use [`Registry::builder()`] to create a new instance of this builder.
#[derive(Debug)]
pub struct RegistryBuilder<T> {
    default_sink: Option<Arc<dyn Sink>>,

    _value: PhantomData<fn() -> T>,
}

impl<T: Value> RegistryBuilder<T> {
    fn new() -> Self {
        Self {
            default_sink: None,
            _value: PhantomData,
        }
    }

    /// Sets the sink that reporters created via [`Registry::reporter()`] write to.
    ///
    /// Defaults to [`StderrSink`].
    #[must_use]
    pub fn default_sink(self, sink: Arc<dyn Sink>) -> Self {
        Self {
            default_sink: Some(sink),
            ..self
        }
    }

    /// Builds the registry.
    #[must_use]
    pub fn build(self) -> Registry<T> {
        Registry {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                default_sink: self
                    .default_sink
                    .unwrap_or_else(|| Arc::new(StderrSink)),
                type_hash: record::type_hash::<T>(),
            }),
            _value: PhantomData,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;
    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::MemorySink;

    assert_impl_all!(Registry<u64>: Send, Sync, Clone);

    #[derive(Debug)]
    struct FailingSink;

    impl Sink for FailingSink {
        fn write_line(&self, _line: &str) -> io::Result<()> {
            Err(io::Error::other("sink is closed"))
        }
    }

    fn memory_registry() -> (Registry<u64>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let registry = Registry::builder().default_sink(sink.clone()).build();
        (registry, sink)
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let registry = Registry::<u64>::new();
        let mut guard = registry.lock();

        assert_eq!(guard.next_id(), 1);
        assert_eq!(guard.next_id(), 2);
        assert_eq!(guard.next_id(), 3);
        drop(guard);

        assert_eq!(registry.issued(), 3);
    }

    #[test]
    fn registries_are_isolated() {
        let (first, _first_sink) = memory_registry();
        let (second, _second_sink) = memory_registry();

        let _a = first.reporter();
        let _b = first.reporter();
        let c = second.reporter();

        assert_eq!(c.id(), 1);
        assert_eq!(first.issued(), 2);
        assert_eq!(second.issued(), 1);
        assert!(!first.same_as(&second));
    }

    #[test]
    fn clones_share_state() {
        let (registry, _sink) = memory_registry();
        let clone = registry.clone();

        let _a = clone.reporter();

        assert_eq!(registry.issued(), 1);
        assert!(registry.same_as(&clone));
    }

    #[test]
    fn global_registry_is_shared_per_type() {
        // An element type no other test uses, so the counter is not disturbed.
        let first = Registry::<i16>::global();
        let second = Registry::<i16>::global();

        assert!(first.same_as(&second));

        let from_thread = thread::spawn(Registry::<i16>::global)
            .join()
            .expect("spawned thread does not panic");
        assert!(first.same_as(&from_thread));
    }

    #[test]
    fn emit_writes_to_default_sink() {
        let (registry, sink) = memory_registry();

        drop(registry.reporter());

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(": Reporter::new()"));
        assert!(lines[1].ends_with(": Reporter::drop(&mut self)"));
    }

    #[test]
    fn write_failures_are_counted() {
        let registry = Registry::<u64>::builder()
            .default_sink(Arc::new(FailingSink))
            .build();

        let reporter = registry.reporter();
        reporter.call(());
        drop(reporter);

        assert_eq!(registry.write_failures(), 3);
        assert_eq!(registry.issued(), 1);
    }
}
