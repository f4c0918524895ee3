//! Diagnostic records and the operations they describe.

use std::any::TypeId;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::mem;
use std::thread::{self, ThreadId};

use foldhash::fast::FixedState;

/// Seed for the hashes rendered in diagnostic lines. Fixed so that the type hash of a
/// given element type is identical on every line of a run.
const HASH_SEED: u64 = 0x7265_706f_7274_6572;

/// Number of hexadecimal digits needed to render any address on this platform.
const ADDRESS_HEX_DIGITS: usize = mem::size_of::<usize>() * 2;

/// Whether an invocation may modify the reporter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Access {
    /// The reporter is invoked through a shared reference.
    ReadOnly,

    /// The reporter is invoked through an exclusive reference or by value.
    Mutable,
}

/// Whether an invocation is the last use of the reporter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Category {
    /// The reporter remains usable after the invocation.
    Borrowed,

    /// The invocation is the final use of the reporter.
    Final,
}

/// The qualifier combination an invocation was made with.
///
/// Each combination produces a distinct operation name in the diagnostic line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct Qualifier {
    /// Whether the invocation may modify the reporter.
    pub access: Access,

    /// Whether the invocation is the final use of the reporter.
    pub category: Category,
}

impl Qualifier {
    /// Read-only invocation that leaves the reporter usable. Used by [`Reporter::call()`][1].
    ///
    /// [1]: crate::Reporter::call
    pub const READ_ONLY: Self = Self::new(Access::ReadOnly, Category::Borrowed);

    /// Mutable invocation that leaves the reporter usable. Used by [`Reporter::call_mut()`][1].
    ///
    /// [1]: crate::Reporter::call_mut
    pub const MUTABLE: Self = Self::new(Access::Mutable, Category::Borrowed);

    /// Read-only invocation that is the final use of the reporter.
    pub const READ_ONLY_FINAL: Self = Self::new(Access::ReadOnly, Category::Final);

    /// Mutable invocation that consumes the reporter. Used by [`Reporter::call_once()`][1].
    ///
    /// [1]: crate::Reporter::call_once
    pub const MUTABLE_FINAL: Self = Self::new(Access::Mutable, Category::Final);

    /// Every qualifier combination.
    pub const ALL: [Self; 4] = [
        Self::READ_ONLY,
        Self::MUTABLE,
        Self::READ_ONLY_FINAL,
        Self::MUTABLE_FINAL,
    ];

    /// Creates a qualifier from its two components.
    #[must_use]
    pub const fn new(access: Access, category: Category) -> Self {
        Self { access, category }
    }

    fn receiver(self) -> &'static str {
        match (self.access, self.category) {
            (Access::ReadOnly, Category::Borrowed) => "Reporter::call(&self)",
            (Access::Mutable, Category::Borrowed) => "Reporter::call_mut(&mut self)",
            (Access::ReadOnly, Category::Final) => "Reporter::invoke(&self)",
            (Access::Mutable, Category::Final) => "Reporter::call_once(self)",
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            Access::ReadOnly => "read-only",
            Access::Mutable => "mutable",
        };

        let category = match self.category {
            Category::Borrowed => "borrowed",
            Category::Final => "final",
        };

        write!(f, "{access}, {category}")
    }
}

/// The lifecycle operation or invocation that produced a diagnostic line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Operation {
    /// Construction bound to the registry's default sink.
    New,

    /// Construction bound to a caller-supplied sink.
    WithSink,

    /// Copy construction.
    Clone,

    /// Move construction.
    Take,

    /// Destruction.
    Drop,

    /// Copy assignment.
    Assign,

    /// Move assignment.
    AssignTake,

    /// Invocation with the given qualifiers.
    Call(Qualifier),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("Reporter::new()"),
            Self::WithSink => f.write_str("Reporter::with_sink(Arc<dyn Sink>)"),
            Self::Clone => f.write_str("Reporter::clone(&self)"),
            Self::Take => f.write_str("Reporter::take(&mut self)"),
            Self::Drop => f.write_str("Reporter::drop(&mut self)"),
            Self::Assign => f.write_str("Reporter::assign(&mut self, &Reporter)"),
            Self::AssignTake => {
                f.write_str("Reporter::assign_take(&mut self, &mut Reporter)")
            }
            Self::Call(qualifier) => write!(f, "{} [{qualifier}]", qualifier.receiver()),
        }
    }
}

/// One diagnostic line, describing the state of a reporter when an operation happened.
///
/// Rendered via `Display` as:
///
/// ```text
/// [<type-hash>, <thread-hash>, <id>, 0x<address>, <value>]: <operation>
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Record {
    pub(crate) type_hash: u16,
    pub(crate) thread_hash: u16,
    pub(crate) id: u64,
    pub(crate) address: usize,
    pub(crate) value: u64,
    pub(crate) operation: Operation,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:05}, {:05}, {:05}, 0x{:0width$X}, {:05}]: {}",
            self.type_hash,
            self.thread_hash,
            self.id,
            self.address,
            self.value,
            self.operation,
            width = ADDRESS_HEX_DIGITS
        )
    }
}

/// Stable hash identifying the element type `T` for the duration of the process.
pub(crate) fn type_hash<T: 'static>() -> u16 {
    fold(TypeId::of::<T>())
}

/// Hash identifying the calling thread.
pub(crate) fn current_thread_hash() -> u16 {
    thread_hash(thread::current().id())
}

fn thread_hash(thread: ThreadId) -> u16 {
    fold(thread)
}

fn fold(value: impl Hash) -> u16 {
    let hash = FixedState::with_seed(HASH_SEED).hash_one(value);
    let folded = hash ^ (hash >> 16) ^ (hash >> 32) ^ (hash >> 48);

    u16::try_from(folded & u64::from(u16::MAX)).expect("masked to 16 bits")
}
