use num_traits::{AsPrimitive, Zero};

/// A value that a [`Reporter`][1] can hold.
///
/// The value is created from the numeric id of the reporter that first owns it and
/// is rendered as an unsigned number in every diagnostic line. Conversions follow
/// the semantics of `as` casts, so an id that does not fit into a narrow type wraps.
///
/// This trait is implemented for every type that is [`Zero`], converts to `u64` via
/// [`AsPrimitive`] and can be created from a `u64` the same way. That covers all
/// primitive numeric types.
///
/// [1]: crate::Reporter
pub trait Value: Copy + Send + Sync + 'static {
    /// Creates the initial value for a reporter with the given id.
    fn from_id(id: u64) -> Self;

    /// The value as rendered in a diagnostic line.
    fn to_record(self) -> u64;

    /// The sentinel a value is reset to before its storage is released.
    fn sentinel() -> Self;
}

impl<T> Value for T
where
    T: Copy + Send + Sync + Zero + AsPrimitive<u64>,
    u64: AsPrimitive<T>,
{
    #[inline]
    fn from_id(id: u64) -> Self {
        id.as_()
    }

    #[inline]
    fn to_record(self) -> u64 {
        self.as_()
    }

    #[inline]
    fn sentinel() -> Self {
        Self::zero()
    }
}
