use thiserror::Error;

/// Failure of an operation that needed to acquire storage.
///
/// Every allocating method on [`Tranche`] returns this on failure and leaves
/// the container exactly as it was before the call.
///
/// [`Tranche`]: crate::Tranche
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveError {
    /// The required capacity cannot be represented.
    ///
    /// Raised when a capacity computation overflows `usize`, or when the
    /// required element count exceeds [`Tranche::MAX_LEN`].
    ///
    /// [`Tranche::MAX_LEN`]: crate::Tranche::MAX_LEN
    #[error("capacity overflow: {required} elements exceeds the maximum of {max}")]
    CapacityOverflow {
        /// Element count the operation needed.
        required: usize,
        /// Largest element count the container can represent.
        max: usize,
    },
    /// The allocation primitive refused the request.
    #[error("allocation of {elements} elements ({bytes} bytes) failed")]
    AllocFailed {
        /// Element count of the refused request.
        elements: usize,
        /// Size of the refused request in bytes.
        bytes: usize,
    },
}
