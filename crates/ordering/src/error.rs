//! Order wrapper errors.

/// Errors returned when mutating an [`OrderWrapper`](crate::OrderWrapper).
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum OrderError {
    /// Transactions are immutable; only bundle economics can be updated.
    #[error("cannot set the profit of a transaction order")]
    ImmutableTransaction,
}
