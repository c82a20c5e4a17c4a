//! Crate-wide error types.
//!
//! Only configuration can fail in this engine; every cache operation is
//! total and reports its effects through a `CacheDelta` instead of a
//! `Result`.

use thiserror::Error;

/// Result type used throughout the paging engine.
pub type PagingResult<T> = Result<T, PagingError>;

/// Errors surfaced by the paging engine.
///
/// All variants are configuration errors detected at construction time.
/// Bit-shift address translation silently produces garbage for
/// non-power-of-two sizes, so the sizes are rejected up front.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagingError {
    #[error("{what} has a zero extent: {size:?}")]
    ZeroExtent { what: &'static str, size: (u32, u32, u32) },

    #[error("{what} must be a power of two on every axis, got {size:?}")]
    NotPowerOfTwo { what: &'static str, size: (u32, u32, u32) },

    #[error("{what} {size:?} is not divisible by its block size {block:?}")]
    NotDivisible {
        what: &'static str,
        size: (u32, u32, u32),
        block: (u32, u32, u32),
    },
}
