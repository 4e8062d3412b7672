//! Error types for the generator chain.
//!
//! Two kinds of failure exist and they are never conflated:
//!
//! - **Precondition violations** (bad bit width, empty buffer, out-of-range span,
//!   over-cap bulk read). These indicate a caller bug and fail loudly at the call
//!   site; nothing is clamped or defaulted.
//! - **Depletion**: a [`GarbageGarbler`](crate::chain::GarbageGarbler) has served its
//!   safe output budget and has no staged entropy to reseed from. This is an
//!   operational condition, not a bug — callers seed more entropy and retry.
//!
//! No error is retried internally and none is converted into a default value.
//! Silent fallback in a generator of this kind would be a security defect.

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of the sponge/conditioning stack.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A whitened-bit request outside the supported 1..=32 range.
    #[error("bit request of {bits} is outside 1..=32")]
    BitWidth {
        /// The rejected bit count.
        bits: u32,
    },

    /// A read or statistics collection over an empty span.
    #[error("zero-length span passed to {operation}")]
    EmptySpan {
        /// Name of the rejecting operation.
        operation: &'static str,
    },

    /// An `offset + length` span that does not fit the supplied buffer.
    #[error("span {offset}+{length} exceeds buffer of {available}")]
    SpanOutOfRange {
        /// Requested start offset.
        offset: usize,
        /// Requested element count.
        length: usize,
        /// Buffer size actually available.
        available: usize,
    },

    /// A benchmark sample whose length is not a multiple of the tester's
    /// atomic unit.
    #[error("sample of {length} bytes is not divisible by the {atom}-byte unit")]
    SampleAlignment {
        /// Length of the offending sample.
        length: usize,
        /// Atomic unit size of the consumer.
        atom: usize,
    },

    /// A bulk read above a source's per-call export cap.
    #[error("bulk read of {requested} exceeds the per-call cap of {cap}")]
    ExportCap {
        /// Requested element count.
        requested: usize,
        /// Hard per-call limit of the source.
        cap: usize,
    },

    /// The depletable generator is out of safe output and holds no staged entropy.
    ///
    /// Distinct from a precondition bug: the caller is expected to feed the staging
    /// pool via `seed_entropy` and retry.
    #[error("generator depleted: {remaining} bits remaining, {requested} requested")]
    Depleted {
        /// Bits still serveable before the reseed threshold.
        remaining: u64,
        /// Bits the caller asked for.
        requested: u64,
    },
}
