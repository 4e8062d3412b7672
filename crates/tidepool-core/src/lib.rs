//! # tidepool-core
//!
//! A layered, self-reseeding random generator built on a from-scratch sponge
//! permutation family, plus the bit-level statistics that watch its health.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tidepool_core::{RandomSource, SecureRandom};
//!
//! let mut random = SecureRandom::new()?;
//! let roll = random.next_f64()?;        // uniform in [0, 1)
//! let mut key = [0u8; 32];
//! random.fill_bytes(&mut key, 0, 32)?;
//! # Ok::<(), tidepool_core::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TimingJitter → SecureEntropy (s256) → SecureFeed (x512) ─┬→ SecureRandom
//!                                                          └→ GarbageGarbler
//! ```
//!
//! Each layer is a sponge instance that re-absorbs output of the layer below
//! on its own revitalization schedule: every read, a jittered round interval,
//! or only when the caller stages fresh entropy. [`GarbageGarbler`] tracks a
//! hard output budget and fails closed with [`Error::Depleted`] rather than
//! stretching stale state.
//!
//! The sponges themselves are not a standardized hash (no SHA-2/SHA-3 claim),
//! deterministic replay across versions is not guaranteed, and nothing here is
//! constant-time. What the crate does guarantee is measurable output quality,
//! checked by [`stats`] in-process and certified by the benchmark suite in the
//! companion `tidepool-tests` crate.

pub mod chain;
pub mod error;
pub mod source;
pub mod sponge;
pub mod stats;
pub mod timing;

pub use chain::{GarbageGarbler, SecureEntropy, SecureFeed, SecureRandom, unit_f32, unit_f64};
pub use error::{Error, Result};
pub use source::RandomSource;
pub use sponge::{Sponge, Variant, digest};
pub use stats::{BitStatistic, Validity};
pub use timing::TimingJitter;

/// Crate version, for reports and logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
