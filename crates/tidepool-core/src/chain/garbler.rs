//! Depletable generator with an externally fed staging pool.

use super::BitTap;
use crate::error::{Error, Result};
use crate::source::{RandomSource, check_span};
use crate::sponge::{Sponge, Variant};
use crate::timing::TimingJitter;

/// Safe output budget between reseeds, in bits.
pub const RESEED_THRESHOLD_BITS: u64 = (i32::MAX as u64) * 4;

/// Size of the external staging pool.
pub const STAGING_POOL_BYTES: usize = 128;

/// A depletable random generator on an x1024 sponge.
///
/// Seeded once from timing jitter at construction, then reseeded only from
/// entropy the caller stages via [`GarbageGarbler::seed_entropy`]. Every
/// served bit is charged against a fixed budget; when the budget is gone the
/// generator either reseeds itself (staging pool full) or fails closed with
/// [`Error::Depleted`]. It never quietly stretches stale state.
///
/// Lifecycle: constructed → serving → (auto-reseed ↺ serving | depleted).
#[derive(Debug)]
pub struct GarbageGarbler {
    sponge: Sponge,
    tap: BitTap,
    threshold: u64,
    remaining: u64,
    pool: [u8; STAGING_POOL_BYTES],
    pool_fill: usize,
}

impl GarbageGarbler {
    /// Construct with the standard output budget.
    pub fn new() -> Result<Self> {
        GarbageGarbler::with_threshold(RESEED_THRESHOLD_BITS)
    }

    /// Construct with a caller-chosen budget. The production budget is
    /// [`RESEED_THRESHOLD_BITS`]; smaller values exist so depletion handling
    /// can be exercised without serving gigabits first.
    pub fn with_threshold(threshold: u64) -> Result<Self> {
        let mut garbler = GarbageGarbler {
            sponge: Sponge::new(Variant::X1024),
            tap: BitTap::new(),
            threshold,
            remaining: threshold,
            pool: [0u8; STAGING_POOL_BYTES],
            pool_fill: 0,
        };
        let mut jitter = TimingJitter::new();
        let visible = garbler.sponge.visible_size();
        let mut words = [0u64; 16];
        jitter.fill_longs(&mut words, 0, visible)?;
        for (position, &word) in words.iter().enumerate() {
            garbler.sponge.absorb(word, position);
        }
        garbler.sponge.scramble();
        Ok(garbler)
    }

    /// Bits still serveable before the generator depletes.
    pub fn remaining_bits(&self) -> u64 {
        self.remaining
    }

    /// The full budget restored by a reseed.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Bytes currently staged toward the next reseed.
    pub fn staged_bytes(&self) -> usize {
        self.pool_fill
    }

    /// Stage external entropy for the next reseed.
    ///
    /// Bytes are XOR-combined into the pool cyclically, so feeding more than
    /// [`STAGING_POOL_BYTES`] folds the excess in rather than dropping it.
    /// The pool counts as full once the cumulative staged length reaches the
    /// pool size.
    pub fn seed_entropy(&mut self, source: &[u8], offset: usize, length: usize) -> Result<()> {
        check_span("seed_entropy", offset, length, source.len())?;
        let start = self.pool_fill % STAGING_POOL_BYTES;
        for (i, &byte) in source[offset..offset + length].iter().enumerate() {
            self.pool[(start + i) % STAGING_POOL_BYTES] ^= byte;
        }
        self.pool_fill = (self.pool_fill + length).min(STAGING_POOL_BYTES);
        Ok(())
    }

    /// Absorb the staged pool, scramble, restore the full budget.
    fn reseed_from_pool(&mut self) {
        for (position, chunk) in self.pool.chunks_exact(8).enumerate() {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            self.sponge.absorb(u64::from_le_bytes(word), position);
        }
        self.sponge.scramble();
        self.pool = [0u8; STAGING_POOL_BYTES];
        self.pool_fill = 0;
        self.remaining = self.threshold;
        log::debug!(
            "garbler reseeded from staging pool, budget restored to {} bits",
            self.threshold
        );
    }
}

impl RandomSource for GarbageGarbler {
    fn next_bits(&mut self, bits: u32) -> Result<u32> {
        if bits == 0 || bits > 32 {
            return Err(Error::BitWidth { bits });
        }
        if self.remaining < u64::from(bits) {
            if self.pool_fill >= STAGING_POOL_BYTES {
                self.reseed_from_pool();
            } else {
                return Err(Error::Depleted {
                    remaining: self.remaining,
                    requested: u64::from(bits),
                });
            }
        }
        let value = self.tap.next_bits(&mut self.sponge, bits)?;
        self.remaining -= u64::from(bits);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_exactly_the_budget_then_fails_closed() {
        let mut garbler = GarbageGarbler::with_threshold(64).unwrap();
        // 64-bit budget serves exactly two 32-bit reads.
        garbler.next_bits(32).unwrap();
        garbler.next_bits(32).unwrap();
        assert_eq!(garbler.remaining_bits(), 0);
        let err = garbler.next_bits(1).unwrap_err();
        match err {
            Error::Depleted {
                remaining,
                requested,
            } => {
                assert_eq!(remaining, 0);
                assert_eq!(requested, 1);
            }
            other => panic!("expected Depleted, got {other}"),
        }
    }

    #[test]
    fn partial_budget_cannot_serve_a_larger_request() {
        let mut garbler = GarbageGarbler::with_threshold(40).unwrap();
        garbler.next_bits(32).unwrap();
        assert_eq!(garbler.remaining_bits(), 8);
        assert!(matches!(
            garbler.next_bits(9),
            Err(Error::Depleted { .. })
        ));
        // The smaller request still fits.
        garbler.next_bits(8).unwrap();
    }

    #[test]
    fn full_staging_pool_triggers_auto_reseed() {
        let mut garbler = GarbageGarbler::with_threshold(32).unwrap();
        let seed = [0xA5u8; STAGING_POOL_BYTES];
        garbler.seed_entropy(&seed, 0, STAGING_POOL_BYTES).unwrap();
        assert_eq!(garbler.staged_bytes(), STAGING_POOL_BYTES);

        garbler.next_bits(32).unwrap();
        assert_eq!(garbler.remaining_bits(), 0);
        // Budget exhausted but the pool is full, so this reseeds instead of
        // failing.
        garbler.next_bits(32).unwrap();
        assert_eq!(garbler.remaining_bits(), garbler.threshold() - 32);
        assert_eq!(garbler.staged_bytes(), 0);
    }

    #[test]
    fn incremental_seeding_accumulates() {
        let mut garbler = GarbageGarbler::with_threshold(1024).unwrap();
        let chunk = [0x3Cu8; 32];
        for expected in [32, 64, 96, 128] {
            garbler.seed_entropy(&chunk, 0, 32).unwrap();
            assert_eq!(garbler.staged_bytes(), expected);
        }
        // Overfeeding folds in, the fill level stays capped.
        garbler.seed_entropy(&chunk, 0, 32).unwrap();
        assert_eq!(garbler.staged_bytes(), STAGING_POOL_BYTES);
    }

    #[test]
    fn seed_entropy_rejects_bad_spans() {
        let mut garbler = GarbageGarbler::with_threshold(64).unwrap();
        let seed = [0u8; 16];
        assert!(matches!(
            garbler.seed_entropy(&seed, 0, 0),
            Err(Error::EmptySpan { .. })
        ));
        assert!(matches!(
            garbler.seed_entropy(&seed, 8, 16),
            Err(Error::SpanOutOfRange { .. })
        ));
    }

    #[test]
    fn bit_width_violation_wins_over_depletion() {
        let mut garbler = GarbageGarbler::with_threshold(0).unwrap();
        assert!(matches!(
            garbler.next_bits(33),
            Err(Error::BitWidth { .. })
        ));
    }

    #[test]
    fn production_threshold_matches_the_documented_budget() {
        assert_eq!(RESEED_THRESHOLD_BITS, 8_589_934_588);
        let garbler = GarbageGarbler::new().unwrap();
        assert_eq!(garbler.remaining_bits(), RESEED_THRESHOLD_BITS);
    }
}
