//! Second conditioning layer: periodically revitalized 512-bit sponge.

use super::BitTap;
use super::entropy::SecureEntropy;
use crate::error::Result;
use crate::source::RandomSource;
use crate::sponge::{Sponge, Variant};

/// Base round interval between revitalizations.
const REVITALIZE_BASE: u64 = 128 * 1024;
/// The interval is jittered by a squeeze-derived offset in `0..JITTER_SPAN`.
const JITTER_SPAN: u64 = 64 * 1024;

/// The workhorse random source.
///
/// Serves whitened bits continuously from an x512 sponge and pulls fresh
/// conditioned entropy from [`SecureEntropy`] only periodically: once the
/// round counter passes a threshold rerandomized at every revitalization to
/// a value `counter + 128K + squeeze-derived jitter`. An observer who times
/// one revitalization learns nothing about when the next one lands.
#[derive(Debug)]
pub struct SecureFeed {
    sponge: Sponge,
    tap: BitTap,
    upstream: SecureEntropy,
    next_revitalize: u64,
}

impl SecureFeed {
    /// Construct and immediately revitalize, so the state never serves
    /// straight from the public initialization vector.
    pub fn new() -> Result<Self> {
        let mut feed = SecureFeed {
            sponge: Sponge::new(Variant::X512),
            tap: BitTap::new(),
            upstream: SecureEntropy::new(),
            next_revitalize: 0,
        };
        feed.revitalize()?;
        Ok(feed)
    }

    /// Rounds until the next scheduled revitalization.
    pub fn rounds_until_revitalize(&self) -> u64 {
        self.next_revitalize.saturating_sub(self.sponge.counter())
    }

    fn revitalize(&mut self) -> Result<()> {
        let visible = self.sponge.visible_size();
        let mut words = [0u64; 8];
        self.upstream.fill_longs(&mut words, 0, visible)?;
        for (position, &word) in words.iter().enumerate() {
            self.sponge.absorb(word, position);
        }
        self.sponge.scramble();
        // The schedule jitter comes out of the freshly scrambled state, so
        // the interval itself is unpredictable to an outside observer.
        let jitter = self.sponge.squeeze(0) % JITTER_SPAN;
        self.next_revitalize = self.sponge.counter() + REVITALIZE_BASE + jitter;
        log::debug!(
            "secure-feed revitalized at round {}, next in {} rounds",
            self.sponge.counter(),
            REVITALIZE_BASE + jitter
        );
        Ok(())
    }
}

impl RandomSource for SecureFeed {
    fn next_bits(&mut self, bits: u32) -> Result<u32> {
        if self.sponge.counter() >= self.next_revitalize {
            self.revitalize()?;
        }
        self.tap.next_bits(&mut self.sponge, bits)
    }
}
