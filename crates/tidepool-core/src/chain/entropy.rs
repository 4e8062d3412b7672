//! First conditioning layer: timing jitter absorbed into a 256-bit sponge.

use super::BitTap;
use crate::error::Result;
use crate::source::{RandomSource, check_span};
use crate::sponge::{Sponge, Variant};
use crate::timing::TimingJitter;

/// Sponge-conditioned timing entropy.
///
/// Revitalizes on **every** read call: fresh jitter words are absorbed into
/// all visible words and the state is fully scrambled before anything is
/// exported. Nothing carries over between calls except the sponge state
/// itself, trading throughput for maximal unpredictability per call. This is
/// the slow, paranoid layer; [`SecureFeed`](super::SecureFeed) amortizes it.
#[derive(Debug)]
pub struct SecureEntropy {
    sponge: Sponge,
    tap: BitTap,
    jitter: TimingJitter,
}

impl SecureEntropy {
    pub fn new() -> Self {
        SecureEntropy {
            sponge: Sponge::new(Variant::S256),
            tap: BitTap::new(),
            jitter: TimingJitter::new(),
        }
    }

    /// Absorb one fresh jitter word per visible word, then scramble.
    fn revitalize(&mut self) -> Result<()> {
        let visible = self.sponge.visible_size();
        let mut words = [0u64; 4];
        self.jitter.fill_longs(&mut words, 0, visible)?;
        for (position, &word) in words.iter().enumerate() {
            self.sponge.absorb(word, position);
        }
        self.sponge.scramble();
        log::trace!(
            "secure-entropy revitalized, round counter {}",
            self.sponge.counter()
        );
        Ok(())
    }
}

impl Default for SecureEntropy {
    fn default() -> Self {
        SecureEntropy::new()
    }
}

impl RandomSource for SecureEntropy {
    fn next_bits(&mut self, bits: u32) -> Result<u32> {
        self.revitalize()?;
        self.tap.next_bits(&mut self.sponge, bits)
    }

    fn fill_bytes(&mut self, buffer: &mut [u8], offset: usize, length: usize) -> Result<()> {
        check_span("SecureEntropy::fill_bytes", offset, length, buffer.len())?;
        // One revitalization per call, not per byte.
        self.revitalize()?;
        for slot in &mut buffer[offset..offset + length] {
            *slot = self.tap.next_bits(&mut self.sponge, 8)? as u8;
        }
        Ok(())
    }

    fn fill_longs(&mut self, buffer: &mut [u64], offset: usize, length: usize) -> Result<()> {
        check_span("SecureEntropy::fill_longs", offset, length, buffer.len())?;
        self.revitalize()?;
        for slot in &mut buffer[offset..offset + length] {
            let hi = self.tap.next_bits(&mut self.sponge, 32)? as u64;
            let lo = self.tap.next_bits(&mut self.sponge, 32)? as u64;
            *slot = (hi << 32) | lo;
        }
        Ok(())
    }
}
