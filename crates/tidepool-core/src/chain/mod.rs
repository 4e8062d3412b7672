//! The entropy conditioning chain.
//!
//! Four layers, each built on a sponge one size up from the layer feeding it:
//!
//! ```text
//! TimingJitter → SecureEntropy (s256) → SecureFeed (x512) ─┬→ SecureRandom (buffered)
//!                                                          └→ GarbageGarbler (x1024, depletable)
//! ```
//!
//! Each layer revitalizes — re-absorbs fresh output of the layer below — on its
//! own schedule: [`SecureEntropy`] before every read, [`SecureFeed`] at a
//! rerandomized round interval, [`GarbageGarbler`] only when its staging pool
//! has been refilled externally. Layers are plain owned values, not process
//! globals; run one instance per process by convention and confine it to one
//! thread, or wrap it in a mutex. No method here is safe to interleave across
//! threads mid-sequence.

mod entropy;
mod feed;
mod garbler;
mod random;

pub use entropy::SecureEntropy;
pub use feed::SecureFeed;
pub use garbler::{GarbageGarbler, RESEED_THRESHOLD_BITS, STAGING_POOL_BYTES};
pub use random::{BUFFER_BYTES, SecureRandom, unit_f32, unit_f64};

use crate::error::{Error, Result};
use crate::sponge::Sponge;

/// A whitened-bit cursor over a sponge's visible words.
///
/// Each call squeezes one word, XOR-folds its halves, and keeps the top `bits`
/// bits of the fold. When the cursor has walked every visible word it runs one
/// permutation round and starts over, so no word is exported twice per round.
#[derive(Debug, Default)]
pub(crate) struct BitTap {
    position: usize,
}

impl BitTap {
    pub(crate) fn new() -> Self {
        BitTap { position: 0 }
    }

    pub(crate) fn next_bits(&mut self, sponge: &mut Sponge, bits: u32) -> Result<u32> {
        if bits == 0 || bits > 32 {
            return Err(Error::BitWidth { bits });
        }
        let word = sponge.squeeze(self.position);
        let folded = (word ^ (word >> 32)) as u32;
        self.position += 1;
        if self.position >= sponge.visible_size() {
            sponge.round();
            self.position = 0;
        }
        Ok(folded >> (32 - bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sponge::Variant;

    #[test]
    fn tap_rounds_the_sponge_once_per_visible_cycle() {
        let mut sponge = Sponge::new(Variant::S256);
        let mut tap = BitTap::new();
        let visible = sponge.visible_size();
        for cycle in 1..=3u64 {
            for _ in 0..visible {
                tap.next_bits(&mut sponge, 32).unwrap();
            }
            assert_eq!(sponge.counter(), cycle);
        }
    }

    #[test]
    fn tap_rejects_out_of_range_widths() {
        let mut sponge = Sponge::new(Variant::X256);
        let mut tap = BitTap::new();
        assert!(matches!(
            tap.next_bits(&mut sponge, 0),
            Err(Error::BitWidth { .. })
        ));
        assert!(matches!(
            tap.next_bits(&mut sponge, 33),
            Err(Error::BitWidth { .. })
        ));
        // A rejected request must not advance the cursor.
        assert_eq!(sponge.counter(), 0);
    }

    #[test]
    fn tap_output_fits_the_requested_width() {
        let mut sponge = Sponge::new(Variant::X1024);
        sponge.scramble();
        let mut tap = BitTap::new();
        for bits in 1..=31u32 {
            let v = tap.next_bits(&mut sponge, bits).unwrap();
            assert!(v < (1u32 << bits), "bits={bits} value={v}");
        }
    }
}
