//! From-scratch sponge permutation family.
//!
//! A sponge owns a fixed array of 64-bit words, a round `counter`, and a derived
//! `mask` recomputed every round. Input is mixed in with [`Sponge::absorb`], output
//! is taken with [`Sponge::squeeze`], and [`Sponge::round`] is the permutation that
//! separates the two. Six variants share this interface (see [`Variant`]); they
//! differ only in word count, which neighbors participate in diffusion, and the
//! odd constants used in confusion.
//!
//! Two permutation families exist:
//!
//! - **Row-mix** (`S256`/`S512`/`S1024`): four running XOR accumulators `r0..r3`
//!   are computed once per round over disjoint word groups, giving every word
//!   long-range influence in a single round.
//! - **Lattice** (`X256`/`X512`/`X1024`): a uniform 4-neighbor diffuse/confuse
//!   step applied identically to every word. The diffusion radius is tighter, so
//!   [`Sponge::scramble`] runs twice as many rounds for this family.
//!
//! Neither family is a standardized hash; the goal is measurable mixing quality
//! (the avalanche and chi-square benchmarks certify it empirically), not SHA-3
//! compliance.

mod tables;

pub use tables::{EXPORT_PRIMES, INIT_VECTOR, nibble_balanced};

use tables::{CONFUSION_MULTIPLIERS, MASK_MULTIPLIER, ROTATIONS, ROUND_CONSTANTS};

/// Which permutation family a variant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Row,
    Lattice,
}

/// The six sponge width variants.
///
/// `S*` variants use the row-mix family, `X*` variants the lattice family. The
/// number names the visible state width in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// 4 words, row-mix.
    S256,
    /// 9 words of which 8 are visible, row-mix. The extra word is capacity that
    /// never leaves the state through `squeeze`.
    S512,
    /// 16 words, row-mix.
    S1024,
    /// 4 words, lattice.
    X256,
    /// 8 words, lattice.
    X512,
    /// 16 words, lattice.
    X1024,
}

impl Variant {
    /// All variants, in declaration order.
    pub const ALL: [Variant; 6] = [
        Variant::S256,
        Variant::S512,
        Variant::S1024,
        Variant::X256,
        Variant::X512,
        Variant::X1024,
    ];

    /// Total state width in words.
    pub fn words(self) -> usize {
        match self {
            Variant::S256 | Variant::X256 => 4,
            Variant::S512 => 9,
            Variant::X512 => 8,
            Variant::S1024 | Variant::X1024 => 16,
        }
    }

    /// Words reachable through `absorb`/`squeeze`.
    pub fn visible(self) -> usize {
        match self {
            Variant::S512 => 8,
            other => other.words(),
        }
    }

    /// Rounds executed by one `scramble` call.
    ///
    /// Row-mix reaches every word from every other word within `words()` rounds.
    /// The lattice family only mixes direct neighbors per round, so it gets twice
    /// the budget.
    pub fn scramble_rounds(self) -> usize {
        match self.family() {
            Family::Row => self.words(),
            Family::Lattice => self.words() * 2,
        }
    }

    /// Short lowercase identifier (`"s256"`, `"x1024"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Variant::S256 => "s256",
            Variant::S512 => "s512",
            Variant::S1024 => "s1024",
            Variant::X256 => "x256",
            Variant::X512 => "x512",
            Variant::X1024 => "x1024",
        }
    }

    fn family(self) -> Family {
        match self {
            Variant::S256 | Variant::S512 | Variant::S1024 => Family::Row,
            Variant::X256 | Variant::X512 | Variant::X1024 => Family::Lattice,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A sponge state instance.
///
/// State mutation is not internally synchronized: an `absorb → round → squeeze`
/// sequence must not interleave across threads. Confine an instance to one
/// thread or wrap it in a mutex.
#[derive(Debug, Clone)]
pub struct Sponge {
    words: [u64; 16],
    variant: Variant,
    counter: u64,
    mask: u64,
}

impl Sponge {
    /// Create a sponge of the given variant, loaded from the initialization
    /// vector.
    ///
    /// # Panics
    ///
    /// Panics if the initialization vector has lost its nibble balance — a
    /// build-corruption check, not a runtime condition.
    pub fn new(variant: Variant) -> Self {
        let mut words = [0u64; 16];
        for (i, w) in words.iter_mut().take(variant.words()).enumerate() {
            assert!(nibble_balanced(INIT_VECTOR[i]), "corrupt init vector");
            *w = INIT_VECTOR[i];
        }
        Sponge {
            words,
            variant,
            counter: 0,
            mask: 0,
        }
    }

    /// The variant this sponge was constructed as.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Total state width in words.
    pub fn sponge_size(&self) -> usize {
        self.variant.words()
    }

    /// Words addressable through `absorb`/`squeeze`.
    pub fn visible_size(&self) -> usize {
        self.variant.visible()
    }

    /// Rounds executed since construction.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// XOR `value` into the visible word at `position mod visible_size`.
    ///
    /// Never fails; the position is always normalized.
    pub fn absorb(&mut self, value: u64, position: usize) {
        let i = position % self.variant.visible();
        self.words[i] ^= value;
    }

    /// Read the visible word at `position mod visible_size`, decorrelated from
    /// raw state by `mask * EXPORT_PRIMES[i]`.
    ///
    /// Read-only; does not advance the state. Call [`Sponge::round`] between
    /// batches of squeezes before relying on the output for unpredictability.
    pub fn squeeze(&self, position: usize) -> u64 {
        let i = position % self.variant.visible();
        self.words[i] ^ self.mask.wrapping_mul(EXPORT_PRIMES[i])
    }

    /// One permutation step: linear diffusion, non-linear confusion, mask
    /// update, round-constant injection. Advances `counter` by exactly 1.
    pub fn round(&mut self) {
        match self.variant.family() {
            Family::Row => self.round_row(),
            Family::Lattice => self.round_lattice(),
        }
        let n = self.variant.words();
        self.counter = self.counter.wrapping_add(1);
        // Mask folds three confused words with the counter so squeeze output
        // never aligns linearly with absorbed input across rounds.
        self.mask = (self.words[0] ^ self.words[n >> 1] ^ self.words[n - 1])
            .wrapping_mul(MASK_MULTIPLIER)
            ^ self.counter;
        self.words[0] ^= ROUND_CONSTANTS[(self.counter & 15) as usize];
    }

    /// Run `round()` enough times that every word has influenced every other
    /// word at least once (see [`Variant::scramble_rounds`]).
    pub fn scramble(&mut self) {
        for _ in 0..self.variant.scramble_rounds() {
            self.round();
        }
    }

    /// Restore all words from the initialization vector.
    ///
    /// `counter` and `mask` are deliberately left untouched: a reset sponge
    /// continues its round schedule, it does not restart history.
    pub fn reset(&mut self) {
        for (i, w) in self.words.iter_mut().take(self.variant.words()).enumerate() {
            *w = INIT_VECTOR[i];
        }
    }

    /// Row-mix round: r0..r3 accumulated over disjoint word groups, then each
    /// word is diffused against two foreign accumulators and confused.
    fn round_row(&mut self) {
        let n = self.variant.words();
        let mut r = [0u64; 4];
        for i in 0..n {
            r[i & 3] ^= self.words[i];
        }
        for i in 0..n {
            // r[(i+1)&3] and r[(i+3)&3] exclude the group containing word i,
            // so a word never partially cancels itself out of the mix.
            let mix = r[(i + 1) & 3].rotate_left(ROTATIONS[i]) ^ r[(i + 3) & 3];
            self.words[i] = confuse(self.words[i] ^ mix, i);
        }
    }

    /// Lattice round: every word diffused against its two ring neighbors and
    /// the word across the ring, then confused. Identical shape for all words.
    fn round_lattice(&mut self) {
        let n = self.variant.words();
        let old = self.words;
        for i in 0..n {
            let left = old[(i + n - 1) % n];
            let right = old[(i + 1) % n];
            let across = old[(i + (n >> 1)) % n];
            let mixed =
                old[i] ^ left.rotate_left(19) ^ right.rotate_left(43) ^ across.rotate_right(7);
            self.words[i] = confuse(mixed, (i + 8) & 15);
        }
    }

    #[cfg(test)]
    pub(crate) fn word(&self, i: usize) -> u64 {
        self.words[i]
    }
}

/// Non-linear confusion of one word: NOT, two odd-constant multiplies with
/// xor-shifts, negation, rotate.
#[inline]
fn confuse(word: u64, i: usize) -> u64 {
    let mut w = (!word).wrapping_mul(CONFUSION_MULTIPLIERS[i & 15]);
    w ^= w >> 30;
    w = w.wrapping_mul(CONFUSION_MULTIPLIERS[(i + 7) & 15]);
    w ^= w >> 27;
    w.wrapping_neg().rotate_left(ROTATIONS[(i + 5) & 15])
}

/// Hash a byte message with the given variant: absorb in LE 64-bit chunks,
/// close with a length word, scramble, squeeze all visible words.
pub fn digest(variant: Variant, message: &[u8]) -> Vec<u8> {
    let mut sponge = Sponge::new(variant);
    let visible = sponge.visible_size();
    let mut position = 0usize;
    for chunk in message.chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        sponge.absorb(u64::from_le_bytes(word), position);
        position += 1;
        if position == visible {
            sponge.round();
            position = 0;
        }
    }
    // Length closes the message so "ab" and "ab\0" cannot collide trivially.
    sponge.absorb((message.len() as u64) ^ (1u64 << 63), position);
    sponge.scramble();
    (0..visible)
        .flat_map(|i| sponge.squeeze(i).to_le_bytes())
        .collect()
}
