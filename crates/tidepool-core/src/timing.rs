//! Timing jitter entropy source.
//!
//! Nondeterminism comes from the low-order bits of monotonic clock deltas taken
//! across a data-dependent spin. The deltas are pushed through reciprocal and
//! trigonometric transforms and reinterpreted as raw IEEE-754 bits: the
//! mantissa of `sin`/`cos`/`atan2` of an irrational-ish input is maximally
//! sensitive to the low-order timing bits, which is where the jitter lives.
//! Trigonometry is a bit scrambler here, not a randomness claim.
//!
//! The true min-entropy per call depends on clock resolution and varies by
//! platform; it is unverified. Downstream conditioning layers treat this source
//! as low-quality input to a sponge, never as finished output. The per-call
//! export caps bound how long one bulk read can block on a slow clock.

use crate::error::{Error, Result};
use crate::source::{RandomSource, check_span};

/// Hard per-call limit for [`RandomSource::fill_longs`] on this source.
pub const MAX_LONGS_PER_CALL: usize = 128;
/// Hard per-call limit for [`RandomSource::fill_bytes`] on this source.
pub const MAX_BYTES_PER_CALL: usize = 1024;

// ---------------------------------------------------------------------------
// High-resolution timing
// ---------------------------------------------------------------------------

/// High-resolution timestamp in nanoseconds.
///
/// On macOS this reads the system absolute time counter directly via
/// `mach_absolute_time()`. Elsewhere it falls back to `std::time::Instant`
/// relative to a process-local epoch.
#[cfg(target_os = "macos")]
fn mach_time() -> u64 {
    unsafe extern "C" {
        fn mach_absolute_time() -> u64;
    }
    // SAFETY: mach_absolute_time() is a stable macOS API with no preconditions.
    unsafe { mach_absolute_time() }
}

#[cfg(not(target_os = "macos"))]
fn mach_time() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}

// ---------------------------------------------------------------------------
// Bit extraction
// ---------------------------------------------------------------------------

/// Drop the trailing zero run of a word. Leading zeros vanish with the shift's
/// value semantics, so both ends of the significant span are trimmed.
fn trim_zero_runs(word: u64) -> u64 {
    if word == 0 {
        return 0;
    }
    word >> word.trailing_zeros()
}

/// A jitter-backed entropy source.
///
/// Stateless apart from a rotation phase that decorrelates consecutive samples
/// taken within one clock tick. Cheap to construct; layers own their own
/// instance rather than sharing one.
#[derive(Debug)]
pub struct TimingJitter {
    phase: u32,
}

impl TimingJitter {
    pub fn new() -> Self {
        TimingJitter { phase: 0 }
    }

    /// Take one 64-bit jitter sample.
    fn sample(&mut self) -> u64 {
        let t0 = mach_time();
        // Data-dependent spin so the second read lands a nondeterministic
        // number of cycles later.
        let mut spin = t0 | 1;
        for _ in 0..(t0 & 0x1F) + 1 {
            spin = spin.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(7);
        }
        std::hint::black_box(spin);
        let t1 = mach_time();
        let t2 = mach_time();

        let d0 = t1.wrapping_sub(t0).max(1) as f64;
        let d1 = t2.wrapping_sub(t1).max(1) as f64;

        let a = (1.0 / d0).sin().to_bits();
        let b = (1.0 / d1).cos().to_bits();
        let c = d0.atan2(d1).to_bits();

        let x = trim_zero_runs(a ^ c);
        let y = trim_zero_runs(b ^ c.rotate_left(17));

        self.phase = self.phase.wrapping_add(23) & 63;
        x ^ y.rotate_left(self.phase)
    }
}

impl Default for TimingJitter {
    fn default() -> Self {
        TimingJitter::new()
    }
}

impl RandomSource for TimingJitter {
    fn next_bits(&mut self, bits: u32) -> Result<u32> {
        if bits == 0 || bits > 32 {
            return Err(Error::BitWidth { bits });
        }
        let word = self.sample();
        let folded = (word ^ (word >> 32)) as u32;
        Ok(folded >> (32 - bits))
    }

    fn fill_bytes(&mut self, buffer: &mut [u8], offset: usize, length: usize) -> Result<()> {
        check_span("TimingJitter::fill_bytes", offset, length, buffer.len())?;
        if length > MAX_BYTES_PER_CALL {
            return Err(Error::ExportCap {
                requested: length,
                cap: MAX_BYTES_PER_CALL,
            });
        }
        // One sample yields 8 bytes; folding below a sample would discard
        // nothing worth keeping from a source this weak.
        for chunk in buffer[offset..offset + length].chunks_mut(8) {
            let bytes = self.sample().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
        Ok(())
    }

    fn fill_longs(&mut self, buffer: &mut [u64], offset: usize, length: usize) -> Result<()> {
        check_span("TimingJitter::fill_longs", offset, length, buffer.len())?;
        if length > MAX_LONGS_PER_CALL {
            return Err(Error::ExportCap {
                requested: length,
                cap: MAX_LONGS_PER_CALL,
            });
        }
        for slot in &mut buffer[offset..offset + length] {
            *slot = self.sample();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mach_time_is_monotonic() {
        let t1 = mach_time();
        let t2 = mach_time();
        assert!(t2 >= t1);
    }

    #[test]
    fn trim_zero_runs_strips_trailing_zeros() {
        assert_eq!(trim_zero_runs(0), 0);
        assert_eq!(trim_zero_runs(0b1000), 1);
        assert_eq!(trim_zero_runs(0b1011_0100), 0b10_1101);
        assert_eq!(trim_zero_runs(u64::MAX), u64::MAX);
    }

    #[test]
    fn next_bits_respects_width() {
        let mut jitter = TimingJitter::new();
        for bits in 1..=32u32 {
            let v = jitter.next_bits(bits).unwrap();
            if bits < 32 {
                assert!(v < (1u32 << bits), "bits={bits} value={v}");
            }
        }
    }

    #[test]
    fn next_bits_rejects_bad_widths() {
        let mut jitter = TimingJitter::new();
        assert!(matches!(jitter.next_bits(0), Err(Error::BitWidth { .. })));
        assert!(matches!(jitter.next_bits(33), Err(Error::BitWidth { .. })));
    }

    #[test]
    fn fill_longs_enforces_the_export_cap() {
        let mut jitter = TimingJitter::new();
        let mut buf = vec![0u64; MAX_LONGS_PER_CALL + 1];
        assert!(matches!(
            jitter.fill_longs(&mut buf, 0, MAX_LONGS_PER_CALL + 1),
            Err(Error::ExportCap { .. })
        ));
        jitter.fill_longs(&mut buf, 0, MAX_LONGS_PER_CALL).unwrap();
    }

    #[test]
    fn fill_bytes_enforces_the_export_cap() {
        let mut jitter = TimingJitter::new();
        let mut buf = vec![0u8; MAX_BYTES_PER_CALL + 1];
        assert!(matches!(
            jitter.fill_bytes(&mut buf, 0, MAX_BYTES_PER_CALL + 1),
            Err(Error::ExportCap { .. })
        ));
        jitter.fill_bytes(&mut buf, 0, MAX_BYTES_PER_CALL).unwrap();
    }

    #[test]
    fn fill_bytes_rejects_empty_spans() {
        let mut jitter = TimingJitter::new();
        let mut buf = [0u8; 16];
        assert!(matches!(
            jitter.fill_bytes(&mut buf, 0, 0),
            Err(Error::EmptySpan { .. })
        ));
    }

    #[test]
    fn samples_are_not_constant() {
        // Jitter quality is platform-dependent; equality of 64 consecutive
        // samples is the only outcome that is implausible everywhere.
        let mut jitter = TimingJitter::new();
        let first = jitter.sample();
        let all_equal = (0..63).all(|_| jitter.sample() == first);
        assert!(!all_equal);
    }
}
