//! Buffered typed-read consumer over [`SecureFeed`].

use super::feed::SecureFeed;
use crate::error::{Error, Result};
use crate::source::{RandomSource, check_span};

/// Ring buffer capacity. Refilled in one bulk read when drained.
pub const BUFFER_BYTES: usize = 1024;

/// Map a signed 32-bit value onto `[0.0, 1.0)`.
///
/// Keeps the top 24 bits so the quotient is exactly representable in an `f32`
/// mantissa; a 31-bit mantissa would round up to 1.0 at the top of the range.
pub fn unit_f32(value: i32) -> f32 {
    ((value as u32) >> 8) as f32 / (1u32 << 24) as f32
}

/// Map a signed 64-bit value onto `[0.0, 1.0)`.
///
/// Same construction as [`unit_f32`] with the 53-bit `f64` mantissa.
pub fn unit_f64(value: i64) -> f64 {
    ((value as u64) >> 11) as f64 / (1u64 << 53) as f64
}

/// Typed random reads served from a refillable byte buffer.
///
/// All typed reads pull little-endian bytes from an internal 1024-byte buffer
/// and trigger one bulk [`SecureFeed`] read when it drains. The float reads
/// return values in `[0.0, 1.0)` via [`unit_f32`]/[`unit_f64`].
#[derive(Debug)]
pub struct SecureRandom {
    feed: SecureFeed,
    buffer: [u8; BUFFER_BYTES],
    cursor: usize,
}

impl SecureRandom {
    pub fn new() -> Result<Self> {
        Ok(SecureRandom {
            feed: SecureFeed::new()?,
            buffer: [0u8; BUFFER_BYTES],
            // Starts drained; the first read refills.
            cursor: BUFFER_BYTES,
        })
    }

    fn refill(&mut self) -> Result<()> {
        self.feed.fill_bytes(&mut self.buffer, 0, BUFFER_BYTES)?;
        self.cursor = 0;
        Ok(())
    }

    /// Take `N` contiguous buffered bytes, refilling if the tail is short.
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.cursor + N > BUFFER_BYTES {
            self.refill()?;
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer[self.cursor..self.cursor + N]);
        self.cursor += N;
        Ok(out)
    }

    pub fn next_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn next_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    pub fn next_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take::<8>()?))
    }

    /// Uniform value in `[0.0, 1.0)`.
    pub fn next_f32(&mut self) -> Result<f32> {
        Ok(unit_f32(self.next_u32()? as i32))
    }

    /// Uniform value in `[0.0, 1.0)`.
    pub fn next_f64(&mut self) -> Result<f64> {
        Ok(unit_f64(self.next_u64()? as i64))
    }
}

impl RandomSource for SecureRandom {
    fn next_bits(&mut self, bits: u32) -> Result<u32> {
        if bits == 0 || bits > 32 {
            return Err(Error::BitWidth { bits });
        }
        Ok(self.next_u32()? >> (32 - bits))
    }

    fn fill_bytes(&mut self, buffer: &mut [u8], offset: usize, length: usize) -> Result<()> {
        check_span("SecureRandom::fill_bytes", offset, length, buffer.len())?;
        let mut written = 0;
        while written < length {
            if self.cursor == BUFFER_BYTES {
                self.refill()?;
            }
            let run = (BUFFER_BYTES - self.cursor).min(length - written);
            buffer[offset + written..offset + written + run]
                .copy_from_slice(&self.buffer[self.cursor..self.cursor + run]);
            self.cursor += run;
            written += run;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Unit-fraction mapping
    // -----------------------------------------------------------------------

    #[test]
    fn unit_f32_covers_the_signed_range_without_reaching_one() {
        for v in [i32::MIN, -1, 0, 1, i32::MAX, 0x7FFF_FF00, -0x8000_0000] {
            let f = unit_f32(v);
            assert!((0.0..1.0).contains(&f), "v={v} f={f}");
        }
        assert_eq!(unit_f32(0), 0.0);
        // The largest possible mantissa stays strictly below 1.0.
        assert!(unit_f32(-1) < 1.0);
        assert!(unit_f32(-1) > 0.9999);
    }

    #[test]
    fn unit_f64_covers_the_signed_range_without_reaching_one() {
        for v in [i64::MIN, -1, 0, 1, i64::MAX] {
            let f = unit_f64(v);
            assert!((0.0..1.0).contains(&f), "v={v} f={f}");
        }
        assert!(unit_f64(-1) > 0.999_999_999);
    }

    #[test]
    fn unit_fractions_are_monotone_in_the_high_bits() {
        assert!(unit_f32(0x0100_0000) < unit_f32(0x0200_0000));
        assert!(unit_f64(1 << 40) < unit_f64(1 << 41));
    }

    // -----------------------------------------------------------------------
    // Buffered reads
    // -----------------------------------------------------------------------

    #[test]
    fn typed_reads_advance_the_cursor_by_their_width() {
        let mut random = SecureRandom::new().unwrap();
        random.next_u8().unwrap();
        assert_eq!(random.cursor, 1);
        random.next_u16().unwrap();
        assert_eq!(random.cursor, 3);
        random.next_u32().unwrap();
        assert_eq!(random.cursor, 7);
        random.next_u64().unwrap();
        assert_eq!(random.cursor, 15);
    }

    #[test]
    fn buffer_refills_after_exhaustion() {
        let mut random = SecureRandom::new().unwrap();
        for _ in 0..BUFFER_BYTES {
            random.next_u8().unwrap();
        }
        assert_eq!(random.cursor, BUFFER_BYTES);
        random.next_u8().unwrap();
        assert_eq!(random.cursor, 1);
    }

    #[test]
    fn float_reads_stay_in_unit_range() {
        let mut random = SecureRandom::new().unwrap();
        for _ in 0..512 {
            let f = random.next_f32().unwrap();
            assert!((0.0..1.0).contains(&f));
            let d = random.next_f64().unwrap();
            assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    fn bulk_fill_crosses_refill_boundaries() {
        let mut random = SecureRandom::new().unwrap();
        let mut out = vec![0u8; BUFFER_BYTES * 2 + 100];
        let len = out.len();
        random.fill_bytes(&mut out, 0, len).unwrap();
        assert!(out.iter().any(|&b| b != 0));
    }

    #[test]
    fn byte_stream_is_not_trivially_repeating() {
        let mut random = SecureRandom::new().unwrap();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        random.fill_bytes(&mut a, 0, 32).unwrap();
        random.fill_bytes(&mut b, 0, 32).unwrap();
        assert_ne!(a, b);
    }
}
