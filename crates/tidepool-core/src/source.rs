//! The common read surface of every random generator layer.
//!
//! Layers differ in how they derive bits (timing jitter, sponge conditioning,
//! buffered reads) but all serve the same three shapes: a single whitened bit
//! group, a byte span, and a 64-bit word span. The trait keeps bulk reads
//! span-addressed (`buffer`, `offset`, `length`) so a caller can scatter reads
//! into a larger staging buffer without intermediate allocation.

use crate::error::{Error, Result};

/// Validate an `offset + length` span against a buffer, rejecting empty spans.
///
/// `operation` names the caller in the error message.
pub(crate) fn check_span(
    operation: &'static str,
    offset: usize,
    length: usize,
    available: usize,
) -> Result<()> {
    if length == 0 {
        return Err(Error::EmptySpan { operation });
    }
    let end = offset.checked_add(length).ok_or(Error::SpanOutOfRange {
        offset,
        length,
        available,
    })?;
    if end > available {
        return Err(Error::SpanOutOfRange {
            offset,
            length,
            available,
        });
    }
    Ok(())
}

/// A producer of whitened random bits.
///
/// Implementors provide [`RandomSource::next_bits`]; the bulk fills have
/// default implementations composed from it, which layers override when they
/// can serve spans more directly.
pub trait RandomSource {
    /// Produce the requested number of whitened bits, right-aligned in the
    /// returned word.
    ///
    /// # Errors
    ///
    /// [`Error::BitWidth`] unless `1 <= bits <= 32`. Layers with a capacity
    /// budget may also return [`Error::Depleted`].
    fn next_bits(&mut self, bits: u32) -> Result<u32>;

    /// Fill `buffer[offset..offset + length]` with random bytes.
    fn fill_bytes(&mut self, buffer: &mut [u8], offset: usize, length: usize) -> Result<()> {
        check_span("fill_bytes", offset, length, buffer.len())?;
        for slot in &mut buffer[offset..offset + length] {
            *slot = self.next_bits(8)? as u8;
        }
        Ok(())
    }

    /// Fill `buffer[offset..offset + length]` with random 64-bit words.
    fn fill_longs(&mut self, buffer: &mut [u64], offset: usize, length: usize) -> Result<()> {
        check_span("fill_longs", offset, length, buffer.len())?;
        for slot in &mut buffer[offset..offset + length] {
            let hi = self.next_bits(32)? as u64;
            let lo = self.next_bits(32)? as u64;
            *slot = (hi << 32) | lo;
        }
        Ok(())
    }
}
