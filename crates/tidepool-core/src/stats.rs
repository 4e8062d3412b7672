//! Bit-level statistics and health predicates.
//!
//! [`BitStatistic`] is an immutable snapshot produced once per sample batch:
//! bit counts, a 16-bucket nibble histogram, and a run-length histogram over
//! bit transitions. The validity predicates on top of it are the cheap,
//! always-on health check of the generator chain; the heavier convergence
//! benchmarks live in the companion tests crate.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::Serialize;

use crate::error::{Error, Result};

/// Individually bucketed run lengths. Runs longer than this are summed into
/// `long_runs`.
pub const RUN_BUCKETS: usize = 20;

// ---------------------------------------------------------------------------
// Validity thresholds
// ---------------------------------------------------------------------------

/// Thresholds for [`BitStatistic::is_valid_with`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Validity {
    /// Sigma multiplier for the bit-balance and run-distribution checks.
    pub tolerance: f64,
    /// Critical value for the nibble chi-square (15 degrees of freedom).
    pub chi_square_threshold: f64,
    /// Required fraction of the 4-bit maximum nibble entropy.
    pub entropy_fraction: f64,
}

impl Default for Validity {
    /// 3 sigma, chi-square at alpha = 0.01 for df 15, 99% of full entropy.
    fn default() -> Self {
        Validity {
            tolerance: 3.0,
            chi_square_threshold: 30.58,
            entropy_fraction: 0.99,
        }
    }
}

// ---------------------------------------------------------------------------
// BitStatistic
// ---------------------------------------------------------------------------

/// Immutable bit-level statistics over one byte sample.
///
/// Bits are walked MSB-first within each byte; nibbles are the high then low
/// 4-bit halves. A run is a maximal streak of identical consecutive bits,
/// counted across byte boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitStatistic {
    total: u64,
    ones: u64,
    zeros: u64,
    nibbles: [u64; 16],
    runs: [u64; RUN_BUCKETS],
    long_runs: u64,
}

impl BitStatistic {
    /// Collect statistics over `data`. Pure function of the input bytes.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySpan`] for an empty sample.
    pub fn collect(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptySpan {
                operation: "BitStatistic::collect",
            });
        }

        let mut ones = 0u64;
        let mut nibbles = [0u64; 16];
        let mut runs = [0u64; RUN_BUCKETS];
        let mut long_runs = 0u64;

        let mut current_bit = (data[0] >> 7) & 1;
        let mut run_length = 0u64;

        for &byte in data {
            nibbles[(byte >> 4) as usize] += 1;
            nibbles[(byte & 0x0F) as usize] += 1;
            for shift in (0..8).rev() {
                let bit = (byte >> shift) & 1;
                ones += u64::from(bit);
                if bit == current_bit {
                    run_length += 1;
                } else {
                    bucket_run(&mut runs, &mut long_runs, run_length);
                    current_bit = bit;
                    run_length = 1;
                }
            }
        }
        bucket_run(&mut runs, &mut long_runs, run_length);

        let total = data.len() as u64 * 8;
        Ok(BitStatistic {
            total,
            ones,
            zeros: total - ones,
            nibbles,
            runs,
            long_runs,
        })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn ones(&self) -> u64 {
        self.ones
    }

    pub fn zeros(&self) -> u64 {
        self.zeros
    }

    /// Nibble histogram, index = nibble value.
    pub fn nibble_counts(&self) -> &[u64; 16] {
        &self.nibbles
    }

    /// Run-length histogram, bucket `k` = runs of length `k + 1`.
    pub fn run_counts(&self) -> &[u64; RUN_BUCKETS] {
        &self.runs
    }

    /// Runs longer than [`RUN_BUCKETS`] bits.
    pub fn long_runs(&self) -> u64 {
        self.long_runs
    }

    /// Shannon entropy over the nibble frequencies, in bits (max 4.0).
    pub fn shannon_entropy(&self) -> f64 {
        let n = (self.total / 4) as f64;
        let mut h = 0.0;
        for &count in &self.nibbles {
            if count > 0 {
                let p = count as f64 / n;
                h -= p * p.log2();
            }
        }
        h
    }

    /// Chi-square statistic of the nibble histogram against a uniform
    /// distribution (15 degrees of freedom).
    pub fn chi_square(&self) -> f64 {
        let expected = (self.total / 4) as f64 / 16.0;
        self.nibbles
            .iter()
            .map(|&count| {
                let d = count as f64 - expected;
                d * d / expected
            })
            .sum()
    }

    /// Expected number of runs of length `k` in `n` bits of unbiased data.
    pub fn expected_runs(n: u64, k: u32) -> f64 {
        (n as f64 - f64::from(k) + 3.0) / 2f64.powi(k as i32 + 1)
    }

    /// Bit balance: ones within `tolerance` sigma of `total / 2`.
    pub fn balanced(&self, tolerance: f64) -> bool {
        let deviation = (self.ones as f64 - self.total as f64 / 2.0).abs();
        deviation < tolerance * (self.total as f64 / 4.0).sqrt()
    }

    /// Run distribution: every bucket within `tolerance` sigma of its
    /// expectation.
    pub fn runs_plausible(&self, tolerance: f64) -> bool {
        for (bucket, &observed) in self.runs.iter().enumerate() {
            let expected = Self::expected_runs(self.total, bucket as u32 + 1);
            if (observed as f64 - expected).abs() > tolerance * expected.sqrt() {
                return false;
            }
        }
        true
    }

    /// All health predicates at the default thresholds.
    pub fn is_valid(&self) -> bool {
        self.is_valid_with(&Validity::default())
    }

    /// All health predicates: bit balance, nibble uniformity (chi-square),
    /// run distribution, nibble entropy, and absence of over-long runs.
    pub fn is_valid_with(&self, validity: &Validity) -> bool {
        self.balanced(validity.tolerance)
            && self.chi_square() < validity.chi_square_threshold
            && self.runs_plausible(validity.tolerance)
            && self.shannon_entropy() > validity.entropy_fraction * 4.0
            && self.long_runs == 0
    }
}

fn bucket_run(runs: &mut [u64; RUN_BUCKETS], long_runs: &mut u64, length: u64) {
    if length == 0 {
        return;
    }
    if length <= RUN_BUCKETS as u64 {
        runs[(length - 1) as usize] += 1;
    } else {
        *long_runs += 1;
    }
}

// ---------------------------------------------------------------------------
// Sample quality
// ---------------------------------------------------------------------------

/// Compressibility of a sample: compressed size over raw size.
///
/// Random data does not compress; a ratio well below 1.0 means structure.
pub fn compression_ratio(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).unwrap_or_default();
    let compressed = encoder.finish().unwrap_or_default();
    compressed.len() as f64 / data.len() as f64
}

/// One-line quality summary of a byte sample.
#[derive(Debug, Clone, Serialize)]
pub struct SampleQuality {
    pub samples: usize,
    pub shannon_entropy: f64,
    pub compression_ratio: f64,
    pub valid: bool,
}

/// Combine the bit statistics with a compressibility check.
pub fn sample_quality(data: &[u8]) -> Result<SampleQuality> {
    let stats = BitStatistic::collect(data)?;
    Ok(SampleQuality {
        samples: data.len(),
        shannon_entropy: stats.shannon_entropy(),
        compression_ratio: compression_ratio(data),
        valid: stats.is_valid(),
    })
}
