use crate::error::{ComputeError, Result};
use crate::scan::ScanConfig;

/// Digit layout of the LSD radix sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadixConfig {
    /// Bits per pass; each pass partitions into `2^digit_width` buckets.
    pub digit_width: u32,

    /// Key bits considered. Higher bits are ignored.
    pub total_bits: u32,

    /// Scan used for the per-pass flag arrays of `2^digit_width * len` entries.
    pub scan: ScanConfig,
}

impl RadixConfig {
    pub const MAX_DIGIT_WIDTH: u32 = 8;

    pub fn new(digit_width: u32, total_bits: u32) -> Self {
        Self {
            digit_width,
            total_bits,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.digit_width == 0 || self.digit_width > Self::MAX_DIGIT_WIDTH {
            return Err(ComputeError::config(format!(
                "digit width must be in 1..={}, got {}",
                Self::MAX_DIGIT_WIDTH,
                self.digit_width
            )));
        }
        if self.total_bits == 0 || self.total_bits > u32::BITS {
            return Err(ComputeError::config(format!(
                "total bits must be in 1..=32, got {}",
                self.total_bits
            )));
        }
        if self.total_bits % self.digit_width != 0 {
            return Err(ComputeError::config(format!(
                "digit width {} does not divide total bits {}",
                self.digit_width, self.total_bits
            )));
        }
        self.scan.validate()
    }

    /// Number of passes.
    pub fn digit_count(&self) -> usize {
        (self.total_bits / self.digit_width) as usize
    }

    pub fn bucket_count(&self) -> usize {
        1 << self.digit_width
    }

    pub fn digit_mask(&self) -> u32 {
        (1u32 << self.digit_width) - 1
    }

    /// Right shift selecting digit `pass`, least significant first.
    pub fn shift(&self, pass: usize) -> u32 {
        pass as u32 * self.digit_width
    }

    #[inline]
    pub fn digit_of(&self, key: u32, pass: usize) -> usize {
        ((key >> self.shift(pass)) & self.digit_mask()) as usize
    }
}

impl Default for RadixConfig {
    fn default() -> Self {
        Self {
            digit_width: 4,
            total_bits: 32,
            scan: ScanConfig::for_radix(),
        }
    }
}
