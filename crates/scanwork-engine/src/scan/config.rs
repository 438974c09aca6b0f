use crate::error::{ComputeError, Result};

/// Parameters of the three-stage scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Elements per chunk; one workgroup scans one chunk. Power of two, ≥ 2.
    pub chunk_size: usize,

    /// Largest padded chunk-sum count the single-workgroup second stage scans.
    /// Power of two. Bounds the scannable length at `chunk_size * max_chunk_sums`.
    pub max_chunk_sums: usize,
}

impl ScanConfig {
    pub const DEFAULT_CHUNK_SIZE: usize = 512;
    pub const DEFAULT_MAX_CHUNK_SUMS: usize = 2048;

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    /// Larger chunks for the radix sort, whose flag arrays are
    /// `2^digit_width` times the key count.
    pub fn for_radix() -> Self {
        Self {
            chunk_size: 2048,
            max_chunk_sums: 2048,
        }
    }

    /// Longest input one call can scan.
    pub fn capacity(&self) -> usize {
        self.chunk_size.saturating_mul(self.max_chunk_sums)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < 2 || !self.chunk_size.is_power_of_two() {
            return Err(ComputeError::config(format!(
                "chunk size must be a power of two of at least 2, got {}",
                self.chunk_size
            )));
        }
        if !self.max_chunk_sums.is_power_of_two() {
            return Err(ComputeError::config(format!(
                "chunk-sum capacity must be a power of two, got {}",
                self.max_chunk_sums
            )));
        }
        Ok(())
    }

    /// Validates the configuration and derives the geometry for `len` elements.
    ///
    /// Fails with [`ComputeError::Capacity`] when the padded chunk-sum array
    /// would not fit the second stage.
    pub fn layout(&self, len: usize) -> Result<ScanLayout> {
        self.validate()?;
        let layout = ScanLayout::new(len, self.chunk_size)?;
        if layout.padded_chunk_count > self.max_chunk_sums {
            return Err(ComputeError::Capacity {
                required: layout.padded_chunk_count,
                limit: self.max_chunk_sums,
            });
        }
        Ok(layout)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            max_chunk_sums: Self::DEFAULT_MAX_CHUNK_SUMS,
        }
    }
}

/// Geometry of one scan call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLayout {
    pub len: usize,
    pub chunk_size: usize,
    /// `ceil(len / chunk_size)`.
    pub chunk_count: usize,
    /// Next power of two ≥ `chunk_count`.
    pub padded_chunk_count: usize,
}

impl ScanLayout {
    /// Rejects empty input and a zero chunk size.
    pub fn new(len: usize, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ComputeError::config("chunk size must be non-zero"));
        }
        if len == 0 {
            return Err(ComputeError::config("cannot scan an empty input"));
        }

        let chunk_count = len.div_ceil(chunk_size);
        Ok(Self {
            len,
            chunk_size,
            chunk_count,
            padded_chunk_count: chunk_count.next_power_of_two(),
        })
    }

    #[inline]
    pub fn chunk_of(&self, index: usize) -> usize {
        index / self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_counts_partial_last_chunk() {
        let l = ScanLayout::new(6, 4).unwrap();
        assert_eq!(l.chunk_count, 2);
        assert_eq!(l.padded_chunk_count, 2);
        assert_eq!(l.chunk_of(3), 0);
        assert_eq!(l.chunk_of(4), 1);
        assert_eq!(l.chunk_of(5), 1);
    }

    #[test]
    fn layout_pads_to_power_of_two() {
        let l = ScanLayout::new(5 * 512 + 1, 512).unwrap();
        assert_eq!(l.chunk_count, 6);
        assert_eq!(l.padded_chunk_count, 8);

        let exact = ScanLayout::new(4 * 512, 512).unwrap();
        assert_eq!(exact.chunk_count, 4);
        assert_eq!(exact.padded_chunk_count, 4);
    }

    #[test]
    fn layout_rejects_empty_and_zero_chunk() {
        assert!(matches!(ScanLayout::new(0, 4), Err(ComputeError::Configuration(_))));
        assert!(matches!(ScanLayout::new(4, 0), Err(ComputeError::Configuration(_))));
    }

    #[test]
    fn config_rejects_non_power_of_two_chunk() {
        assert!(ScanConfig::with_chunk_size(384).validate().is_err());
        assert!(ScanConfig::with_chunk_size(1).validate().is_err());
        assert!(ScanConfig::with_chunk_size(2).validate().is_ok());
    }

    #[test]
    fn config_reports_capacity_overflow() {
        let cfg = ScanConfig {
            chunk_size: 4,
            max_chunk_sums: 4,
        };
        assert_eq!(cfg.capacity(), 16);
        assert!(cfg.layout(16).is_ok());
        match cfg.layout(17) {
            Err(ComputeError::Capacity { required, limit }) => {
                assert_eq!(required, 8);
                assert_eq!(limit, 4);
            }
            other => panic!("expected capacity error, got {other:?}"),
        }
    }
}
