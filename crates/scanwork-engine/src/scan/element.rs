use std::fmt::Debug;

use bytemuck::Pod;

/// Element types the prefix-sum engine can scan.
///
/// Addition must match the WGSL operator on the same type: integer types wrap
/// on overflow, floats follow IEEE-754.
pub trait ScanElement: Pod + Debug + PartialEq + Send + Sync + 'static {
    /// Neutral element; padding and out-of-range reads use it.
    const ZERO: Self;

    /// WGSL scalar type the kernels are specialized with.
    const WGSL_TYPE: &'static str;

    fn add(self, rhs: Self) -> Self;
}

impl ScanElement for u32 {
    const ZERO: Self = 0;
    const WGSL_TYPE: &'static str = "u32";

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }
}

impl ScanElement for i32 {
    const ZERO: Self = 0;
    const WGSL_TYPE: &'static str = "i32";

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }
}

impl ScanElement for f32 {
    const ZERO: Self = 0.0;
    const WGSL_TYPE: &'static str = "f32";

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self + rhs
    }
}
