//! Vector converters.
//!
//! Each converter type is a zero-sized token that can only be obtained through
//! `detect()`, so holding one proves the running CPU supports its kernel. The
//! types exist on every target so they can sit in [`crate::Converter`]
//! unconditionally; off their architecture `detect()` always returns `None`.

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "aarch64")]
mod neon;
#[cfg(target_arch = "x86_64")]
mod sse2;

use crate::converter::{Isa, Sc16ToFc32};
use crate::dispatch::{self, BulkKernel};
use crate::format::{lane_multiplier, Fc32, LaneLayout, WireFormat, BYTES_PER_ITEM};
use crate::{check_lengths, Result};

/// Splits off the prefix of `output` made of whole batches.
#[inline(always)]
fn whole_batches<'a, 'b>(
    batch: usize,
    input: &'a [u8],
    output: &'b mut [Fc32],
) -> (&'a [u8], &'b mut [Fc32]) {
    let n = output.len() / batch * batch;
    (&input[..n * BYTES_PER_ITEM], &mut output[..n])
}

macro_rules! vector_converter {
    ($(#[$meta:meta])* $name:ident, $isa:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            _detected: (),
        }

        impl Sc16ToFc32 for $name {
            fn isa(&self) -> Isa {
                $isa
            }

            fn convert(
                &self,
                format: WireFormat,
                input: &[u8],
                output: &mut [Fc32],
                scale_factor: f64,
            ) -> Result<()> {
                check_lengths(input, output)?;
                dispatch::run_format(*self, format, input, output, lane_multiplier(scale_factor));
                Ok(())
            }
        }
    };
}

vector_converter!(
    /// 128-bit SSE2 kernel, 4 samples per iteration.
    Sse2Converter,
    Isa::Sse2
);

vector_converter!(
    /// 256-bit AVX2 kernel, 8 samples per iteration.
    Avx2Converter,
    Isa::Avx2
);

vector_converter!(
    /// 128-bit NEON kernel, 4 samples per iteration.
    NeonConverter,
    Isa::Neon
);

impl Sse2Converter {
    pub fn detect() -> Option<Self> {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("sse2") {
                return Some(Self { _detected: () });
            }
        }
        None
    }
}

impl Avx2Converter {
    pub fn detect() -> Option<Self> {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return Some(Self { _detected: () });
            }
        }
        None
    }
}

impl NeonConverter {
    pub fn detect() -> Option<Self> {
        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                return Some(Self { _detected: () });
            }
        }
        None
    }
}

// Off-architecture impls convert zero batches and leave everything to the
// scalar tail. They are unreachable since `detect()` never succeeds there.

#[cfg(target_arch = "x86_64")]
impl BulkKernel for Sse2Converter {
    const BATCH: usize = sse2::BATCH;

    #[inline]
    fn convert_batches<L: LaneLayout, const ALIGNED: bool>(
        self,
        input: &[u8],
        output: &mut [Fc32],
        multiplier: f32,
    ) -> usize {
        let (input, output) = whole_batches(Self::BATCH, input, output);
        // SAFETY: `self` exists only after SSE2 was detected, and both slices
        // cover exactly `output.len()` whole batches.
        unsafe { sse2::convert::<L, ALIGNED>(input, output, multiplier) };
        output.len()
    }
}

#[cfg(not(target_arch = "x86_64"))]
impl BulkKernel for Sse2Converter {
    const BATCH: usize = 4;

    fn convert_batches<L: LaneLayout, const ALIGNED: bool>(
        self,
        _input: &[u8],
        _output: &mut [Fc32],
        _multiplier: f32,
    ) -> usize {
        0
    }
}

#[cfg(target_arch = "x86_64")]
impl BulkKernel for Avx2Converter {
    const BATCH: usize = avx2::BATCH;

    #[inline]
    fn convert_batches<L: LaneLayout, const ALIGNED: bool>(
        self,
        input: &[u8],
        output: &mut [Fc32],
        multiplier: f32,
    ) -> usize {
        let (input, output) = whole_batches(Self::BATCH, input, output);
        // SAFETY: `self` exists only after AVX2 was detected, and both slices
        // cover exactly `output.len()` whole batches.
        unsafe { avx2::convert::<L, ALIGNED>(input, output, multiplier) };
        output.len()
    }
}

#[cfg(not(target_arch = "x86_64"))]
impl BulkKernel for Avx2Converter {
    const BATCH: usize = 8;

    fn convert_batches<L: LaneLayout, const ALIGNED: bool>(
        self,
        _input: &[u8],
        _output: &mut [Fc32],
        _multiplier: f32,
    ) -> usize {
        0
    }
}

#[cfg(target_arch = "aarch64")]
impl BulkKernel for NeonConverter {
    const BATCH: usize = neon::BATCH;

    #[inline]
    fn convert_batches<L: LaneLayout, const ALIGNED: bool>(
        self,
        input: &[u8],
        output: &mut [Fc32],
        multiplier: f32,
    ) -> usize {
        let (input, output) = whole_batches(Self::BATCH, input, output);
        // SAFETY: `self` exists only after NEON was detected, and both slices
        // cover exactly `output.len()` whole batches.
        unsafe { neon::convert::<L>(input, output, multiplier) };
        output.len()
    }
}

#[cfg(not(target_arch = "aarch64"))]
impl BulkKernel for NeonConverter {
    const BATCH: usize = 4;

    fn convert_batches<L: LaneLayout, const ALIGNED: bool>(
        self,
        _input: &[u8],
        _output: &mut [Fc32],
        _multiplier: f32,
    ) -> usize {
        0
    }
}
