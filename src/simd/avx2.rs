use std::arch::x86_64::*;

use crate::format::{Fc32, LaneLayout, WireFormat, BYTES_PER_ITEM};

/// Samples per iteration: one 256-bit load of eight items.
pub(super) const BATCH: usize = 8;

const SWAP_HALVES: i32 = 0b10_11_00_01;

/// Lower 128-bit lanes of both operands.
const LOW_LANES: i32 = 0x20;
/// Upper 128-bit lanes of both operands.
const HIGH_LANES: i32 = 0x31;

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn swizzle<L: LaneLayout>(items: __m256i) -> __m256i {
    match L::FORMAT {
        WireFormat::Chdr => items,
        WireFormat::ItemLe => {
            let items = _mm256_shufflelo_epi16::<SWAP_HALVES>(items);
            _mm256_shufflehi_epi16::<SWAP_HALVES>(items)
        }
        WireFormat::ItemBe => {
            _mm256_or_si256(_mm256_srli_epi16::<8>(items), _mm256_slli_epi16::<8>(items))
        }
    }
}

/// Stores eight floats. The aligned form only relies on the 16-byte boundary
/// the dispatcher guarantees, so it is split into two 128-bit stores.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn store<const ALIGNED: bool>(dst: *mut f32, values: __m256) {
    if ALIGNED {
        _mm_store_ps(dst, _mm256_castps256_ps128(values));
        _mm_store_ps(dst.add(4), _mm256_extractf128_ps::<1>(values));
    } else {
        _mm256_storeu_ps(dst, values);
    }
}

/// Converts `output.len()` samples, which must be a multiple of [`BATCH`].
///
/// # Safety
///
/// AVX2 must be available, `input` must hold `BYTES_PER_ITEM * output.len()`
/// bytes, and with `ALIGNED` the output must start on a 16-byte boundary.
#[target_feature(enable = "avx2")]
pub(super) unsafe fn convert<L: LaneLayout, const ALIGNED: bool>(
    input: &[u8],
    output: &mut [Fc32],
    multiplier: f32,
) {
    let total_samples = output.len();
    debug_assert_eq!(total_samples % BATCH, 0);
    debug_assert_eq!(input.len(), total_samples * BYTES_PER_ITEM);
    debug_assert!(!ALIGNED || output.as_ptr() as usize % 16 == 0);

    let scalar = _mm256_set1_ps(multiplier);
    let zero = _mm256_setzero_si256();
    let src = input.as_ptr();
    let dst = output.as_mut_ptr() as *mut f32;

    let mut i = 0;
    while i + BATCH <= total_samples {
        // Load 8 items = 32 bytes (unaligned)
        let items = _mm256_loadu_si256(src.add(i * BYTES_PER_ITEM) as *const __m256i);
        let items = swizzle::<L>(items);

        // Unpack works per 128-bit lane: `lo` holds items 0,1 | 4,5 and `hi`
        // holds items 2,3 | 6,7, each lane sign-extended to 32 bits.
        let lo = _mm256_srai_epi32::<16>(_mm256_unpacklo_epi16(zero, items));
        let hi = _mm256_srai_epi32::<16>(_mm256_unpackhi_epi16(zero, items));

        // Regroup into items 0..4 and 4..8.
        let first = _mm256_permute2x128_si256::<LOW_LANES>(lo, hi);
        let second = _mm256_permute2x128_si256::<HIGH_LANES>(lo, hi);

        let first = _mm256_mul_ps(_mm256_cvtepi32_ps(first), scalar);
        let second = _mm256_mul_ps(_mm256_cvtepi32_ps(second), scalar);

        let out = dst.add(i * 2);
        store::<ALIGNED>(out, first);
        store::<ALIGNED>(out.add(8), second);

        i += BATCH;
    }
}
