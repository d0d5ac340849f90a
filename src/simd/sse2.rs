use std::arch::x86_64::*;

use crate::format::{Fc32, LaneLayout, WireFormat, BYTES_PER_ITEM};

/// Samples per iteration: one 128-bit load of four items.
pub(super) const BATCH: usize = 4;

/// Swaps the two 16-bit halves of every 32-bit item.
const SWAP_HALVES: i32 = 0b10_11_00_01;

/// Brings every item into CHDR lane order: real low, imag high.
#[target_feature(enable = "sse2")]
#[inline]
unsafe fn swizzle<L: LaneLayout>(items: __m128i) -> __m128i {
    match L::FORMAT {
        WireFormat::Chdr => items,
        WireFormat::ItemLe => {
            let items = _mm_shufflelo_epi16::<SWAP_HALVES>(items);
            _mm_shufflehi_epi16::<SWAP_HALVES>(items)
        }
        WireFormat::ItemBe => _mm_or_si128(_mm_srli_epi16::<8>(items), _mm_slli_epi16::<8>(items)),
    }
}

#[target_feature(enable = "sse2")]
#[inline]
unsafe fn store<const ALIGNED: bool>(dst: *mut f32, values: __m128) {
    if ALIGNED {
        _mm_store_ps(dst, values);
    } else {
        _mm_storeu_ps(dst, values);
    }
}

/// Converts `output.len()` samples, which must be a multiple of [`BATCH`].
///
/// # Safety
///
/// SSE2 must be available, `input` must hold `BYTES_PER_ITEM * output.len()`
/// bytes, and with `ALIGNED` the output must start on a 16-byte boundary.
#[target_feature(enable = "sse2")]
pub(super) unsafe fn convert<L: LaneLayout, const ALIGNED: bool>(
    input: &[u8],
    output: &mut [Fc32],
    multiplier: f32,
) {
    let total_samples = output.len();
    debug_assert_eq!(total_samples % BATCH, 0);
    debug_assert_eq!(input.len(), total_samples * BYTES_PER_ITEM);
    debug_assert!(!ALIGNED || output.as_ptr() as usize % 16 == 0);

    let scalar = _mm_set1_ps(multiplier);
    let zero = _mm_setzero_si128();
    let src = input.as_ptr();
    let dst = output.as_mut_ptr() as *mut f32;

    let mut i = 0;
    while i + BATCH <= total_samples {
        // Load 4 items = 16 bytes (unaligned)
        let items = _mm_loadu_si128(src.add(i * BYTES_PER_ITEM) as *const __m128i);
        let items = swizzle::<L>(items);

        // Each lane lands in the upper half of a 32-bit slot, then the
        // arithmetic shift sign-extends it back down.
        let lo = _mm_srai_epi32::<16>(_mm_unpacklo_epi16(zero, items));
        let hi = _mm_srai_epi32::<16>(_mm_unpackhi_epi16(zero, items));

        let lo = _mm_mul_ps(_mm_cvtepi32_ps(lo), scalar);
        let hi = _mm_mul_ps(_mm_cvtepi32_ps(hi), scalar);

        let out = dst.add(i * 2);
        store::<ALIGNED>(out, lo);
        store::<ALIGNED>(out.add(4), hi);

        i += BATCH;
    }
}
