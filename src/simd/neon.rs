use std::arch::aarch64::*;

use crate::format::{Fc32, LaneLayout, WireFormat, BYTES_PER_ITEM};

/// Samples per iteration: one 128-bit load of four items.
pub(super) const BATCH: usize = 4;

#[target_feature(enable = "neon")]
#[inline]
unsafe fn swizzle<L: LaneLayout>(bytes: uint8x16_t) -> int16x8_t {
    match L::FORMAT {
        WireFormat::Chdr => vreinterpretq_s16_u8(bytes),
        WireFormat::ItemLe => vreinterpretq_s16_u16(vrev32q_u16(vreinterpretq_u16_u8(bytes))),
        WireFormat::ItemBe => vreinterpretq_s16_u8(vrev16q_u8(bytes)),
    }
}

/// Converts `output.len()` samples, which must be a multiple of [`BATCH`].
///
/// NEON stores carry no alignment requirement, so one entry point serves
/// every dispatcher branch.
///
/// # Safety
///
/// NEON must be available and `input` must hold
/// `BYTES_PER_ITEM * output.len()` bytes.
#[target_feature(enable = "neon")]
pub(super) unsafe fn convert<L: LaneLayout>(input: &[u8], output: &mut [Fc32], multiplier: f32) {
    let total_samples = output.len();
    debug_assert_eq!(total_samples % BATCH, 0);
    debug_assert_eq!(input.len(), total_samples * BYTES_PER_ITEM);

    let scale_vec = vdupq_n_f32(multiplier);
    let src = input.as_ptr();
    let dst = output.as_mut_ptr() as *mut f32;

    let mut i = 0;
    while i + BATCH <= total_samples {
        let lanes = swizzle::<L>(vld1q_u8(src.add(i * BYTES_PER_ITEM)));

        let lo = vmovl_s16(vget_low_s16(lanes));
        let hi = vmovl_high_s16(lanes);

        let lo = vmulq_f32(vcvtq_f32_s32(lo), scale_vec);
        let hi = vmulq_f32(vcvtq_f32_s32(hi), scale_vec);

        let out = dst.add(i * 2);
        vst1q_f32(out, lo);
        vst1q_f32(out.add(4), hi);

        i += BATCH;
    }
}
