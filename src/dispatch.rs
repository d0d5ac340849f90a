//! Alignment-driven scheduling of a bulk kernel plus the scalar fallback.

use crate::format::{Chdr, Fc32, ItemBe, ItemLe, LaneLayout, WireFormat, BYTES_PER_ITEM};
use crate::scalar;

/// Boundary the aligned kernel entry points store to.
pub const ALIGNMENT_BOUNDARY: usize = 16;

/// Offset at which a single `Fc32` (8 bytes) re-aligns the output.
const HALF_BOUNDARY: usize = ALIGNMENT_BOUNDARY / 2;

/// Position of the output buffer relative to [`ALIGNMENT_BOUNDARY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Starts on the boundary.
    Aligned,
    /// Starts one sample short of the boundary.
    HalfOffset,
    /// Anywhere else.
    Unaligned,
}

impl Alignment {
    #[inline]
    pub fn probe<T>(ptr: *const T) -> Self {
        match ptr as usize % ALIGNMENT_BOUNDARY {
            0 => Alignment::Aligned,
            HALF_BOUNDARY => Alignment::HalfOffset,
            _ => Alignment::Unaligned,
        }
    }
}

/// A vector kernel that converts whole batches of samples.
///
/// Values of implementing types are proof that the CPU supports the kernel's
/// instruction set; they are only handed out after feature detection.
pub(crate) trait BulkKernel: Copy {
    /// Samples consumed per loop iteration.
    const BATCH: usize;

    /// Converts as many full batches as `output` holds and returns how many
    /// samples were written. Never touches a partial batch.
    ///
    /// `input` holds at least `BYTES_PER_ITEM * output.len()` bytes. With
    /// `ALIGNED`, `output` starts on [`ALIGNMENT_BOUNDARY`].
    fn convert_batches<L: LaneLayout, const ALIGNED: bool>(
        self,
        input: &[u8],
        output: &mut [Fc32],
        multiplier: f32,
    ) -> usize;
}

/// Runs `kernel` over `output`, choosing the entry point from the output
/// alignment, and finishes the remainder with the scalar path.
pub(crate) fn run<K: BulkKernel, L: LaneLayout>(
    kernel: K,
    input: &[u8],
    output: &mut [Fc32],
    multiplier: f32,
) {
    let nsamps = output.len();
    if nsamps == 0 {
        return;
    }
    debug_assert_eq!(input.len(), nsamps * BYTES_PER_ITEM);

    let mut i = 0;
    match Alignment::probe(output.as_ptr()) {
        Alignment::Aligned => {
            i += kernel.convert_batches::<L, true>(input, output, multiplier);
        }
        Alignment::HalfOffset => {
            scalar::convert_run::<L>(&input[..BYTES_PER_ITEM], &mut output[..1], multiplier);
            i += 1;
            i += kernel.convert_batches::<L, true>(
                &input[BYTES_PER_ITEM..],
                &mut output[1..],
                multiplier,
            );
        }
        Alignment::Unaligned => {
            i += kernel.convert_batches::<L, false>(input, output, multiplier);
        }
    }

    debug_assert!(nsamps - i < K::BATCH);
    scalar::convert_run::<L>(&input[i * BYTES_PER_ITEM..], &mut output[i..], multiplier);
}

/// Picks the monomorphized [`run`] for a runtime wire format.
pub(crate) fn run_format<K: BulkKernel>(
    kernel: K,
    format: WireFormat,
    input: &[u8],
    output: &mut [Fc32],
    multiplier: f32,
) {
    match format {
        WireFormat::Chdr => run::<K, Chdr>(kernel, input, output, multiplier),
        WireFormat::ItemLe => run::<K, ItemLe>(kernel, input, output, multiplier),
        WireFormat::ItemBe => run::<K, ItemBe>(kernel, input, output, multiplier),
    }
}
