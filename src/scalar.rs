//! Scalar sc16 -> fc32 conversion.
//!
//! Finishes whatever the vector kernels leave over (the alignment head sample
//! and the tail) and is the complete strategy on CPUs without a vector
//! kernel. Every vector kernel must match it bit for bit.

use crate::converter::{Isa, Sc16ToFc32};
use crate::format::{lane_multiplier, read_item, Chdr, Fc32, ItemBe, ItemLe, LaneLayout, WireFormat};
use crate::{check_lengths, Result};

/// Converts one item with an already computed lane multiplier.
#[inline(always)]
pub(crate) fn convert_item<L: LaneLayout>(word: u32, multiplier: f32) -> Fc32 {
    let (re, im) = L::lanes(word);
    Fc32::new(f32::from(re) * multiplier, f32::from(im) * multiplier)
}

/// Converts `output.len()` items, one at a time.
#[inline]
pub(crate) fn convert_run<L: LaneLayout>(input: &[u8], output: &mut [Fc32], multiplier: f32) {
    for (i, sample) in output.iter_mut().enumerate() {
        *sample = convert_item::<L>(read_item(input, i), multiplier);
    }
}

/// Converts a single item the way every converter in this crate does.
///
/// ```
/// use sc16_fc32::{convert_word, Fc32, WireFormat};
///
/// assert_eq!(convert_word(WireFormat::Chdr, 0x0001_0002, 65536.0), Fc32::new(2.0, 1.0));
/// ```
pub fn convert_word(format: WireFormat, word: u32, scale_factor: f64) -> Fc32 {
    let multiplier = lane_multiplier(scale_factor);
    match format {
        WireFormat::Chdr => convert_item::<Chdr>(word, multiplier),
        WireFormat::ItemLe => convert_item::<ItemLe>(word, multiplier),
        WireFormat::ItemBe => convert_item::<ItemBe>(word, multiplier),
    }
}

/// Portable converter, available on every target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarConverter;

impl Sc16ToFc32 for ScalarConverter {
    fn isa(&self) -> Isa {
        Isa::Scalar
    }

    fn convert(
        &self,
        format: WireFormat,
        input: &[u8],
        output: &mut [Fc32],
        scale_factor: f64,
    ) -> Result<()> {
        check_lengths(input, output)?;
        let multiplier = lane_multiplier(scale_factor);
        match format {
            WireFormat::Chdr => convert_run::<Chdr>(input, output, multiplier),
            WireFormat::ItemLe => convert_run::<ItemLe>(input, output, multiplier),
            WireFormat::ItemBe => convert_run::<ItemBe>(input, output, multiplier),
        }
        Ok(())
    }
}
