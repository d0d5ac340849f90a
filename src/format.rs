//! Wire formats of packed sc16 samples and the fc32 output sample.

use bytemuck::{Pod, Zeroable};

/// Bytes occupied by one packed sc16 sample (one 32-bit item).
pub const BYTES_PER_ITEM: usize = 4;

/// Fixed-point denominator applied on top of the caller's scale factor.
const FIXED_POINT_ONE: f32 = 65536.0;

/// Byte-order conventions for a stream of packed sc16 items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// Native CHDR framing: real in the low half-word, no byte swapping.
    Chdr,
    /// Little-endian item32 wire: real in the high half-word.
    ItemLe,
    /// Big-endian item32 wire: each 16-bit lane is byte-swapped.
    ItemBe,
}

impl WireFormat {
    pub const ALL: [WireFormat; 3] = [WireFormat::Chdr, WireFormat::ItemLe, WireFormat::ItemBe];

    /// Splits a 32-bit item into its `(real, imag)` lanes.
    ///
    /// `word` is the little-endian reading of the four stream bytes. These rules
    /// are the reference every vector swizzle reproduces.
    #[inline(always)]
    pub fn decode(self, word: u32) -> (i16, i16) {
        let lo = word as u16;
        let hi = (word >> 16) as u16;
        match self {
            WireFormat::Chdr => (lo as i16, hi as i16),
            WireFormat::ItemLe => (hi as i16, lo as i16),
            WireFormat::ItemBe => (lo.swap_bytes() as i16, hi.swap_bytes() as i16),
        }
    }

    /// Short lowercase name, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            WireFormat::Chdr => "chdr",
            WireFormat::ItemLe => "item32_le",
            WireFormat::ItemBe => "item32_be",
        }
    }
}

/// Compile-time selection of a wire format.
///
/// Kernels are generic over this trait so each format gets its own
/// monomorphized loop; `FORMAT` is a constant and the swizzle `match` on it
/// folds away.
pub(crate) trait LaneLayout: Copy + 'static {
    const FORMAT: WireFormat;

    #[inline(always)]
    fn lanes(word: u32) -> (i16, i16) {
        Self::FORMAT.decode(word)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Chdr;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ItemLe;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ItemBe;

impl LaneLayout for Chdr {
    const FORMAT: WireFormat = WireFormat::Chdr;
}

impl LaneLayout for ItemLe {
    const FORMAT: WireFormat = WireFormat::ItemLe;
}

impl LaneLayout for ItemBe {
    const FORMAT: WireFormat = WireFormat::ItemBe;
}

/// One complex float sample, laid out as two consecutive `f32`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Fc32 {
    pub re: f32,
    pub im: f32,
}

impl Fc32 {
    #[inline]
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    /// Bit patterns of both lanes, for exact comparisons.
    #[inline]
    pub fn to_bits(self) -> (u32, u32) {
        (self.re.to_bits(), self.im.to_bits())
    }
}

/// Views converted samples as interleaved `re, im, re, im, ...` floats.
#[inline]
pub fn as_interleaved(samples: &[Fc32]) -> &[f32] {
    bytemuck::cast_slice(samples)
}

/// Mutable counterpart of [`as_interleaved`].
#[inline]
pub fn as_interleaved_mut(samples: &mut [Fc32]) -> &mut [f32] {
    bytemuck::cast_slice_mut(samples)
}

/// Multiplier applied to each widened lane: `scale_factor / 65536` in single
/// precision. Every path computes it through this function.
#[inline]
pub fn lane_multiplier(scale_factor: f64) -> f32 {
    scale_factor as f32 / FIXED_POINT_ONE
}

/// Reads the item at `index` from a byte stream.
#[inline(always)]
pub(crate) fn read_item(bytes: &[u8], index: usize) -> u32 {
    let start = index * BYTES_PER_ITEM;
    let mut word = [0u8; BYTES_PER_ITEM];
    word.copy_from_slice(&bytes[start..start + BYTES_PER_ITEM]);
    u32::from_le_bytes(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chdr_keeps_real_in_low_half() {
        assert_eq!(WireFormat::Chdr.decode(0x0001_0002), (2, 1));
    }

    #[test]
    fn item_le_takes_real_from_high_half() {
        assert_eq!(WireFormat::ItemLe.decode(0x0001_0002), (1, 2));
    }

    #[test]
    fn item_be_swaps_bytes_within_lanes() {
        assert_eq!(WireFormat::ItemBe.decode(0x0001_0002), (0x0200, 0x0100));
        assert_eq!(WireFormat::ItemBe.decode(0x00ff_80ff), (-128, -256));
    }

    #[test]
    fn lanes_are_signed() {
        assert_eq!(WireFormat::Chdr.decode(0x8000_ffff), (-1, i16::MIN));
        assert_eq!(WireFormat::ItemLe.decode(0x7fff_8000), (i16::MAX, i16::MIN));
    }

    #[test]
    fn be_of_swapped_word_matches_le() {
        for word in [0u32, 0x0001_0002, 0xdead_beef, 0x8000_7fff, u32::MAX] {
            assert_eq!(
                WireFormat::ItemBe.decode(word.swap_bytes()),
                WireFormat::ItemLe.decode(word),
                "word {word:#010x}"
            );
        }
    }

    #[test]
    fn marker_types_follow_enum() {
        assert_eq!(Chdr::lanes(0x0003_0004), WireFormat::Chdr.decode(0x0003_0004));
        assert_eq!(ItemLe::lanes(0x0003_0004), WireFormat::ItemLe.decode(0x0003_0004));
        assert_eq!(ItemBe::lanes(0x0003_0004), WireFormat::ItemBe.decode(0x0003_0004));
    }

    #[test]
    fn read_item_is_little_endian() {
        let bytes = [0x02, 0x00, 0x01, 0x00, 0xaa, 0xbb, 0xcc, 0xdd];
        assert_eq!(read_item(&bytes, 0), 0x0001_0002);
        assert_eq!(read_item(&bytes, 1), 0xddcc_bbaa);
    }

    #[test]
    fn multiplier_divides_by_fixed_point_one() {
        assert_eq!(lane_multiplier(65536.0), 1.0);
        assert_eq!(lane_multiplier(1.0), 1.0 / 65536.0);
    }

    #[test]
    fn interleaved_view_keeps_order() {
        let samples = [Fc32::new(1.0, 2.0), Fc32::new(3.0, 4.0)];
        assert_eq!(as_interleaved(&samples), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn interleaved_writes_land_in_lanes() {
        let mut samples = [Fc32::default(); 2];
        let floats = as_interleaved_mut(&mut samples);
        assert_eq!(floats.len(), 4);
        floats[1] = -1.5;
        floats[2] = 8.0;
        assert_eq!(samples, [Fc32::new(0.0, -1.5), Fc32::new(8.0, 0.0)]);
    }
}
