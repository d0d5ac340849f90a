//! Bulk conversion of packed sc16 complex samples to interleaved fc32.
//!
//! Each 32-bit input item carries a real and an imaginary 16-bit lane. The
//! lane order and byte order depend on the [`WireFormat`]; every lane is
//! scaled by `scale_factor / 65536`.
//!
//! ```
//! use sc16_fc32::{Converter, Fc32, Sc16ToFc32, WireFormat};
//!
//! let input = 0x0001_0002u32.to_le_bytes();
//! let mut output = [Fc32::default(); 1];
//! Converter::detect().convert(WireFormat::Chdr, &input, &mut output, 65536.0)?;
//! assert_eq!(output[0], Fc32::new(2.0, 1.0));
//! # Ok::<(), sc16_fc32::Error>(())
//! ```

mod converter;
mod dispatch;
mod format;
mod scalar;
mod simd;

pub use converter::{convert, ConvertOptions, Converter, Isa, Sc16ToFc32, ISA_ENV_VAR};
pub use dispatch::{Alignment, ALIGNMENT_BOUNDARY};
pub use format::{
    as_interleaved, as_interleaved_mut, lane_multiplier, Fc32, WireFormat, BYTES_PER_ITEM,
};
pub use scalar::{convert_word, ScalarConverter};
pub use simd::{Avx2Converter, NeonConverter, Sse2Converter};

/// Specialized Result type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;

/// General errors for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Input holds {actual} bytes, {expected} needed for the output length")]
    InputLength { expected: usize, actual: usize },
    #[error("Instruction set not available on this CPU: {0}")]
    IsaUnavailable(Isa),
    #[error("Unknown instruction set: {0}")]
    UnknownIsa(String),
}

/// Checks that `input` holds exactly one item per output sample.
#[inline]
pub(crate) fn check_lengths(input: &[u8], output: &[Fc32]) -> Result<()> {
    let expected = output.len() * BYTES_PER_ITEM;
    if input.len() != expected {
        return Err(Error::InputLength {
            expected,
            actual: input.len(),
        });
    }
    Ok(())
}
