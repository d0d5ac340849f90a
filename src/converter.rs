//! Strategy selection across the scalar and vector converters.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use enum_dispatch::enum_dispatch;
use tracing::{debug, warn};

use crate::format::{Fc32, WireFormat};
use crate::scalar::ScalarConverter;
use crate::simd::{Avx2Converter, NeonConverter, Sse2Converter};
use crate::{Error, Result};

/// Environment variable that pins the process-wide converter to one ISA.
pub const ISA_ENV_VAR: &str = "SC16_FC32_ISA";

/// Common interface of every sc16 -> fc32 strategy.
///
/// All implementations produce bit-identical output for the same input.
#[enum_dispatch]
pub trait Sc16ToFc32 {
    /// Instruction set this converter runs on.
    fn isa(&self) -> Isa;

    /// Converts `output.len()` items from the `input` byte stream.
    ///
    /// `input` must hold exactly four bytes per output sample.
    fn convert(
        &self,
        format: WireFormat,
        input: &[u8],
        output: &mut [Fc32],
        scale_factor: f64,
    ) -> Result<()>;

    /// Converts items already loaded as 32-bit words, in memory order.
    fn convert_items(
        &self,
        format: WireFormat,
        input: &[u32],
        output: &mut [Fc32],
        scale_factor: f64,
    ) -> Result<()> {
        self.convert(format, bytemuck::cast_slice(input), output, scale_factor)
    }
}

/// Instruction sets a converter can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Isa {
    Scalar,
    Sse2,
    Avx2,
    Neon,
}

impl Isa {
    pub const ALL: [Isa; 4] = [Isa::Scalar, Isa::Sse2, Isa::Avx2, Isa::Neon];

    /// Preference when several are available; higher wins.
    pub fn priority(self) -> u8 {
        match self {
            Isa::Scalar => 0,
            Isa::Sse2 | Isa::Neon => 2,
            Isa::Avx2 => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Isa::Scalar => "scalar",
            Isa::Sse2 => "sse2",
            Isa::Avx2 => "avx2",
            Isa::Neon => "neon",
        }
    }
}

impl fmt::Display for Isa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Isa {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Isa::ALL
            .into_iter()
            .find(|isa| isa.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownIsa(wanted.to_string()))
    }
}

/// Dispatches conversions to the chosen implementation.
#[enum_dispatch(Sc16ToFc32)]
#[derive(Debug, Clone, Copy)]
pub enum Converter {
    Scalar(ScalarConverter),
    Sse2(Sse2Converter),
    Avx2(Avx2Converter),
    Neon(NeonConverter),
}

impl Default for Converter {
    fn default() -> Self {
        Converter::detect()
    }
}

impl Converter {
    /// Builds the converter for `isa` if the running CPU supports it.
    fn probe(isa: Isa) -> Option<Self> {
        match isa {
            Isa::Scalar => Some(ScalarConverter.into()),
            Isa::Sse2 => Sse2Converter::detect().map(Into::into),
            Isa::Avx2 => Avx2Converter::detect().map(Into::into),
            Isa::Neon => NeonConverter::detect().map(Into::into),
        }
    }

    /// Every converter usable on this CPU, scalar first.
    pub fn available() -> Vec<Self> {
        Isa::ALL.into_iter().filter_map(Self::probe).collect()
    }

    /// Selects the highest-priority converter the CPU supports.
    pub fn detect() -> Self {
        let converter = Self::available()
            .into_iter()
            .max_by_key(|c| c.isa().priority())
            .unwrap_or(Converter::Scalar(ScalarConverter));
        debug!(isa = %converter.isa(), "selected sc16 -> fc32 converter");
        converter
    }

    /// Builds the converter for exactly `isa`.
    pub fn with_isa(isa: Isa) -> Result<Self> {
        match Self::probe(isa) {
            Some(converter) => {
                debug!(%isa, "using requested sc16 -> fc32 converter");
                Ok(converter)
            }
            None => {
                debug!(%isa, "requested instruction set not available");
                Err(Error::IsaUnavailable(isa))
            }
        }
    }

    pub fn from_options(options: &ConvertOptions) -> Result<Self> {
        match options.isa {
            Some(isa) => Self::with_isa(isa),
            None => Ok(Self::detect()),
        }
    }

    /// Process-wide converter, chosen once from the environment.
    ///
    /// An unusable [`ISA_ENV_VAR`] setting is logged and ignored.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<Converter> = OnceLock::new();
        *GLOBAL.get_or_init(|| {
            match ConvertOptions::from_env().and_then(|options| Self::from_options(&options)) {
                Ok(converter) => converter,
                Err(err) => {
                    warn!(%err, "ignoring {}, falling back to detection", ISA_ENV_VAR);
                    Self::detect()
                }
            }
        })
    }
}

/// Options for building a [`Converter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Force one instruction set instead of detecting the best.
    pub isa: Option<Isa>,
}

impl ConvertOptions {
    /// Reads [`ISA_ENV_VAR`]; unset or empty means auto-detect.
    pub fn from_env() -> Result<Self> {
        match env::var(ISA_ENV_VAR) {
            Ok(value) => Self::parse(&value),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(env::VarError::NotUnicode(value)) => {
                Err(Error::UnknownIsa(value.to_string_lossy().into_owned()))
            }
        }
    }

    fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("auto") {
            return Ok(Self::default());
        }
        Ok(Self {
            isa: Some(value.parse()?),
        })
    }
}

/// Converts with [`Converter::global`].
pub fn convert(
    format: WireFormat,
    input: &[u8],
    output: &mut [Fc32],
    scale_factor: f64,
) -> Result<()> {
    Converter::global().convert(format, input, output, scale_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_is_always_available() {
        let available = Converter::available();
        assert!(matches!(available.first(), Some(Converter::Scalar(_))));
        assert!(Converter::with_isa(Isa::Scalar).is_ok());
    }

    #[test]
    fn detect_prefers_highest_priority() {
        let best = Converter::detect();
        let top = Converter::available()
            .iter()
            .map(|c| c.isa().priority())
            .max()
            .unwrap();
        assert_eq!(best.isa().priority(), top);
    }

    #[test]
    fn with_isa_reports_missing_features() {
        for isa in Isa::ALL {
            match Converter::with_isa(isa) {
                Ok(converter) => assert_eq!(converter.isa(), isa),
                Err(Error::IsaUnavailable(missing)) => assert_eq!(missing, isa),
                Err(e) => panic!("Expected IsaUnavailable, got {:?}", e),
            }
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn neon_is_unavailable_on_x86() {
        assert!(matches!(
            Converter::with_isa(Isa::Neon),
            Err(Error::IsaUnavailable(Isa::Neon))
        ));
    }

    #[test]
    fn isa_names_round_trip() {
        for isa in Isa::ALL {
            assert_eq!(isa.to_string().parse::<Isa>().unwrap(), isa);
        }
        assert_eq!(" AVX2 ".parse::<Isa>().unwrap(), Isa::Avx2);
        match "avx512".parse::<Isa>() {
            Err(Error::UnknownIsa(name)) => assert_eq!(name, "avx512"),
            other => panic!("Expected UnknownIsa, got {:?}", other),
        }
    }

    #[test]
    fn options_parse_auto_and_names() {
        assert_eq!(ConvertOptions::parse("").unwrap(), ConvertOptions::default());
        assert_eq!(ConvertOptions::parse("Auto").unwrap(), ConvertOptions::default());
        assert_eq!(
            ConvertOptions::parse("scalar").unwrap(),
            ConvertOptions {
                isa: Some(Isa::Scalar)
            }
        );
        assert!(ConvertOptions::parse("mmx").is_err());
    }

    #[test]
    fn forced_scalar_options_build_scalar() {
        let options = ConvertOptions {
            isa: Some(Isa::Scalar),
        };
        let converter = Converter::from_options(&options).unwrap();
        assert_eq!(converter.isa(), Isa::Scalar);
    }

    #[test]
    fn enum_forwards_items_api() {
        let words = [0x0001_0002u32; 11];
        let mut output = [Fc32::default(); 11];
        for converter in Converter::available() {
            converter
                .convert_items(WireFormat::Chdr, &words, &mut output, 65536.0)
                .unwrap();
            assert!(output.iter().all(|s| *s == Fc32::new(2.0, 1.0)));
        }
    }

    #[test]
    fn global_converter_converts() {
        let input: Vec<u8> = [0x0001_0002u32; 3].iter().flat_map(|w| w.to_le_bytes()).collect();
        let mut output = [Fc32::default(); 3];
        convert(WireFormat::ItemBe, &input, &mut output, 65536.0).unwrap();
        assert_eq!(output, [Fc32::new(512.0, 256.0); 3]);
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn wire_format() -> impl Strategy<Value = WireFormat> {
        prop::sample::select(WireFormat::ALL.to_vec())
    }

    fn to_bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn run(converter: Converter, format: WireFormat, words: &[u32], scale: f64) -> Vec<Fc32> {
        let mut output = vec![Fc32::new(f32::NAN, f32::NAN); words.len()];
        converter
            .convert(format, &to_bytes(words), &mut output, scale)
            .unwrap();
        output
    }

    proptest! {
        /// Every available converter matches the scalar path bit for bit
        #[test]
        fn converters_match_scalar(
            words in prop::collection::vec(any::<u32>(), 0..80),
            format in wire_format(),
            scale in -1.0e6f64..1.0e6,
        ) {
            let expected = run(ScalarConverter.into(), format, &words, scale);
            for converter in Converter::available() {
                let output = run(converter, format, &words, scale);
                for (i, (got, want)) in output.iter().zip(&expected).enumerate() {
                    prop_assert_eq!(got.to_bits(), want.to_bits(), "{} at {}", converter.isa(), i);
                }
            }
        }

        /// Output scales linearly with the scale factor
        #[test]
        fn output_is_linear_in_scale(
            words in prop::collection::vec(any::<u32>(), 1..40),
            format in wire_format(),
            scale in 0.001f64..1000.0,
        ) {
            let unit = run(Converter::detect(), format, &words, 1.0);
            let scaled = run(Converter::detect(), format, &words, scale);
            for (u, s) in unit.iter().zip(&scaled) {
                for (a, b) in [(s.re, u.re * scale as f32), (s.im, u.im * scale as f32)] {
                    prop_assert!((a - b).abs() <= b.abs() * 1e-6, "{} vs {}", a, b);
                }
            }
        }

        /// Big-endian decode of a byte-swapped word equals little-endian decode of the word
        #[test]
        fn swapped_be_matches_le(words in prop::collection::vec(any::<u32>(), 0..40)) {
            let swapped: Vec<u32> = words.iter().map(|w| w.swap_bytes()).collect();
            let converter = Converter::detect();
            let le = run(converter, WireFormat::ItemLe, &words, 1.0);
            let be = run(converter, WireFormat::ItemBe, &swapped, 1.0);
            prop_assert_eq!(le, be);
        }
    }
}
