use std::time::Instant;

use sc16_fc32::{Converter, Fc32, Result, Sc16ToFc32, WireFormat, BYTES_PER_ITEM};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const NUM_SAMPLES: usize = 1 << 20;
const ROUNDS: u32 = 64;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let input: Vec<u8> = (0..NUM_SAMPLES as u32)
        .flat_map(|i| i.wrapping_mul(0x9e37_79b9).to_le_bytes())
        .collect();
    debug_assert_eq!(input.len(), NUM_SAMPLES * BYTES_PER_ITEM);
    let mut output = vec![Fc32::default(); NUM_SAMPLES];

    info!(isa = %Converter::global().isa(), "process-wide converter");

    for converter in Converter::available() {
        for format in WireFormat::ALL {
            let time = Instant::now();
            for _ in 0..ROUNDS {
                converter.convert(format, &input, &mut output, 1.0 / 32767.0)?;
                std::hint::black_box(&output);
            }
            let elapsed = time.elapsed();
            let msps = (NUM_SAMPLES as f64 * f64::from(ROUNDS)) / elapsed.as_secs_f64() / 1e6;
            info!(
                isa = %converter.isa(),
                format = format.name(),
                ?elapsed,
                msps = %format!("{msps:.1}"),
                "converted {} samples",
                NUM_SAMPLES * ROUNDS as usize
            );
        }
    }

    Ok(())
}
