//! Prints nodeflake identifiers, one per line.

mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, CliConfig, Format, Mode};
use core::fmt::Display;
use nodeflake::{DecimalEncoding, Encoding, Generator, U64Encoding, U128Encoding};
use std::io::{BufWriter, Write};
use std::sync::Arc;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    telemetry::init_tracing();

    let generator = Arc::new(Generator::new(&config.generator_config())?);
    tracing::info!(
        "node {} (mode={:?}, format={:?}, count={})",
        generator.node_identity(),
        config.mode,
        config.format,
        config.count
    );

    match config.format {
        Format::U64 => run::<U64Encoding>(&generator, &config).await,
        Format::U128 => run::<U128Encoding>(&generator, &config).await,
        Format::String => run::<DecimalEncoding>(&generator, &config).await,
    }
}

async fn run<E>(generator: &Arc<Generator>, config: &CliConfig) -> anyhow::Result<()>
where
    E: Encoding + 'static,
    E::Output: Display,
{
    let mut out = BufWriter::new(std::io::stdout().lock());

    match config.mode {
        Mode::Single => {
            for _ in 0..config.count {
                writeln!(out, "{}", generator.try_next::<E>()?)?;
            }
        }
        Mode::Batch => {
            for id in generator.try_next_batch::<E>(config.count)? {
                writeln!(out, "{id}")?;
            }
        }
        Mode::Stream => {
            let mut stream = generator.spawn_stream::<E>(config.buffer);
            for _ in 0..config.count {
                match stream.recv().await {
                    Some(id) => writeln!(out, "{id}")?,
                    None => break,
                }
            }
            stream.stop();

            let error = stream.next_error().await;
            stream.join().await?;
            if let Some(error) = error {
                out.flush()?;
                return Err(error.into());
            }
        }
    }

    out.flush()?;
    Ok(())
}
