use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;
use zrom_ultra::rom::Rom;

/// Writes a big-endian (.z64) copy of a ROM in any byte order.
#[derive(Parser)]
struct Args {
    input: PathBuf,
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let rom = Rom::new(fs::read(&args.input).context("File read")?)
        .context("Couldn't read N64 ROM")?;

    info!("{:?} -> big endian", rom.endian());

    fs::write(&args.output, rom.to_big()?)
        .with_context(|| format!("writing {}", args.output.display()))?;

    Ok(())
}
