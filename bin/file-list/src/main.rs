use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use zrom_ultra::rom::Rom;
use zrom_zelda::version::{Config, Version};
use zrom_zelda::ZeldaRom;

/// Lists the files of a Zelda ROM, or the file containing an offset.
#[derive(Parser)]
struct Args {
    rom: PathBuf,
    /// File table directory (JSON)
    #[arg(long)]
    files: PathBuf,
    #[arg(long, env = "ZROM_VERSION", default_value = "o1_0")]
    game: Version,
    /// Only print the file containing this vrom offset (hex)
    #[arg(long, value_parser = parse_hex)]
    at: Option<u32>,
}

fn parse_hex(s: &str) -> Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let files = fs::read_to_string(&args.files)
        .with_context(|| format!("reading {}", args.files.display()))?;
    let config = Config::load(args.game, &files, "{}")?;
    let rom = Rom::new(fs::read(&args.rom).context("File read")?)
        .context("Couldn't read N64 ROM")?;
    let zrom = ZeldaRom::load(rom, &config).context("Couldn't read Zelda ROM")?;

    if let Some(at) = args.at {
        println!("{}", zrom.containing_file(at)?);

        return Ok(());
    }

    let header = zrom.rom().header();

    println!(
        "{} ({}, rev {}, {:?}, {})",
        header.name,
        header.region,
        header.revision,
        zrom.rom().endian(),
        zrom.version()
    );

    for (i, f) in zrom.files().iter().enumerate() {
        println!("{:>4}  {}", i, f);
    }

    Ok(())
}
