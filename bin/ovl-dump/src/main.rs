use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use zrom_ultra::rom::Rom;
use zrom_zelda::version::{Config, Version};
use zrom_zelda::ZeldaRom;

/// Decodes an overlay file from a Zelda ROM and prints its layout.
#[derive(Parser)]
struct Args {
    rom: PathBuf,
    /// Name of the overlay file, e.g. ovl_En_Vase
    name: String,
    /// File table directory (JSON)
    #[arg(long)]
    files: PathBuf,
    /// Address directory (JSON)
    #[arg(long)]
    addresses: Option<PathBuf>,
    #[arg(long, env = "ZROM_VERSION", default_value = "o1_0")]
    game: Version,
    /// Load address of the overlay (0x-prefixed hex), or an address symbol
    #[arg(long, default_value = "0x0")]
    vram: String,
    /// Re-encode the overlay and check it matches the ROM byte for byte
    #[arg(long)]
    verify: bool,
    /// Write the raw overlay file here
    #[arg(long)]
    out: Option<PathBuf>,
}

/// A `--vram` value: a literal address or a symbol to look up.
#[derive(Debug, PartialEq)]
enum Vram<'a> {
    Literal(u32),
    Symbol(&'a str),
}

fn parse_vram(s: &str) -> Result<Vram> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16)
            .map(Vram::Literal)
            .with_context(|| format!("bad vram address {:?}", s)),
        None => Ok(Vram::Symbol(s)),
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let addresses = match &args.addresses {
        Some(p) => read_text(p)?,
        None => "{}".to_string(),
    };
    let config = Config::load(args.game, &read_text(&args.files)?, &addresses)?;
    let rom = Rom::new(fs::read(&args.rom).context("File read")?)
        .context("Couldn't read N64 ROM")?;
    let zrom = ZeldaRom::load(rom, &config).context("Couldn't read Zelda ROM")?;

    let vram = match parse_vram(&args.vram)? {
        Vram::Literal(x) => x,
        Vram::Symbol(sym) => zrom.address(sym)?,
    };

    let file = zrom.files().by_name(&args.name)?.clone();
    let raw = zrom.raw_file(&file.name)?;
    let ovl = zrom.overlay(&file.name)?;

    println!("{}", file);
    println!();
    println!("{}", ovl.display(vram));

    if args.verify {
        if ovl.encode()? != raw {
            bail!("{} doesn't round-trip", file.name);
        }

        info!("{} round-trips ({} bytes)", file.name, raw.len());
        println!("round trip OK");
    }

    if let Some(out) = &args.out {
        fs::write(out, &raw).with_context(|| format!("writing {}", out.display()))?;
    }

    Ok(())
}
