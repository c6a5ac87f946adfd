//! Fixed-layout entries of the code file's overlay tables.
//!
//! All of them start with (or contain) the virtual ROM and RAM ranges of the
//! overlay they describe; fields that only mean something at run time are
//! zero in ROM.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Cursor};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Error, PartialEq)]
pub enum TableError {
    #[error("{name} entry at {addr:08X} needs {expected} bytes, got {actual}")]
    BadSize {
        name: &'static str,
        addr: u32,
        expected: usize,
        actual: usize,
    },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VromRange {
    pub start: u32,
    pub end: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VramRange {
    pub start: u32,
    pub end: u32,
}

pub trait TableEntry: Sized {
    const NAME: &'static str;
    const SIZE: usize;

    fn read(c: &mut Cursor<&[u8]>, addr: u32) -> io::Result<Self>;

    fn parse(raw: &[u8], addr: u32) -> Result<Self, TableError> {
        if raw.len() != Self::SIZE {
            Err(TableError::BadSize {
                name: Self::NAME,
                addr,
                expected: Self::SIZE,
                actual: raw.len(),
            })?;
        }

        // Length was checked, so the reads can't run out.
        Self::read(&mut Cursor::new(raw), addr).map_err(|_| TableError::BadSize {
            name: Self::NAME,
            addr,
            expected: Self::SIZE,
            actual: raw.len(),
        })
    }
}

/// Decodes `count` consecutive entries of a table that starts at `addr`.
pub fn read_table<E: TableEntry>(raw: &[u8], addr: u32, count: usize) -> Result<Vec<E>, TableError> {
    let needed = E::SIZE.checked_mul(count).unwrap_or(usize::MAX);

    if raw.len() < needed {
        Err(TableError::BadSize {
            name: E::NAME,
            addr,
            expected: needed,
            actual: raw.len(),
        })?;
    }

    // Entry addresses wrap like the cpu's would.
    raw[..needed]
        .chunks_exact(E::SIZE)
        .enumerate()
        .map(|(i, chunk)| E::parse(chunk, addr.wrapping_add((i * E::SIZE) as u32)))
        .collect()
}

fn u32_be(c: &mut Cursor<&[u8]>) -> io::Result<u32> {
    c.read_u32::<BigEndian>()
}

fn vrom(c: &mut Cursor<&[u8]>) -> io::Result<VromRange> {
    Ok(VromRange {
        start: u32_be(c)?,
        end: u32_be(c)?,
    })
}

fn vram(c: &mut Cursor<&[u8]>) -> io::Result<VramRange> {
    Ok(VramRange {
        start: u32_be(c)?,
        end: u32_be(c)?,
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParticleOverlayEntry {
    pub addr: u32,
    pub vrom: VromRange,
    pub vram: VramRange,
    pub ram: u32,
    pub init: u32,
    pub unknown: u32,
}

impl TableEntry for ParticleOverlayEntry {
    const NAME: &'static str = "particle overlay";
    const SIZE: usize = 7 * 4;

    fn read(c: &mut Cursor<&[u8]>, addr: u32) -> io::Result<Self> {
        Ok(ParticleOverlayEntry {
            addr,
            vrom: vrom(c)?,
            vram: vram(c)?,
            ram: u32_be(c)?,
            init: u32_be(c)?,
            unknown: u32_be(c)?,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActorOverlayEntry {
    pub addr: u32,
    pub vrom: VromRange,
    pub vram: VramRange,
    pub ram: u32,
    pub init_vars: u32,
    /// Only set in debug builds.
    pub name_ptr: u32,
    pub alloc_type: u16,
    pub instances: u8,
}

impl TableEntry for ActorOverlayEntry {
    const NAME: &'static str = "actor overlay";
    const SIZE: usize = 8 * 4;

    fn read(c: &mut Cursor<&[u8]>, addr: u32) -> io::Result<Self> {
        Ok(ActorOverlayEntry {
            addr,
            vrom: vrom(c)?,
            vram: vram(c)?,
            ram: u32_be(c)?,
            init_vars: u32_be(c)?,
            name_ptr: u32_be(c)?,
            alloc_type: c.read_u16::<BigEndian>()?,
            instances: c.read_u8()?,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameStateEntry {
    pub addr: u32,
    pub ram: u32,
    pub vrom: VromRange,
    pub vram: VramRange,
    pub ctor: u32,
    pub dtor: u32,
    pub alloc_size: u32,
}

impl TableEntry for GameStateEntry {
    const NAME: &'static str = "game state";
    const SIZE: usize = 0x30;

    fn read(c: &mut Cursor<&[u8]>, addr: u32) -> io::Result<Self> {
        let ram = u32_be(c)?;
        let vrom = vrom(c)?;
        let vram = vram(c)?;
        let _ = u32_be(c)?;
        let ctor = u32_be(c)?;
        let dtor = u32_be(c)?;

        c.set_position(0x2C);

        Ok(GameStateEntry {
            addr,
            ram,
            vrom,
            vram,
            ctor,
            dtor,
            alloc_size: u32_be(c)?,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapMarkEntry {
    pub addr: u32,
    pub ram: u32,
    pub vrom: VromRange,
    pub vram: VramRange,
    pub mark_data: u32,
}

impl TableEntry for MapMarkEntry {
    const NAME: &'static str = "map mark";
    const SIZE: usize = 0x18;

    fn read(c: &mut Cursor<&[u8]>, addr: u32) -> io::Result<Self> {
        Ok(MapMarkEntry {
            addr,
            ram: u32_be(c)?,
            vrom: vrom(c)?,
            vram: vram(c)?,
            mark_data: u32_be(c)?,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlayerPauseEntry {
    pub addr: u32,
    pub ram: u32,
    pub vrom: VromRange,
    pub vram: VramRange,
    pub name_ptr: u32,
}

impl TableEntry for PlayerPauseEntry {
    const NAME: &'static str = "player/pause";
    const SIZE: usize = 7 * 4;

    fn read(c: &mut Cursor<&[u8]>, addr: u32) -> io::Result<Self> {
        let ram = u32_be(c)?;
        let vrom = vrom(c)?;
        let vram = vram(c)?;
        let _ = u32_be(c)?;

        Ok(PlayerPauseEntry {
            addr,
            ram,
            vrom,
            vram,
            name_ptr: u32_be(c)?,
        })
    }
}
