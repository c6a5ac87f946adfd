use crate::relocation::{RelocationError, RelocationRecord, Section};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use log::{debug, warn};
use std::convert::TryFrom;
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

/// Size of the five-word metadata table.
const TABLE_SIZE: u32 = 20;
/// Smallest possible distance from the end back to the table.
const MIN_SEEK: u32 = TABLE_SIZE + 4;

/// A relocatable overlay, split into its sections.
///
/// On disk the layout is `.text .data .rodata | table relocs padding seek`,
/// where `seek` is the distance from the end of the blob back to `table`.
/// `.bss` only has a size; it takes no space in the blob.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayImage {
    pub text: Vec<u8>,
    pub data: Vec<u8>,
    pub rodata: Vec<u8>,
    pub bss_size: u32,
    pub relocations: Vec<RelocationRecord>,
    /// Bytes between the last relocation word and the seek word.
    pub padding: Vec<u8>,
}

pub struct OverlayDisplay<'a>(u32, &'a OverlayImage);

#[derive(Debug, Error, PartialEq)]
pub enum OverlayError {
    #[error("overlay of {0} bytes is too small to hold a trailer")]
    InvalidSize(u32),
    #[error("overlay of {0} bytes doesn't fit a 32-bit size field")]
    TooLarge(usize),
    #[error("trailer seek {0:X} doesn't point at a metadata table")]
    BadHeaderPointer(u32),
    #[error("metadata table at {0:X} runs past the end of the overlay")]
    UnexpectedHeaderEnd(u32),
    #[error("sections need {needed:X} bytes but the metadata table starts at {table:X}")]
    Truncated { needed: u64, table: u32 },
    #[error("sections end at {end:X} but the metadata table starts at {table:X}")]
    SectionGap { end: u32, table: u32 },
    #[error("relocation {index}: {source}")]
    Relocation {
        index: usize,
        source: RelocationError,
    },
}

fn put_u32(out: &mut Vec<u8>, w: u32) {
    out.write_u32::<BigEndian>(w)
        .expect("Vec write; shouldn't happen")
}

fn size_u32(len: usize) -> Result<u32, OverlayError> {
    u32::try_from(len).map_err(|_| OverlayError::TooLarge(len))
}

impl OverlayImage {
    pub fn decode(raw: &[u8]) -> Result<OverlayImage, OverlayError> {
        use OverlayError::*;

        let len = size_u32(raw.len())?;

        if len < 4 {
            Err(InvalidSize(len))?
        }

        let seek = BigEndian::read_u32(&raw[(len - 4) as usize..]);

        if seek < MIN_SEEK || seek > len {
            Err(BadHeaderPointer(seek))?
        }

        let table = len - seek;

        let mut header = Cursor::new(&raw[table as usize..]);
        let mut words = [0u32; 5];

        header
            .read_u32_into::<BigEndian>(&mut words)
            .map_err(|_| UnexpectedHeaderEnd(table))?;

        let [text_size, data_size, rodata_size, bss_size, reloc_count] = words;

        let relocs_end = table as u64 + TABLE_SIZE as u64 + reloc_count as u64 * 4;

        if relocs_end > (len - 4) as u64 {
            Err(UnexpectedHeaderEnd(table))?
        }

        let needed = text_size as u64 + data_size as u64 + rodata_size as u64;

        if needed > table as u64 {
            Err(Truncated { needed, table })?
        }

        if needed < table as u64 {
            Err(SectionGap {
                end: needed as u32,
                table,
            })?
        }

        let mut seek = 0;
        let mut read = |size: u32| {
            let out = raw[seek..seek + size as usize].to_vec();
            seek += size as usize;
            out
        };

        let text = read(text_size);
        let data = read(data_size);
        let rodata = read(rodata_size);

        let mut relocations = Vec::with_capacity(reloc_count as usize);

        for index in 0..reloc_count as usize {
            let w = header
                .read_u32::<BigEndian>()
                .map_err(|_| UnexpectedHeaderEnd(table))?;

            relocations.push(
                RelocationRecord::decode(w).map_err(|source| Relocation { index, source })?,
            );
        }

        let padding = raw[relocs_end as usize..(len - 4) as usize].to_vec();

        if padding.iter().any(|&b| b != 0) {
            warn!("overlay trailer padding at {:X} is not zero", relocs_end);
        }

        debug!(
            "decoded overlay: .text {:X} .data {:X} .rodata {:X} .bss {:X}, {} relocations",
            text_size, data_size, rodata_size, bss_size, reloc_count
        );

        Ok(OverlayImage {
            text,
            data,
            rodata,
            bss_size,
            relocations,
            padding,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, OverlayError> {
        let trailer = self.trailer_len()?;
        let mut out = Vec::with_capacity(self.loaded_len() + trailer as usize);

        out.extend_from_slice(&self.text);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.rodata);

        for &size in [
            size_u32(self.text.len())?,
            size_u32(self.data.len())?,
            size_u32(self.rodata.len())?,
            self.bss_size,
            size_u32(self.relocations.len())?,
        ]
        .iter()
        {
            put_u32(&mut out, size);
        }

        for r in &self.relocations {
            put_u32(&mut out, r.encode());
        }

        out.extend_from_slice(&self.padding);
        put_u32(&mut out, trailer);

        size_u32(out.len())?;

        Ok(out)
    }

    /// Zero-pads the trailer so the encoded overlay is a multiple of `align`
    /// bytes long. Cartridge overlays use 16.
    pub fn pad_trailer(&mut self, align: usize) {
        self.padding.clear();

        if align > 1 {
            let unpadded = self.loaded_len() + (MIN_SEEK as usize + self.relocations.len() * 4);

            self.padding.resize((align - unpadded % align) % align, 0);
        }
    }

    pub fn section(&self, section: Section) -> &[u8] {
        match section {
            Section::Text => &self.text,
            Section::Data => &self.data,
            Section::Rodata => &self.rodata,
            Section::Bss => &[],
        }
    }

    pub fn section_size(&self, section: Section) -> u32 {
        match section {
            Section::Bss => self.bss_size,
            x => self.section(x).len() as u32,
        }
    }

    pub fn display(&self, at: u32) -> OverlayDisplay {
        OverlayDisplay(at, self)
    }

    fn loaded_len(&self) -> usize {
        self.text.len() + self.data.len() + self.rodata.len()
    }

    /// Distance from the end of the blob back to the metadata table.
    fn trailer_len(&self) -> Result<u32, OverlayError> {
        size_u32(MIN_SEEK as usize + self.relocations.len() * 4 + self.padding.len())
    }
}

struct OvlAddressPair(u32, u32);

impl fmt::Display for OvlAddressPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let OvlAddressPair(start, end) = self;
        let size = end.wrapping_sub(*start);

        if size == 0 {
            write!(f, "{:<31}", "-")
        } else {
            write!(
                f,
                "{:08X} - {:08X}  {:>6.2} KiB",
                start,
                end,
                size as f64 / 1024.0
            )
        }
    }
}

impl<'a> fmt::Display for OverlayDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let OverlayDisplay(base, ovl) = *self;
        let trailer = ovl.trailer_len().map_err(|_| fmt::Error)?;

        // .bss is loaded after the relocations, but occupies nothing on disk.
        let (mut vstart, mut pstart) = (0u32, 0u32);
        let mut rows = Vec::with_capacity(5);

        for &(name, vsize, psize) in [
            (".text", ovl.section_size(Section::Text), ovl.section_size(Section::Text)),
            (".data", ovl.section_size(Section::Data), ovl.section_size(Section::Data)),
            (".rodata", ovl.section_size(Section::Rodata), ovl.section_size(Section::Rodata)),
            (".rel.*", trailer, trailer),
            (".bss", ovl.bss_size, 0),
        ]
        .iter()
        {
            rows.push((name, vstart, vsize, pstart, psize));
            vstart = vstart.wrapping_add(vsize);
            pstart = pstart.wrapping_add(psize);
        }

        // Listed in the same order as the metadata table.
        rows.swap(3, 4);

        writeln!(f, "SECTION    VIRTUAL                            PHYSICAL")?;

        for (name, vstart, vsize, pstart, psize) in rows {
            let vstart = base.wrapping_add(vstart);

            writeln!(
                f,
                "{:<7}    {}    {}",
                name,
                OvlAddressPair(vstart, vstart.wrapping_add(vsize)),
                OvlAddressPair(pstart, pstart + psize)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "RELOCATIONS ({})", ovl.relocations.len())?;

        for r in &ovl.relocations {
            writeln!(f, "  {}", r)?;
        }

        Ok(())
    }
}
