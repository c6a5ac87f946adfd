use crate::endian::{DataNotWordAligned, Endian, UnrecognizedIdent};
use crate::header::{RomHeader, HEADER_SIZE};
use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace};
use thiserror::Error;

/// A cartridge image kept in its on-disk byte order.
///
/// Every read goes through [`Rom::read`], which hands out bytes as if the
/// image were stored big-endian.
pub struct Rom {
    data: Vec<u8>,
    endian: Endian,
    header: RomHeader,
}

#[derive(Debug, Error, PartialEq)]
pub enum RomError {
    #[error(transparent)]
    UnknownEndian(#[from] UnrecognizedIdent),
    #[error(transparent)]
    BadSize(#[from] DataNotWordAligned),
    #[error("image is {0} bytes, too small to hold a header")]
    TooSmall(usize),
    #[error("read of {length} bytes at {offset:08X} is outside the {size} byte image")]
    OutOfBounds {
        offset: u32,
        length: u32,
        size: usize,
    },
}

fn read_span(data: &[u8], endian: Endian, offset: u32, length: u32) -> Result<Vec<u8>, RomError> {
    let start = offset as usize;
    let end = start
        .checked_add(length as usize)
        .filter(|&end| end <= data.len())
        .ok_or(RomError::OutOfBounds {
            offset,
            length,
            size: data.len(),
        })?;

    let word = endian.word_size();
    let pre = start % word;
    let post = (word - end % word) % word;

    // The image length is a multiple of the word size, so the padded span
    // never runs past the end.
    let mut span = data[start - pre..end + post].to_vec();

    endian.to_big(&mut span)?;

    span.truncate(pre + length as usize);
    span.drain(..pre);

    trace!(
        "read {:08X}+{:X} (pre {}, post {}, {:?})",
        offset,
        length,
        pre,
        post,
        endian
    );

    Ok(span)
}

impl Rom {
    pub fn new(data: Vec<u8>) -> Result<Rom, RomError> {
        let endian = Endian::from_ident_bytes(&data)?;

        if data.len() < HEADER_SIZE {
            Err(RomError::TooSmall(data.len()))?;
        }

        if data.len() % endian.word_size() != 0 {
            Err(DataNotWordAligned(data.len()))?;
        }

        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&read_span(&data, endian, 0, HEADER_SIZE as u32)?);

        let header = RomHeader::parse(&raw);

        debug!(
            "opened {:?} ({:?}, {} bytes, entry {:08X})",
            header.name,
            endian,
            data.len(),
            header.entry_point
        );

        Ok(Rom {
            data,
            endian,
            header,
        })
    }

    /// `length` bytes at `offset`, in canonical big-endian order.
    pub fn read(&self, offset: u32, length: u32) -> Result<Vec<u8>, RomError> {
        read_span(&self.data, self.endian, offset, length)
    }

    pub fn read_u32(&self, offset: u32) -> Result<u32, RomError> {
        self.read(offset, 4).map(|w| BigEndian::read_u32(&w))
    }

    /// Canonical copy of the whole image.
    pub fn to_big(&self) -> Result<Vec<u8>, RomError> {
        let mut out = self.data.clone();

        self.endian.to_big(&mut out)?;

        Ok(out)
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn header(&self) -> &RomHeader {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
