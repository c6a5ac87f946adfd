use byteorder::{BigEndian, ByteOrder};
use std::fmt;

pub const HEADER_SIZE: usize = 0x40;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RomCrc(pub u32, pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    Japan,
    NorthAmerica,
    Pal,
    Other(u8),
}

impl From<u8> for Region {
    fn from(code: u8) -> Self {
        match code {
            b'J' => Region::Japan,
            b'E' => Region::NorthAmerica,
            b'P' => Region::Pal,
            x => Region::Other(x),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Region::Japan => write!(f, "JP"),
            Region::NorthAmerica => write!(f, "US"),
            Region::Pal => write!(f, "PAL"),
            Region::Other(x) if x.is_ascii_graphic() => write!(f, "{}", *x as char),
            Region::Other(x) => write!(f, "{:02X}", x),
        }
    }
}

/// The first 0x40 bytes of the image, in canonical byte order.
#[derive(Clone, Debug, PartialEq)]
pub struct RomHeader {
    pub pi_init: u32,
    pub clock_rate: u32,
    pub entry_point: u32,
    pub release: u32,
    pub crc: RomCrc,
    pub name: String,
    pub media_format: u32,
    pub cart_id: [u8; 2],
    pub region: Region,
    pub revision: u8,
}

impl RomHeader {
    pub fn parse(data: &[u8; HEADER_SIZE]) -> RomHeader {
        let word = |at: usize| BigEndian::read_u32(&data[at..]);

        RomHeader {
            pi_init: word(0x00),
            clock_rate: word(0x04),
            entry_point: word(0x08),
            release: word(0x0C),
            crc: RomCrc(word(0x10), word(0x14)),
            name: String::from_utf8_lossy(&data[0x20..0x34])
                .trim_end_matches(|c: char| c == ' ' || c == '\0')
                .to_string(),
            media_format: word(0x38),
            cart_id: [data[0x3C], data[0x3D]],
            region: data[0x3E].into(),
            revision: data[0x3F],
        }
    }

    pub fn cart_id(&self) -> String {
        String::from_utf8_lossy(&self.cart_id).into_owned()
    }
}
