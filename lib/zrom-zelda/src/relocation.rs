use std::fmt;
use thiserror::Error;

pub const MAX_OFFSET: u32 = 0x00FF_FFFF;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Text,
    Data,
    Rodata,
    Bss,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Text, Section::Data, Section::Rodata, Section::Bss];

    pub fn tag(self) -> u32 {
        match self {
            Section::Text => 1,
            Section::Data => 2,
            Section::Rodata => 3,
            Section::Bss => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Section::Text => ".text",
            Section::Data => ".data",
            Section::Rodata => ".rodata",
            Section::Bss => ".bss",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelocationKind {
    R32,
    R26,
    Hi16,
    Lo16,
}

impl RelocationKind {
    pub fn tag(self) -> u32 {
        match self {
            RelocationKind::R32 => 2,
            RelocationKind::R26 => 4,
            RelocationKind::Hi16 => 5,
            RelocationKind::Lo16 => 6,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RelocationKind::R32 => "32 bit pointer",
            RelocationKind::R26 => "jump target",
            RelocationKind::Hi16 => "lui/ori pair high 16 bits",
            RelocationKind::Lo16 => "lui/ori pair low 16 bits",
        }
    }
}

#[derive(Copy, Clone, Debug, Error, PartialEq)]
pub enum RelocationError {
    #[error("relocation {0:08X} has unknown section tag {1}")]
    InvalidSection(u32, u8),
    #[error("relocation {0:08X} has unknown type {1}")]
    UnknownRelocationType(u32, u8),
    #[error("section {0} can't be expressed in a relocation word")]
    UnencodableSection(Section),
    #[error("relocation offset {0:X} doesn't fit in 24 bits")]
    OffsetTooLarge(u32),
}

/// One packed relocation word: `SSKKKKKK OOOOOOOO OOOOOOOO OOOOOOOO`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RelocationRecord {
    section: Section,
    kind: RelocationKind,
    offset: u32,
}

impl RelocationRecord {
    pub fn new(
        section: Section,
        kind: RelocationKind,
        offset: u32,
    ) -> Result<RelocationRecord, RelocationError> {
        // Only two bits are available for the section.
        if section.tag() > 3 {
            Err(RelocationError::UnencodableSection(section))?;
        }

        if offset > MAX_OFFSET {
            Err(RelocationError::OffsetTooLarge(offset))?;
        }

        Ok(RelocationRecord {
            section,
            kind,
            offset,
        })
    }

    pub fn decode(w: u32) -> Result<RelocationRecord, RelocationError> {
        Ok(RelocationRecord {
            section: match w >> 30 {
                1 => Section::Text,
                2 => Section::Data,
                3 => Section::Rodata,
                x => Err(RelocationError::InvalidSection(w, x as u8))?,
            },
            kind: match w >> 24 & 0x3F {
                2 => RelocationKind::R32,
                4 => RelocationKind::R26,
                5 => RelocationKind::Hi16,
                6 => RelocationKind::Lo16,
                x => Err(RelocationError::UnknownRelocationType(w, x as u8))?,
            },
            offset: w & MAX_OFFSET,
        })
    }

    pub fn encode(&self) -> u32 {
        self.section.tag() << 30 | self.kind.tag() << 24 | self.offset
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn kind(&self) -> RelocationKind {
        self.kind
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl fmt::Display for RelocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "{}: {}+0x{:06x}",
            self.kind.description(),
            self.section,
            self.offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_fields() {
        let r = RelocationRecord::decode(0x8500_0004).unwrap();

        assert_eq!(r.section(), Section::Data);
        assert_eq!(r.kind(), RelocationKind::Hi16);
        assert_eq!(r.offset(), 4);

        let r = RelocationRecord::decode(0x4412_3456).unwrap();

        assert_eq!(r.section(), Section::Text);
        assert_eq!(r.kind(), RelocationKind::R26);
        assert_eq!(r.offset(), 0x12_3456);
    }

    #[test]
    fn encode_inverts_decode() {
        for section in 1..4u32 {
            for &kind in [2u32, 4, 5, 6].iter() {
                for &offset in [0, 1, 0x7FFF, 0x8000, 0xFF_FFFF].iter() {
                    let w = section << 30 | kind << 24 | offset;

                    assert_eq!(RelocationRecord::decode(w).unwrap().encode(), w);
                }
            }
        }
    }

    #[test]
    fn decode_rejects_unknown_tags() {
        assert_eq!(
            RelocationRecord::decode(0x0200_0010),
            Err(RelocationError::InvalidSection(0x0200_0010, 0))
        );
        assert_eq!(
            RelocationRecord::decode(0x8300_0010),
            Err(RelocationError::UnknownRelocationType(0x8300_0010, 3))
        );
        assert_eq!(
            RelocationRecord::decode(0x4000_0000),
            Err(RelocationError::UnknownRelocationType(0x4000_0000, 0))
        );
    }

    #[test]
    fn new_checks_encodability() {
        assert_eq!(
            RelocationRecord::new(Section::Bss, RelocationKind::R32, 0),
            Err(RelocationError::UnencodableSection(Section::Bss))
        );
        assert_eq!(
            RelocationRecord::new(Section::Text, RelocationKind::R32, 0x100_0000),
            Err(RelocationError::OffsetTooLarge(0x100_0000))
        );

        let r = RelocationRecord::new(Section::Rodata, RelocationKind::Lo16, 0x20).unwrap();

        assert_eq!(r.encode(), 0xC600_0020);
    }

    #[test]
    fn display() {
        let r = RelocationRecord::decode(0x8200_0010).unwrap();

        assert_eq!(r.to_string(), "32 bit pointer: .data+0x000010");
    }
}
