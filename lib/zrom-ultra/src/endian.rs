use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Error, PartialEq)]
#[error("unrecognized image signature {0:08X}")]
pub struct UnrecognizedIdent(pub u32);

#[derive(Copy, Clone, Debug, Error, PartialEq)]
#[error("data length {0} is not a multiple of the word size")]
pub struct DataNotWordAligned(pub usize);

/// On-disk word order of a cartridge image.
///
/// `Big` is the canonical layout (.z64). `Little16` has the bytes of every
/// halfword swapped (.v64) and `Little32` has every word reversed (.n64).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little16,
    Little32,
}

impl Endian {
    pub fn from_ident(ident: u32) -> Result<Endian, UnrecognizedIdent> {
        Ok(match ident {
            0x80371240 => Endian::Big,
            0x37804012 => Endian::Little16,
            0x40123780 => Endian::Little32,
            x => Err(UnrecognizedIdent(x))?,
        })
    }

    pub fn from_ident_bytes(ident: &[u8]) -> Result<Endian, UnrecognizedIdent> {
        if ident.len() < 4 {
            // Pad short input so the error still shows what was there.
            let mut word = [0u8; 4];
            word[..ident.len()].copy_from_slice(ident);

            return Err(UnrecognizedIdent(BigEndian::read_u32(&word)));
        }

        Endian::from_ident(BigEndian::read_u32(ident))
    }

    /// Size of the unit the bytes are shuffled within.
    pub fn word_size(self) -> usize {
        match self {
            Endian::Big => 1,
            Endian::Little16 => 2,
            Endian::Little32 => 4,
        }
    }

    pub fn to_big(self, data: &mut [u8]) -> Result<(), DataNotWordAligned> {
        if data.len() % self.word_size() != 0 {
            Err(DataNotWordAligned(data.len()))?;
        }

        if self == Endian::Big {
            return Ok(());
        }

        for pair in data.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }

        if self == Endian::Little32 {
            // Halfwords are in the right order now, only their position
            // within the word is still flipped: [2, 3, 0, 1].
            for word in data.chunks_exact_mut(4) {
                word.swap(0, 2);
                word.swap(1, 3);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_signatures() {
        assert_eq!(Endian::from_ident(0x80371240), Ok(Endian::Big));
        assert_eq!(Endian::from_ident(0x37804012), Ok(Endian::Little16));
        assert_eq!(Endian::from_ident(0x40123780), Ok(Endian::Little32));
        assert_eq!(
            Endian::from_ident(0x12345678),
            Err(UnrecognizedIdent(0x12345678))
        );
    }

    #[test]
    fn detect_short_signature() {
        assert_eq!(
            Endian::from_ident_bytes(&[0x80, 0x37]),
            Err(UnrecognizedIdent(0x80370000))
        );
    }

    #[test]
    fn swap_each_order_to_big() {
        let cases = [
            (Endian::Little16, [0xA, 0xB, 0xC, 0xD]),
            (Endian::Little32, [0xC, 0xD, 0xA, 0xB]),
            (Endian::Big, [0xB, 0xA, 0xD, 0xC]),
        ];

        for (endian, expected) in cases.iter() {
            let mut input = [0xB, 0xA, 0xD, 0xC];

            endian.to_big(&mut input).unwrap();

            assert_eq!(&input, expected, "{:?}", endian);
        }
    }

    #[test]
    fn signatures_normalize_to_canonical() {
        for sig in [[0x37, 0x80, 0x40, 0x12], [0x40, 0x12, 0x37, 0x80]].iter() {
            let mut data = *sig;
            let endian = Endian::from_ident_bytes(&data).unwrap();

            endian.to_big(&mut data).unwrap();

            assert_eq!(data, [0x80, 0x37, 0x12, 0x40]);
        }
    }

    #[test]
    fn swap_unaligned() {
        assert_eq!(
            Endian::Little16.to_big(&mut [1, 2, 3]),
            Err(DataNotWordAligned(3))
        );
        assert_eq!(
            Endian::Little32.to_big(&mut [1, 2, 3, 4, 5, 6]),
            Err(DataNotWordAligned(6))
        );
        assert_eq!(Endian::Big.to_big(&mut [1, 2, 3]), Ok(()));
    }
}
