use crate::files::{FileIndex, FileIndexError, FileRange};
use crate::overlay::{OverlayError, OverlayImage};
use crate::version::{AddressSource, Config, DirectoryError, Version};
use log::debug;
use thiserror::Error;
use zrom_ultra::rom::{Rom, RomError};

pub struct ZeldaRom<'c> {
    rom: Rom,
    files: FileIndex,
    config: &'c Config,
}

#[derive(Debug, Error)]
pub enum ZeldaRomError {
    #[error(transparent)]
    Rom(#[from] RomError),
    #[error(transparent)]
    Files(#[from] FileIndexError),
    #[error(transparent)]
    Address(#[from] DirectoryError),
    #[error("{0}: {1}")]
    Overlay(String, OverlayError),
}

impl<'c> ZeldaRom<'c> {
    pub fn load(rom: Rom, config: &'c Config) -> Result<ZeldaRom<'c>, ZeldaRomError> {
        let files = FileIndex::from_source(&config.files())?;

        debug!("{} files in the {} file table", files.len(), config.version);

        Ok(ZeldaRom { rom, files, config })
    }

    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    pub fn version(&self) -> Version {
        self.config.version
    }

    pub fn files(&self) -> &FileIndex {
        &self.files
    }

    pub fn containing_file(&self, vrom: u32) -> Result<&FileRange, ZeldaRomError> {
        Ok(self.files.lookup(vrom)?)
    }

    pub fn raw_file(&self, name: &str) -> Result<Vec<u8>, ZeldaRomError> {
        let file = self.files.by_name(name)?;

        Ok(self.rom.read(file.start, file.len())?)
    }

    pub fn overlay(&self, name: &str) -> Result<OverlayImage, ZeldaRomError> {
        OverlayImage::decode(&self.raw_file(name)?)
            .map_err(|e| ZeldaRomError::Overlay(name.to_string(), e))
    }

    pub fn address(&self, symbol: &str) -> Result<u32, ZeldaRomError> {
        Ok(self.config.addresses().address(symbol)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::tests::ADDR_JSON;

    // 0x100 bytes of header, then a 0x30 byte overlay
    const FILES: &str = r#"{
        "header": { "start": { "a": 0 }, "end": { "a": 256 } },
        "ovl_Test": { "start": { "a": 256 }, "end": { "a": 304 } }
    }"#;

    fn image() -> Vec<u8> {
        let mut data = vec![0u8; 0x100];

        data[..4].copy_from_slice(&[0x80, 0x37, 0x12, 0x40]);
        data[0x20..0x24].copy_from_slice(b"ZELD");

        let mut ovl = OverlayImage {
            text: vec![0x03, 0xE0, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00],
            rodata: b"hello\0\0\0".to_vec(),
            bss_size: 0x10,
            ..OverlayImage::default()
        };

        ovl.pad_trailer(16);
        data.extend(ovl.encode().unwrap());
        data
    }

    fn swapped(mut data: Vec<u8>) -> Vec<u8> {
        data.chunks_exact_mut(2).for_each(|c| c.swap(0, 1));
        data
    }

    #[test]
    fn load_and_extract() {
        let config = Config::load(Version::Oot10, FILES, ADDR_JSON).unwrap();
        let rom = ZeldaRom::load(Rom::new(swapped(image())).unwrap(), &config).unwrap();

        assert_eq!(rom.files().len(), 2);
        assert_eq!(rom.containing_file(0x120).unwrap().name, "ovl_Test");
        assert_eq!(rom.raw_file("header").unwrap(), &image()[..0x100]);

        let ovl = rom.overlay("OVL_TEST").unwrap();

        assert_eq!(ovl.rodata, b"hello\0\0\0");
        assert_eq!(ovl.bss_size, 0x10);
        assert_eq!(rom.address("actor.count").unwrap(), 471);
    }

    #[test]
    fn errors() {
        let config = Config::load(Version::Oot10, FILES, ADDR_JSON).unwrap();
        let rom = ZeldaRom::load(Rom::new(image()).unwrap(), &config).unwrap();

        assert!(matches!(
            rom.containing_file(0x130),
            Err(ZeldaRomError::Files(FileIndexError::OutOfRange(0x130)))
        ));
        assert!(matches!(
            rom.overlay("header"),
            Err(ZeldaRomError::Overlay(ref n, _)) if n == "header"
        ));
        assert!(matches!(
            rom.raw_file("code"),
            Err(ZeldaRomError::Files(FileIndexError::UnknownFile(_)))
        ));
        assert!(matches!(
            rom.address("gGameInfo"),
            Err(ZeldaRomError::Address(DirectoryError::NoValue { .. }))
        ));
    }

    #[test]
    fn file_past_image_end() {
        let files = r#"{ "big": { "start": { "a": 256 }, "end": { "a": 4096 } } }"#;
        let config = Config::load(Version::Oot10, files, "{}").unwrap();
        let rom = ZeldaRom::load(Rom::new(image()).unwrap(), &config).unwrap();

        assert!(matches!(
            rom.raw_file("big"),
            Err(ZeldaRomError::Rom(RomError::OutOfBounds { offset: 256, .. }))
        ));
    }
}
