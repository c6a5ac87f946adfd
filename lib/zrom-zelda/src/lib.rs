pub mod files;
pub mod overlay;
pub mod relocation;
pub mod tables;
pub mod version;
mod zelda_rom;

pub use zelda_rom::{ZeldaRom, ZeldaRomError};
