mod endian;
pub mod header;
pub mod rom;

pub use endian::{DataNotWordAligned, Endian, UnrecognizedIdent};
