use crate::version::{DirectoryError, FileSource};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// A named file at `start..end` in virtual ROM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRange {
    pub start: u32,
    pub end: u32,
    pub name: String,
}

impl FileRange {
    pub fn new(start: u32, end: u32, name: &str) -> FileRange {
        FileRange {
            start,
            end,
            name: name.to_string(),
        }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for FileRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "{:08X} {:08X}  {:>7.2} KiB  {}",
            self.start,
            self.end,
            self.len() as f64 / 1024.0,
            self.name
        )
    }
}

#[derive(Debug, Error)]
pub enum FileIndexError {
    #[error("vrom offset {0:08X} is not inside any file")]
    OutOfRange(u32),
    #[error("{0} not in the rom")]
    UnknownFile(String),
    #[error("file {} has an empty or inverted range {:08X}-{:08X}", .0.name, .0.start, .0.end)]
    EmptyRange(FileRange),
    #[error("files {0} and {1} overlap")]
    Overlap(FileRange, FileRange),
    #[error(transparent)]
    Source(#[from] DirectoryError),
}

/// The files of an image, sorted by start offset and never overlapping.
#[derive(Clone, Debug, Default)]
pub struct FileIndex {
    files: Vec<FileRange>,
}

impl FileIndex {
    pub fn new(mut files: Vec<FileRange>) -> Result<FileIndex, FileIndexError> {
        if let Some(f) = files.iter().find(|f| f.is_empty()) {
            Err(FileIndexError::EmptyRange(f.clone()))?;
        }

        files.sort_by_key(|f| f.start);

        if let Some(w) = files.windows(2).find(|w| w[1].start < w[0].end) {
            Err(FileIndexError::Overlap(w[0].clone(), w[1].clone()))?;
        }

        Ok(FileIndex { files })
    }

    pub fn from_source<S: FileSource>(source: &S) -> Result<FileIndex, FileIndexError> {
        source
            .file_names()
            .iter()
            .map(|name| {
                source
                    .file_range(name)
                    .map(|(start, end)| FileRange::new(start, end, name))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(FileIndexError::from)
            .and_then(FileIndex::new)
    }

    /// Name of the file containing `offset`.
    pub fn lookup(&self, offset: u32) -> Result<&FileRange, FileIndexError> {
        self.files
            .binary_search_by(|c| {
                if offset < c.start {
                    Ordering::Greater
                } else if offset >= c.end {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .map(|i| &self.files[i])
            .map_err(|_| FileIndexError::OutOfRange(offset))
    }

    pub fn by_name(&self, name: &str) -> Result<&FileRange, FileIndexError> {
        self.files
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| FileIndexError::UnknownFile(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRange> + '_ {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
