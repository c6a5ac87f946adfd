use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::{fmt, fs, io};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Version {
    #[serde(rename = "o1_0")]
    Oot10,
    #[serde(rename = "o1_1")]
    Oot11,
    #[serde(rename = "o1_2")]
    Oot12,
    #[serde(rename = "ogc")]
    OotGc,
    #[serde(rename = "omq")]
    OotMq,
    #[serde(rename = "odbg")]
    OotDebug,
    #[serde(rename = "m1_0")]
    Mm10,
    #[serde(rename = "m1_1")]
    Mm11,
    #[serde(rename = "meng")]
    MmEnglish,
    #[serde(rename = "mgce")]
    MmGcE,
    #[serde(rename = "mgcj")]
    MmGcJ,
    #[serde(rename = "mdbg")]
    MmDebug,
}

impl Version {
    pub const ALL: [Version; 12] = [
        Version::Oot10,
        Version::Oot11,
        Version::Oot12,
        Version::OotGc,
        Version::OotMq,
        Version::OotDebug,
        Version::Mm10,
        Version::Mm11,
        Version::MmEnglish,
        Version::MmGcE,
        Version::MmGcJ,
        Version::MmDebug,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Version::Oot10 => "o1_0",
            Version::Oot11 => "o1_1",
            Version::Oot12 => "o1_2",
            Version::OotGc => "ogc",
            Version::OotMq => "omq",
            Version::OotDebug => "odbg",
            Version::Mm10 => "m1_0",
            Version::Mm11 => "m1_1",
            Version::MmEnglish => "meng",
            Version::MmGcE => "mgce",
            Version::MmGcJ => "mgcj",
            Version::MmDebug => "mdbg",
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::Oot10
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str(self.key())
    }
}

impl FromStr for Version {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::ALL
            .iter()
            .copied()
            .find(|v| v.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| DirectoryError::UnknownVersion(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no entry named {0:?}")]
    UnknownKey(String),
    #[error("{0:?} is a table, not a value")]
    NotAValue(String),
    #[error("{0:?} is a value, not a table")]
    NotATable(String),
    #[error("{key:?} has no value for {version} and no default")]
    NoValue { key: String, version: Version },
    #[error("unknown game version {0:?}")]
    UnknownVersion(String),
    #[error("bad directory data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("couldn't read directory: {0}")]
    Io(#[from] io::Error),
}

/// A value with per-version overrides and a fallback shared by all
/// versions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    #[serde(rename = "a", skip_serializing_if = "Option::is_none")]
    default: Option<T>,
    #[serde(flatten)]
    overrides: BTreeMap<Version, T>,
}

impl<T> Versioned<T> {
    pub fn new(default: Option<T>) -> Self {
        Versioned {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with(mut self, version: Version, value: T) -> Self {
        self.overrides.insert(version, value);
        self
    }

    pub fn get(&self, version: Version) -> Option<&T> {
        self.overrides.get(&version).or_else(|| self.default.as_ref())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry<T> {
    Value(Versioned<T>),
    Table(Directory<T>),
}

/// A tree of named, version dependent values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory<T> {
    entries: BTreeMap<String, Entry<T>>,
}

impl<T> Default for Directory<T> {
    fn default() -> Self {
        Directory {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Directory<T> {
    pub fn insert(&mut self, key: &str, entry: Entry<T>) {
        self.entries.insert(key.to_string(), entry);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn resolve(&self, version: Version) -> Resolver<T> {
        Resolver {
            dir: self,
            version,
            path: String::new(),
        }
    }
}

impl<T> Directory<T>
where
    T: for<'de> Deserialize<'de>,
{
    pub fn from_json(json: &str) -> Result<Directory<T>, DirectoryError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A view of a [`Directory`] with the game version fixed.
pub struct Resolver<'a, T> {
    dir: &'a Directory<T>,
    version: Version,
    path: String,
}

impl<'a, T> Resolver<'a, T> {
    fn full_key(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn entry(&self, key: &str) -> Result<&'a Entry<T>, DirectoryError> {
        self.dir
            .entries
            .get(key)
            .ok_or_else(|| DirectoryError::UnknownKey(self.full_key(key)))
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.dir.entries.keys().map(|k| k.as_str())
    }

    pub fn value(&self, key: &str) -> Result<&'a T, DirectoryError> {
        match self.entry(key)? {
            Entry::Value(v) => v.get(self.version).ok_or_else(|| DirectoryError::NoValue {
                key: self.full_key(key),
                version: self.version,
            }),
            Entry::Table(_) => Err(DirectoryError::NotAValue(self.full_key(key))),
        }
    }

    pub fn table(&self, key: &str) -> Result<Resolver<'a, T>, DirectoryError> {
        match self.entry(key)? {
            Entry::Table(dir) => Ok(Resolver {
                dir,
                version: self.version,
                path: self.full_key(key),
            }),
            Entry::Value(_) => Err(DirectoryError::NotATable(self.full_key(key))),
        }
    }

    /// Walks a dotted path such as `actor.table`.
    pub fn lookup(&self, path: &str) -> Result<&'a T, DirectoryError> {
        let mut parts = path.rsplitn(2, '.');
        let last = parts.next().unwrap_or(path);

        match parts.next() {
            None => self.value(last),
            Some(tables) => tables
                .split('.')
                .try_fold(self.table_ref(), |r, key| r.table(key))?
                .value(last),
        }
    }

    fn table_ref(&self) -> Resolver<'a, T> {
        Resolver {
            dir: self.dir,
            version: self.version,
            path: self.path.clone(),
        }
    }
}

/// Where the virtual ROM range of each named file comes from.
pub trait FileSource {
    fn file_names(&self) -> Vec<String>;
    fn file_range(&self, name: &str) -> Result<(u32, u32), DirectoryError>;
}

/// Where named RAM addresses come from.
pub trait AddressSource {
    fn address(&self, name: &str) -> Result<u32, DirectoryError>;
}

impl<'a> FileSource for Resolver<'a, u32> {
    fn file_names(&self) -> Vec<String> {
        self.keys().map(|k| k.to_string()).collect()
    }

    fn file_range(&self, name: &str) -> Result<(u32, u32), DirectoryError> {
        let file = self.table(name)?;

        Ok((*file.value("start")?, *file.value("end")?))
    }
}

impl<'a> AddressSource for Resolver<'a, u32> {
    fn address(&self, name: &str) -> Result<u32, DirectoryError> {
        self.lookup(name).map(|a| *a)
    }
}

/// The file table and address table for one game version.
pub struct Config {
    pub version: Version,
    pub files: Directory<u32>,
    pub addresses: Directory<u32>,
}

impl Config {
    pub fn load(version: Version, files: &str, addresses: &str) -> Result<Config, DirectoryError> {
        let config = Config {
            version,
            files: Directory::from_json(files)?,
            addresses: Directory::from_json(addresses)?,
        };

        debug!(
            "loaded {} file entries, {} address groups for {}",
            config.files.entries.len(),
            config.addresses.entries.len(),
            version
        );

        Ok(config)
    }

    pub fn open<P: AsRef<Path>>(
        version: Version,
        files: P,
        addresses: P,
    ) -> Result<Config, DirectoryError> {
        Config::load(
            version,
            &fs::read_to_string(files)?,
            &fs::read_to_string(addresses)?,
        )
    }

    pub fn files(&self) -> Resolver<u32> {
        self.files.resolve(self.version)
    }

    pub fn addresses(&self) -> Resolver<u32> {
        self.addresses.resolve(self.version)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const FILES_JSON: &str = r#"{
        "makerom": { "start": { "a": 0 }, "end": { "a": 4096 } },
        "boot": { "start": { "a": 4096 }, "end": { "a": 28528, "m1_0": 31536 } },
        "dmadata": { "start": { "a": 28528 }, "end": { "a": 53008 } },
        "code": { "start": { "a": 53008 }, "end": { "a": 60000 } },
        "ovl_En_Vase": { "start": { "a": 60000 }, "end": { "a": 60240 } }
    }"#;

    pub(crate) const ADDR_JSON: &str = r#"{
        "actor": {
            "table": { "a": 2148540480, "odbg": 2148589232 },
            "count": { "a": 471 }
        },
        "gGameInfo": { "m1_0": 2148934512 }
    }"#;

    #[test]
    fn version_keys() {
        for &v in Version::ALL.iter() {
            assert_eq!(v.key().parse::<Version>().unwrap(), v);
        }

        assert_eq!("ODBG".parse::<Version>().unwrap(), Version::OotDebug);
        assert!(matches!(
            "o9_9".parse::<Version>(),
            Err(DirectoryError::UnknownVersion(_))
        ));
    }

    #[test]
    fn versioned_falls_back_to_default() {
        let v = Versioned::new(Some(10)).with(Version::Mm10, 20);

        assert_eq!(v.get(Version::Oot10), Some(&10));
        assert_eq!(v.get(Version::Mm10), Some(&20));
        assert_eq!(Versioned::<u32>::new(None).get(Version::Oot10), None);
    }

    #[test]
    fn versioned_without_default() {
        let v: Versioned<u32> = serde_json::from_str(r#"{ "m1_0": 5 }"#).unwrap();

        assert_eq!(v.get(Version::Oot10), None);
        assert_eq!(v.get(Version::Mm10), Some(&5));
        assert_eq!(v, Versioned::new(None).with(Version::Mm10, 5));
    }

    #[test]
    fn files_by_version() {
        let dir = Directory::<u32>::from_json(FILES_JSON).unwrap();

        assert_eq!(dir.resolve(Version::Oot10).file_range("boot").unwrap(), (4096, 28528));
        assert_eq!(dir.resolve(Version::Mm10).file_range("boot").unwrap(), (4096, 31536));
        assert_eq!(dir.resolve(Version::Oot10).file_names().len(), 5);
        assert!(matches!(
            dir.resolve(Version::Oot10).file_range("nope"),
            Err(DirectoryError::UnknownKey(k)) if k == "nope"
        ));
    }

    #[test]
    fn nested_lookup() {
        let config = Config::load(Version::OotDebug, FILES_JSON, ADDR_JSON).unwrap();
        let addr = config.addresses();

        assert_eq!(addr.address("actor.table").unwrap(), 0x8010_DEB0);
        assert_eq!(addr.address("actor.count").unwrap(), 471);
        assert_eq!(*addr.table("actor").unwrap().value("count").unwrap(), 471);

        assert!(matches!(
            addr.address("gGameInfo"),
            Err(DirectoryError::NoValue { ref key, version: Version::OotDebug }) if key == "gGameInfo"
        ));
        assert!(matches!(
            addr.address("actor"),
            Err(DirectoryError::NotAValue(ref k)) if k == "actor"
        ));
        assert!(matches!(
            addr.address("gGameInfo.x"),
            Err(DirectoryError::NotATable(ref k)) if k == "gGameInfo"
        ));
        assert!(matches!(
            addr.address("actor.missing"),
            Err(DirectoryError::UnknownKey(ref k)) if k == "actor.missing"
        ));
    }

    #[test]
    fn bad_json() {
        assert!(matches!(
            Directory::<u32>::from_json("{ \"x\": 5 }"),
            Err(DirectoryError::Parse(_))
        ));
    }

    #[test]
    fn serializes_with_version_keys() {
        let mut dir = Directory::default();

        dir.insert(
            "x",
            Entry::Value(Versioned::new(Some(1u32)).with(Version::MmGcJ, 2)),
        );

        assert_eq!(
            serde_json::to_string(&dir).unwrap(),
            r#"{"x":{"a":1,"mgcj":2}}"#
        );
    }
}
