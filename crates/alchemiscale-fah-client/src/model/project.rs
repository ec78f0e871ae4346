// Work server project model types

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

/// Work unit compression applied by the work server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompressionType {
    None,
    Bzip2,
    #[default]
    Zlib,
    Gzip,
    Lz4,
}

impl CompressionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionType::None => "NONE",
            CompressionType::Bzip2 => "BZIP2",
            CompressionType::Zlib => "ZLIB",
            CompressionType::Gzip => "GZIP",
            CompressionType::Lz4 => "LZ4",
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(CompressionType::None),
            "BZIP2" => Ok(CompressionType::Bzip2),
            "ZLIB" => Ok(CompressionType::Zlib),
            "GZIP" => Ok(CompressionType::Gzip),
            "LZ4" => Ok(CompressionType::Lz4),
            other => Err(format!("unknown compression type: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for CompressionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// FAH core identifier, e.g. `0xa8`.
///
/// The work server speaks hex strings; integers are accepted on input too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoreId(pub u32);

impl CoreId {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for CoreId {
    fn from(value: u32) -> Self {
        CoreId(value)
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl FromStr for CoreId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse::<u32>(),
        };
        parsed
            .map(CoreId)
            .map_err(|_| format!("invalid core id: {s}"))
    }
}

impl Serialize for CoreId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CoreId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoreIdVisitor;

        impl Visitor<'_> for CoreIdVisitor {
            type Value = CoreId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a core id as an integer or hex string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CoreId, E> {
                u32::try_from(v)
                    .map(CoreId)
                    .map_err(|_| E::custom(format!("core id out of range: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<CoreId, E> {
                u32::try_from(v)
                    .map(CoreId)
                    .map_err(|_| E::custom(format!("core id out of range: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CoreId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(CoreIdVisitor)
    }
}

fn default_gens() -> u64 {
    1
}

fn default_timeout() -> f64 {
    86400.0
}

fn default_deadline() -> f64 {
    172800.0
}

/// Project attributes held by the work server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProjectData {
    /// The core ID, e.g. 0xa8
    pub core_id: CoreId,
    /// Email of the person responsible for the project
    #[validate(email)]
    pub contact: String,
    /// The number of runs
    #[serde(default)]
    pub runs: u64,
    /// The number of clones
    #[serde(default)]
    pub clones: u64,
    /// Maximum number of generations per job
    #[serde(default = "default_gens")]
    #[validate(range(min = 1))]
    pub gens: u64,
    /// Approximate number of atoms in the simulations
    pub atoms: u64,
    /// The base credit awarded for the WU
    pub credit: u64,
    /// Seconds before the WU can be reassigned
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    /// Seconds in which the WU can be returned for credit
    #[serde(default = "default_deadline")]
    pub deadline: f64,
    #[serde(default)]
    pub compression: CompressionType,
}

impl ProjectData {
    /// Project with the work server defaults for every optional field
    pub fn new(core_id: impl Into<CoreId>, contact: &str, atoms: u64, credit: u64) -> Self {
        Self {
            core_id: core_id.into(),
            contact: contact.to_string(),
            runs: 0,
            clones: 0,
            gens: default_gens(),
            atoms,
            credit,
            timeout: default_timeout(),
            deadline: default_deadline(),
            compression: CompressionType::default(),
        }
    }
}

/// Metadata alchemiscale keeps alongside a FAH project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FahProject {
    pub project_id: u64,
    pub n_atoms: u64,
    pub nonbonded_settings: NonbondedSettings,
}

/// Nonbonded treatment the project's systems were prepared with
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NonbondedSettings {
    NoCutoff,
    PME,
}
