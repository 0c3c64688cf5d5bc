//! FourCC value and database entry types
//!
//! A FourCC is four bytes packed big-endian into a `u32`, the way media
//! framework APIs compare and store pixel formats, codec types and
//! transport types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Four-character code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// Create a FourCC from its four bytes
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Unpack a raw 32-bit value, most significant byte first
    pub const fn from_raw(value: u32) -> Self {
        Self([
            ((value >> 24) & 0xff) as u8,
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ])
    }

    /// Create a FourCC from a byte slice that must be exactly four bytes long
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 4]>::try_from(bytes).ok().map(Self)
    }

    /// Packed big-endian value: `(c0 << 24) | (c1 << 16) | (c2 << 8) | c3`
    pub const fn raw(&self) -> u32 {
        ((self.0[0] as u32) << 24)
            | ((self.0[1] as u32) << 16)
            | ((self.0[2] as u32) << 8)
            | (self.0[3] as u32)
    }

    /// The four bytes
    pub const fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// Map each byte to the Latin-1 character with the same code point
    pub fn as_latin1(&self) -> String {
        self.0.iter().map(|&b| char::from(b)).collect()
    }

    /// Whether all four bytes are printable ASCII (space through tilde)
    pub fn is_printable_ascii(&self) -> bool {
        self.0.iter().all(|b| (0x20..=0x7e).contains(b))
    }
}

impl From<u32> for FourCc {
    fn from(value: u32) -> Self {
        Self::from_raw(value)
    }
}

impl From<FourCc> for u32 {
    fn from(fcc: FourCc) -> Self {
        fcc.raw()
    }
}

impl FromStr for FourCc {
    type Err = Error;

    /// Parse exactly four characters, each in the Latin-1 range
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 4];
        let mut count = 0;

        for c in s.chars() {
            if count == 4 {
                return Err(Error::InvalidFourCc(s.to_string()));
            }
            bytes[count] = u8::try_from(u32::from(c))
                .map_err(|_| Error::InvalidFourCc(s.to_string()))?;
            count += 1;
        }

        if count != 4 {
            return Err(Error::InvalidFourCc(s.to_string()));
        }

        Ok(Self(bytes))
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_printable_ascii() {
            write!(f, "{}", self.as_latin1())
        } else {
            write!(f, "0x{:08x}", self.raw())
        }
    }
}

/// One row of the FourCC database
///
/// The raw value is always derived from the stored FourCC, so an entry can
/// never carry a value inconsistent with its characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntryRecord", into = "EntryRecord")]
pub struct FourCcEntry {
    constant_name: String,
    four_cc: FourCc,
}

impl FourCcEntry {
    /// Create an entry for a constant
    pub fn new(constant_name: impl Into<String>, four_cc: FourCc) -> Self {
        Self {
            constant_name: constant_name.into(),
            four_cc,
        }
    }

    /// Symbolic constant name as it appeared in the expanded headers
    pub fn constant_name(&self) -> &str {
        &self.constant_name
    }

    /// The FourCC value
    pub fn four_cc(&self) -> FourCc {
        self.four_cc
    }

    /// Packed big-endian value
    pub fn raw_value(&self) -> u32 {
        self.four_cc.raw()
    }
}

/// Wire shape of an entry in the JSON database
#[derive(Serialize, Deserialize)]
struct EntryRecord {
    #[serde(rename = "constantName")]
    constant_name: String,
    #[serde(rename = "fourCC")]
    four_cc: String,
    #[serde(rename = "rawValue")]
    raw_value: u32,
}

impl From<FourCcEntry> for EntryRecord {
    fn from(entry: FourCcEntry) -> Self {
        Self {
            four_cc: entry.four_cc.as_latin1(),
            raw_value: entry.four_cc.raw(),
            constant_name: entry.constant_name,
        }
    }
}

impl TryFrom<EntryRecord> for FourCcEntry {
    type Error = Error;

    fn try_from(record: EntryRecord) -> Result<Self, Self::Error> {
        let four_cc: FourCc = record.four_cc.parse()?;
        if four_cc.raw() != record.raw_value {
            return Err(Error::InconsistentEntry {
                name: record.constant_name,
                four_cc: record.four_cc,
                raw_value: record.raw_value,
                expected: four_cc.raw(),
            });
        }

        Ok(Self {
            constant_name: record.constant_name,
            four_cc,
        })
    }
}
