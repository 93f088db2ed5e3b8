//! Version strings and event types.
//!
//! A version string has the fixed layout `PPPPvvKKKKssssss_`: four protocol
//! characters, two hex version digits, four serialization kind characters
//! and six lowercase hex digits of total serialized size.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EventError, Result};

pub const PROTOCOL: &str = "KERI";
pub const KIND_JSON: &str = "JSON";
pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;

/// Length of a version string.
pub const VERSION_SIZE: usize = 17;

/// Largest size the six hex digits can express.
pub const MAX_EVENT_SIZE: usize = 0xff_ffff;

/// Render a KERI JSON version string for a serialization of `size` bytes.
pub fn versify(size: usize) -> Result<String> {
    if size > MAX_EVENT_SIZE {
        return Err(EventError::InvalidVersion(format!(
            "size {size} exceeds {MAX_EVENT_SIZE}"
        )));
    }
    Ok(format!(
        "{PROTOCOL}{VERSION_MAJOR:x}{VERSION_MINOR:x}{KIND_JSON}{size:06x}_"
    ))
}

/// A parsed version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub proto: String,
    pub major: u8,
    pub minor: u8,
    pub kind: String,
    pub size: usize,
}

/// Parse a version string.
pub fn deversify(vs: &str) -> Result<Version> {
    let invalid = || EventError::InvalidVersion(vs.to_string());
    if vs.len() != VERSION_SIZE || !vs.is_ascii() || !vs.ends_with('_') {
        return Err(invalid());
    }
    let proto = &vs[0..4];
    let major = u8::from_str_radix(&vs[4..5], 16).map_err(|_| invalid())?;
    let minor = u8::from_str_radix(&vs[5..6], 16).map_err(|_| invalid())?;
    let kind = &vs[6..10];
    let size_hex = &vs[10..16];
    if !size_hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(invalid());
    }
    let size = usize::from_str_radix(size_hex, 16).map_err(|_| invalid())?;
    if proto != PROTOCOL {
        return Err(EventError::InvalidVersion(format!(
            "unsupported protocol {proto:?}"
        )));
    }
    if kind != KIND_JSON {
        return Err(EventError::InvalidVersion(format!(
            "unsupported serialization {kind:?}"
        )));
    }
    if major != VERSION_MAJOR {
        return Err(EventError::InvalidVersion(format!(
            "unsupported major version {major}"
        )));
    }
    Ok(Version {
        proto: proto.to_string(),
        major,
        minor,
        kind: kind.to_string(),
        size,
    })
}

/// Key event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ilk {
    /// Inception.
    Icp,
    /// Rotation.
    Rot,
    /// Interaction.
    Ixn,
    /// Delegated inception.
    Dip,
    /// Delegated rotation.
    Drt,
}

impl Ilk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ilk::Icp => "icp",
            Ilk::Rot => "rot",
            Ilk::Ixn => "ixn",
            Ilk::Dip => "dip",
            Ilk::Drt => "drt",
        }
    }

    pub fn is_inception(&self) -> bool {
        matches!(self, Ilk::Icp | Ilk::Dip)
    }

    /// Inceptions and rotations establish key state; interactions do not.
    pub fn is_establishment(&self) -> bool {
        !matches!(self, Ilk::Ixn)
    }
}

impl fmt::Display for Ilk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ilk {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "icp" => Ok(Ilk::Icp),
            "rot" => Ok(Ilk::Rot),
            "ixn" => Ok(Ilk::Ixn),
            "dip" => Ok(Ilk::Dip),
            "drt" => Ok(Ilk::Drt),
            other => Err(EventError::InvalidField {
                field: "t".into(),
                reason: format!("unknown event type {other:?}"),
            }),
        }
    }
}
