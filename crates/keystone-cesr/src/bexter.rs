//! Variable length base64 text carried as material.
//!
//! The text is decoded as if it were base64 so that it packs into the
//! fewest raw bytes. Round trips are exact except for one documented
//! ambiguity: text that is a whole number of quadlets and begins with one
//! or more `'A'` characters loses those leading `'A'`s, since they decode
//! to the same zero bits as the lead bytes.

use std::fmt;

use crate::b64;
use crate::codes::{matter_sizage, mtr};
use crate::error::{CesrError, Result};
use crate::matter::{qb64_serde, Matter};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bexter(Matter);

impl Bexter {
    /// Pack base64url text.
    pub fn new(bext: &str) -> Result<Self> {
        let raw = rawify(bext)?;
        Ok(Self(Matter::variable(
            mtr::STR_B64_SMALL,
            mtr::STR_B64_LARGE,
            raw,
        )?))
    }

    pub fn from_matter(matter: Matter) -> Result<Self> {
        if !mtr::STR_B64_SMALL.contains(&matter.code())
            && !mtr::STR_B64_LARGE.contains(&matter.code())
        {
            return Err(CesrError::UnsupportedCode {
                code: matter.code().to_string(),
                context: "base64 text",
            });
        }
        Ok(Self(matter))
    }

    pub fn from_qb64(qb64: &str) -> Result<Self> {
        Self::from_matter(Matter::from_qb64(qb64)?)
    }

    pub fn from_qb2(qb2: &[u8]) -> Result<Self> {
        Self::from_matter(Matter::from_qb2(qb2)?)
    }

    /// Recover the text.
    pub fn bext(&self) -> String {
        let ls = matter_sizage(self.0.code())
            .map(|(_, s)| s.ls)
            .unwrap_or(0);
        let mut padded = vec![0u8; ls];
        padded.extend_from_slice(self.0.raw());
        let text = b64::encode(&padded);
        let strip = match ls {
            0 if text.starts_with('A') => 1,
            0 => 0,
            _ => (ls + 1) % 4,
        };
        text[strip.min(text.len())..].to_string()
    }

    pub fn code(&self) -> &'static str {
        self.0.code()
    }

    pub fn raw(&self) -> &[u8] {
        self.0.raw()
    }

    pub fn qb64(&self) -> String {
        self.0.qb64()
    }

    pub fn qb2(&self) -> Vec<u8> {
        self.0.qb2()
    }

    pub fn as_matter(&self) -> &Matter {
        &self.0
    }
}

/// Convert base64url text to the raw bytes it packs into.
///
/// The text is left padded with `'A'` to a quadlet boundary, decoded, and
/// stripped of the lead bytes the padding produced.
pub fn rawify(bext: &str) -> Result<Vec<u8>> {
    b64::check_chars(bext)?;
    let ts = bext.len() % 4;
    let ws = (4 - ts) % 4;
    let ls = (3 - ts) % 3;
    let base = format!("{}{bext}", "A".repeat(ws));
    let raw = b64::decode(&base)?;
    Ok(raw[ls.min(raw.len())..].to_vec())
}

impl fmt::Debug for Bexter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bexter({:?})", self.bext())
    }
}

impl fmt::Display for Bexter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64())
    }
}

qb64_serde!(Bexter);
