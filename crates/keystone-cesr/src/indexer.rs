//! Indexed signatures.
//!
//! An indexed signature names the position of its signing key in the
//! current key list (`index`) and, for rotations, the position of that
//! key's digest in the prior next-key list (`ondex`).

use std::fmt;

use crate::b64;
use crate::codes::{idx, index_hard_size, index_sizage, IndexSizage};
use crate::error::{CesrError, Result};
use crate::matter::{pack_fixed, qb64_serde, unpack_fixed};

/// An indexed signature.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Siger {
    code: &'static str,
    raw: Vec<u8>,
    index: u32,
    ondex: Option<u32>,
}

impl Siger {
    /// Build an indexed signature, validating index limits.
    ///
    /// Current-only codes reject any `ondex`. Small "both" codes have no
    /// room for an ondex, so it defaults to `index` and must equal it.
    pub fn new(
        code: &str,
        raw: impl Into<Vec<u8>>,
        index: u32,
        ondex: Option<u32>,
    ) -> Result<Self> {
        let raw = raw.into();
        let (code, sizage) =
            index_sizage(code).ok_or_else(|| CesrError::UnknownCode(code.to_string()))?;
        if raw.len() != sizage.raw_size() {
            return Err(CesrError::RawSize {
                code: code.to_string(),
                expected: sizage.raw_size(),
                actual: raw.len(),
            });
        }
        let max = b64::max_for(sizage.ms());
        if u64::from(index) > max {
            return Err(CesrError::IndexOutOfRange {
                code: code.to_string(),
                index: u64::from(index),
                max,
            });
        }
        let ondex = check_ondex(code, &sizage, index, ondex)?;
        Ok(Self {
            code,
            raw,
            index,
            ondex,
        })
    }

    /// Pick the smallest Ed25519 code that fits both indices.
    pub fn ed25519(
        raw: impl Into<Vec<u8>>,
        index: u32,
        ondex: Option<u32>,
        current_only: bool,
    ) -> Result<Self> {
        let small = index <= 63;
        let (code, ondex) = if current_only {
            let code = if small {
                idx::ED25519_CRT_SIG
            } else {
                idx::ED25519_BIG_CRT_SIG
            };
            (code, None)
        } else if small && ondex.map_or(true, |o| o == index) {
            (idx::ED25519_SIG, Some(index))
        } else {
            (idx::ED25519_BIG_SIG, ondex.or(Some(index)))
        };
        Self::new(code, raw, index, ondex)
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn ondex(&self) -> Option<u32> {
        self.ondex
    }

    /// Whether the signature only attests to the current key list.
    pub fn is_current_only(&self) -> bool {
        idx::CURRENT_ONLY.contains(&self.code)
    }

    fn sizage(&self) -> IndexSizage {
        index_sizage(self.code).map(|(_, s)| s).unwrap_or(IndexSizage {
            hs: self.code.len(),
            ss: 0,
            os: 0,
            fs: 0,
            ls: 0,
        })
    }

    pub fn full_size(&self) -> usize {
        self.sizage().fs
    }

    pub fn qb64(&self) -> String {
        let sizage = self.sizage();
        // Limits were checked at construction.
        let index = b64::int_to_b64(u64::from(self.index), sizage.ms()).unwrap_or_default();
        let ondex =
            b64::int_to_b64(u64::from(self.ondex.unwrap_or(0)), sizage.os).unwrap_or_default();
        let both = format!("{}{index}{ondex}", self.code);
        pack_fixed(self.code, &both, &self.raw, sizage.ls).unwrap_or_default()
    }

    pub fn qb2(&self) -> Vec<u8> {
        b64::decode(&self.qb64()).unwrap_or_default()
    }

    /// Parse exactly one indexed signature from text.
    pub fn from_qb64(qb64: &str) -> Result<Self> {
        let (siger, size) = Self::parse_qb64(qb64)?;
        if size != qb64.len() {
            return Err(CesrError::MalformedText(format!(
                "{} trailing characters after indexed signature",
                qb64.len() - size
            )));
        }
        Ok(siger)
    }

    /// Parse the leading indexed signature of a text stream.
    pub fn parse_qb64(qb64: &str) -> Result<(Self, usize)> {
        let first = qb64
            .chars()
            .next()
            .ok_or(CesrError::Shortage { needed: 1 })?;
        let hs =
            index_hard_size(first).ok_or_else(|| CesrError::UnknownCode(first.to_string()))?;
        let hard = qb64
            .get(..hs)
            .ok_or(CesrError::Shortage { needed: hs })?;
        let (code, sizage) =
            index_sizage(hard).ok_or_else(|| CesrError::UnknownCode(hard.to_string()))?;
        if qb64.len() < sizage.fs {
            return Err(CesrError::Shortage {
                needed: sizage.fs - qb64.len(),
            });
        }
        let soft = qb64
            .get(sizage.hs..sizage.cs())
            .ok_or_else(|| CesrError::MalformedText("non-ascii index".into()))?;
        let index = b64::b64_to_int(&soft[..sizage.ms()])?;
        let ondex = b64::b64_to_int(&soft[sizage.ms()..])?;
        let body = qb64
            .get(sizage.cs()..sizage.fs)
            .ok_or_else(|| CesrError::MalformedText("non-ascii signature".into()))?;
        let raw = unpack_fixed(code, sizage.cs(), body, sizage.ls)?;

        let index = u32::try_from(index).map_err(|_| CesrError::IndexOutOfRange {
            code: code.to_string(),
            index,
            max: u64::from(u32::MAX),
        })?;
        let ondex = if idx::CURRENT_ONLY.contains(&code) {
            if ondex != 0 {
                return Err(CesrError::InvalidOndex {
                    code: code.to_string(),
                    reason: format!("current-only signature carries ondex {ondex}"),
                });
            }
            None
        } else if sizage.os == 0 {
            Some(index)
        } else {
            Some(u32::try_from(ondex).map_err(|_| CesrError::IndexOutOfRange {
                code: code.to_string(),
                index: ondex,
                max: u64::from(u32::MAX),
            })?)
        };
        Ok((Self::new(code, raw, index, ondex)?, sizage.fs))
    }

    pub fn from_qb2(qb2: &[u8]) -> Result<Self> {
        let (siger, size) = Self::parse_qb2(qb2)?;
        if size != qb2.len() {
            return Err(CesrError::MalformedText(format!(
                "{} trailing bytes after indexed signature",
                qb2.len() - size
            )));
        }
        Ok(siger)
    }

    pub fn parse_qb2(qb2: &[u8]) -> Result<(Self, usize)> {
        let first = b64::sniff_b2(qb2, 1)?;
        let hs = first
            .chars()
            .next()
            .and_then(index_hard_size)
            .ok_or_else(|| CesrError::UnknownCode(first.clone()))?;
        let hard = b64::sniff_b2(qb2, hs)?;
        let (_, sizage) =
            index_sizage(&hard).ok_or_else(|| CesrError::UnknownCode(hard.clone()))?;
        let bfs = sizage.fs / 4 * 3;
        if qb2.len() < bfs {
            return Err(CesrError::Shortage {
                needed: bfs - qb2.len(),
            });
        }
        let (siger, _) = Self::parse_qb64(&b64::encode(&qb2[..bfs]))?;
        Ok((siger, bfs))
    }
}

fn check_ondex(
    code: &str,
    sizage: &IndexSizage,
    index: u32,
    ondex: Option<u32>,
) -> Result<Option<u32>> {
    if idx::CURRENT_ONLY.contains(&code) {
        return match ondex {
            None => Ok(None),
            Some(o) => Err(CesrError::InvalidOndex {
                code: code.to_string(),
                reason: format!("current-only code cannot carry ondex {o}"),
            }),
        };
    }
    if sizage.os == 0 {
        let ondex = ondex.unwrap_or(index);
        if ondex != index {
            return Err(CesrError::InvalidOndex {
                code: code.to_string(),
                reason: format!("ondex {ondex} must equal index {index}"),
            });
        }
        return Ok(Some(ondex));
    }
    let ondex = ondex.unwrap_or(index);
    let max = b64::max_for(sizage.os);
    if u64::from(ondex) > max {
        return Err(CesrError::IndexOutOfRange {
            code: code.to_string(),
            index: u64::from(ondex),
            max,
        });
    }
    Ok(Some(ondex))
}

impl fmt::Debug for Siger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Siger")
            .field("code", &self.code)
            .field("index", &self.index)
            .field("ondex", &self.ondex)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Siger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64())
    }
}

qb64_serde!(Siger);
