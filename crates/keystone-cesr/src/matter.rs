//! Matter: the `(code, raw)` pair at the root of every CESR primitive.
//!
//! Text domain (qb64) framing for fixed codes:
//!
//! ```text
//! ps   = (3 - (len(raw) + ls) % 3) % 3      // pad chars, must equal cs % 4
//! qb64 = code || b64(zeros(ps + ls) || raw)[ps..]
//! ```
//!
//! Variable codes carry their size in quadlets in the soft part and need no
//! pad: `(ls + len(raw)) % 3 == 0`. The binary domain (qb2) is always the
//! base64 decoding of qb64, since every qb64 is a whole number of quadlets.

use std::fmt;

use crate::b64;
use crate::codes::{matter_hard_size, matter_sizage, mtr, Sizage};
use crate::error::{CesrError, Result};

/// Encode fixed-size material whose leading code (hard + soft) is `both`.
///
/// Shared with the indexed signature codec, which uses the same padding.
pub(crate) fn pack_fixed(code: &str, both: &str, raw: &[u8], ls: usize) -> Result<String> {
    let cs = both.len();
    let ps = (3 - (raw.len() + ls) % 3) % 3;
    if ps != cs % 4 {
        return Err(CesrError::RawSize {
            code: code.to_string(),
            expected: raw.len() + ps,
            actual: raw.len(),
        });
    }
    let mut padded = vec![0u8; ps + ls];
    padded.extend_from_slice(raw);
    let encoded = b64::encode(&padded);
    Ok(format!("{both}{}", &encoded[ps..]))
}

/// Decode the text after the code of a fixed-size material.
pub(crate) fn unpack_fixed(code: &str, cs: usize, body: &str, ls: usize) -> Result<Vec<u8>> {
    let ps = cs % 4;
    let base = format!("{}{body}", "A".repeat(ps));
    let paw = b64::decode(&base)?;
    if paw.len() < ps + ls || paw[..ps + ls].iter().any(|b| *b != 0) {
        return Err(CesrError::NonZeroPad(code.to_string()));
    }
    Ok(paw[ps + ls..].to_vec())
}

/// Cryptographic material with its derivation code.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Matter {
    code: &'static str,
    raw: Vec<u8>,
}

impl Matter {
    /// Create material from a code and raw bytes, validating the size.
    pub fn new(code: &str, raw: impl Into<Vec<u8>>) -> Result<Self> {
        let raw = raw.into();
        let (code, sizage) =
            matter_sizage(code).ok_or_else(|| CesrError::UnknownCode(code.to_string()))?;
        match sizage.raw_size() {
            Some(expected) if raw.len() != expected => Err(CesrError::RawSize {
                code: code.to_string(),
                expected,
                actual: raw.len(),
            }),
            Some(_) => Ok(Self { code, raw }),
            None => {
                check_variable(code, &sizage, raw.len())?;
                Ok(Self { code, raw })
            }
        }
    }

    /// Build from a table code and raw bytes already known to fit it.
    pub(crate) fn from_parts(code: &'static str, raw: Vec<u8>) -> Self {
        debug_assert!(Self::new(code, raw.clone()).is_ok());
        Self { code, raw }
    }

    /// Create variable sized material choosing the code variant that fits.
    ///
    /// `small` and `large` are the L0/L1/L2 triples of one family, e.g.
    /// [`mtr::STR_B64_SMALL`] and [`mtr::STR_B64_LARGE`].
    pub fn variable(
        small: [&'static str; 3],
        large: [&'static str; 3],
        raw: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let raw = raw.into();
        let ls = (3 - raw.len() % 3) % 3;
        let quadlets = (raw.len() + ls) / 3;
        let small_max = b64::max_for(2) as usize;
        let code = if quadlets <= small_max {
            small[ls]
        } else {
            large[ls]
        };
        Self::new(code, raw)
    }

    /// The derivation code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// The raw bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Consume and return the raw bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }

    fn sizage(&self) -> Sizage {
        // Codes are only ever taken from the table.
        matter_sizage(self.code)
            .map(|(_, s)| s)
            .unwrap_or(Sizage {
                hs: self.code.len(),
                ss: 0,
                fs: None,
                ls: 0,
            })
    }

    /// Hard code plus soft size field.
    pub fn both(&self) -> String {
        let sizage = self.sizage();
        if sizage.fs.is_some() {
            return self.code.to_string();
        }
        let quadlets = (self.raw.len() + sizage.ls) / 3;
        let soft = b64::int_to_b64(quadlets as u64, sizage.ss).unwrap_or_default();
        format!("{}{soft}", self.code)
    }

    /// Full size of the text encoding.
    pub fn full_size(&self) -> usize {
        let sizage = self.sizage();
        sizage
            .fs
            .unwrap_or_else(|| sizage.cs() + (self.raw.len() + sizage.ls) / 3 * 4)
    }

    /// Text domain encoding.
    pub fn qb64(&self) -> String {
        let sizage = self.sizage();
        let both = self.both();
        if sizage.fs.is_some() {
            // Size was checked at construction, so packing cannot fail.
            pack_fixed(self.code, &both, &self.raw, sizage.ls).unwrap_or_default()
        } else {
            let mut padded = vec![0u8; sizage.ls];
            padded.extend_from_slice(&self.raw);
            format!("{both}{}", b64::encode(&padded))
        }
    }

    /// Binary domain encoding.
    pub fn qb2(&self) -> Vec<u8> {
        // qb64 is always quadlet aligned, so decoding cannot fail.
        b64::decode(&self.qb64()).unwrap_or_default()
    }

    /// Parse exactly one material from text, rejecting trailing characters.
    pub fn from_qb64(qb64: &str) -> Result<Self> {
        let (matter, size) = Self::parse_qb64(qb64)?;
        if size != qb64.len() {
            return Err(CesrError::MalformedText(format!(
                "{} trailing characters after {}",
                qb64.len() - size,
                matter.code
            )));
        }
        Ok(matter)
    }

    /// Parse the leading material of a text stream.
    ///
    /// Returns the material and the number of characters consumed.
    pub fn parse_qb64(qb64: &str) -> Result<(Self, usize)> {
        let first = qb64
            .chars()
            .next()
            .ok_or(CesrError::Shortage { needed: 1 })?;
        let hs = matter_hard_size(first)
            .ok_or_else(|| CesrError::UnknownCode(first.to_string()))?;
        if qb64.len() < hs {
            return Err(CesrError::Shortage {
                needed: hs - qb64.len(),
            });
        }
        let hard = qb64
            .get(..hs)
            .ok_or_else(|| CesrError::MalformedText("non-ascii code".into()))?;
        let (code, sizage) =
            matter_sizage(hard).ok_or_else(|| CesrError::UnknownCode(hard.to_string()))?;
        let cs = sizage.cs();
        if qb64.len() < cs {
            return Err(CesrError::Shortage {
                needed: cs - qb64.len(),
            });
        }
        let fs = match sizage.fs {
            Some(fs) => fs,
            None => {
                let soft = qb64
                    .get(sizage.hs..cs)
                    .ok_or_else(|| CesrError::MalformedText("non-ascii soft size".into()))?;
                b64::b64_to_int(soft)? as usize * 4 + cs
            }
        };
        if qb64.len() < fs {
            return Err(CesrError::Shortage {
                needed: fs - qb64.len(),
            });
        }
        let body = qb64
            .get(cs..fs)
            .ok_or_else(|| CesrError::MalformedText("non-ascii body".into()))?;
        let raw = if sizage.fs.is_some() {
            unpack_fixed(code, cs, body, sizage.ls)?
        } else {
            let paw = b64::decode(body)?;
            if paw[..sizage.ls.min(paw.len())].iter().any(|b| *b != 0) {
                return Err(CesrError::NonZeroPad(code.to_string()));
            }
            paw[sizage.ls.min(paw.len())..].to_vec()
        };
        Ok((Self::new(code, raw)?, fs))
    }

    /// Parse exactly one material from binary, rejecting trailing bytes.
    pub fn from_qb2(qb2: &[u8]) -> Result<Self> {
        let (matter, size) = Self::parse_qb2(qb2)?;
        if size != qb2.len() {
            return Err(CesrError::MalformedText(format!(
                "{} trailing bytes after {}",
                qb2.len() - size,
                matter.code
            )));
        }
        Ok(matter)
    }

    /// Parse the leading material of a binary stream.
    ///
    /// Returns the material and the number of bytes consumed.
    pub fn parse_qb2(qb2: &[u8]) -> Result<(Self, usize)> {
        let first = b64::sniff_b2(qb2, 1)?;
        let hs = first
            .chars()
            .next()
            .and_then(matter_hard_size)
            .ok_or_else(|| CesrError::UnknownCode(first.clone()))?;
        let hard = b64::sniff_b2(qb2, hs)?;
        let (_, sizage) =
            matter_sizage(&hard).ok_or_else(|| CesrError::UnknownCode(hard.clone()))?;
        let fs = match sizage.fs {
            Some(fs) => fs,
            None => {
                let both = b64::sniff_b2(qb2, sizage.cs())?;
                b64::b64_to_int(&both[sizage.hs..])? as usize * 4 + sizage.cs()
            }
        };
        let bfs = fs / 4 * 3;
        if qb2.len() < bfs {
            return Err(CesrError::Shortage {
                needed: bfs - qb2.len(),
            });
        }
        let text = b64::encode(&qb2[..bfs]);
        Ok((Self::from_qb64(&text)?, bfs))
    }

    /// Whether the code is one of the digest codes.
    pub fn is_digestive(&self) -> bool {
        mtr::DIGESTS.contains(&self.code)
    }

    /// Whether a public key with this code may be rotated.
    pub fn is_transferable(&self) -> bool {
        !mtr::NON_TRANSFERABLE.contains(&self.code)
    }
}

fn check_variable(code: &str, sizage: &Sizage, len: usize) -> Result<()> {
    if (len + sizage.ls) % 3 != 0 {
        return Err(CesrError::VariableSize {
            code: code.to_string(),
            reason: format!("raw length {len} with lead {} is not 24-bit aligned", sizage.ls),
        });
    }
    let quadlets = (len + sizage.ls) / 3;
    if quadlets as u64 > b64::max_for(sizage.ss) {
        return Err(CesrError::VariableSize {
            code: code.to_string(),
            reason: format!("{quadlets} quadlets exceed soft size {}", sizage.ss),
        });
    }
    Ok(())
}

impl fmt::Debug for Matter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matter({}, {})", self.code, hex::encode(&self.raw))
    }
}

impl fmt::Display for Matter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64())
    }
}

/// Serde support as qb64 text for the typed wrappers.
macro_rules! qb64_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.qb64())
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                <$ty>::from_qb64(&text).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use qb64_serde;

qb64_serde!(Matter);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::matter_codes;

    #[test]
    fn test_ed25519_key_text_layout() {
        let matter = Matter::new(mtr::ED25519, vec![0u8; 32]).unwrap();
        let qb64 = matter.qb64();
        assert_eq!(qb64.len(), 44);
        assert_eq!(qb64, format!("D{}", "A".repeat(43)));
        assert_eq!(matter.qb2().len(), 33);
        assert_eq!(Matter::from_qb64(&qb64).unwrap(), matter);
        assert_eq!(Matter::from_qb2(&matter.qb2()).unwrap(), matter);
    }

    #[test]
    fn test_salt_text_layout() {
        let matter = Matter::new(mtr::SALT_128, vec![0u8; 16]).unwrap();
        assert_eq!(matter.qb64(), format!("0A{}", "A".repeat(22)));
    }

    #[test]
    fn test_wrong_raw_size() {
        let err = Matter::new(mtr::ED25519, vec![0u8; 31]).unwrap_err();
        assert_eq!(
            err,
            CesrError::RawSize {
                code: "D".into(),
                expected: 32,
                actual: 31
            }
        );
    }

    #[test]
    fn test_unknown_code() {
        assert!(matches!(
            Matter::new("Z", vec![0u8; 32]),
            Err(CesrError::UnknownCode(_))
        ));
        assert!(matches!(
            Matter::from_qb64("#AAA"),
            Err(CesrError::UnknownCode(_))
        ));
    }

    #[test]
    fn test_truncated_text() {
        let qb64 = Matter::new(mtr::ED25519, vec![7u8; 32]).unwrap().qb64();
        assert_eq!(
            Matter::from_qb64(&qb64[..40]),
            Err(CesrError::Shortage { needed: 4 })
        );
        assert!(matches!(
            Matter::from_qb64(&format!("{qb64}A")),
            Err(CesrError::MalformedText(_))
        ));
    }

    #[test]
    fn test_non_base64_character() {
        let mut qb64 = Matter::new(mtr::ED25519, vec![7u8; 32]).unwrap().qb64();
        qb64.replace_range(10..11, "+");
        assert_eq!(Matter::from_qb64(&qb64), Err(CesrError::InvalidBase64('+')));
    }

    #[test]
    fn test_nonzero_pad_bits_rejected() {
        // 'D' followed by '_' sets the two pad bits.
        let text = format!("D_{}", "A".repeat(42));
        assert_eq!(
            Matter::from_qb64(&text),
            Err(CesrError::NonZeroPad("D".into()))
        );
    }

    #[test]
    fn test_variable_material() {
        let matter =
            Matter::variable(mtr::BYTES_SMALL, mtr::BYTES_LARGE, b"hello".to_vec()).unwrap();
        // 5 bytes need one lead byte.
        assert_eq!(matter.code(), mtr::BYTES_L1);
        let qb64 = matter.qb64();
        assert!(qb64.starts_with("5BAC"));
        assert_eq!(qb64.len(), matter.full_size());
        assert_eq!(Matter::from_qb64(&qb64).unwrap(), matter);
        assert_eq!(Matter::from_qb2(&matter.qb2()).unwrap(), matter);
    }

    #[test]
    fn test_variable_material_big() {
        let raw = vec![1u8; 3 * 4096];
        let matter = Matter::variable(mtr::BYTES_SMALL, mtr::BYTES_LARGE, raw).unwrap();
        assert_eq!(matter.code(), mtr::BYTES_BIG_L0);
        assert_eq!(Matter::from_qb64(&matter.qb64()).unwrap(), matter);
    }

    #[test]
    fn test_variable_misaligned() {
        assert!(matches!(
            Matter::new(mtr::BYTES_L0, vec![0u8; 4]),
            Err(CesrError::VariableSize { .. })
        ));
    }

    #[test]
    fn test_parse_stream_prefix() {
        let a = Matter::new(mtr::ED25519, vec![1u8; 32]).unwrap();
        let b = Matter::new(mtr::SHORT, vec![0, 5]).unwrap();
        let stream = format!("{}{}", a.qb64(), b.qb64());
        let (first, used) = Matter::parse_qb64(&stream).unwrap();
        assert_eq!(first, a);
        let (second, _) = Matter::parse_qb64(&stream[used..]).unwrap();
        assert_eq!(second, b);
    }

    #[test]
    fn test_every_fixed_code_roundtrips() {
        for code in matter_codes() {
            let (_, sizage) = matter_sizage(code).unwrap();
            let Some(rs) = sizage.raw_size() else { continue };
            let raw: Vec<u8> = (0..rs).map(|i| (i * 7 + 3) as u8).collect();
            let matter = Matter::new(code, raw).unwrap();
            let qb64 = matter.qb64();
            assert_eq!(qb64.len(), sizage.fs.unwrap(), "{code}");
            assert_eq!(Matter::from_qb64(&qb64).unwrap(), matter, "{code}");
            assert_eq!(Matter::from_qb2(&matter.qb2()).unwrap(), matter, "{code}");
        }
    }

    #[test]
    fn test_serde_as_qb64() {
        let matter = Matter::new(mtr::BLAKE3_256, vec![9u8; 32]).unwrap();
        let json = serde_json::to_string(&matter).unwrap();
        assert_eq!(json, format!("\"{}\"", matter.qb64()));
        let back: Matter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, matter);
    }
}
