//! Digest material.

use std::fmt;

use blake2::digest::{Update, VariableOutput};
use blake2::{Blake2b512, Blake2bVar, Blake2s256};
use sha2::Digest;

use crate::codes::mtr;
use crate::error::{CesrError, Result};
use crate::matter::{qb64_serde, Matter};

/// Compute the raw digest of `ser` for a digest code.
pub fn digest(code: &str, ser: &[u8]) -> Result<Vec<u8>> {
    let raw = match code {
        mtr::BLAKE3_256 => blake3::hash(ser).as_bytes().to_vec(),
        mtr::BLAKE3_512 => {
            let mut out = vec![0u8; 64];
            let mut hasher = blake3::Hasher::new();
            hasher.update(ser);
            hasher.finalize_xof().fill(&mut out);
            out
        }
        mtr::BLAKE2B_256 => {
            let mut hasher = Blake2bVar::new(32)
                .map_err(|e| CesrError::UnsupportedCode {
                    code: format!("{code}: {e}"),
                    context: "digest",
                })?;
            Update::update(&mut hasher, ser);
            let mut out = vec![0u8; 32];
            hasher
                .finalize_variable(&mut out)
                .map_err(|e| CesrError::UnsupportedCode {
                    code: format!("{code}: {e}"),
                    context: "digest",
                })?;
            out
        }
        mtr::BLAKE2B_512 => Blake2b512::digest(ser).to_vec(),
        mtr::BLAKE2S_256 => Blake2s256::digest(ser).to_vec(),
        mtr::SHA3_256 => sha3::Sha3_256::digest(ser).to_vec(),
        mtr::SHA3_512 => sha3::Sha3_512::digest(ser).to_vec(),
        mtr::SHA2_256 => sha2::Sha256::digest(ser).to_vec(),
        mtr::SHA2_512 => sha2::Sha512::digest(ser).to_vec(),
        other => {
            return Err(CesrError::UnsupportedCode {
                code: other.to_string(),
                context: "digest",
            })
        }
    };
    Ok(raw)
}

/// A digest together with the algorithm that produced it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Diger(Matter);

impl Diger {
    /// Digest `ser` with the algorithm named by `code`.
    pub fn new(code: &str, ser: &[u8]) -> Result<Self> {
        let raw = digest(code, ser)?;
        Self::from_raw(code, raw)
    }

    /// Wrap an already computed digest.
    pub fn from_raw(code: &str, raw: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_matter(Matter::new(code, raw)?)
    }

    pub fn from_matter(matter: Matter) -> Result<Self> {
        if !matter.is_digestive() {
            return Err(CesrError::UnsupportedCode {
                code: matter.code().to_string(),
                context: "digest",
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

    /// Recompute the digest of `ser` and compare.
    ///
    /// An unsupported code never verifies.
    pub fn verify(&self, ser: &[u8]) -> bool {
        digest(self.code(), ser)
            .map(|raw| raw == self.raw())
            .unwrap_or(false)
    }

    /// Whether `other` names the same digest, possibly under another code.
    ///
    /// When codes differ, `ser` is digested with `other`'s algorithm.
    pub fn compare(&self, ser: &[u8], other: &Diger) -> bool {
        if self.code() == other.code() {
            return self.raw() == other.raw();
        }
        self.verify(ser) && other.verify(ser)
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

impl fmt::Debug for Diger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Diger({})", self.qb64())
    }
}

impl fmt::Display for Diger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64())
    }
}

qb64_serde!(Diger);
