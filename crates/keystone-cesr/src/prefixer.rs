//! Identifier prefixes.

use std::fmt;

use crate::codes::mtr;
use crate::crypto::Verfer;
use crate::diger::Diger;
use crate::error::{CesrError, Result};
use crate::matter::{qb64_serde, Matter};

/// An identifier prefix: either a public key ("basic") or a digest of the
/// inception event ("self-addressing").
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Prefixer(Matter);

impl Prefixer {
    pub fn from_matter(matter: Matter) -> Result<Self> {
        if !matter.is_digestive() && !mtr::VERIFIERS.contains(&matter.code()) {
            return Err(CesrError::UnsupportedCode {
                code: matter.code().to_string(),
                context: "identifier prefix",
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

    /// Whether this prefix is a digest.
    pub fn is_digestive(&self) -> bool {
        self.0.is_digestive()
    }

    /// Whether the controlling keys of this prefix may rotate.
    ///
    /// Self-addressing prefixes are always transferable.
    pub fn is_transferable(&self) -> bool {
        self.0.is_transferable()
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
}

impl From<Diger> for Prefixer {
    fn from(diger: Diger) -> Self {
        Self(diger.as_matter().clone())
    }
}

impl From<Verfer> for Prefixer {
    fn from(verfer: Verfer) -> Self {
        Self(verfer.as_matter().clone())
    }
}

impl fmt::Debug for Prefixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prefixer({})", self.qb64())
    }
}

impl fmt::Display for Prefixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64())
    }
}

qb64_serde!(Prefixer);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_kinds() {
        let diger = Diger::new(mtr::BLAKE3_256, b"icp").unwrap();
        let prefixer = Prefixer::from(diger.clone());
        assert!(prefixer.is_digestive());
        assert!(prefixer.is_transferable());
        assert_eq!(prefixer.qb64(), diger.qb64());

        let basic = Verfer::new(mtr::ED25519N, vec![1u8; 32]).unwrap();
        let prefixer = Prefixer::from(basic);
        assert!(!prefixer.is_digestive());
        assert!(!prefixer.is_transferable());
    }

    #[test]
    fn test_rejects_other_material() {
        let salt = Matter::new(mtr::SALT_128, vec![0u8; 16]).unwrap();
        assert!(Prefixer::from_qb64(&salt.qb64()).is_err());
    }
}
