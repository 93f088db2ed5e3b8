//! Keys, signatures and salts.
//!
//! Wraps Ed25519 signing and Argon2id seed stretching with CESR-coded
//! strong types.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::codes::mtr;
use crate::error::{CesrError, Result};
use crate::indexer::Siger;
use crate::matter::{qb64_serde, Matter};

/// A public verification key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Verfer(Matter);

impl Verfer {
    pub fn new(code: &str, raw: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_matter(Matter::new(code, raw)?)
    }

    pub fn from_matter(matter: Matter) -> Result<Self> {
        if !mtr::VERIFIERS.contains(&matter.code()) {
            return Err(CesrError::UnsupportedCode {
                code: matter.code().to_string(),
                context: "verification key",
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

    /// Verify a raw signature over `ser`.
    ///
    /// Returns `false` for bad signatures and for key types this build
    /// cannot verify.
    pub fn verify(&self, sig: &[u8], ser: &[u8]) -> bool {
        match self.code() {
            mtr::ED25519 | mtr::ED25519N => verify_ed25519(self.raw(), sig, ser),
            _ => false,
        }
    }

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

    pub fn as_matter(&self) -> &Matter {
        &self.0
    }
}

fn verify_ed25519(key: &[u8], sig: &[u8], ser: &[u8]) -> bool {
    let Ok(key) = <[u8; 32]>::try_from(key) else {
        return false;
    };
    let Ok(sig) = <[u8; 64]>::try_from(sig) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key) else {
        return false;
    };
    verifying_key
        .verify(ser, &Signature::from_bytes(&sig))
        .is_ok()
}

impl fmt::Debug for Verfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Verfer({})", self.qb64())
    }
}

impl fmt::Display for Verfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64())
    }
}

qb64_serde!(Verfer);

/// A non-indexed signature, optionally paired with the key that made it.
#[derive(Clone, PartialEq, Eq)]
pub struct Cigar {
    matter: Matter,
    verfer: Option<Verfer>,
}

impl Cigar {
    pub fn new(code: &str, raw: impl Into<Vec<u8>>, verfer: Option<Verfer>) -> Result<Self> {
        let matter = Matter::new(code, raw)?;
        if matter.code() != mtr::ED25519_SIG {
            return Err(CesrError::UnsupportedCode {
                code: matter.code().to_string(),
                context: "signature",
            });
        }
        Ok(Self { matter, verfer })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self> {
        let matter = Matter::from_qb64(qb64)?;
        Self::new(matter.code(), matter.into_raw(), None)
    }

    pub fn verfer(&self) -> Option<&Verfer> {
        self.verfer.as_ref()
    }

    pub fn with_verfer(mut self, verfer: Verfer) -> Self {
        self.verfer = Some(verfer);
        self
    }

    /// Verify against the paired key, if any.
    pub fn verify(&self, ser: &[u8]) -> bool {
        self.verfer
            .as_ref()
            .is_some_and(|verfer| verfer.verify(self.raw(), ser))
    }

    pub fn code(&self) -> &'static str {
        self.matter.code()
    }

    pub fn raw(&self) -> &[u8] {
        self.matter.raw()
    }

    pub fn qb64(&self) -> String {
        self.matter.qb64()
    }

    pub fn qb2(&self) -> Vec<u8> {
        self.matter.qb2()
    }
}

impl fmt::Debug for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cigar({}...)", &self.qb64()[..16])
    }
}

/// A private signing key.
///
/// The seed is zeroized on drop by `ed25519-dalek`.
#[derive(Clone)]
pub struct Signer {
    signing_key: SigningKey,
    verfer: Verfer,
}

impl Signer {
    /// Generate a new random signer.
    pub fn generate(transferable: bool) -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self::from_signing_key(signing_key, transferable)
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32], transferable: bool) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed), transferable)
    }

    /// Parse a qb64 seed (code `A`).
    pub fn from_qb64(qb64: &str, transferable: bool) -> Result<Self> {
        let matter = Matter::from_qb64(qb64)?;
        if matter.code() != mtr::ED25519_SEED {
            return Err(CesrError::UnsupportedCode {
                code: matter.code().to_string(),
                context: "signing seed",
            });
        }
        let seed = Zeroizing::new(
            <[u8; 32]>::try_from(matter.raw())
                .map_err(|_| CesrError::InvalidKey("seed must be 32 bytes".into()))?,
        );
        Ok(Self::from_seed(&seed, transferable))
    }

    fn from_signing_key(signing_key: SigningKey, transferable: bool) -> Self {
        let code = if transferable {
            mtr::ED25519
        } else {
            mtr::ED25519N
        };
        let raw = signing_key.verifying_key().to_bytes().to_vec();
        let verfer = Verfer(Matter::from_parts(code, raw));
        Self {
            signing_key,
            verfer,
        }
    }

    pub fn verfer(&self) -> &Verfer {
        &self.verfer
    }

    /// The qb64 of the seed. Handle with care.
    pub fn qb64(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.signing_key.to_bytes().to_vec());
        Zeroizing::new(Matter::from_parts(mtr::ED25519_SEED, seed.to_vec()).qb64())
    }

    /// Sign without an index.
    pub fn sign(&self, ser: &[u8]) -> Cigar {
        let sig = self.signing_key.sign(ser);
        Cigar {
            matter: Matter::from_parts(mtr::ED25519_SIG, sig.to_bytes().to_vec()),
            verfer: Some(self.verfer.clone()),
        }
    }

    /// Sign and attach key list positions.
    pub fn sign_indexed(
        &self,
        ser: &[u8],
        index: u32,
        ondex: Option<u32>,
        current_only: bool,
    ) -> Result<Siger> {
        let sig = self.signing_key.sign(ser);
        Siger::ed25519(sig.to_bytes().to_vec(), index, ondex, current_only)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer({})", self.verfer.qb64())
    }
}

/// Argon2id work factor used when stretching a salt into a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Low,
    Med,
    High,
}

impl Tier {
    /// `(time cost, memory cost in KiB)`.
    fn costs(self, temp: bool) -> (u32, u32) {
        if temp {
            return (1, 8);
        }
        match self {
            Tier::Low => (2, 65_536),
            Tier::Med => (3, 262_144),
            Tier::High => (4, 1_048_576),
        }
    }
}

/// A 128 bit salt for deterministic key derivation.
#[derive(Clone)]
pub struct Salter {
    raw: Zeroizing<Vec<u8>>,
    tier: Tier,
}

impl Salter {
    pub const RAW_SIZE: usize = 16;

    /// Generate a random salt.
    pub fn generate(tier: Tier) -> Self {
        let mut raw = Zeroizing::new(vec![0u8; Self::RAW_SIZE]);
        rand::thread_rng().fill_bytes(&mut raw);
        Self { raw, tier }
    }

    pub fn from_raw(raw: &[u8], tier: Tier) -> Result<Self> {
        if raw.len() != Self::RAW_SIZE {
            return Err(CesrError::RawSize {
                code: mtr::SALT_128.to_string(),
                expected: Self::RAW_SIZE,
                actual: raw.len(),
            });
        }
        Ok(Self {
            raw: Zeroizing::new(raw.to_vec()),
            tier,
        })
    }

    pub fn from_qb64(qb64: &str, tier: Tier) -> Result<Self> {
        let matter = Matter::from_qb64(qb64)?;
        if matter.code() != mtr::SALT_128 {
            return Err(CesrError::UnsupportedCode {
                code: matter.code().to_string(),
                context: "salt",
            });
        }
        Self::from_raw(matter.raw(), tier)
    }

    /// Build a salt from a 21 character passcode.
    ///
    /// Characters past the 21st are ignored.
    pub fn from_passcode(bran: &str, tier: Tier) -> Result<Self> {
        let bran = bran
            .get(..21)
            .ok_or_else(|| CesrError::InvalidKey("passcode needs at least 21 characters".into()))?;
        Self::from_qb64(&format!("{}A{bran}", mtr::SALT_128), tier)
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn qb64(&self) -> Zeroizing<String> {
        Zeroizing::new(Matter::from_parts(mtr::SALT_128, self.raw.to_vec()).qb64())
    }

    /// Stretch `path` under this salt into `size` bytes with Argon2id.
    pub fn stretch(
        &self,
        path: &str,
        size: usize,
        tier: Option<Tier>,
        temp: bool,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let (t_cost, m_cost) = tier.unwrap_or(self.tier).costs(temp);
        let params = Params::new(m_cost, t_cost, 1, Some(size))
            .map_err(|e| CesrError::Stretch(e.to_string()))?;
        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut out = Zeroizing::new(vec![0u8; size]);
        argon
            .hash_password_into(path.as_bytes(), &self.raw, &mut out)
            .map_err(|e| CesrError::Stretch(e.to_string()))?;
        Ok(out)
    }

    /// Derive one signer from `path`.
    pub fn signer(
        &self,
        path: &str,
        transferable: bool,
        tier: Option<Tier>,
        temp: bool,
    ) -> Result<Signer> {
        let seed = self.stretch(path, 32, tier, temp)?;
        let seed: &[u8; 32] = seed
            .as_slice()
            .try_into()
            .map_err(|_| CesrError::Stretch("seed must be 32 bytes".into()))?;
        Ok(Signer::from_seed(seed, transferable))
    }
}

impl fmt::Debug for Salter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Salter")
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}
