//! Signer creation strategies.
//!
//! A [`Creator`] produces batches of signers for a rotation index `ridx`
//! starting at key index `kidx`. Salty creation is deterministic: the same
//! salt and indices always give the same keys. Randy creation draws fresh
//! random seeds and cannot be repeated.

use keystone_cesr::{Salter, Signer, Tier};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::keeper::advance;

/// Key creation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algo {
    Salty,
    Randy,
    Group,
    Extern,
}

/// Where a creator derives its keys from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derivation {
    pub pidx: u32,
    pub stem: String,
    pub tier: Tier,
    pub temp: bool,
}

/// Produces signers for key indices.
pub trait Creator: Send + Sync {
    fn algo(&self) -> Algo;

    /// Derivation inputs other than the secret, if any.
    fn derivation(&self) -> Derivation {
        Derivation::default()
    }

    /// Create `count` signers at rotation `ridx`, key indices `kidx..`.
    fn create(&self, count: usize, ridx: u32, kidx: u32, transferable: bool)
        -> Result<Vec<Signer>>;
}

/// Deterministic creation by stretching an indexed path under a salt.
#[derive(Debug, Clone)]
pub struct SaltyCreator {
    salter: Salter,
    pidx: u32,
    stem: String,
    tier: Tier,
    temp: bool,
}

impl SaltyCreator {
    pub fn new(salter: Salter, pidx: u32, stem: impl Into<String>, tier: Tier, temp: bool) -> Self {
        Self {
            salter,
            pidx,
            stem: stem.into(),
            tier,
            temp,
        }
    }

    /// Derivation path of one key: `{stem}{pidx:x}{ridx:x}{kidx:x}`.
    ///
    /// The indices are joined without separators, so distinct index
    /// triples can share a path: `(pidx 1, ridx 0x10)` and
    /// `(pidx 0x11, ridx 0)` both render `110`. The format stays as is for
    /// interop with keys derived by other KERI keepers; callers that mix
    /// identifier indices above `0xf` with rotations must use distinct
    /// stems or salts to keep paths apart.
    pub fn path(&self, ridx: u32, kidx: u32) -> String {
        format!("{}{:x}{ridx:x}{kidx:x}", self.stem, self.pidx)
    }
}

impl Creator for SaltyCreator {
    fn algo(&self) -> Algo {
        Algo::Salty
    }

    fn derivation(&self) -> Derivation {
        Derivation {
            pidx: self.pidx,
            stem: self.stem.clone(),
            tier: self.tier,
            temp: self.temp,
        }
    }

    fn create(
        &self,
        count: usize,
        ridx: u32,
        kidx: u32,
        transferable: bool,
    ) -> Result<Vec<Signer>> {
        (0..count)
            .map(|i| {
                let path = self.path(ridx, advance(kidx, i)?);
                Ok(self
                    .salter
                    .signer(&path, transferable, Some(self.tier), self.temp)?)
            })
            .collect()
    }
}

/// Random creation. Seeds exist only in the keeper that holds them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandyCreator;

impl Creator for RandyCreator {
    fn algo(&self) -> Algo {
        Algo::Randy
    }

    fn create(&self, count: usize, _ridx: u32, _kidx: u32, transferable: bool) -> Result<Vec<Signer>> {
        Ok((0..count).map(|_| Signer::generate(transferable)).collect())
    }
}
