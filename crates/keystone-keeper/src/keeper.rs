//! The keeper capability: create, rotate and sign with an identifier's keys.

use keystone_cesr::{Cigar, Diger, Siger, Signer, Tier, Verfer};
use serde::{Deserialize, Serialize};

use crate::creator::Algo;
use crate::error::{KeeperError, Result};

/// Parameters that locate a keeper's keys.
///
/// For salty keepers these, together with the salt, reproduce the current
/// and next keys exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperParams {
    pub algo: Algo,
    /// Identifier index under the root salt.
    pub pidx: u32,
    /// Rotation index of the current keys.
    pub ridx: u32,
    /// Key index of the first current key.
    pub kidx: u32,
    /// Number of current keys.
    pub icount: usize,
    /// Number of next keys.
    pub ncount: usize,
    pub stem: String,
    pub tier: Tier,
    pub temp: bool,
    pub transferable: bool,
}

/// Key management for one identifier.
///
/// Implementations keep their index counters behind a lock: `incept` and
/// `rotate` write, signing only reads.
pub trait Keeper: Send + Sync {
    fn algo(&self) -> Algo;

    /// Create `icount` current keys and commit to `ncount` next keys.
    ///
    /// Returns the current verifiers and the next-key digests.
    fn incept(
        &self,
        icount: usize,
        ncount: usize,
        transferable: bool,
    ) -> Result<(Vec<Verfer>, Vec<Diger>)>;

    /// Promote the committed next keys to current and commit to `ncount`
    /// new next keys.
    ///
    /// `committed` is the next-key digest list of the prior establishment
    /// event; the promoted keys must match it exactly.
    fn rotate(
        &self,
        committed: &[Diger],
        ncount: usize,
        transferable: bool,
    ) -> Result<(Vec<Verfer>, Vec<Diger>)>;

    /// Sign with every current key.
    ///
    /// `indices` overrides the key list positions (default: key order).
    /// `ondices` gives each signature's prior next-key position; `None`
    /// entries produce current-only signatures. Without `ondices` every
    /// signature uses its index as ondex.
    fn sign(
        &self,
        ser: &[u8],
        indices: Option<&[u32]>,
        ondices: Option<&[Option<u32>]>,
    ) -> Result<Vec<Siger>>;

    /// Sign with every current key without indices.
    fn sign_unindexed(&self, ser: &[u8]) -> Result<Vec<Cigar>>;

    /// Current verification keys.
    fn verfers(&self) -> Result<Vec<Verfer>>;

    /// Current next-key commitment.
    fn ndigs(&self) -> Result<Vec<Diger>>;

    fn params(&self) -> Result<KeeperParams>;
}

/// `base + by` in the `u32` index space, rejecting overflow.
pub(crate) fn advance(base: u32, by: usize) -> Result<u32> {
    u32::try_from(by)
        .ok()
        .and_then(|by| base.checked_add(by))
        .ok_or_else(|| KeeperError::InvalidParams(format!("index {base} + {by} overflows")))
}

/// Indexed signatures from `signers` with optional index overrides.
pub(crate) fn sign_indexed(
    signers: &[Signer],
    ser: &[u8],
    indices: Option<&[u32]>,
    ondices: Option<&[Option<u32>]>,
) -> Result<Vec<Siger>> {
    if signers.is_empty() {
        return Err(KeeperError::NotIncepted);
    }
    if let Some(indices) = indices {
        if indices.len() != signers.len() {
            return Err(KeeperError::InvalidParams(format!(
                "{} indices for {} signers",
                indices.len(),
                signers.len()
            )));
        }
    }
    if let Some(ondices) = ondices {
        if ondices.len() != signers.len() {
            return Err(KeeperError::InvalidParams(format!(
                "{} ondices for {} signers",
                ondices.len(),
                signers.len()
            )));
        }
    }
    signers
        .iter()
        .enumerate()
        .map(|(i, signer)| {
            let index = indices.map_or(i as u32, |idx| idx[i]);
            let siger = match ondices {
                None => signer.sign_indexed(ser, index, Some(index), false)?,
                Some(ondices) => match ondices[i] {
                    Some(ondex) => signer.sign_indexed(ser, index, Some(ondex), false)?,
                    None => signer.sign_indexed(ser, index, None, true)?,
                },
            };
            Ok(siger)
        })
        .collect()
}

/// Check `verfers` against the next-key commitment `committed`: same
/// count, and each key digests to the commitment at its position.
pub(crate) fn check_commitment(committed: &[Diger], verfers: &[Verfer]) -> Result<()> {
    if committed.len() != verfers.len() {
        return Err(KeeperError::CommitmentViolation(format!(
            "{} keys for {} committed digests",
            verfers.len(),
            committed.len()
        )));
    }
    for (i, (diger, verfer)) in committed.iter().zip(verfers).enumerate() {
        if !diger.verify(verfer.qb64().as_bytes()) {
            return Err(KeeperError::CommitmentViolation(format!(
                "key {i} ({verfer}) does not match committed digest {diger}"
            )));
        }
    }
    Ok(())
}
