//! Event validation: indexed signature verification against key state.

use keystone_cesr::{Diger, Siger, Verfer};
use tracing::{debug, warn};

use crate::error::{EventError, Result};
use crate::serder::Serder;
use crate::state::KeyState;
use crate::tholder::Tholder;

/// Verify `sigers` over `ser` against `keys` and return the indices of the
/// signatures that verified.
///
/// Signatures with an index past the key list, or that fail to verify, are
/// skipped. The verified indices must satisfy `tholder`.
pub fn verify_sigers(
    ser: &[u8],
    sigers: &[Siger],
    keys: &[Verfer],
    tholder: &Tholder,
) -> Result<Vec<u32>> {
    let mut verified = Vec::with_capacity(sigers.len());
    for siger in sigers {
        let Some(verfer) = keys.get(siger.index() as usize) else {
            warn!(index = siger.index(), keys = keys.len(), "signature index out of range");
            continue;
        };
        if !verfer.verify(siger.raw(), ser) {
            warn!(index = siger.index(), key = %verfer, "signature did not verify");
            continue;
        }
        if !verified.contains(&siger.index()) {
            verified.push(siger.index());
        }
    }
    if !tholder.satisfy(&verified) {
        return Err(EventError::ThresholdUnsatisfied {
            verified: verified.len(),
            provided: sigers.len(),
        });
    }
    Ok(verified)
}

/// Prior next-key positions (`ondex`) of signatures that verified under
/// `keys`, kept only where the committed digest matches the signing key.
fn committed_ondices(
    verified: &[u32],
    sigers: &[Siger],
    keys: &[Verfer],
    ndigs: &[Diger],
) -> Vec<u32> {
    let mut ondices = Vec::new();
    for siger in sigers {
        let (index, Some(ondex)) = (siger.index(), siger.ondex()) else {
            continue;
        };
        if !verified.contains(&index) {
            continue;
        }
        let key = &keys[index as usize];
        match ndigs.get(ondex as usize) {
            Some(ndig) if ndig.verify(key.qb64().as_bytes()) => ondices.push(ondex),
            _ => warn!(index, ondex, "signature ondex does not match a committed key"),
        }
    }
    ondices
}

/// Validate a signed event and return the resulting key state.
///
/// `state` is `None` for an inception. Establishment events are signed by
/// their own keys; interactions by the current keys. Rotations must also
/// be signed by enough previously committed keys, located by each
/// signature's `ondex`, to satisfy the prior next threshold.
pub fn validate_event(
    state: Option<&KeyState>,
    serder: &Serder,
    sigers: &[Siger],
) -> Result<KeyState> {
    let next = match state {
        None => KeyState::from_inception(serder)?,
        Some(state) => state.apply(serder)?,
    };
    let verified = verify_sigers(serder.raw(), sigers, &next.keys, &next.tholder)?;

    if let Some(prior) = state {
        if serder.ilk()?.is_establishment() {
            let ondices = committed_ondices(&verified, sigers, &next.keys, &prior.ndigs);
            if !prior.ntholder.satisfy(&ondices) {
                return Err(EventError::ThresholdUnsatisfied {
                    verified: ondices.len(),
                    provided: sigers.len(),
                });
            }
        }
    }

    debug!(pre = %next.prefix, sn = %next.sn, signers = verified.len(), "validated event");
    Ok(next)
}
