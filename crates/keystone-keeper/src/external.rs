//! Keys held outside the process, such as in a hardware module.
//!
//! An [`ExternalKeyModule`] is injected as a trait object. Every result it
//! returns is checked against the keeper contract before use: key and
//! digest counts, the pre-rotation commitment, and signature validity.

use std::sync::{RwLock, RwLockReadGuard};

use keystone_cesr::{Cigar, Diger, Siger, Tier, Verfer};
use tracing::{debug, warn};

use crate::creator::Algo;
use crate::error::{KeeperError, Result};
use crate::keeper::{check_commitment, Keeper, KeeperParams};

/// A key store that creates keys and signs on request.
///
/// Errors are reported as text and surface as [`KeeperError::External`].
pub trait ExternalKeyModule: Send + Sync {
    /// Create current keys and next-key digests.
    fn incept(
        &self,
        icount: usize,
        ncount: usize,
        transferable: bool,
    ) -> std::result::Result<(Vec<Verfer>, Vec<Diger>), String>;

    /// Promote the next keys and create new next keys.
    fn rotate(
        &self,
        ncount: usize,
        transferable: bool,
    ) -> std::result::Result<(Vec<Verfer>, Vec<Diger>), String>;

    /// Indexed signatures by the current keys at the given positions.
    fn sign(
        &self,
        ser: &[u8],
        indices: &[u32],
        ondices: &[Option<u32>],
    ) -> std::result::Result<Vec<Siger>, String>;

    /// Unindexed signatures by the current keys.
    fn sign_unindexed(&self, ser: &[u8]) -> std::result::Result<Vec<Cigar>, String>;
}

#[derive(Default)]
struct ExternKeys {
    ridx: u32,
    verfers: Vec<Verfer>,
    ndigs: Vec<Diger>,
    transferable: bool,
}

/// Keeper over an [`ExternalKeyModule`].
pub struct ExternKeeper {
    module: Box<dyn ExternalKeyModule>,
    keys: RwLock<ExternKeys>,
}

impl ExternKeeper {
    pub fn new(module: Box<dyn ExternalKeyModule>) -> Self {
        Self {
            module,
            keys: RwLock::new(ExternKeys::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ExternKeys>> {
        self.keys.read().map_err(|_| KeeperError::Poisoned)
    }
}

fn check_counts(what: &str, verfers: usize, icount: usize, ndigs: usize, ncount: usize) -> Result<()> {
    if verfers != icount || ndigs != ncount {
        warn!(what, verfers, ndigs, icount, ncount, "external module returned wrong counts");
        return Err(KeeperError::External(format!(
            "{what} returned {verfers} keys and {ndigs} digests, expected {icount} and {ncount}"
        )));
    }
    Ok(())
}

impl Keeper for ExternKeeper {
    fn algo(&self) -> Algo {
        Algo::Extern
    }

    fn incept(
        &self,
        icount: usize,
        ncount: usize,
        transferable: bool,
    ) -> Result<(Vec<Verfer>, Vec<Diger>)> {
        let mut keys = self.keys.write().map_err(|_| KeeperError::Poisoned)?;
        if !keys.verfers.is_empty() {
            return Err(KeeperError::AlreadyIncepted);
        }
        let (verfers, ndigs) = self
            .module
            .incept(icount, ncount, transferable)
            .map_err(KeeperError::External)?;
        check_counts("incept", verfers.len(), icount, ndigs.len(), ncount)?;
        *keys = ExternKeys {
            ridx: 0,
            verfers: verfers.clone(),
            ndigs: ndigs.clone(),
            transferable,
        };
        debug!(icount, ncount, "incepted external keys");
        Ok((verfers, ndigs))
    }

    fn rotate(
        &self,
        committed: &[Diger],
        ncount: usize,
        transferable: bool,
    ) -> Result<(Vec<Verfer>, Vec<Diger>)> {
        let mut keys = self.keys.write().map_err(|_| KeeperError::Poisoned)?;
        if keys.verfers.is_empty() {
            return Err(KeeperError::NotIncepted);
        }
        if keys.ndigs.is_empty() {
            return Err(KeeperError::NonTransferable);
        }
        let (verfers, ndigs) = self
            .module
            .rotate(ncount, transferable)
            .map_err(KeeperError::External)?;
        check_counts("rotate", verfers.len(), committed.len(), ndigs.len(), ncount)?;
        if let Err(e) = check_commitment(committed, &verfers) {
            warn!(error = %e, "external rotation keys do not match commitment");
            return Err(e);
        }
        keys.ridx += 1;
        keys.verfers = verfers.clone();
        keys.ndigs = ndigs.clone();
        keys.transferable = transferable;
        debug!(ridx = keys.ridx, ncount, "rotated external keys");
        Ok((verfers, ndigs))
    }

    fn sign(
        &self,
        ser: &[u8],
        indices: Option<&[u32]>,
        ondices: Option<&[Option<u32>]>,
    ) -> Result<Vec<Siger>> {
        let keys = self.read()?;
        if keys.verfers.is_empty() {
            return Err(KeeperError::NotIncepted);
        }
        let default_indices: Vec<u32> = (0..keys.verfers.len() as u32).collect();
        let indices = indices.unwrap_or(&default_indices);
        let default_ondices: Vec<Option<u32>> = indices.iter().map(|i| Some(*i)).collect();
        let ondices = ondices.unwrap_or(&default_ondices);
        if indices.len() != keys.verfers.len() || ondices.len() != keys.verfers.len() {
            return Err(KeeperError::InvalidParams(format!(
                "{} indices and {} ondices for {} keys",
                indices.len(),
                ondices.len(),
                keys.verfers.len()
            )));
        }

        let sigers = self
            .module
            .sign(ser, indices, ondices)
            .map_err(KeeperError::External)?;
        if sigers.len() != keys.verfers.len() {
            return Err(KeeperError::External(format!(
                "sign returned {} signatures for {} keys",
                sigers.len(),
                keys.verfers.len()
            )));
        }
        for (siger, (verfer, index)) in sigers.iter().zip(keys.verfers.iter().zip(indices)) {
            if siger.index() != *index || !verfer.verify(siger.raw(), ser) {
                warn!(index, "external module returned an invalid signature");
                return Err(KeeperError::External(format!(
                    "signature at index {index} does not verify"
                )));
            }
        }
        Ok(sigers)
    }

    fn sign_unindexed(&self, ser: &[u8]) -> Result<Vec<Cigar>> {
        let keys = self.read()?;
        let cigars = self
            .module
            .sign_unindexed(ser)
            .map_err(KeeperError::External)?;
        if cigars.len() != keys.verfers.len() {
            return Err(KeeperError::External(format!(
                "sign returned {} signatures for {} keys",
                cigars.len(),
                keys.verfers.len()
            )));
        }
        let cigars: Vec<Cigar> = cigars
            .into_iter()
            .zip(&keys.verfers)
            .map(|(cigar, verfer)| cigar.with_verfer(verfer.clone()))
            .collect();
        if !cigars.iter().all(|c| c.verify(ser)) {
            return Err(KeeperError::External(
                "unindexed signature does not verify".into(),
            ));
        }
        Ok(cigars)
    }

    fn verfers(&self) -> Result<Vec<Verfer>> {
        Ok(self.read()?.verfers.clone())
    }

    fn ndigs(&self) -> Result<Vec<Diger>> {
        Ok(self.read()?.ndigs.clone())
    }

    fn params(&self) -> Result<KeeperParams> {
        let keys = self.read()?;
        Ok(KeeperParams {
            algo: Algo::Extern,
            pidx: 0,
            ridx: keys.ridx,
            kidx: 0,
            icount: keys.verfers.len(),
            ncount: keys.ndigs.len(),
            stem: String::new(),
            tier: Tier::default(),
            temp: false,
            transferable: keys.transferable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::RandyKeeper;

    /// A module backed by an in-process keeper, optionally misbehaving.
    struct Module {
        inner: RandyKeeper,
        short_incept: bool,
        forge: bool,
    }

    impl Module {
        fn honest() -> Box<Self> {
            Box::new(Self {
                inner: RandyKeeper::new(),
                short_incept: false,
                forge: false,
            })
        }
    }

    impl ExternalKeyModule for Module {
        fn incept(
            &self,
            icount: usize,
            ncount: usize,
            transferable: bool,
        ) -> std::result::Result<(Vec<Verfer>, Vec<Diger>), String> {
            let (mut verfers, ndigs) = self
                .inner
                .incept(icount, ncount, transferable)
                .map_err(|e| e.to_string())?;
            if self.short_incept {
                verfers.pop();
            }
            Ok((verfers, ndigs))
        }

        fn rotate(
            &self,
            ncount: usize,
            transferable: bool,
        ) -> std::result::Result<(Vec<Verfer>, Vec<Diger>), String> {
            let committed = self.inner.ndigs().map_err(|e| e.to_string())?;
            self.inner
                .rotate(&committed, ncount, transferable)
                .map_err(|e| e.to_string())
        }

        fn sign(
            &self,
            ser: &[u8],
            indices: &[u32],
            ondices: &[Option<u32>],
        ) -> std::result::Result<Vec<Siger>, String> {
            let ser = if self.forge { b"other".as_slice() } else { ser };
            self.inner
                .sign(ser, Some(indices), Some(ondices))
                .map_err(|e| e.to_string())
        }

        fn sign_unindexed(&self, ser: &[u8]) -> std::result::Result<Vec<Cigar>, String> {
            self.inner.sign_unindexed(ser).map_err(|e| e.to_string())
        }
    }

    #[test]
    fn test_honest_module() {
        let keeper = ExternKeeper::new(Module::honest());
        let (verfers, ndigs) = keeper.incept(2, 2, true).unwrap();
        let sigers = keeper.sign(b"evt", None, None).unwrap();
        assert!(verfers[1].verify(sigers[1].raw(), b"evt"));
        assert_eq!(keeper.sign_unindexed(b"evt").unwrap().len(), 2);
        let (rotated, _) = keeper.rotate(&ndigs, 1, true).unwrap();
        assert_eq!(rotated.len(), 2);
        assert_eq!(keeper.params().unwrap().ridx, 1);
    }

    #[test]
    fn test_wrong_counts_rejected() {
        let keeper = ExternKeeper::new(Box::new(Module {
            inner: RandyKeeper::new(),
            short_incept: true,
            forge: false,
        }));
        assert!(matches!(
            keeper.incept(2, 1, true),
            Err(KeeperError::External(_))
        ));
    }

    #[test]
    fn test_forged_signature_rejected() {
        let keeper = ExternKeeper::new(Box::new(Module {
            inner: RandyKeeper::new(),
            short_incept: false,
            forge: true,
        }));
        keeper.incept(1, 1, true).unwrap();
        assert!(matches!(
            keeper.sign(b"evt", None, None),
            Err(KeeperError::External(_))
        ));
    }

    #[test]
    fn test_rotation_checked_against_commitment() {
        let keeper = ExternKeeper::new(Module::honest());
        keeper.incept(1, 1, true).unwrap();
        let (_, foreign) = RandyKeeper::new().incept(1, 1, true).unwrap();
        assert!(matches!(
            keeper.rotate(&foreign, 1, true),
            Err(KeeperError::CommitmentViolation(_))
        ));
    }
}
