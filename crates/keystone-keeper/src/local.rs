//! Keepers that hold their signing keys in process.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use keystone_cesr::{mtr, Cigar, Diger, Salter, Siger, Signer, Tier, Verfer};
use keystone_event::next_digests;
use tracing::{debug, warn};

use crate::creator::{Algo, Creator, RandyCreator, SaltyCreator};
use crate::error::{KeeperError, Result};
use crate::keeper::{advance, check_commitment, sign_indexed, Keeper, KeeperParams};

/// Salt-derived keys, recoverable from the salt and [`KeeperParams`].
pub type SaltyKeeper = LocalKeeper<SaltyCreator>;

/// Randomly generated keys with no recovery path.
pub type RandyKeeper = LocalKeeper<RandyCreator>;

#[derive(Default)]
struct Keys {
    ridx: u32,
    kidx: u32,
    signers: Vec<Signer>,
    nsigners: Vec<Signer>,
    ndigs: Vec<Diger>,
    transferable: bool,
}

/// A keeper holding current and next signers created by `C`.
///
/// Current keys live at rotation index `ridx` starting at key index
/// `kidx`; the committed next keys at `ridx + 1` starting right after the
/// current ones.
pub struct LocalKeeper<C: Creator> {
    creator: C,
    ndig_code: &'static str,
    keys: RwLock<Keys>,
}

impl<C: Creator> LocalKeeper<C> {
    /// A keeper committing next keys with digests of `ndig_code`.
    pub fn with_creator(creator: C, ndig_code: &'static str) -> Self {
        Self {
            creator,
            ndig_code,
            keys: RwLock::new(Keys::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Keys>> {
        self.keys.read().map_err(|_| KeeperError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Keys>> {
        self.keys.write().map_err(|_| KeeperError::Poisoned)
    }

    fn digests(&self, signers: &[Signer]) -> Result<Vec<Diger>> {
        let verfers: Vec<Verfer> = signers.iter().map(|s| s.verfer().clone()).collect();
        Ok(next_digests(&verfers, self.ndig_code)?)
    }
}

impl SaltyKeeper {
    /// A salty keeper for identifier index `pidx` under `salter`.
    pub fn new(salter: Salter, pidx: u32, stem: impl Into<String>, tier: Tier, temp: bool) -> Self {
        Self::with_creator(
            SaltyCreator::new(salter, pidx, stem, tier, temp),
            mtr::BLAKE3_256,
        )
    }

    /// Recreate a salty keeper at the position recorded in `params`.
    pub fn restore(salter: Salter, params: &KeeperParams, ndig_code: &'static str) -> Result<Self> {
        if params.algo != Algo::Salty {
            return Err(KeeperError::InvalidParams(format!(
                "cannot restore {:?} keys from a salt",
                params.algo
            )));
        }
        let creator = SaltyCreator::new(
            salter,
            params.pidx,
            params.stem.clone(),
            params.tier,
            params.temp,
        );
        let signers = creator.create(params.icount, params.ridx, params.kidx, params.transferable)?;
        let nsigners = creator.create(
            params.ncount,
            advance(params.ridx, 1)?,
            advance(params.kidx, params.icount)?,
            params.transferable,
        )?;
        let keeper = Self::with_creator(creator, ndig_code);
        let ndigs = keeper.digests(&nsigners)?;
        *keeper.write()? = Keys {
            ridx: params.ridx,
            kidx: params.kidx,
            signers,
            nsigners,
            ndigs,
            transferable: params.transferable,
        };
        Ok(keeper)
    }
}

impl RandyKeeper {
    pub fn new() -> Self {
        Self::with_creator(RandyCreator, mtr::BLAKE3_256)
    }
}

impl Default for RandyKeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Creator> Keeper for LocalKeeper<C> {
    fn algo(&self) -> Algo {
        self.creator.algo()
    }

    fn incept(
        &self,
        icount: usize,
        ncount: usize,
        transferable: bool,
    ) -> Result<(Vec<Verfer>, Vec<Diger>)> {
        if icount == 0 {
            return Err(KeeperError::InvalidParams(
                "at least one current key is required".into(),
            ));
        }
        if !transferable && ncount > 0 {
            return Err(KeeperError::InvalidParams(
                "non-transferable keys cannot commit next keys".into(),
            ));
        }
        let mut keys = self.write()?;
        if !keys.signers.is_empty() {
            return Err(KeeperError::AlreadyIncepted);
        }
        let signers = self.creator.create(icount, 0, 0, transferable)?;
        let nsigners = self.creator.create(ncount, 1, advance(0, icount)?, transferable)?;
        let ndigs = self.digests(&nsigners)?;
        *keys = Keys {
            ridx: 0,
            kidx: 0,
            signers,
            nsigners,
            ndigs: ndigs.clone(),
            transferable,
        };
        debug!(algo = ?self.creator.algo(), icount, ncount, "incepted keys");
        Ok((keys.signers.iter().map(|s| s.verfer().clone()).collect(), ndigs))
    }

    fn rotate(
        &self,
        committed: &[Diger],
        ncount: usize,
        transferable: bool,
    ) -> Result<(Vec<Verfer>, Vec<Diger>)> {
        let mut keys = self.write()?;
        if keys.signers.is_empty() {
            return Err(KeeperError::NotIncepted);
        }
        if keys.nsigners.is_empty() {
            return Err(KeeperError::NonTransferable);
        }
        if !transferable && ncount > 0 {
            return Err(KeeperError::InvalidParams(
                "non-transferable keys cannot commit next keys".into(),
            ));
        }
        let promoted: Vec<Verfer> = keys.nsigners.iter().map(|s| s.verfer().clone()).collect();
        if let Err(e) = check_commitment(committed, &promoted) {
            warn!(ridx = keys.ridx.saturating_add(1), error = %e, "rotation keys do not match commitment");
            return Err(e);
        }

        let ridx = advance(keys.ridx, 1)?;
        let kidx = advance(keys.kidx, keys.signers.len())?;
        let nsigners = self.creator.create(
            ncount,
            advance(ridx, 1)?,
            advance(kidx, promoted.len())?,
            transferable,
        )?;
        let ndigs = self.digests(&nsigners)?;

        // Prior signing keys are dropped here and never used again.
        let signers = std::mem::replace(&mut keys.nsigners, nsigners);
        keys.signers = signers;
        keys.ndigs = ndigs.clone();
        keys.ridx = ridx;
        keys.kidx = kidx;
        keys.transferable = transferable;
        debug!(algo = ?self.creator.algo(), ridx, kidx, ncount, "rotated keys");
        Ok((promoted, ndigs))
    }

    fn sign(
        &self,
        ser: &[u8],
        indices: Option<&[u32]>,
        ondices: Option<&[Option<u32>]>,
    ) -> Result<Vec<Siger>> {
        sign_indexed(&self.read()?.signers, ser, indices, ondices)
    }

    fn sign_unindexed(&self, ser: &[u8]) -> Result<Vec<Cigar>> {
        let keys = self.read()?;
        if keys.signers.is_empty() {
            return Err(KeeperError::NotIncepted);
        }
        Ok(keys.signers.iter().map(|s| s.sign(ser)).collect())
    }

    fn verfers(&self) -> Result<Vec<Verfer>> {
        Ok(self.read()?.signers.iter().map(|s| s.verfer().clone()).collect())
    }

    fn ndigs(&self) -> Result<Vec<Diger>> {
        Ok(self.read()?.ndigs.clone())
    }

    fn params(&self) -> Result<KeeperParams> {
        let keys = self.read()?;
        let derivation = self.creator.derivation();
        Ok(KeeperParams {
            algo: self.creator.algo(),
            pidx: derivation.pidx,
            ridx: keys.ridx,
            kidx: keys.kidx,
            icount: keys.signers.len(),
            ncount: keys.nsigners.len(),
            stem: derivation.stem,
            tier: derivation.tier,
            temp: derivation.temp,
            transferable: keys.transferable,
        })
    }
}
