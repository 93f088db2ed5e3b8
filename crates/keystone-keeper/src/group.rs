//! Group (multi-member) identifiers.
//!
//! Each member holds its own keys in a local keeper. The group identifier's
//! key list is the concatenation of member keys, so a member signs at the
//! position its key occupies in the group list (`index`) and, after a
//! rotation, at the position its key's digest occupied in the prior group
//! next list (`ondex`).

use std::sync::{Arc, RwLock, RwLockReadGuard};

use keystone_cesr::{Cigar, Diger, Siger, Verfer};
use tracing::debug;

use crate::creator::Algo;
use crate::error::{KeeperError, Result};
use crate::keeper::{Keeper, KeeperParams};

struct GroupKeys {
    keys: Vec<Verfer>,
    ndigs: Vec<Diger>,
    prior: Vec<Diger>,
}

/// A member's view of a group identifier.
pub struct GroupKeeper {
    member: Arc<dyn Keeper>,
    group: RwLock<GroupKeys>,
}

impl GroupKeeper {
    /// Wrap an incepted member keeper with the group's current keys and
    /// next digests. The member's keys must appear in both lists.
    pub fn new(member: Arc<dyn Keeper>, keys: Vec<Verfer>, ndigs: Vec<Diger>) -> Result<Self> {
        check_membership(member.as_ref(), &keys, &ndigs)?;
        Ok(Self {
            member,
            group: RwLock::new(GroupKeys {
                keys,
                ndigs,
                prior: Vec::new(),
            }),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, GroupKeys>> {
        self.group.read().map_err(|_| KeeperError::Poisoned)
    }

    /// Install the group lists of a completed group rotation. The previous
    /// next digests become the prior commitment used for ondices.
    pub fn update(&self, keys: Vec<Verfer>, ndigs: Vec<Diger>) -> Result<()> {
        check_membership(self.member.as_ref(), &keys, &ndigs)?;
        let mut group = self.group.write().map_err(|_| KeeperError::Poisoned)?;
        let prior = std::mem::replace(&mut group.ndigs, ndigs);
        group.prior = prior;
        group.keys = keys;
        debug!(keys = group.keys.len(), "updated group keys");
        Ok(())
    }

    /// Group positions of the member's current keys: indices into the
    /// group key list and ondices into the prior group next list.
    pub fn positions(&self) -> Result<(Vec<u32>, Vec<Option<u32>>)> {
        let group = self.read()?;
        let mut indices = Vec::new();
        let mut ondices = Vec::new();
        for verfer in self.member.verfers()? {
            let index = group
                .keys
                .iter()
                .position(|k| *k == verfer)
                .ok_or_else(|| KeeperError::NotGroupMember(verfer.qb64()))?;
            let ser = verfer.qb64();
            let ondex = group.prior.iter().position(|d| d.verify(ser.as_bytes()));
            indices.push(index as u32);
            ondices.push(ondex.map(|o| o as u32));
        }
        Ok((indices, ondices))
    }

    pub fn member(&self) -> &Arc<dyn Keeper> {
        &self.member
    }
}

fn check_membership(member: &dyn Keeper, keys: &[Verfer], ndigs: &[Diger]) -> Result<()> {
    for verfer in member.verfers()? {
        if !keys.contains(&verfer) {
            return Err(KeeperError::NotGroupMember(verfer.qb64()));
        }
    }
    for diger in member.ndigs()? {
        if !ndigs.contains(&diger) {
            return Err(KeeperError::NotGroupMember(diger.qb64()));
        }
    }
    Ok(())
}

impl Keeper for GroupKeeper {
    fn algo(&self) -> Algo {
        Algo::Group
    }

    /// Group keys are created by the members; this returns the assembled
    /// lists after checking the requested counts.
    fn incept(
        &self,
        icount: usize,
        ncount: usize,
        _transferable: bool,
    ) -> Result<(Vec<Verfer>, Vec<Diger>)> {
        let group = self.read()?;
        if group.keys.len() != icount || group.ndigs.len() != ncount {
            return Err(KeeperError::InvalidParams(format!(
                "group has {} keys and {} next digests, asked for {icount} and {ncount}",
                group.keys.len(),
                group.ndigs.len()
            )));
        }
        Ok((group.keys.clone(), group.ndigs.clone()))
    }

    /// Rotate the member's own keys against its share of the group
    /// commitment. Returns the member's new keys and next digests; the
    /// caller assembles the group lists and installs them with
    /// [`GroupKeeper::update`].
    fn rotate(
        &self,
        committed: &[Diger],
        ncount: usize,
        transferable: bool,
    ) -> Result<(Vec<Verfer>, Vec<Diger>)> {
        let own = self.member.ndigs()?;
        if let Some(missing) = own.iter().find(|d| !committed.contains(d)) {
            return Err(KeeperError::CommitmentViolation(format!(
                "member commitment {missing} is not in the group next list"
            )));
        }
        self.member.rotate(&own, ncount, transferable)
    }

    /// Sign with the member keys at their group positions unless
    /// positions are given explicitly.
    fn sign(
        &self,
        ser: &[u8],
        indices: Option<&[u32]>,
        ondices: Option<&[Option<u32>]>,
    ) -> Result<Vec<Siger>> {
        let (group_indices, group_ondices) = self.positions()?;
        self.member.sign(
            ser,
            Some(indices.unwrap_or(&group_indices)),
            Some(ondices.unwrap_or(&group_ondices)),
        )
    }

    fn sign_unindexed(&self, ser: &[u8]) -> Result<Vec<Cigar>> {
        self.member.sign_unindexed(ser)
    }

    fn verfers(&self) -> Result<Vec<Verfer>> {
        Ok(self.read()?.keys.clone())
    }

    fn ndigs(&self) -> Result<Vec<Diger>> {
        Ok(self.read()?.ndigs.clone())
    }

    fn params(&self) -> Result<KeeperParams> {
        Ok(KeeperParams {
            algo: Algo::Group,
            ..self.member.params()?
        })
    }
}
