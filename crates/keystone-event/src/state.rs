//! Key state computation.
//!
//! Key state is computed by replaying an identifier's key event log from
//! its inception. Each accepted event yields a new [`KeyState`]; a rejected
//! event leaves the previous state untouched.

use keystone_cesr::{Diger, Prefixer, Verfer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EventError, Result};
use crate::eventing::{
    check_current_threshold, check_next_threshold, check_toad, check_unique, rotate_witnesses,
    verify_commitment, TRAIT_ESTABLISHMENT_ONLY,
};
use crate::serder::Serder;
use crate::tholder::Tholder;
use crate::version::Ilk;

/// Location of the latest establishment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastEstablishment {
    pub sn: u128,
    pub said: String,
}

/// Current key state of an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyState {
    /// Identifier prefix.
    pub prefix: Prefixer,

    /// Sequence number of the latest event.
    pub sn: u128,

    /// SAID of the latest event.
    pub said: String,

    /// Type of the latest event.
    pub ilk: Ilk,

    /// Latest establishment event.
    pub last_est: LastEstablishment,

    /// Current signing keys.
    pub keys: Vec<Verfer>,

    /// Current signing threshold.
    pub tholder: Tholder,

    /// Digests of the committed next keys.
    pub ndigs: Vec<Diger>,

    /// Threshold the next keys must satisfy.
    pub ntholder: Tholder,

    /// Current witnesses.
    pub wits: Vec<String>,

    /// Witness threshold.
    pub toad: u64,

    /// Configuration traits from inception.
    pub traits: Vec<String>,

    /// Delegator, for delegated identifiers.
    pub delpre: Option<String>,
}

fn owned(items: Vec<&str>) -> Vec<String> {
    items.into_iter().map(str::to_string).collect()
}

impl KeyState {
    /// Initial key state from an inception event.
    pub fn from_inception(serder: &Serder) -> Result<Self> {
        // 1. Event type and sequence
        let ilk = serder.ilk()?;
        if !ilk.is_inception() {
            return Err(EventError::UnexpectedIlk {
                expected: "icp or dip".into(),
                actual: ilk.to_string(),
            });
        }
        let sn = serder.sn()?;
        if sn != 0 {
            return Err(EventError::SequenceViolation {
                expected: 0,
                actual: sn,
            });
        }

        // 2. SAID (and self-addressing prefix)
        if !serder.verify_said()? {
            warn!(said = serder.said()?, "inception SAID mismatch");
            return Err(EventError::SaidMismatch("d".into()));
        }

        // 3. Keys and thresholds
        let keys = serder.keys()?;
        if keys.is_empty() {
            return Err(EventError::InvalidField {
                field: "k".into(),
                reason: "at least one signing key is required".into(),
            });
        }
        let tholder = serder.tholder()?;
        check_current_threshold(&tholder, keys.len())?;
        let ndigs = serder.ndigs()?;
        let ntholder = serder.ntholder()?;
        check_next_threshold(&ntholder, ndigs.len())?;

        // 4. Prefix
        let prefix = serder.prefixer()?;
        let delpre = serder.delpre().map(str::to_string);
        if matches!(ilk, Ilk::Dip) != delpre.is_some() {
            return Err(EventError::InvalidField {
                field: "di".into(),
                reason: "delegator must be present exactly on delegated inceptions".into(),
            });
        }
        if let Some(delpre) = &delpre {
            Prefixer::from_qb64(delpre)?;
        }
        if !prefix.is_digestive() {
            if delpre.is_some() {
                return Err(EventError::InvalidPrefix(
                    "delegated identifiers must be self-addressing".into(),
                ));
            }
            if keys.len() != 1 || keys[0].qb64() != prefix.qb64() {
                return Err(EventError::InvalidPrefix(
                    "basic prefix must be the single signing key".into(),
                ));
            }
            if !prefix.is_transferable() && !ndigs.is_empty() {
                return Err(EventError::InvalidPrefix(
                    "non-transferable prefix cannot commit next keys".into(),
                ));
            }
        }

        // 5. Witnesses
        let wits = owned(serder.wits()?);
        check_unique("b", &wits)?;
        let toad = check_toad(Some(serder.toad()?), wits.len())?;

        let said = serder.said()?.to_string();
        debug!(pre = %prefix, said = %said, "accepted inception");
        Ok(Self {
            prefix,
            sn,
            said: said.clone(),
            ilk,
            last_est: LastEstablishment { sn, said },
            keys,
            tholder,
            ndigs,
            ntholder,
            wits,
            toad,
            traits: owned(serder.traits()?),
            delpre,
        })
    }

    /// Key state after applying `serder`, a rotation or interaction.
    pub fn apply(&self, serder: &Serder) -> Result<Self> {
        // 1. Identity, sequence and chaining
        let pre = serder.pre()?;
        if pre != self.prefix.qb64() {
            return Err(EventError::InvalidField {
                field: "i".into(),
                reason: format!("event for {pre}, state is for {}", self.prefix),
            });
        }
        let ilk = serder.ilk()?;
        let sn = serder.sn()?;
        let expected = self.sn + 1;
        if sn != expected {
            return Err(EventError::SequenceViolation {
                expected,
                actual: sn,
            });
        }
        let prior = serder.prior()?;
        if prior != self.said {
            return Err(EventError::PriorMismatch {
                expected: self.said.clone(),
                actual: prior.to_string(),
            });
        }

        // 2. SAID
        if !serder.verify_said()? {
            warn!(pre = %self.prefix, sn = %sn, "event SAID mismatch");
            return Err(EventError::SaidMismatch("d".into()));
        }
        let said = serder.said()?.to_string();

        match ilk {
            Ilk::Ixn => {
                if self.is_establishment_only() {
                    return Err(EventError::UnexpectedIlk {
                        expected: "establishment event".into(),
                        actual: ilk.to_string(),
                    });
                }
                debug!(pre = %self.prefix, sn = %sn, "accepted interaction");
                Ok(Self {
                    sn,
                    said,
                    ilk,
                    ..self.clone()
                })
            }
            Ilk::Rot | Ilk::Drt => {
                let expected_ilk = if self.delpre.is_some() {
                    Ilk::Drt
                } else {
                    Ilk::Rot
                };
                if ilk != expected_ilk {
                    return Err(EventError::UnexpectedIlk {
                        expected: expected_ilk.to_string(),
                        actual: ilk.to_string(),
                    });
                }
                self.rotate(serder, sn, said, ilk)
            }
            Ilk::Icp | Ilk::Dip => Err(EventError::UnexpectedIlk {
                expected: "rot, drt or ixn".into(),
                actual: ilk.to_string(),
            }),
        }
    }

    fn rotate(&self, serder: &Serder, sn: u128, said: String, ilk: Ilk) -> Result<Self> {
        if !self.is_transferable() {
            return Err(EventError::NonTransferable(self.prefix.qb64()));
        }

        // 3. Pre-rotation commitment
        let keys = serder.keys()?;
        if keys.is_empty() {
            return Err(EventError::InvalidField {
                field: "k".into(),
                reason: "at least one signing key is required".into(),
            });
        }
        verify_commitment(&self.ndigs, &self.ntholder, &keys)?;

        // 4. New thresholds
        let tholder = serder.tholder()?;
        check_current_threshold(&tholder, keys.len())?;
        let ndigs = serder.ndigs()?;
        let ntholder = serder.ntholder()?;
        check_next_threshold(&ntholder, ndigs.len())?;

        // 5. Witness deltas
        let wits = rotate_witnesses(&self.wits, &owned(serder.cuts()?), &owned(serder.adds()?))?;
        let toad = check_toad(Some(serder.toad()?), wits.len())?;

        debug!(pre = %self.prefix, sn = %sn, "accepted rotation");
        Ok(Self {
            prefix: self.prefix.clone(),
            sn,
            said: said.clone(),
            ilk,
            last_est: LastEstablishment { sn, said },
            keys,
            tholder,
            ndigs,
            ntholder,
            wits,
            toad,
            traits: self.traits.clone(),
            delpre: self.delpre.clone(),
        })
    }

    /// Whether the keys may still rotate.
    pub fn is_transferable(&self) -> bool {
        self.prefix.is_transferable() && !self.ndigs.is_empty()
    }

    /// Whether interaction events are disallowed.
    pub fn is_establishment_only(&self) -> bool {
        self.traits.iter().any(|t| t == TRAIT_ESTABLISHMENT_ONLY)
    }
}

/// Replay a key event log from its inception.
pub fn replay<'a, I>(events: I) -> Result<KeyState>
where
    I: IntoIterator<Item = &'a Serder>,
{
    let mut events = events.into_iter();
    let first = events.next().ok_or_else(|| EventError::MissingField("icp".into()))?;
    events.try_fold(KeyState::from_inception(first)?, |state, serder| {
        state.apply(serder)
    })
}
