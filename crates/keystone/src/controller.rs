//! The controller: one identifier, its keeper and its key event log.
//!
//! The controller builds each event, signs it with the keeper and then
//! validates the signed event exactly as a verifier would before accepting
//! it into the log.

use std::sync::Arc;

use keystone_cesr::{mtr, Cigar};
use keystone_event::{
    validate_event, InceptionBuilder, InteractionBuilder, KeyState, RotationBuilder, SealEvent,
    Serder, Tholder,
};
use keystone_keeper::Keeper;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{KeystoneError, Result};
use crate::kel::{verify_kel, SignedEvent};

/// Configuration for a new identifier.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Number of current signing keys.
    pub icount: usize,
    /// Number of committed next keys.
    pub ncount: usize,
    /// Current signing threshold. Defaults to a majority.
    pub isith: Option<Tholder>,
    /// Next signing threshold. Defaults to a majority.
    pub nsith: Option<Tholder>,
    pub wits: Vec<String>,
    /// Witness threshold. Defaults to `ample` of the witness count.
    pub toad: Option<u64>,
    /// Configuration traits.
    pub cnfg: Vec<String>,
    /// Data anchored in the inception.
    pub data: Vec<Value>,
    /// Delegator prefix, for delegated identifiers.
    pub delpre: Option<String>,
    /// Digest code for SAIDs and the prefix.
    pub code: &'static str,
    /// Whether the keys may ever rotate. A non-transferable identifier
    /// uses its single key as a basic prefix.
    pub transferable: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            icount: 1,
            ncount: 1,
            isith: None,
            nsith: None,
            wits: Vec::new(),
            toad: None,
            cnfg: Vec::new(),
            data: Vec::new(),
            delpre: None,
            code: mtr::BLAKE3_256,
            transferable: true,
        }
    }
}

/// Parameters of one rotation.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Number of new next keys. Zero abandons the identifier.
    pub ncount: usize,
    pub isith: Option<Tholder>,
    pub nsith: Option<Tholder>,
    /// Witnesses to remove.
    pub cuts: Vec<String>,
    /// Witnesses to add.
    pub adds: Vec<String>,
    pub toad: Option<u64>,
    pub data: Vec<Value>,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            ncount: 1,
            isith: None,
            nsith: None,
            cuts: Vec::new(),
            adds: Vec::new(),
            toad: None,
            data: Vec::new(),
        }
    }
}

/// A single-signer identifier under local control.
///
/// The keeper must sign with every current key, so group keepers, whose
/// members sign separately, are not driven through a controller.
pub struct Controller {
    keeper: Arc<dyn Keeper>,
    code: &'static str,
    state: KeyState,
    kel: Vec<SignedEvent>,
}

impl Controller {
    /// Create keys in `keeper` and incept a new identifier with them.
    pub fn incept(keeper: Arc<dyn Keeper>, config: ControllerConfig) -> Result<Self> {
        let ncount = if config.transferable { config.ncount } else { 0 };
        let (verfers, ndigs) = keeper.incept(config.icount, ncount, config.transferable)?;

        let mut builder = InceptionBuilder::new(verfers)
            .ndigs(ndigs)
            .wits(config.wits)
            .cnfg(config.cnfg)
            .data(config.data)
            .code(config.code);
        if let Some(isith) = config.isith {
            builder = builder.isith(isith);
        }
        if let Some(nsith) = config.nsith {
            builder = builder.nsith(nsith);
        }
        if let Some(toad) = config.toad {
            builder = builder.toad(toad);
        }
        if let Some(delpre) = config.delpre {
            builder = builder.delpre(delpre);
        }
        if !config.transferable {
            builder = builder.basic();
        }
        let serder = builder.build()?;

        let sigers = keeper.sign(serder.raw(), None, None)?;
        let state = validate_event(None, &serder, &sigers)?;
        debug!(pre = %state.prefix, algo = ?keeper.algo(), "incepted identifier");
        Ok(Self {
            keeper,
            code: config.code,
            state,
            kel: vec![SignedEvent::new(serder, sigers)],
        })
    }

    /// Resume control of an existing identifier from its log and a keeper
    /// holding its current keys, such as one restored from saved params.
    pub fn resume(
        keeper: Arc<dyn Keeper>,
        kel: Vec<SignedEvent>,
        code: &'static str,
    ) -> Result<Self> {
        let state = verify_kel(&kel)?;
        if keeper.verfers()? != state.keys || keeper.ndigs()? != state.ndigs {
            return Err(KeystoneError::InvalidOperation(format!(
                "keeper does not hold the current keys of {}",
                state.prefix
            )));
        }
        debug!(pre = %state.prefix, sn = %state.sn, "resumed identifier");
        Ok(Self {
            keeper,
            code,
            state,
            kel,
        })
    }

    pub fn prefix(&self) -> String {
        self.state.prefix.qb64()
    }

    pub fn state(&self) -> &KeyState {
        &self.state
    }

    pub fn keeper(&self) -> &Arc<dyn Keeper> {
        &self.keeper
    }

    /// The accepted key event log, inception first.
    pub fn kel(&self) -> &[SignedEvent] {
        &self.kel
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Rotate to the committed next keys.
    ///
    /// The keeper rotates before the event is built. If the event is then
    /// rejected the keeper is ahead of the log and must be restored from
    /// its saved parameters.
    pub fn rotate(&mut self, rotation: RotationConfig) -> Result<SignedEvent> {
        if !self.state.is_transferable() {
            return Err(KeystoneError::InvalidOperation(format!(
                "identifier {} cannot rotate",
                self.prefix()
            )));
        }
        let (verfers, ndigs) = self
            .keeper
            .rotate(&self.state.ndigs, rotation.ncount, true)?;

        let mut builder = RotationBuilder::new(&self.state, verfers)
            .ndigs(ndigs)
            .cuts(rotation.cuts)
            .adds(rotation.adds)
            .data(rotation.data)
            .code(self.code);
        if let Some(isith) = rotation.isith {
            builder = builder.isith(isith);
        }
        if let Some(nsith) = rotation.nsith {
            builder = builder.nsith(nsith);
        }
        if let Some(toad) = rotation.toad {
            builder = builder.toad(toad);
        }
        let serder = builder.build().map_err(|e| {
            warn!(pre = %self.state.prefix, error = %e, "keeper rotated but event was rejected");
            e
        })?;
        self.commit(serder)
    }

    /// Anchor `data` in an interaction event.
    pub fn interact(&mut self, data: Vec<Value>) -> Result<SignedEvent> {
        let serder = InteractionBuilder::new(&self.state)
            .data(data)
            .code(self.code)
            .build()?;
        self.commit(serder)
    }

    /// Unindexed signatures over `ser` by the current keys.
    pub fn sign(&self, ser: &[u8]) -> Result<Vec<Cigar>> {
        Ok(self.keeper.sign_unindexed(ser)?)
    }

    /// Seal referencing the latest event, for anchoring in another log.
    pub fn seal(&self) -> SealEvent {
        SealEvent::new(&self.prefix(), self.state.sn, &self.state.said)
    }

    fn commit(&mut self, serder: Serder) -> Result<SignedEvent> {
        let sigers = self.keeper.sign(serder.raw(), None, None)?;
        let state = validate_event(Some(&self.state), &serder, &sigers)?;
        debug!(pre = %state.prefix, sn = %state.sn, ilk = %state.ilk, "accepted event");
        let event = SignedEvent::new(serder, sigers);
        self.state = state;
        self.kel.push(event.clone());
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_event::TRAIT_ESTABLISHMENT_ONLY;
    use keystone_keeper::RandyKeeper;
    use serde_json::json;

    fn controller(config: ControllerConfig) -> Controller {
        Controller::incept(Arc::new(RandyKeeper::new()), config).unwrap()
    }

    #[test]
    fn test_incept_defaults() {
        let ctl = controller(ControllerConfig::default());
        assert_eq!(ctl.kel().len(), 1);
        assert_eq!(ctl.state().sn, 0);
        assert_eq!(ctl.state().keys.len(), 1);
        assert_eq!(ctl.state().ndigs.len(), 1);
        assert!(ctl.prefix().starts_with('E'));
    }

    #[test]
    fn test_rotate_then_interact() {
        let mut ctl = controller(ControllerConfig {
            icount: 2,
            ncount: 2,
            ..ControllerConfig::default()
        });
        let first_keys = ctl.state().keys.clone();
        let rot = ctl
            .rotate(RotationConfig {
                ncount: 3,
                ..RotationConfig::default()
            })
            .unwrap();
        assert_eq!(rot.sigers.len(), 2);
        assert_ne!(ctl.state().keys, first_keys);
        assert_eq!(ctl.state().ndigs.len(), 3);

        let ixn = ctl.interact(vec![json!({"x": 1})]).unwrap();
        assert_eq!(ixn.serder.sn().unwrap(), 2);
        assert_eq!(ctl.state().last_est.sn, 1);
        assert_eq!(ctl.kel().len(), 3);
    }

    #[test]
    fn test_abandoned_identifier_cannot_rotate() {
        let mut ctl = controller(ControllerConfig::default());
        ctl.rotate(RotationConfig {
            ncount: 0,
            ..RotationConfig::default()
        })
        .unwrap();
        assert!(!ctl.state().is_transferable());
        assert!(matches!(
            ctl.rotate(RotationConfig::default()),
            Err(KeystoneError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_non_transferable_uses_basic_prefix() {
        let mut ctl = controller(ControllerConfig {
            transferable: false,
            ..ControllerConfig::default()
        });
        assert!(ctl.prefix().starts_with('B'));
        assert!(ctl.state().ndigs.is_empty());
        assert!(ctl.rotate(RotationConfig::default()).is_err());
    }

    #[test]
    fn test_establishment_only_rejects_interaction() {
        let mut ctl = controller(ControllerConfig {
            cnfg: vec![TRAIT_ESTABLISHMENT_ONLY.to_string()],
            ..ControllerConfig::default()
        });
        assert!(matches!(
            ctl.interact(Vec::new()),
            Err(KeystoneError::Event(_))
        ));
        assert_eq!(ctl.kel().len(), 1);
    }

    #[test]
    fn test_seal_and_sign() {
        let ctl = controller(ControllerConfig::default());
        let seal = ctl.seal();
        assert_eq!(seal.i, ctl.prefix());
        assert_eq!(seal.s, "0");
        assert_eq!(seal.d, ctl.state().said);
        let cigars = ctl.sign(b"message").unwrap();
        assert!(cigars[0].verify(b"message"));
    }
}
