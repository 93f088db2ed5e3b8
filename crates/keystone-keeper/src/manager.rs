//! Key manager: creates keepers and tracks them by identifier prefix.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use keystone_cesr::{mtr, Salter, Tier};
use tracing::debug;

use crate::creator::{RandyCreator, SaltyCreator};
use crate::error::{KeeperError, Result};
use crate::keeper::{advance, Keeper, KeeperParams};
use crate::local::{RandyKeeper, SaltyKeeper};

/// Configuration for salty keepers.
#[derive(Debug, Clone)]
pub struct SaltyConfig {
    /// Argon2id work factor.
    pub tier: Tier,
    /// Path prefix for key derivation.
    pub stem: String,
    /// Use minimal stretching cost. Only for tests.
    pub temp: bool,
    /// Digest code of next-key commitments.
    pub ndig_code: &'static str,
}

impl Default for SaltyConfig {
    fn default() -> Self {
        Self {
            tier: Tier::Low,
            stem: String::new(),
            temp: false,
            ndig_code: mtr::BLAKE3_256,
        }
    }
}

/// Configuration for the key manager.
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    pub salty: SaltyConfig,
}

/// Creates keepers and holds them by identifier prefix.
///
/// Salty keepers get consecutive identifier indices (`pidx`) under the
/// manager's root salt.
pub struct KeyManager {
    salter: Salter,
    config: ManagerConfig,
    pidx: AtomicU32,
    keepers: RwLock<HashMap<String, Arc<dyn Keeper>>>,
}

impl KeyManager {
    pub fn new(salter: Salter, config: ManagerConfig) -> Self {
        Self {
            salter,
            config,
            pidx: AtomicU32::new(0),
            keepers: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Next unused identifier index.
    pub fn pidx(&self) -> u32 {
        self.pidx.load(Ordering::SeqCst)
    }

    /// A new salty keeper at the next identifier index.
    pub fn salty(&self) -> SaltyKeeper {
        let pidx = self.pidx.fetch_add(1, Ordering::SeqCst);
        let salty = &self.config.salty;
        debug!(pidx, "creating salty keeper");
        SaltyKeeper::with_creator(
            SaltyCreator::new(
                self.salter.clone(),
                pidx,
                salty.stem.clone(),
                salty.tier,
                salty.temp,
            ),
            salty.ndig_code,
        )
    }

    /// A new random keeper.
    pub fn randy(&self) -> RandyKeeper {
        RandyKeeper::with_creator(RandyCreator, self.config.salty.ndig_code)
    }

    /// Recreate a salty keeper from saved parameters.
    pub fn restore(&self, params: &KeeperParams) -> Result<SaltyKeeper> {
        let next = advance(params.pidx, 1)?;
        let keeper = SaltyKeeper::restore(self.salter.clone(), params, self.config.salty.ndig_code)?;
        self.pidx.fetch_max(next, Ordering::SeqCst);
        Ok(keeper)
    }

    /// Track `keeper` as the key manager of `pre`.
    pub fn register(&self, pre: impl Into<String>, keeper: Arc<dyn Keeper>) -> Result<()> {
        let pre = pre.into();
        debug!(pre = %pre, algo = ?keeper.algo(), "registered keeper");
        self.keepers
            .write()
            .map_err(|_| KeeperError::Poisoned)?
            .insert(pre, keeper);
        Ok(())
    }

    pub fn get(&self, pre: &str) -> Result<Arc<dyn Keeper>> {
        self.keepers
            .read()
            .map_err(|_| KeeperError::Poisoned)?
            .get(pre)
            .cloned()
            .ok_or_else(|| KeeperError::UnknownPrefix(pre.to_string()))
    }

    pub fn prefixes(&self) -> Result<Vec<String>> {
        let mut pres: Vec<String> = self
            .keepers
            .read()
            .map_err(|_| KeeperError::Poisoned)?
            .keys()
            .cloned()
            .collect();
        pres.sort();
        Ok(pres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> KeyManager {
        let salter = Salter::from_raw(b"0123456789abcdef", Tier::Low).unwrap();
        let config = ManagerConfig {
            salty: SaltyConfig {
                temp: true,
                ..SaltyConfig::default()
            },
        };
        KeyManager::new(salter, config)
    }

    #[test]
    fn test_salty_keepers_get_distinct_pidx() {
        let manager = manager();
        let a = manager.salty();
        let b = manager.salty();
        let (ka, _) = a.incept(1, 1, true).unwrap();
        let (kb, _) = b.incept(1, 1, true).unwrap();
        assert_ne!(ka, kb);
        assert_eq!(a.params().unwrap().pidx, 0);
        assert_eq!(b.params().unwrap().pidx, 1);
        assert_eq!(manager.pidx(), 2);
    }

    #[test]
    fn test_register_and_get() {
        let manager = manager();
        let keeper = Arc::new(manager.randy());
        keeper.incept(1, 1, true).unwrap();
        manager.register("Epre", keeper.clone()).unwrap();
        let found = manager.get("Epre").unwrap();
        assert_eq!(found.verfers().unwrap(), keeper.verfers().unwrap());
        assert!(matches!(
            manager.get("Eother"),
            Err(KeeperError::UnknownPrefix(_))
        ));
        assert_eq!(manager.prefixes().unwrap(), vec!["Epre".to_string()]);
    }

    #[test]
    fn test_restore_advances_pidx() {
        let keeper = manager().salty();
        keeper.incept(1, 1, true).unwrap();
        let params = keeper.params().unwrap();

        let fresh = manager();
        let restored = fresh.restore(&params).unwrap();
        assert_eq!(restored.verfers().unwrap(), keeper.verfers().unwrap());
        assert_eq!(fresh.pidx(), 1);
    }

    #[test]
    fn test_restore_rejects_exhausted_pidx() {
        let keeper = manager().salty();
        keeper.incept(1, 1, true).unwrap();
        let mut params = keeper.params().unwrap();
        params.pidx = u32::MAX;

        let fresh = manager();
        assert!(matches!(
            fresh.restore(&params),
            Err(KeeperError::InvalidParams(_))
        ));
        assert_eq!(fresh.pidx(), 0);
    }
}
