//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use keystone::{Controller, ControllerConfig, RotationConfig, SignedEvent};
use keystone_cesr::{Diger, Salter, Tier, Verfer};
use keystone_event::{InceptionBuilder, KeyState, RotationBuilder, Serder};
use keystone_keeper::{GroupKeeper, KeyManager, Keeper, ManagerConfig, SaltyConfig};

/// Salt used by [`TestFixture::new`].
pub const DEFAULT_SALT: &[u8; 16] = b"keystone-testkit";

/// A test fixture with a salted key manager using minimal stretching.
pub struct TestFixture {
    pub manager: KeyManager,
}

impl TestFixture {
    /// Create a fixture under [`DEFAULT_SALT`].
    pub fn new() -> Self {
        Self::with_salt(DEFAULT_SALT)
    }

    /// Create a fixture under a specific salt.
    pub fn with_salt(salt: &[u8; 16]) -> Self {
        let salter = Salter::from_raw(salt, Tier::Low).expect("16-byte salt");
        let config = ManagerConfig {
            salty: SaltyConfig {
                temp: true,
                ..SaltyConfig::default()
            },
        };
        Self {
            manager: KeyManager::new(salter, config),
        }
    }

    /// A fresh salty keeper at the manager's next identifier index.
    pub fn keeper(&self) -> Arc<dyn Keeper> {
        Arc::new(self.manager.salty())
    }

    /// Incept an identifier with default settings.
    pub fn controller(&self) -> Controller {
        self.controller_with(ControllerConfig::default())
    }

    /// Incept an identifier with `config`.
    pub fn controller_with(&self, config: ControllerConfig) -> Controller {
        Controller::incept(self.keeper(), config).expect("inception")
    }

    /// Incept an identifier and rotate it `rotations` times.
    pub fn rotated(&self, rotations: usize) -> Controller {
        let mut controller = self.controller();
        for _ in 0..rotations {
            controller
                .rotate(RotationConfig::default())
                .expect("rotation");
        }
        controller
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create fixtures with distinct salts for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut salt = *DEFAULT_SALT;
            salt[0] = i as u8;
            TestFixture::with_salt(&salt)
        })
        .collect()
}

/// One group keeper per member, each member holding one current and one
/// next key, all sharing the concatenated group key lists.
pub fn group_fixture(count: usize) -> Vec<GroupKeeper> {
    let members: Vec<Arc<dyn Keeper>> = multi_party_fixtures(count)
        .iter()
        .map(|fixture| {
            let keeper = fixture.keeper();
            keeper.incept(1, 1, true).expect("member inception");
            keeper
        })
        .collect();
    let (keys, ndigs) = concat(
        members
            .iter()
            .map(|m| (m.verfers().expect("keys"), m.ndigs().expect("ndigs"))),
    );
    members
        .into_iter()
        .map(|m| GroupKeeper::new(m, keys.clone(), ndigs.clone()).expect("group member"))
        .collect()
}

fn concat(parts: impl Iterator<Item = (Vec<Verfer>, Vec<Diger>)>) -> (Vec<Verfer>, Vec<Diger>) {
    let mut keys = Vec::new();
    let mut ndigs = Vec::new();
    for (k, n) in parts {
        keys.extend(k);
        ndigs.extend(n);
    }
    (keys, ndigs)
}

fn sign_by_all(groups: &[GroupKeeper], serder: Serder) -> SignedEvent {
    let sigers = groups
        .iter()
        .flat_map(|g| g.sign(serder.raw(), None, None).expect("member signature"))
        .collect();
    SignedEvent::new(serder, sigers)
}

/// Group inception signed by every member.
pub fn group_inception(groups: &[GroupKeeper]) -> SignedEvent {
    let keys = groups[0].verfers().expect("group keys");
    let ndigs = groups[0].ndigs().expect("group ndigs");
    let serder = InceptionBuilder::new(keys)
        .ndigs(ndigs)
        .build()
        .expect("group inception");
    sign_by_all(groups, serder)
}

/// Rotate every member, install the new group lists and return the group
/// rotation signed by every member.
pub fn group_rotation(groups: &[GroupKeeper], state: &KeyState) -> SignedEvent {
    let (keys, ndigs) = concat(
        groups
            .iter()
            .map(|g| g.rotate(&state.ndigs, 1, true).expect("member rotation")),
    );
    for group in groups {
        group
            .update(keys.clone(), ndigs.clone())
            .expect("group update");
    }
    let serder = RotationBuilder::new(state, keys)
        .ndigs(ndigs)
        .build()
        .expect("group rotation");
    sign_by_all(groups, serder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone::verify_kel;

    #[test]
    fn test_fixture_controller() {
        let fixture = TestFixture::new();
        let controller = fixture.rotated(2);
        assert_eq!(controller.state().sn, 2);
        assert_eq!(verify_kel(controller.kel()).unwrap(), *controller.state());
    }

    #[test]
    fn test_fixtures_are_reproducible() {
        let a = TestFixture::new().controller();
        let b = TestFixture::new().controller();
        assert_eq!(a.prefix(), b.prefix());
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_fixtures(3);
        let prefixes: Vec<String> = parties.iter().map(|p| p.controller().prefix()).collect();
        assert_ne!(prefixes[0], prefixes[1]);
        assert_ne!(prefixes[1], prefixes[2]);
        assert_ne!(prefixes[0], prefixes[2]);
    }

    #[test]
    fn test_group_lifecycle() {
        let groups = group_fixture(3);
        let icp = group_inception(&groups);
        assert_eq!(icp.sigers.len(), 3);
        let rot = group_rotation(&groups, &verify_kel(&[icp.clone()]).unwrap());
        let ondices: Vec<Option<u32>> = rot.sigers.iter().map(|s| s.ondex()).collect();
        assert_eq!(ondices, vec![Some(0), Some(1), Some(2)]);

        let state = verify_kel(&[icp, rot]).unwrap();
        assert_eq!(state.sn, 1);
        assert_eq!(state.keys, groups[0].verfers().unwrap());
    }
}
