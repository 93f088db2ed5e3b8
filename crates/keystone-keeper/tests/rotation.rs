//! Salty key derivation across rotations.

use keystone_cesr::{Salter, Tier, Verfer};
use keystone_keeper::{Keeper, KeeperError, KeeperParams, RandyKeeper, SaltyKeeper};
use proptest::prelude::*;

const SALT: &[u8; 16] = b"keystone-salt-01";

fn keeper(pidx: u32) -> SaltyKeeper {
    let salter = Salter::from_raw(SALT, Tier::Low).unwrap();
    SaltyKeeper::new(salter, pidx, "", Tier::Low, true)
}

fn rotate_twice(keeper: &SaltyKeeper) -> Vec<Vec<Verfer>> {
    let (k0, n0) = keeper.incept(2, 2, true).unwrap();
    let (k1, n1) = keeper.rotate(&n0, 3, true).unwrap();
    let (k2, _) = keeper.rotate(&n1, 2, true).unwrap();
    vec![k0, k1, k2]
}

#[test]
fn two_rotations_replay_from_salt() {
    let original = keeper(0);
    let history = rotate_twice(&original);
    assert_eq!(history[1].len(), 2);
    assert_eq!(history[2].len(), 3);

    let replayed = keeper(0);
    assert_eq!(rotate_twice(&replayed), history);
    assert_eq!(replayed.ndigs().unwrap(), original.ndigs().unwrap());
    assert_eq!(replayed.params().unwrap(), original.params().unwrap());
}

#[test]
fn restored_keeper_continues_the_sequence() {
    let original = keeper(4);
    let (_, n0) = original.incept(1, 1, true).unwrap();
    let salter = Salter::from_raw(SALT, Tier::Low).unwrap();
    let restored =
        SaltyKeeper::restore(salter, &original.params().unwrap(), keystone_cesr::mtr::BLAKE3_256)
            .unwrap();

    let (a, na) = original.rotate(&n0, 1, true).unwrap();
    let (b, nb) = restored.rotate(&n0, 1, true).unwrap();
    assert_eq!(a, b);
    assert_eq!(na, nb);
}

#[test]
fn rotation_against_a_foreign_commitment_fails() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let ours = keeper(0);
    ours.incept(1, 1, true).unwrap();
    let theirs = keeper(1);
    let (_, foreign) = theirs.incept(1, 1, true).unwrap();

    assert!(matches!(
        ours.rotate(&foreign, 1, true),
        Err(KeeperError::CommitmentViolation(_))
    ));
    // The keeper can still rotate against its own commitment.
    let own = ours.ndigs().unwrap();
    assert!(ours.rotate(&own, 1, true).is_ok());
}

#[test]
fn signing_uses_only_current_keys() {
    let keeper = keeper(0);
    let history = rotate_twice(&keeper);
    let sigers = keeper.sign(b"msg", None, None).unwrap();
    assert_eq!(sigers.len(), history[2].len());
    for siger in &sigers {
        let index = siger.index() as usize;
        assert!(history[2][index].verify(siger.raw(), b"msg"));
        assert!(!history[1].iter().any(|k| k.verify(siger.raw(), b"msg")));
    }
}

#[test]
fn params_survive_json_persistence() {
    let original = keeper(2);
    let (_, n0) = original.incept(2, 1, true).unwrap();
    original.rotate(&n0, 2, true).unwrap();

    let saved = serde_json::to_string(&original.params().unwrap()).unwrap();
    assert!(saved.contains(r#""algo":"salty""#));
    let params: KeeperParams = serde_json::from_str(&saved).unwrap();

    let salter = Salter::from_raw(SALT, Tier::Low).unwrap();
    let restored = SaltyKeeper::restore(salter, &params, keystone_cesr::mtr::BLAKE3_256).unwrap();
    assert_eq!(restored.verfers().unwrap(), original.verfers().unwrap());
    assert_eq!(restored.ndigs().unwrap(), original.ndigs().unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn rotation_reveals_exactly_the_committed_keys(icount in 1usize..4, ncount in 1usize..4, next in 0usize..4) {
        let keeper = RandyKeeper::new();
        let (_, ndigs) = keeper.incept(icount, ncount, true).unwrap();
        let (keys, _) = keeper.rotate(&ndigs, next, true).unwrap();
        prop_assert_eq!(keys.len(), ncount);
        for (dig, key) in ndigs.iter().zip(&keys) {
            prop_assert!(dig.verify(key.qb64().as_bytes()));
        }
        prop_assert_eq!(keeper.ndigs().unwrap().len(), next);
    }
}
