//! Proptest generators for property-based testing.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use keystone::{Controller, ControllerConfig};
use keystone_cesr::{Salter, Signer, Tier, Verfer};
use keystone_event::Tholder;
use keystone_keeper::SaltyKeeper;

/// Generate a random transferable signer.
pub fn signer() -> impl Strategy<Value = Signer> {
    any::<[u8; 32]>().prop_map(|seed| Signer::from_seed(&seed, true))
}

/// Generate a random transferable verification key.
pub fn verfer() -> impl Strategy<Value = Verfer> {
    signer().prop_map(|s| s.verfer().clone())
}

/// Generate a 16-byte salt.
pub fn salt() -> impl Strategy<Value = [u8; 16]> {
    any::<[u8; 16]>()
}

/// Generate a satisfiable unweighted threshold for `count` keys.
pub fn unweighted_threshold(count: usize) -> impl Strategy<Value = Tholder> {
    (1..=count as u64).prop_map(Tholder::count)
}

/// Generate a single weighted clause for `count` keys.
///
/// Every weight is `1/d` with `d <= count`, so the clause always sums to
/// at least one.
pub fn weighted_threshold(count: usize) -> impl Strategy<Value = Tholder> {
    prop::collection::vec(1..=count, count).prop_map(|dens| {
        let clause: Vec<String> = dens.iter().map(|d| format!("1/{d}")).collect();
        Tholder::weighted(&[clause]).expect("weights sum to at least one")
    })
}

/// Generate either kind of threshold for `count` keys.
pub fn threshold(count: usize) -> impl Strategy<Value = Tholder> {
    prop_oneof![unweighted_threshold(count), weighted_threshold(count)]
}

/// Generate anchored data entries.
pub fn anchors() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec("[a-z]{1,8}".prop_map(|s| json!({ "x": s })), 0..3)
}

/// Parameters for generating an identifier.
#[derive(Debug, Clone)]
pub struct IdentifierParams {
    pub salt: [u8; 16],
    pub icount: usize,
    pub ncount: usize,
    pub isith: Tholder,
    pub data: Vec<Value>,
}

impl Arbitrary for IdentifierParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (salt(), 1usize..=4, 0usize..=4, anchors())
            .prop_flat_map(|(salt, icount, ncount, data)| {
                threshold(icount).prop_map(move |isith| IdentifierParams {
                    salt,
                    icount,
                    ncount,
                    isith,
                    data: data.clone(),
                })
            })
            .boxed()
    }
}

/// Incept an identifier from parameters, deterministically.
pub fn controller_from_params(params: &IdentifierParams) -> Controller {
    let salter = Salter::from_raw(&params.salt, Tier::Low).expect("16-byte salt");
    let keeper = SaltyKeeper::new(salter, 0, "", Tier::Low, true);
    Controller::incept(
        Arc::new(keeper),
        ControllerConfig {
            icount: params.icount,
            ncount: params.ncount,
            isith: Some(params.isith.clone()),
            data: params.data.clone(),
            ..ControllerConfig::default()
        },
    )
    .expect("inception from generated params")
}
