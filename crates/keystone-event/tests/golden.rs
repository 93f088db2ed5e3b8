//! Golden key event log for cross-implementation verification.
//!
//! Keys use seeds of 32 repeated bytes: current keys 1 and 2, next keys
//! 10 and 11, and after the rotation 20 and 21. Digests are SHA3-256 so
//! that any hashlib-based reference can regenerate them.

use keystone_cesr::{mtr, Signer, Verfer};
use keystone_event::{
    next_digests, validate_event, InceptionBuilder, KeyState, RotationBuilder, Serder, Tholder,
};
use proptest::prelude::*;

const ICP_SAID: &str = "HGmzK2XnLzmNlvGLy9Ni-DTGTyRodxeukE9j7efkf1ZW";
const ICP_RAW: &str = concat!(
    r#"{"v":"KERI10JSON000189_","t":"icp","#,
    r#""d":"HGmzK2XnLzmNlvGLy9Ni-DTGTyRodxeukE9j7efkf1ZW","#,
    r#""i":"HGmzK2XnLzmNlvGLy9Ni-DTGTyRodxeukE9j7efkf1ZW","s":"0","kt":"1","#,
    r#""k":["DIqI4910CfGV_VLbLTy6XXLKZwm_HZQSG_N0iAG0D29c","#,
    r#""DIE5dw6ofRdfVqNUZsNMfszLjYqRtO43ol32D1uPybOU"],"nt":"1","#,
    r#""n":["HJy0nOA6iW1Q8wvEWlENVegwYePjSSj74N7-bUQ-xYeC","#,
    r#""HCe4J9Fk6f2-0TZYnk42Ab7XTNm28VMbsgUfxbjRH5QW"],"bt":"0","b":[],"c":[],"a":[]}"#,
);
const ICP_SIGER_0: &str =
    "AAD0yx_vquoNyczrq27_HWeCDbPyxIbcgIiWFEDjjw1jJufZAX-e9hn2HKEbw-nYoBjUTXqNt19dhSfSKPjpSgsL";

const ROT_SAID: &str = "HMIyuCNS40GDcYCi0o-PElcmHAkV1RLmOF3CU-Ithwnb";
const ROT_RAW: &str = concat!(
    r#"{"v":"KERI10JSON0001c5_","t":"rot","#,
    r#""d":"HMIyuCNS40GDcYCi0o-PElcmHAkV1RLmOF3CU-Ithwnb","#,
    r#""i":"HGmzK2XnLzmNlvGLy9Ni-DTGTyRodxeukE9j7efkf1ZW","s":"1","#,
    r#""p":"HGmzK2XnLzmNlvGLy9Ni-DTGTyRodxeukE9j7efkf1ZW","kt":"1","#,
    r#""k":["DEOnLnFEAXYt9mtowm373yaCquyfJHTspGE-QkoPuv08","#,
    r#""DGa-fjMsekUzMr2dCn99sFX1xe8aBq2mbZizn7aBDEc6"],"nt":"1","#,
    r#""n":["HNDczkRDHOK6cnH5IFtpBi_qV29YriyQN13NHUN_4TiC","#,
    r#""HABvGKPj_nrkLuIxXd95owf58qt_Blwrefw8JIawmDWK"],"bt":"0","br":[],"ba":[],"c":[],"a":[]}"#,
);
const ROT_SIGER_0: &str =
    "AAAje97Ln_KxUuoLUoVtZPJWbe00LD_gQ_c_tP7p7fYdhIVL004byIzOwp9tOLmVHfKdxoR-tSl-ycjeLYgVXJsH";

fn signer(seed: u8) -> Signer {
    Signer::from_seed(&[seed; 32], true)
}

fn verfers(seeds: &[u8]) -> Vec<Verfer> {
    seeds.iter().map(|s| signer(*s).verfer().clone()).collect()
}

fn inception() -> Serder {
    InceptionBuilder::new(verfers(&[1, 2]))
        .ndigs(next_digests(&verfers(&[10, 11]), mtr::SHA3_256).unwrap())
        .code(mtr::SHA3_256)
        .build()
        .unwrap()
}

#[test]
fn golden_inception() {
    let icp = inception();
    assert_eq!(icp.said().unwrap(), ICP_SAID);
    assert_eq!(icp.pre().unwrap(), ICP_SAID);
    assert_eq!(icp.raw(), ICP_RAW.as_bytes());
    assert_eq!(icp.size(), 0x189);

    let siger = signer(1).sign_indexed(icp.raw(), 0, None, false).unwrap();
    assert_eq!(siger.qb64(), ICP_SIGER_0);
}

#[test]
fn golden_rotation() {
    let state = KeyState::from_inception(&inception()).unwrap();
    let rot = RotationBuilder::new(&state, verfers(&[10, 11]))
        .ndigs(next_digests(&verfers(&[20, 21]), mtr::SHA3_256).unwrap())
        .code(mtr::SHA3_256)
        .build()
        .unwrap();
    assert_eq!(rot.said().unwrap(), ROT_SAID);
    assert_eq!(rot.raw(), ROT_RAW.as_bytes());

    let siger = signer(10).sign_indexed(rot.raw(), 0, None, false).unwrap();
    assert_eq!(siger.qb64(), ROT_SIGER_0);
}

#[test]
fn golden_log_validates_from_text() {
    let (icp, used) = Serder::from_raw(ICP_RAW.as_bytes()).unwrap();
    assert_eq!(used, ICP_RAW.len());
    let siger = keystone_cesr::Siger::from_qb64(ICP_SIGER_0).unwrap();
    let state = validate_event(None, &icp, &[siger]).unwrap();
    assert_eq!(state.prefix.qb64(), ICP_SAID);

    let (rot, _) = Serder::from_raw(ROT_RAW.as_bytes()).unwrap();
    let siger = keystone_cesr::Siger::from_qb64(ROT_SIGER_0).unwrap();
    let state = validate_event(Some(&state), &rot, &[siger]).unwrap();
    assert_eq!(state.sn, 1);
    assert_eq!(state.said, ROT_SAID);
    assert_eq!(state.keys, verfers(&[10, 11]));
    assert_eq!(state.ntholder, Tholder::count(1));
}

#[test]
fn golden_text_is_canonical() {
    // Whitespace changes the serialization and is rejected.
    let spaced = ICP_RAW.replacen(r#""s":"0""#, r#""s": "0""#, 1);
    assert!(Serder::from_raw(spaced.as_bytes()).is_err());
}

#[test]
fn overlapping_clauses_share_a_signer() {
    let sith = Tholder::weighted(&[vec!["1/2", "1/2", "0"], vec!["1/2", "0", "1/2"]]).unwrap();
    let icp = InceptionBuilder::new(verfers(&[1, 2, 3]))
        .isith(sith)
        .build()
        .unwrap();
    let sign = |which: &[u8]| -> Vec<keystone_cesr::Siger> {
        which
            .iter()
            .map(|i| {
                signer(i + 1)
                    .sign_indexed(icp.raw(), u32::from(*i), None, false)
                    .unwrap()
            })
            .collect()
    };
    // Key 0 carries half of each clause.
    assert!(validate_event(None, &icp, &sign(&[0, 1, 2])).is_ok());
    assert!(validate_event(None, &icp, &sign(&[0, 1])).is_err());
    assert!(validate_event(None, &icp, &sign(&[1, 2])).is_err());
}

proptest! {
    #[test]
    fn inception_said_commits_to_anchored_data(text in "[a-z]{1,16}") {
        let icp = InceptionBuilder::new(verfers(&[1]))
            .data(vec![serde_json::json!({"x": text})])
            .build()
            .unwrap();
        prop_assert!(icp.verify_said().unwrap());
        let other = InceptionBuilder::new(verfers(&[1])).build().unwrap();
        prop_assert_ne!(icp.said().unwrap(), other.said().unwrap());
    }
}
