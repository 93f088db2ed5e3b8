//! Key event construction.
//!
//! Builders produce self-addressed [`Serder`]s with KERI field order:
//!
//! ```text
//! icp: v t d i s kt k nt n bt b c a        (dip appends di)
//! rot: v t d i s p kt k nt n bt br ba c a  (drt has the same fields)
//! ixn: v t d i s p a
//! ```

use std::collections::BTreeSet;

use keystone_cesr::{mtr, Diger, Prefixer, Verfer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{EventError, Result};
use crate::said::{saidify, saidify_all};
use crate::serder::Serder;
use crate::state::KeyState;
use crate::tholder::{default_next_threshold, default_signing_threshold, Tholder};
use crate::version::{versify, Ilk};

/// Configuration trait: establishment events only, no interactions.
pub const TRAIT_ESTABLISHMENT_ONLY: &str = "EO";

/// Default witness threshold for `n` witnesses: the smallest count that
/// still guarantees agreement with up to `f` faulty witnesses.
pub fn ample(n: usize) -> usize {
    let m = n.saturating_sub(1);
    let f1 = (m / 3).max(1);
    let f2 = m.div_ceil(3).max(1);
    n.min((n + f1 + 1).div_ceil(2)).min((n + f2 + 1).div_ceil(2))
}

/// An anchor for another event: `{i, s, d}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealEvent {
    pub i: String,
    pub s: String,
    pub d: String,
}

impl SealEvent {
    pub fn new(pre: &str, sn: u128, said: &str) -> Self {
        Self {
            i: pre.to_string(),
            s: format!("{sn:x}"),
            d: said.to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({"i": self.i, "s": self.s, "d": self.d})
    }
}

pub(crate) fn check_current_threshold(tholder: &Tholder, count: usize) -> Result<()> {
    match tholder {
        Tholder::Unweighted(t) if *t < 1 => Err(EventError::InvalidThreshold(format!(
            "signing threshold {t} is below 1"
        ))),
        Tholder::Unweighted(t) if *t as usize > count => Err(EventError::InvalidThreshold(
            format!("signing threshold {t} exceeds {count} keys"),
        )),
        Tholder::Weighted(_) => match tholder.mismatched_clauses(count).first() {
            Some((i, len)) => Err(EventError::InvalidThreshold(format!(
                "clause {i} has {len} weights for {count} keys"
            ))),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

pub(crate) fn check_next_threshold(tholder: &Tholder, count: usize) -> Result<()> {
    match tholder {
        Tholder::Unweighted(t) if *t as usize > count => Err(EventError::InvalidThreshold(
            format!("next threshold {t} exceeds {count} next digests"),
        )),
        Tholder::Weighted(_) => match tholder.mismatched_clauses(count).first() {
            Some((i, len)) => Err(EventError::InvalidThreshold(format!(
                "next clause {i} has {len} weights for {count} next digests"
            ))),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

pub(crate) fn check_unique(field: &str, items: &[String]) -> Result<BTreeSet<String>> {
    let set: BTreeSet<String> = items.iter().cloned().collect();
    if set.len() != items.len() {
        return Err(EventError::InvalidWitnesses(format!(
            "{field} has duplicates"
        )));
    }
    for item in items {
        Prefixer::from_qb64(item)?;
    }
    Ok(set)
}

pub(crate) fn check_toad(toad: Option<u64>, count: usize) -> Result<u64> {
    let toad = toad.unwrap_or(ample(count) as u64);
    if count == 0 && toad != 0 {
        return Err(EventError::InvalidWitnesses(format!(
            "witness threshold {toad} without witnesses"
        )));
    }
    if count > 0 && (toad < 1 || toad as usize > count) {
        return Err(EventError::InvalidWitnesses(format!(
            "witness threshold {toad} out of range for {count} witnesses"
        )));
    }
    Ok(toad)
}

/// Witness list after a rotation's cuts and adds, with validation.
pub fn rotate_witnesses(wits: &[String], cuts: &[String], adds: &[String]) -> Result<Vec<String>> {
    let witset = check_unique("b", wits)?;
    let cutset = check_unique("br", cuts)?;
    let addset = check_unique("ba", adds)?;
    if !cutset.is_subset(&witset) {
        return Err(EventError::InvalidWitnesses(
            "cuts include non-witnesses".into(),
        ));
    }
    if !cutset.is_disjoint(&addset) {
        return Err(EventError::InvalidWitnesses(
            "cuts and adds intersect".into(),
        ));
    }
    if !witset.is_disjoint(&addset) {
        return Err(EventError::InvalidWitnesses(
            "adds include current witnesses".into(),
        ));
    }
    let mut out: Vec<String> = wits.iter().filter(|w| !cutset.contains(*w)).cloned().collect();
    out.extend(adds.iter().cloned());
    Ok(out)
}

/// Check that `keys` fulfil the pre-rotation commitment in `ndigs`.
///
/// Every key must digest (with the code of the commitment it matches) to
/// one of the committed digests, and the matched commitments must satisfy
/// `ntholder`. Returns the matched commitment positions in key order.
pub fn verify_commitment(ndigs: &[Diger], ntholder: &Tholder, keys: &[Verfer]) -> Result<Vec<u32>> {
    if ndigs.is_empty() {
        return Err(EventError::CommitmentViolation(
            "no next keys were committed".into(),
        ));
    }
    let mut matched = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        let ser = key.qb64();
        let position = ndigs
            .iter()
            .position(|ndig| ndig.verify(ser.as_bytes()))
            .ok_or_else(|| {
                warn!(key = %ser, "rotation key was not committed");
                EventError::CommitmentViolation(format!("key {i} ({ser}) was not committed"))
            })?;
        matched.push(position as u32);
    }
    if !ntholder.satisfy(&matched) {
        warn!(?matched, "rotation keys do not satisfy the prior next threshold");
        return Err(EventError::CommitmentViolation(format!(
            "committed keys {matched:?} do not satisfy next threshold {ntholder}"
        )));
    }
    Ok(matched)
}

/// Digests committing to `keys` as the next key set.
pub fn next_digests(keys: &[Verfer], code: &str) -> Result<Vec<Diger>> {
    keys.iter()
        .map(|k| Diger::new(code, k.qb64().as_bytes()).map_err(EventError::from))
        .collect()
}

fn qb64s<'a, I, T>(items: I, f: impl Fn(&T) -> String) -> Value
where
    I: IntoIterator<Item = &'a T>,
    T: 'a,
{
    Value::Array(items.into_iter().map(|t| Value::String(f(t))).collect())
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Builder for inception (`icp`) and delegated inception (`dip`) events.
#[derive(Debug, Clone)]
pub struct InceptionBuilder {
    keys: Vec<Verfer>,
    isith: Option<Tholder>,
    ndigs: Vec<Diger>,
    nsith: Option<Tholder>,
    wits: Vec<String>,
    toad: Option<u64>,
    cnfg: Vec<String>,
    data: Vec<Value>,
    delpre: Option<String>,
    code: &'static str,
    basic: bool,
}

impl InceptionBuilder {
    /// Start an inception for the current signing keys.
    pub fn new(keys: Vec<Verfer>) -> Self {
        Self {
            keys,
            isith: None,
            ndigs: Vec::new(),
            nsith: None,
            wits: Vec::new(),
            toad: None,
            cnfg: Vec::new(),
            data: Vec::new(),
            delpre: None,
            code: mtr::BLAKE3_256,
            basic: false,
        }
    }

    /// Current signing threshold. Defaults to a majority.
    pub fn isith(mut self, tholder: Tholder) -> Self {
        self.isith = Some(tholder);
        self
    }

    /// Next key digests (the pre-rotation commitment).
    pub fn ndigs(mut self, ndigs: Vec<Diger>) -> Self {
        self.ndigs = ndigs;
        self
    }

    /// Next signing threshold. Defaults to a majority of next keys.
    pub fn nsith(mut self, tholder: Tholder) -> Self {
        self.nsith = Some(tholder);
        self
    }

    pub fn wits(mut self, wits: Vec<String>) -> Self {
        self.wits = wits;
        self
    }

    /// Witness threshold. Defaults to [`ample`] of the witness count.
    pub fn toad(mut self, toad: u64) -> Self {
        self.toad = Some(toad);
        self
    }

    /// Configuration traits such as [`TRAIT_ESTABLISHMENT_ONLY`].
    pub fn cnfg(mut self, cnfg: Vec<String>) -> Self {
        self.cnfg = cnfg;
        self
    }

    /// Anchored data (usually seals).
    pub fn data(mut self, data: Vec<Value>) -> Self {
        self.data = data;
        self
    }

    /// Make this a delegated inception under `delpre`.
    pub fn delpre(mut self, delpre: impl Into<String>) -> Self {
        self.delpre = Some(delpre.into());
        self
    }

    /// Digest code for the SAID and self-addressing prefix.
    pub fn code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    /// Use the single signing key itself as the prefix.
    pub fn basic(mut self) -> Self {
        self.basic = true;
        self
    }

    pub fn build(self) -> Result<Serder> {
        let ilk = if self.delpre.is_some() {
            Ilk::Dip
        } else {
            Ilk::Icp
        };
        if self.keys.is_empty() {
            return Err(EventError::InvalidField {
                field: "k".into(),
                reason: "at least one signing key is required".into(),
            });
        }
        let tholder = self
            .isith
            .unwrap_or_else(|| default_signing_threshold(self.keys.len()));
        check_current_threshold(&tholder, self.keys.len())?;
        let ntholder = self
            .nsith
            .unwrap_or_else(|| default_next_threshold(self.ndigs.len()));
        check_next_threshold(&ntholder, self.ndigs.len())?;
        check_unique("b", &self.wits)?;
        let toad = check_toad(self.toad, self.wits.len())?;

        let mut ked = Map::new();
        ked.insert("v".into(), Value::String(versify(0)?));
        ked.insert("t".into(), Value::String(ilk.to_string()));
        ked.insert("d".into(), Value::String(String::new()));
        ked.insert("i".into(), Value::String(String::new()));
        ked.insert("s".into(), Value::String("0".into()));
        ked.insert("kt".into(), tholder.sith());
        ked.insert("k".into(), qb64s(&self.keys, Verfer::qb64));
        ked.insert("nt".into(), ntholder.sith());
        ked.insert("n".into(), qb64s(&self.ndigs, Diger::qb64));
        ked.insert("bt".into(), Value::String(format!("{toad:x}")));
        ked.insert("b".into(), strings(&self.wits));
        ked.insert("c".into(), strings(&self.cnfg));
        ked.insert("a".into(), Value::Array(self.data));
        if let Some(delpre) = &self.delpre {
            Prefixer::from_qb64(delpre)?;
            ked.insert("di".into(), Value::String(delpre.clone()));
        }

        let value = if self.basic {
            if self.delpre.is_some() {
                return Err(EventError::InvalidPrefix(
                    "delegated identifiers must be self-addressing".into(),
                ));
            }
            let [key] = self.keys.as_slice() else {
                return Err(EventError::InvalidPrefix(format!(
                    "basic prefix needs exactly one key, got {}",
                    self.keys.len()
                )));
            };
            if !key.is_transferable() && (!self.ndigs.is_empty() || !self.wits.is_empty()) {
                return Err(EventError::InvalidPrefix(
                    "non-transferable prefix cannot commit next keys or witnesses".into(),
                ));
            }
            let no_data = ked.get("a").and_then(Value::as_array).map_or(true, Vec::is_empty);
            if !key.is_transferable() && !no_data {
                return Err(EventError::InvalidPrefix(
                    "non-transferable prefix cannot anchor data".into(),
                ));
            }
            ked.insert("i".into(), Value::String(key.qb64()));
            saidify(&Value::Object(ked), "d", self.code)?.1
        } else {
            saidify_all(&Value::Object(ked), &["d", "i"], self.code)?.1
        };
        let serder = into_serder(value)?;
        debug!(ilk = %ilk, said = serder.said()?, "built inception");
        Ok(serder)
    }
}

fn into_serder(value: Value) -> Result<Serder> {
    match value {
        Value::Object(map) => Serder::from_ked(map),
        _ => Err(EventError::NotAnObject),
    }
}

/// Builder for rotation (`rot`) and delegated rotation (`drt`) events.
#[derive(Debug, Clone)]
pub struct RotationBuilder<'a> {
    state: &'a KeyState,
    keys: Vec<Verfer>,
    sn: Option<u128>,
    isith: Option<Tholder>,
    ndigs: Vec<Diger>,
    nsith: Option<Tholder>,
    cuts: Vec<String>,
    adds: Vec<String>,
    toad: Option<u64>,
    cnfg: Vec<String>,
    data: Vec<Value>,
    code: &'static str,
}

impl<'a> RotationBuilder<'a> {
    /// Start a rotation of `state` to `keys`, which must have been
    /// committed by the prior establishment event.
    pub fn new(state: &'a KeyState, keys: Vec<Verfer>) -> Self {
        Self {
            state,
            keys,
            sn: None,
            isith: None,
            ndigs: Vec::new(),
            nsith: None,
            cuts: Vec::new(),
            adds: Vec::new(),
            toad: None,
            cnfg: Vec::new(),
            data: Vec::new(),
            code: mtr::BLAKE3_256,
        }
    }

    /// Sequence number. Defaults to one past the state.
    pub fn sn(mut self, sn: u128) -> Self {
        self.sn = Some(sn);
        self
    }

    pub fn isith(mut self, tholder: Tholder) -> Self {
        self.isith = Some(tholder);
        self
    }

    pub fn ndigs(mut self, ndigs: Vec<Diger>) -> Self {
        self.ndigs = ndigs;
        self
    }

    pub fn nsith(mut self, tholder: Tholder) -> Self {
        self.nsith = Some(tholder);
        self
    }

    /// Witnesses to remove.
    pub fn cuts(mut self, cuts: Vec<String>) -> Self {
        self.cuts = cuts;
        self
    }

    /// Witnesses to add.
    pub fn adds(mut self, adds: Vec<String>) -> Self {
        self.adds = adds;
        self
    }

    pub fn toad(mut self, toad: u64) -> Self {
        self.toad = Some(toad);
        self
    }

    pub fn cnfg(mut self, cnfg: Vec<String>) -> Self {
        self.cnfg = cnfg;
        self
    }

    pub fn data(mut self, data: Vec<Value>) -> Self {
        self.data = data;
        self
    }

    pub fn code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    pub fn build(self) -> Result<Serder> {
        let state = self.state;
        if !state.is_transferable() {
            return Err(EventError::NonTransferable(state.prefix.qb64()));
        }
        let expected = state.sn + 1;
        let sn = self.sn.unwrap_or(expected);
        if sn != expected {
            return Err(EventError::SequenceViolation {
                expected,
                actual: sn,
            });
        }
        if self.keys.is_empty() {
            return Err(EventError::InvalidField {
                field: "k".into(),
                reason: "at least one signing key is required".into(),
            });
        }
        verify_commitment(&state.ndigs, &state.ntholder, &self.keys)?;

        let tholder = self
            .isith
            .unwrap_or_else(|| default_signing_threshold(self.keys.len()));
        check_current_threshold(&tholder, self.keys.len())?;
        let ntholder = self
            .nsith
            .unwrap_or_else(|| default_next_threshold(self.ndigs.len()));
        check_next_threshold(&ntholder, self.ndigs.len())?;
        let wits = rotate_witnesses(&state.wits, &self.cuts, &self.adds)?;
        let toad = check_toad(self.toad, wits.len())?;
        let ilk = if state.delpre.is_some() {
            Ilk::Drt
        } else {
            Ilk::Rot
        };

        let mut ked = Map::new();
        ked.insert("v".into(), Value::String(versify(0)?));
        ked.insert("t".into(), Value::String(ilk.to_string()));
        ked.insert("d".into(), Value::String(String::new()));
        ked.insert("i".into(), Value::String(state.prefix.qb64()));
        ked.insert("s".into(), Value::String(format!("{sn:x}")));
        ked.insert("p".into(), Value::String(state.said.clone()));
        ked.insert("kt".into(), tholder.sith());
        ked.insert("k".into(), qb64s(&self.keys, Verfer::qb64));
        ked.insert("nt".into(), ntholder.sith());
        ked.insert("n".into(), qb64s(&self.ndigs, Diger::qb64));
        ked.insert("bt".into(), Value::String(format!("{toad:x}")));
        ked.insert("br".into(), strings(&self.cuts));
        ked.insert("ba".into(), strings(&self.adds));
        ked.insert("c".into(), strings(&self.cnfg));
        ked.insert("a".into(), Value::Array(self.data));

        let (_, value) = saidify(&Value::Object(ked), "d", self.code)?;
        let serder = into_serder(value)?;
        debug!(pre = %state.prefix, sn = %sn, said = serder.said()?, "built rotation");
        Ok(serder)
    }
}

/// Builder for interaction (`ixn`) events.
#[derive(Debug, Clone)]
pub struct InteractionBuilder<'a> {
    state: &'a KeyState,
    sn: Option<u128>,
    data: Vec<Value>,
    code: &'static str,
}

impl<'a> InteractionBuilder<'a> {
    pub fn new(state: &'a KeyState) -> Self {
        Self {
            state,
            sn: None,
            data: Vec::new(),
            code: mtr::BLAKE3_256,
        }
    }

    /// Sequence number. Defaults to one past the state.
    pub fn sn(mut self, sn: u128) -> Self {
        self.sn = Some(sn);
        self
    }

    pub fn data(mut self, data: Vec<Value>) -> Self {
        self.data = data;
        self
    }

    pub fn code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    pub fn build(self) -> Result<Serder> {
        let state = self.state;
        if state.is_establishment_only() {
            return Err(EventError::UnexpectedIlk {
                expected: "establishment event".into(),
                actual: Ilk::Ixn.to_string(),
            });
        }
        let expected = state.sn + 1;
        let sn = self.sn.unwrap_or(expected);
        if sn != expected {
            return Err(EventError::SequenceViolation {
                expected,
                actual: sn,
            });
        }

        let mut ked = Map::new();
        ked.insert("v".into(), Value::String(versify(0)?));
        ked.insert("t".into(), Value::String(Ilk::Ixn.to_string()));
        ked.insert("d".into(), Value::String(String::new()));
        ked.insert("i".into(), Value::String(state.prefix.qb64()));
        ked.insert("s".into(), Value::String(format!("{sn:x}")));
        ked.insert("p".into(), Value::String(state.said.clone()));
        ked.insert("a".into(), Value::Array(self.data));

        let (_, value) = saidify(&Value::Object(ked), "d", self.code)?;
        let serder = into_serder(value)?;
        debug!(pre = %state.prefix, sn = %sn, said = serder.said()?, "built interaction");
        Ok(serder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_cesr::Signer;

    fn signers(tag: u8, n: usize) -> Vec<Signer> {
        (0..n)
            .map(|i| Signer::from_seed(&[tag.wrapping_add(i as u8); 32], true))
            .collect()
    }

    fn verfers(signers: &[Signer]) -> Vec<Verfer> {
        signers.iter().map(|s| s.verfer().clone()).collect()
    }

    fn witness(tag: u8) -> String {
        Signer::from_seed(&[tag; 32], false).verfer().qb64()
    }

    #[test]
    fn test_ample() {
        let expected = [0, 1, 2, 3, 3, 4, 4, 5, 6, 6, 7, 8, 8];
        for (n, want) in expected.iter().enumerate() {
            assert_eq!(ample(n), *want, "ample({n})");
        }
    }

    #[test]
    fn test_inception_field_order_and_said() {
        let current = signers(1, 3);
        let next = signers(10, 3);
        let ndigs = next_digests(&verfers(&next), mtr::BLAKE3_256).unwrap();
        let serder = InceptionBuilder::new(verfers(&current))
            .ndigs(ndigs)
            .build()
            .unwrap();
        let fields: Vec<&str> = serder.ked().keys().map(String::as_str).collect();
        assert_eq!(
            fields,
            ["v", "t", "d", "i", "s", "kt", "k", "nt", "n", "bt", "b", "c", "a"]
        );
        assert_eq!(serder.said().unwrap(), serder.pre().unwrap());
        assert_eq!(serder.ked()["kt"], json!("2"));
        assert_eq!(serder.ked()["nt"], json!("2"));
        assert_eq!(serder.ked()["bt"], json!("0"));
        assert!(serder.verify_said().unwrap());
        assert_eq!(serder.version().unwrap().size, serder.size());
    }

    #[test]
    fn test_inception_is_deterministic() {
        let keys = verfers(&signers(1, 2));
        let a = InceptionBuilder::new(keys.clone()).build().unwrap();
        let b = InceptionBuilder::new(keys.clone()).build().unwrap();
        assert_eq!(a.said().unwrap(), b.said().unwrap());
        let c = InceptionBuilder::new(keys)
            .cnfg(vec![TRAIT_ESTABLISHMENT_ONLY.into()])
            .build()
            .unwrap();
        assert_ne!(a.said().unwrap(), c.said().unwrap());
    }

    #[test]
    fn test_delegated_inception() {
        let delegator = InceptionBuilder::new(verfers(&signers(50, 1))).build().unwrap();
        let serder = InceptionBuilder::new(verfers(&signers(1, 1)))
            .delpre(delegator.pre().unwrap())
            .build()
            .unwrap();
        assert_eq!(serder.ilk().unwrap(), Ilk::Dip);
        assert_eq!(serder.ked().keys().last().unwrap(), "di");
        assert_eq!(serder.delpre(), Some(delegator.pre().unwrap()));
        assert!(serder.verify_said().unwrap());
    }

    #[test]
    fn test_basic_prefix() {
        let key = Signer::from_seed(&[3u8; 32], false).verfer().clone();
        let serder = InceptionBuilder::new(vec![key.clone()]).basic().build().unwrap();
        assert_eq!(serder.pre().unwrap(), key.qb64());
        assert_ne!(serder.said().unwrap(), serder.pre().unwrap());
        assert!(serder.verify_said().unwrap());

        let two = verfers(&signers(1, 2));
        assert!(matches!(
            InceptionBuilder::new(two).basic().build(),
            Err(EventError::InvalidPrefix(_))
        ));
        let ndigs = next_digests(&[key.clone()], mtr::BLAKE3_256).unwrap();
        assert!(matches!(
            InceptionBuilder::new(vec![key]).basic().ndigs(ndigs).build(),
            Err(EventError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn test_threshold_validation() {
        let keys = verfers(&signers(1, 2));
        assert!(matches!(
            InceptionBuilder::new(keys.clone()).isith(Tholder::count(3)).build(),
            Err(EventError::InvalidThreshold(_))
        ));
        assert!(matches!(
            InceptionBuilder::new(keys.clone()).isith(Tholder::count(0)).build(),
            Err(EventError::InvalidThreshold(_))
        ));
        let weighted = Tholder::weighted(&[vec!["1/2", "1/2", "1/2"]]).unwrap();
        assert!(matches!(
            InceptionBuilder::new(keys).isith(weighted).build(),
            Err(EventError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_multi_clause_inception() {
        let keys = verfers(&signers(1, 2));
        let sith = Tholder::weighted(&[vec!["1/2", "1/2"], vec!["1", "0"]]).unwrap();
        let serder = InceptionBuilder::new(keys.clone())
            .isith(sith.clone())
            .build()
            .unwrap();
        assert_eq!(serder.tholder().unwrap(), sith);
        assert!(serder.tholder().unwrap().satisfy(&[0, 1]));

        let short = Tholder::weighted(&[vec!["1/2", "1/2", "0"], vec!["1", "0", "0"]]).unwrap();
        assert!(matches!(
            InceptionBuilder::new(keys).isith(short).build(),
            Err(EventError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_witness_validation() {
        let keys = verfers(&signers(1, 1));
        let wits = vec![witness(90), witness(91), witness(92)];
        let serder = InceptionBuilder::new(keys.clone()).wits(wits.clone()).build().unwrap();
        assert_eq!(serder.toad().unwrap(), 2);

        let dup = vec![witness(90), witness(90)];
        assert!(matches!(
            InceptionBuilder::new(keys.clone()).wits(dup).build(),
            Err(EventError::InvalidWitnesses(_))
        ));
        assert!(matches!(
            InceptionBuilder::new(keys.clone()).wits(wits).toad(4).build(),
            Err(EventError::InvalidWitnesses(_))
        ));
        assert!(matches!(
            InceptionBuilder::new(keys).toad(1).build(),
            Err(EventError::InvalidWitnesses(_))
        ));
    }

    #[test]
    fn test_rotate_witnesses() {
        let (a, b, c) = (witness(1), witness(2), witness(3));
        let out = rotate_witnesses(&[a.clone(), b.clone()], &[a.clone()], &[c.clone()]).unwrap();
        assert_eq!(out, vec![b.clone(), c.clone()]);
        assert!(rotate_witnesses(&[a.clone()], &[b.clone()], &[]).is_err());
        assert!(rotate_witnesses(&[a.clone()], &[a.clone()], &[a.clone()]).is_err());
        assert!(rotate_witnesses(&[a.clone()], &[], &[a]).is_err());
    }

    #[test]
    fn test_seal_value() {
        let seal = SealEvent::new("Eabc", 26, "Edig");
        assert_eq!(seal.to_value(), json!({"i": "Eabc", "s": "1a", "d": "Edig"}));
    }
}
