//! Signing thresholds.
//!
//! A threshold is either an unweighted count of distinct signers or a list
//! of weighted clauses. Every clause carries one weight per key, aligned to
//! key list position, so a signer index counts toward every clause. A
//! weighted threshold is satisfied when every clause's signed weights sum to
//! at least one.
//!
//! Accepted input forms:
//!
//! ```text
//! 2                          unweighted integer
//! "2"                        unweighted, hex (as in KERI `kt` / `nt`)
//! ["1/2", "1/2", "1/4"]      one weighted clause
//! [["1/2", "1/2"], ["1", "0"]]  several weighted clauses
//! "[[\"1/2\",\"1/2\"]]"      any list form as a JSON string
//! ```

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use keystone_cesr::{Bexter, Matter, Number};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{EventError, Result};

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// An exact non-negative rational weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Weight {
    num: u128,
    den: u128,
}

impl Weight {
    pub const ZERO: Weight = Weight { num: 0, den: 1 };
    pub const ONE: Weight = Weight { num: 1, den: 1 };

    /// Build a reduced weight. Returns `None` for a zero denominator.
    pub fn new(num: u128, den: u128) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num, den).max(1);
        Some(Self {
            num: num / g,
            den: den / g,
        })
    }

    pub fn numerator(&self) -> u128 {
        self.num
    }

    pub fn denominator(&self) -> u128 {
        self.den
    }

    /// Exact sum, or `None` on overflow.
    pub fn checked_add(self, other: Weight) -> Option<Weight> {
        let g = gcd(self.den, other.den).max(1);
        let den = (self.den / g).checked_mul(other.den)?;
        let num = self
            .num
            .checked_mul(den / self.den)?
            .checked_add(other.num.checked_mul(den / other.den)?)?;
        Weight::new(num, den)
    }

    fn is_proper(&self) -> bool {
        self.num > 0 && self.num < self.den
    }
}

impl PartialOrd for Weight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weight {
    fn cmp(&self, other: &Self) -> Ordering {
        // Cross multiply; fall back to float for astronomically large terms.
        match (
            self.num.checked_mul(other.den),
            other.num.checked_mul(self.den),
        ) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => {
                let a = self.num as f64 / self.den as f64;
                let b = other.num as f64 / other.den as f64;
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
        }
    }
}

impl FromStr for Weight {
    type Err = EventError;

    /// Parse `"n"` or `"n/d"` with decimal digits.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EventError::InvalidThreshold(format!("invalid weight {s:?}"));
        let digits = |t: &str| -> Result<u128> {
            if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            t.parse::<u128>().map_err(|_| invalid())
        };
        let weight = match s.split_once('/') {
            Some((n, d)) => Weight::new(digits(n)?, digits(d)?).ok_or_else(invalid)?,
            None => Weight::new(digits(s)?, 1).ok_or_else(invalid)?,
        };
        Ok(weight)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// A parsed signing threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tholder {
    /// At least this many distinct signers.
    Unweighted(u64),
    /// Clauses of weights. Each clause holds one weight per key, in key
    /// list order.
    Weighted(Vec<Vec<Weight>>),
}

impl Tholder {
    /// Unweighted threshold.
    pub fn count(thold: u64) -> Self {
        Tholder::Unweighted(thold)
    }

    /// Weighted threshold from string clauses, validating each clause.
    pub fn weighted<S: AsRef<str>>(clauses: &[Vec<S>]) -> Result<Self> {
        let clauses = clauses
            .iter()
            .map(|clause| clause.iter().map(|w| w.as_ref().parse()).collect())
            .collect::<Result<Vec<Vec<Weight>>>>()?;
        Self::from_clauses(clauses)
    }

    fn from_clauses(clauses: Vec<Vec<Weight>>) -> Result<Self> {
        if clauses.is_empty() {
            return Err(EventError::InvalidThreshold("empty clause list".into()));
        }
        let width = clauses[0].len();
        for (i, clause) in clauses.iter().enumerate() {
            if clause.is_empty() {
                return Err(EventError::InvalidThreshold(format!("clause {i} is empty")));
            }
            if clause.len() != width {
                return Err(EventError::InvalidThreshold(format!(
                    "clause {i} has {} weights, clause 0 has {width}",
                    clause.len()
                )));
            }
            let mut sum = Weight::ZERO;
            for w in clause {
                if *w > Weight::ONE {
                    return Err(EventError::InvalidThreshold(format!(
                        "weight {w} in clause {i} exceeds 1"
                    )));
                }
                sum = sum.checked_add(*w).ok_or_else(|| {
                    EventError::InvalidThreshold(format!("clause {i} weights overflow"))
                })?;
            }
            if sum < Weight::ONE {
                return Err(EventError::InvalidThreshold(format!(
                    "clause {i} sums to {sum}, below 1"
                )));
            }
        }
        Ok(Tholder::Weighted(clauses))
    }

    /// Parse any accepted JSON form.
    pub fn from_sith(sith: &Value) -> Result<Self> {
        match sith {
            Value::Number(n) => n.as_u64().map(Tholder::Unweighted).ok_or_else(|| {
                EventError::InvalidThreshold(format!("{n} is not a non-negative integer"))
            }),
            Value::String(s) => Self::from_sith_str(s),
            Value::Array(items) => Self::from_list(items),
            other => Err(EventError::InvalidThreshold(format!(
                "unsupported threshold {other}"
            ))),
        }
    }

    /// Parse a string form: hex integer or a JSON encoded list.
    pub fn from_sith_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.starts_with('[') {
            let value: Value = serde_json::from_str(trimmed)
                .map_err(|e| EventError::InvalidThreshold(format!("{s:?}: {e}")))?;
            return Self::from_sith(&value);
        }
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EventError::InvalidThreshold(format!(
                "{s:?} is not a hex integer"
            )));
        }
        u64::from_str_radix(trimmed, 16)
            .map(Tholder::Unweighted)
            .map_err(|e| EventError::InvalidThreshold(format!("{s:?}: {e}")))
    }

    fn from_list(items: &[Value]) -> Result<Self> {
        if items.is_empty() {
            return Err(EventError::InvalidThreshold("empty clause list".into()));
        }
        let clause_of = |values: &[Value]| -> Result<Vec<Weight>> {
            values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.parse(),
                    other => Err(EventError::InvalidThreshold(format!(
                        "weight {other} must be a string"
                    ))),
                })
                .collect()
        };
        let clauses = if items.iter().all(Value::is_array) {
            items
                .iter()
                .map(|item| clause_of(item.as_array().map(Vec::as_slice).unwrap_or(&[])))
                .collect::<Result<Vec<_>>>()?
        } else if items.iter().all(Value::is_string) {
            vec![clause_of(items)?]
        } else {
            return Err(EventError::InvalidThreshold(
                "threshold list mixes weights and clauses".into(),
            ));
        };
        Self::from_clauses(clauses)
    }

    /// Parse the compact `limen` text form.
    pub fn from_limen(limen: &str) -> Result<Self> {
        let matter = Matter::from_qb64(limen)?;
        if let Ok(number) = Number::from_matter(matter.clone()) {
            let thold = number.as_u64().ok_or_else(|| {
                EventError::InvalidThreshold(format!("threshold {} too large", number.num()))
            })?;
            return Ok(Tholder::Unweighted(thold));
        }
        let bext = Bexter::from_matter(matter)?.bext();
        let clauses = bext
            .split('a')
            .map(|clause| {
                clause
                    .split('c')
                    .map(|w| w.replace('s', "/").parse())
                    .collect::<Result<Vec<Weight>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_clauses(clauses)
    }

    pub fn is_weighted(&self) -> bool {
        matches!(self, Tholder::Weighted(_))
    }

    /// The unweighted count, if unweighted.
    pub fn num(&self) -> Option<u64> {
        match self {
            Tholder::Unweighted(t) => Some(*t),
            Tholder::Weighted(_) => None,
        }
    }

    /// Number of keys the threshold speaks for. Unweighted thresholds
    /// require at least `thold` keys; weighted thresholds carry one weight
    /// per key in every clause.
    pub fn size(&self) -> usize {
        match self {
            Tholder::Unweighted(t) => *t as usize,
            Tholder::Weighted(clauses) => clauses.first().map_or(0, Vec::len),
        }
    }

    /// Clause weight counts that differ from `count`, as `(clause, len)`.
    pub fn mismatched_clauses(&self, count: usize) -> Vec<(usize, usize)> {
        match self {
            Tholder::Unweighted(_) => Vec::new(),
            Tholder::Weighted(clauses) => clauses
                .iter()
                .enumerate()
                .filter(|(_, c)| c.len() != count)
                .map(|(i, c)| (i, c.len()))
                .collect(),
        }
    }

    /// Whether the signers at `indices` meet the threshold.
    ///
    /// Duplicate indices count once. For weighted thresholds every index
    /// contributes its weight to every clause; indices past the last
    /// weight are ignored.
    pub fn satisfy(&self, indices: &[u32]) -> bool {
        let distinct: BTreeSet<usize> = indices.iter().map(|i| *i as usize).collect();
        match self {
            Tholder::Unweighted(t) => *t > 0 && distinct.len() as u64 >= *t,
            Tholder::Weighted(clauses) => clauses.iter().all(|clause| {
                let mut sum = Weight::ZERO;
                for i in &distinct {
                    let Some(w) = clause.get(*i) else { continue };
                    match sum.checked_add(*w) {
                        Some(s) => sum = s,
                        None => return false,
                    }
                }
                sum >= Weight::ONE
            }),
        }
    }

    /// JSON form for event bodies: hex string, or weight lists.
    pub fn sith(&self) -> Value {
        match self {
            Tholder::Unweighted(t) => Value::String(format!("{t:x}")),
            Tholder::Weighted(clauses) => {
                let render = |clause: &Vec<Weight>| {
                    Value::Array(
                        clause
                            .iter()
                            .map(|w| Value::String(w.to_string()))
                            .collect(),
                    )
                };
                match clauses.as_slice() {
                    [single] => render(single),
                    many => Value::Array(many.iter().map(render).collect()),
                }
            }
        }
    }

    /// Compact text form: a Number for counts, a Bexter for weights with
    /// `s` for `/`, `c` between weights and `a` between clauses.
    pub fn limen(&self) -> Result<String> {
        match self {
            Tholder::Unweighted(t) => Ok(Number::from(*t).qb64()),
            Tholder::Weighted(clauses) => {
                let bext = clauses
                    .iter()
                    .map(|clause| {
                        clause
                            .iter()
                            .map(|w| {
                                if w.is_proper() {
                                    format!("{}s{}", w.num, w.den)
                                } else {
                                    w.num.to_string()
                                }
                            })
                            .collect::<Vec<_>>()
                            .join("c")
                    })
                    .collect::<Vec<_>>()
                    .join("a");
                Ok(Bexter::new(&bext)?.qb64())
            }
        }
    }
}

impl fmt::Display for Tholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sith())
    }
}

impl Serialize for Tholder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.sith().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tholder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Tholder::from_sith(&value).map_err(serde::de::Error::custom)
    }
}

/// Default current signing threshold: a majority of `count` keys, at
/// least one.
pub fn default_signing_threshold(count: usize) -> Tholder {
    Tholder::Unweighted((count.div_ceil(2)).max(1) as u64)
}

/// Default next threshold: a majority of the committed next keys, zero
/// when none are committed.
pub fn default_next_threshold(count: usize) -> Tholder {
    Tholder::Unweighted(count.div_ceil(2) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_unweighted_two_of_three() {
        let tholder = Tholder::from_sith(&json!(2)).unwrap();
        assert!(tholder.satisfy(&[0, 2]));
        assert!(!tholder.satisfy(&[0]));
        assert!(!tholder.satisfy(&[1, 1]));
    }

    #[test]
    fn test_zero_threshold_never_satisfied() {
        assert!(!Tholder::count(0).satisfy(&[0, 1, 2]));
    }

    #[test]
    fn test_weighted_single_clause() {
        let tholder =
            Tholder::from_sith(&json!([["1/2", "1/2", "1/4", "1/4", "1/4"]])).unwrap();
        assert!(tholder.satisfy(&[0, 1]));
        assert!(!tholder.satisfy(&[2, 3]));
        assert!(tholder.satisfy(&[0, 2, 3]));
        assert_eq!(tholder.size(), 5);
    }

    #[test]
    fn test_weighted_clauses_share_indices() {
        let tholder = Tholder::from_sith(&json!([["1/2", "1/2"], ["1", "0"]])).unwrap();
        assert_eq!(tholder.size(), 2);
        // Index 0 counts toward both clauses.
        assert!(tholder.satisfy(&[0, 1]));
        assert!(!tholder.satisfy(&[0]));
        assert!(!tholder.satisfy(&[1]));
        // Out of range indices are ignored.
        assert!(!tholder.satisfy(&[1, 9]));
    }

    #[test]
    fn test_every_clause_must_be_met() {
        let tholder = Tholder::weighted(&[
            vec!["1/2", "1/2", "1/2", "0"],
            vec!["0", "0", "1/2", "1/2"],
        ])
        .unwrap();
        // Index 2 contributes to both clauses.
        assert!(tholder.satisfy(&[0, 2, 3]));
        assert!(tholder.satisfy(&[1, 2, 3]));
        // First clause met, second only at 1/2.
        assert!(!tholder.satisfy(&[0, 1, 2]));
        // Second clause met, first only at 1/2.
        assert!(!tholder.satisfy(&[2, 3]));
    }

    #[test]
    fn test_clause_lengths_must_agree() {
        assert!(matches!(
            Tholder::from_sith(&json!([["1/2", "1/2"], ["1"]])),
            Err(EventError::InvalidThreshold(_))
        ));
        let tholder = Tholder::weighted(&[vec!["1", "0"], vec!["0", "1"]]).unwrap();
        assert!(tholder.mismatched_clauses(2).is_empty());
        assert_eq!(tholder.mismatched_clauses(3), vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(Tholder::from_sith(&json!("a")).unwrap(), Tholder::count(10));
        assert_eq!(Tholder::from_sith(&json!("1")).unwrap(), Tholder::count(1));
        let flat = Tholder::from_sith(&json!(["1/2", "1/2"])).unwrap();
        let nested = Tholder::from_sith(&json!([["1/2", "1/2"]])).unwrap();
        let quoted = Tholder::from_sith(&json!("[\"1/2\", \"1/2\"]")).unwrap();
        assert_eq!(flat, nested);
        assert_eq!(flat, quoted);
        assert_eq!(flat, Tholder::weighted(&[vec!["1/2", "1/2"]]).unwrap());
    }

    #[test]
    fn test_invalid_thresholds() {
        for bad in [
            json!([]),
            json!([[]]),
            json!(["1/3", "1/3"]),
            json!(["3/2"]),
            json!(["1/0"]),
            json!(["-1"]),
            json!(["0.5", "0.5"]),
            json!([["1"], "1"]),
            json!([1, 1]),
            json!(-1),
            json!(1.5),
            json!(""),
            json!("zz"),
            json!(null),
        ] {
            assert!(
                matches!(Tholder::from_sith(&bad), Err(EventError::InvalidThreshold(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_sith_output() {
        assert_eq!(Tholder::count(11).sith(), json!("b"));
        let single = Tholder::from_sith(&json!([["1/2", "1/2"]])).unwrap();
        assert_eq!(single.sith(), json!(["1/2", "1/2"]));
        let multi = Tholder::from_sith(&json!([["1/2", "1/2"], ["1", "0"]])).unwrap();
        assert_eq!(multi.sith(), json!([["1/2", "1/2"], ["1", "0"]]));
    }

    #[test]
    fn test_weights_reduce() {
        let a: Weight = "2/4".parse().unwrap();
        assert_eq!(a, Weight::new(1, 2).unwrap());
        assert_eq!(a.to_string(), "1/2");
        let sum = a.checked_add("1/3".parse().unwrap()).unwrap();
        assert_eq!(sum, Weight::new(5, 6).unwrap());
    }

    #[test]
    fn test_limen() {
        assert_eq!(Tholder::count(1).limen().unwrap(), "MAAB");
        let weighted = Tholder::from_sith(&json!([["1/2", "1/2"], ["1", "0"]])).unwrap();
        let limen = weighted.limen().unwrap();
        assert_eq!(
            Bexter::from_qb64(&limen).unwrap().bext(),
            "1s2c1s2a1c0"
        );
        assert_eq!(Tholder::from_limen(&limen).unwrap(), weighted);
        assert_eq!(Tholder::from_limen("MAAC").unwrap(), Tholder::count(2));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_signing_threshold(0), Tholder::count(1));
        assert_eq!(default_signing_threshold(3), Tholder::count(2));
        assert_eq!(default_next_threshold(0), Tholder::count(0));
        assert_eq!(default_next_threshold(1), Tholder::count(1));
        assert_eq!(default_next_threshold(4), Tholder::count(2));
    }

    #[test]
    fn test_serde_as_sith() {
        let tholder = Tholder::count(2);
        assert_eq!(serde_json::to_string(&tholder).unwrap(), "\"2\"");
        let back: Tholder = serde_json::from_str("[\"1/2\",\"1/2\"]").unwrap();
        assert!(back.is_weighted());
    }

    proptest! {
        #[test]
        fn prop_unweighted_monotonic(
            thold in 1u64..6,
            subset in proptest::collection::vec(0u32..8, 0..8),
            extra in proptest::collection::vec(0u32..8, 0..4),
        ) {
            let tholder = Tholder::count(thold);
            let mut superset = subset.clone();
            superset.extend(extra);
            if tholder.satisfy(&subset) {
                prop_assert!(tholder.satisfy(&superset));
            }
        }

        #[test]
        fn prop_weighted_monotonic(
            subset in proptest::collection::vec(0u32..6, 0..6),
            extra in proptest::collection::vec(0u32..6, 0..4),
        ) {
            let tholder = Tholder::weighted(&[
                vec!["1/2", "1/2", "1/4"],
                vec!["1/3", "1/3", "1/3"],
            ]).unwrap();
            let mut superset = subset.clone();
            superset.extend(extra);
            if tholder.satisfy(&subset) {
                prop_assert!(tholder.satisfy(&superset));
            }
        }
    }
}
