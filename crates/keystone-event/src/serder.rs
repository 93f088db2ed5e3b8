//! Serialized key events.

use std::fmt;

use keystone_cesr::{Diger, Prefixer, Verfer};
use serde_json::{Map, Value};

use crate::error::{EventError, Result};
use crate::said::{sizeify, verify_said, verify_said_all};
use crate::tholder::Tholder;
use crate::version::{deversify, Ilk, Version, VERSION_SIZE};

/// An event body with its canonical serialization.
///
/// Field order is the insertion order of the body, which is part of the
/// serialization and therefore of the SAID.
#[derive(Clone, PartialEq, Eq)]
pub struct Serder {
    ked: Map<String, Value>,
    raw: Vec<u8>,
}

impl Serder {
    /// Wrap an event body, checking that its version string declares the
    /// serialized size.
    pub fn from_ked(ked: Map<String, Value>) -> Result<Self> {
        let raw = serde_json::to_vec(&ked)?;
        let vs = ked
            .get("v")
            .and_then(Value::as_str)
            .ok_or_else(|| EventError::MissingField("v".into()))?;
        let version = deversify(vs)?;
        if version.size != raw.len() {
            return Err(EventError::SizeMismatch {
                declared: version.size,
                actual: raw.len(),
            });
        }
        Ok(Self { ked, raw })
    }

    /// Like [`Serder::from_ked`], but recomputes the version string size.
    pub fn sized(mut ked: Map<String, Value>) -> Result<Self> {
        let raw = sizeify(&mut ked)?;
        Ok(Self { ked, raw })
    }

    /// Parse the event at the front of `raw`.
    ///
    /// Returns the event and the number of bytes it occupies; any
    /// attachments follow.
    pub fn from_raw(raw: &[u8]) -> Result<(Self, usize)> {
        let version = sniff(raw)?;
        if raw.len() < version.size {
            return Err(EventError::SizeMismatch {
                declared: version.size,
                actual: raw.len(),
            });
        }
        let body = &raw[..version.size];
        let ked: Map<String, Value> = serde_json::from_slice(body)?;
        let serder = Self::from_ked(ked)?;
        if serder.raw != body {
            return Err(EventError::Serialization(
                "event is not in canonical compact form".into(),
            ));
        }
        Ok((serder, version.size))
    }

    pub fn ked(&self) -> &Map<String, Value> {
        &self.ked
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn size(&self) -> usize {
        self.raw.len()
    }

    /// The body as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.ked.clone())
    }

    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.ked).unwrap_or_default()
    }

    fn str_field(&self, field: &str) -> Result<&str> {
        self.ked
            .get(field)
            .ok_or_else(|| EventError::MissingField(field.to_string()))?
            .as_str()
            .ok_or_else(|| EventError::InvalidField {
                field: field.to_string(),
                reason: "expected a string".into(),
            })
    }

    fn list_field(&self, field: &str) -> Result<Vec<&str>> {
        self.ked
            .get(field)
            .ok_or_else(|| EventError::MissingField(field.to_string()))?
            .as_array()
            .ok_or_else(|| EventError::InvalidField {
                field: field.to_string(),
                reason: "expected a list".into(),
            })?
            .iter()
            .map(|v| {
                v.as_str().ok_or_else(|| EventError::InvalidField {
                    field: field.to_string(),
                    reason: "expected a list of strings".into(),
                })
            })
            .collect()
    }

    fn hex_field(&self, field: &str) -> Result<u128> {
        let text = self.str_field(field)?;
        let invalid = || EventError::InvalidField {
            field: field.to_string(),
            reason: format!("{text:?} is not a hex number"),
        };
        if text.is_empty() || text.chars().any(|c| !c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        u128::from_str_radix(text, 16).map_err(|_| invalid())
    }

    pub fn version(&self) -> Result<Version> {
        deversify(self.str_field("v")?)
    }

    pub fn ilk(&self) -> Result<Ilk> {
        self.str_field("t")?.parse()
    }

    /// The SAID in `d`.
    pub fn said(&self) -> Result<&str> {
        self.str_field("d")
    }

    pub fn saider(&self) -> Result<Diger> {
        Ok(Diger::from_qb64(self.said()?)?)
    }

    /// The identifier prefix in `i`.
    pub fn pre(&self) -> Result<&str> {
        self.str_field("i")
    }

    pub fn prefixer(&self) -> Result<Prefixer> {
        Ok(Prefixer::from_qb64(self.pre()?)?)
    }

    /// Sequence number from the hex `s` field.
    pub fn sn(&self) -> Result<u128> {
        self.hex_field("s")
    }

    /// Prior event SAID, for non-inception events.
    pub fn prior(&self) -> Result<&str> {
        self.str_field("p")
    }

    pub fn keys(&self) -> Result<Vec<Verfer>> {
        self.list_field("k")?
            .into_iter()
            .map(|k| Verfer::from_qb64(k).map_err(EventError::from))
            .collect()
    }

    pub fn ndigs(&self) -> Result<Vec<Diger>> {
        self.list_field("n")?
            .into_iter()
            .map(|d| Diger::from_qb64(d).map_err(EventError::from))
            .collect()
    }

    pub fn tholder(&self) -> Result<Tholder> {
        let kt = self
            .ked
            .get("kt")
            .ok_or_else(|| EventError::MissingField("kt".into()))?;
        Tholder::from_sith(kt)
    }

    pub fn ntholder(&self) -> Result<Tholder> {
        let nt = self
            .ked
            .get("nt")
            .ok_or_else(|| EventError::MissingField("nt".into()))?;
        Tholder::from_sith(nt)
    }

    /// Witness threshold from the hex `bt` field.
    pub fn toad(&self) -> Result<u64> {
        let bt = self.hex_field("bt")?;
        u64::try_from(bt).map_err(|_| EventError::InvalidField {
            field: "bt".into(),
            reason: "witness threshold too large".into(),
        })
    }

    /// Witnesses of an inception event.
    pub fn wits(&self) -> Result<Vec<&str>> {
        self.list_field("b")
    }

    /// Witnesses cut by a rotation.
    pub fn cuts(&self) -> Result<Vec<&str>> {
        self.list_field("br")
    }

    /// Witnesses added by a rotation.
    pub fn adds(&self) -> Result<Vec<&str>> {
        self.list_field("ba")
    }

    pub fn traits(&self) -> Result<Vec<&str>> {
        self.list_field("c")
    }

    /// Delegator prefix of a delegated inception.
    pub fn delpre(&self) -> Option<&str> {
        self.ked.get("di").and_then(Value::as_str)
    }

    /// Check the embedded SAID. Inceptions with a self-addressing prefix
    /// share the SAID between `d` and `i`.
    pub fn verify_said(&self) -> Result<bool> {
        let value = self.to_value();
        if self.ilk()?.is_inception() && self.prefixer()?.is_digestive() {
            verify_said_all(&value, &["d", "i"])
        } else {
            verify_said(&value, "d")
        }
    }
}

/// Read the version string from the front of a serialized event.
pub fn sniff(raw: &[u8]) -> Result<Version> {
    const LEAD: &[u8] = b"{\"v\":\"";
    if raw.len() < LEAD.len() + VERSION_SIZE {
        return Err(EventError::InvalidVersion(
            "too short to hold a version string".into(),
        ));
    }
    if &raw[..LEAD.len()] != LEAD {
        return Err(EventError::InvalidVersion(
            "event must start with the version string".into(),
        ));
    }
    let vs = std::str::from_utf8(&raw[LEAD.len()..LEAD.len() + VERSION_SIZE])
        .map_err(|e| EventError::InvalidVersion(e.to_string()))?;
    deversify(vs)
}

impl fmt::Debug for Serder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serder")
            .field("t", &self.ked.get("t"))
            .field("d", &self.ked.get("d"))
            .field("s", &self.ked.get("s"))
            .finish()
    }
}

impl fmt::Display for Serder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Map<String, Value> {
        json!({"v": "KERI10JSON000000_", "t": "ixn", "d": "", "i": "E", "s": "1", "p": "", "a": []})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_sized_then_parse() {
        let serder = Serder::sized(body()).unwrap();
        assert_eq!(serder.version().unwrap().size, serder.size());
        let mut stream = serder.raw().to_vec();
        stream.extend_from_slice(b"-AAB");
        let (parsed, used) = Serder::from_raw(&stream).unwrap();
        assert_eq!(parsed, serder);
        assert_eq!(used, serder.size());
        assert_eq!(parsed.ilk().unwrap(), Ilk::Ixn);
        assert_eq!(parsed.sn().unwrap(), 1);
    }

    #[test]
    fn test_wrong_declared_size() {
        assert!(matches!(
            Serder::from_ked(body()),
            Err(EventError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_sniff_rejects_other_leads() {
        assert!(sniff(b"{\"t\":\"icp\",\"v\":\"KERI10JSON000000_\"}").is_err());
        assert!(sniff(b"{\"v\":\"KE").is_err());
    }

    #[test]
    fn test_truncated_stream() {
        let serder = Serder::sized(body()).unwrap();
        let raw = serder.raw();
        assert!(matches!(
            Serder::from_raw(&raw[..raw.len() - 1]),
            Err(EventError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_field_errors() {
        let serder = Serder::sized(body()).unwrap();
        assert!(matches!(serder.keys(), Err(EventError::MissingField(_))));
        let mut ked = body();
        ked.insert("s".into(), json!("xyz"));
        let serder = Serder::sized(ked).unwrap();
        assert!(matches!(serder.sn(), Err(EventError::InvalidField { .. })));
    }
}
