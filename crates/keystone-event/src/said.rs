//! Self-addressing identifiers.
//!
//! A SAID is the digest of a serialization in which the SAID field itself
//! holds a placeholder of `#` characters as long as the final digest text.
//! Serialization is compact JSON in field insertion order.

use keystone_cesr::codes::matter_sizage;
use keystone_cesr::{CesrError, Diger};
use serde_json::{Map, Value};

use crate::error::{EventError, Result};
use crate::version::{deversify, versify};

/// Placeholder character for SAID fields during digest computation.
pub const DUMMY: char = '#';

/// Default SAID field label.
pub const LABEL: &str = "d";

/// Serialize compactly, recomputing the size in the version string `v`
/// when present.
pub fn sizeify(map: &mut Map<String, Value>) -> Result<Vec<u8>> {
    let Some(vs) = map.get("v") else {
        return Ok(serde_json::to_vec(map)?);
    };
    let vs = vs.as_str().ok_or_else(|| EventError::InvalidField {
        field: "v".into(),
        reason: "version string must be a string".into(),
    })?;
    deversify(vs)?;
    // The version string has fixed width, so the size does not move.
    let size = serde_json::to_vec(map)?.len();
    map.insert("v".into(), Value::String(versify(size)?));
    let raw = serde_json::to_vec(map)?;
    if raw.len() != size {
        return Err(EventError::SizeMismatch {
            declared: size,
            actual: raw.len(),
        });
    }
    Ok(raw)
}

fn placeholder(code: &str) -> Result<String> {
    let fs = matter_sizage(code)
        .and_then(|(_, s)| s.fs)
        .ok_or_else(|| CesrError::UnsupportedCode {
            code: code.to_string(),
            context: "said",
        })?;
    Ok(DUMMY.to_string().repeat(fs))
}

/// Compute the SAID of `sad` at `label` and return it with the updated
/// object.
pub fn saidify(sad: &Value, label: &str, code: &str) -> Result<(Diger, Value)> {
    saidify_all(sad, &[label], code)
}

/// Like [`saidify`], but every label in `labels` is dummied during digest
/// computation and receives the same SAID.
///
/// Inception events address both `d` and `i` this way.
pub fn saidify_all(sad: &Value, labels: &[&str], code: &str) -> Result<(Diger, Value)> {
    let mut map = sad.as_object().cloned().ok_or(EventError::NotAnObject)?;
    let dummy = placeholder(code)?;
    for label in labels {
        let slot = map
            .get_mut(*label)
            .ok_or_else(|| EventError::MissingField((*label).to_string()))?;
        *slot = Value::String(dummy.clone());
    }
    let raw = sizeify(&mut map)?;
    let diger = Diger::new(code, &raw)?;
    for label in labels {
        map.insert((*label).to_string(), Value::String(diger.qb64()));
    }
    Ok((diger, Value::Object(map)))
}

/// Check the SAID embedded at `label`.
///
/// Returns `Ok(false)` on a digest mismatch and an error when the input
/// is malformed.
pub fn verify_said(sad: &Value, label: &str) -> Result<bool> {
    verify_said_all(sad, &[label])
}

/// Check a SAID shared by several labels. All labels must carry the same
/// value.
pub fn verify_said_all(sad: &Value, labels: &[&str]) -> Result<bool> {
    let map = sad.as_object().ok_or(EventError::NotAnObject)?;
    let first = labels
        .first()
        .ok_or_else(|| EventError::MissingField(LABEL.into()))?;
    let said = said_at(map, first)?;
    for label in &labels[1..] {
        if said_at(map, label)? != said {
            return Ok(false);
        }
    }
    let expected = Diger::from_qb64(said)?;
    let (computed, _) = saidify_all(sad, labels, expected.code())?;
    Ok(computed == expected)
}

fn said_at<'a>(map: &'a Map<String, Value>, label: &str) -> Result<&'a str> {
    map.get(label)
        .ok_or_else(|| EventError::MissingField(label.to_string()))?
        .as_str()
        .ok_or_else(|| EventError::InvalidField {
            field: label.to_string(),
            reason: "SAID must be a string".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_cesr::mtr;
    use serde_json::json;

    #[test]
    fn test_saidify_and_verify() {
        let sad = json!({"d": "", "name": "keystone", "n": 3});
        let (diger, said) = saidify(&sad, LABEL, mtr::BLAKE3_256).unwrap();
        assert_eq!(said["d"], diger.qb64());
        assert_eq!(diger.qb64().len(), 44);
        assert!(verify_said(&said, LABEL).unwrap());

        // Field order survives.
        let keys: Vec<&String> = said.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["d", "name", "n"]);
    }

    #[test]
    fn test_digest_covers_placeholder_form() {
        let sad = json!({"a": 1, "d": "anything"});
        let (diger, _) = saidify(&sad, LABEL, mtr::SHA3_256).unwrap();
        let expected = format!("{{\"a\":1,\"d\":\"{}\"}}", "#".repeat(44));
        assert!(diger.verify(expected.as_bytes()));
    }

    #[test]
    fn test_mutation_breaks_said() {
        let (_, mut said) = saidify(&json!({"d": "", "x": "a"}), LABEL, mtr::BLAKE3_256).unwrap();
        said["x"] = json!("b");
        assert!(!verify_said(&said, LABEL).unwrap());
    }

    #[test]
    fn test_version_size_recomputed() {
        let sad = json!({"v": "KERI10JSON000000_", "d": ""});
        let (_, said) = saidify(&sad, LABEL, mtr::BLAKE3_256).unwrap();
        let raw = serde_json::to_vec(&said).unwrap();
        let version = deversify(said["v"].as_str().unwrap()).unwrap();
        assert_eq!(version.size, raw.len());
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            saidify(&json!({"x": 1}), LABEL, mtr::BLAKE3_256),
            Err(EventError::MissingField(_))
        ));
        assert!(matches!(
            saidify(&json!([1, 2]), LABEL, mtr::BLAKE3_256),
            Err(EventError::NotAnObject)
        ));
        assert!(matches!(
            verify_said(&json!({"d": 5}), LABEL),
            Err(EventError::InvalidField { .. })
        ));
        assert!(matches!(
            verify_said(&json!({"d": "Eshort"}), LABEL),
            Err(EventError::Cesr(_))
        ));
        assert!(matches!(
            saidify(&json!({"d": ""}), LABEL, mtr::ED25519),
            Err(EventError::Cesr(_))
        ));
    }

    #[test]
    fn test_shared_labels() {
        let sad = json!({"d": "", "i": "", "s": "0"});
        let (diger, said) = saidify_all(&sad, &["d", "i"], mtr::BLAKE3_256).unwrap();
        assert_eq!(said["i"], diger.qb64());
        assert!(verify_said_all(&said, &["d", "i"]).unwrap());
        // Dummying only "d" yields a different digest.
        assert!(!verify_said(&said, "d").unwrap());
    }
}
