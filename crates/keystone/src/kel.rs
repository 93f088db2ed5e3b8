//! Signed key event logs.
//!
//! On the wire each event is its canonical JSON body followed by a
//! controller indexed signature group (`-A##` and that many sigers).

use keystone_cesr::{ctr, encode_sigers, parse_sigers, Siger};
use keystone_event::{validate_event, KeyState, Serder};
use tracing::debug;

use crate::error::{KeystoneError, Result};

/// An event with its controller signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedEvent {
    pub serder: Serder,
    pub sigers: Vec<Siger>,
}

impl SignedEvent {
    pub fn new(serder: Serder, sigers: Vec<Siger>) -> Self {
        Self { serder, sigers }
    }

    /// Event bytes followed by the signature group.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let group = encode_sigers(ctr::CONTROLLER_IDX_SIGS, &self.sigers)?;
        let mut out = Vec::with_capacity(self.serder.size() + group.len());
        out.extend_from_slice(self.serder.raw());
        out.extend_from_slice(group.as_bytes());
        Ok(out)
    }

    /// Parse one signed event from the front of `stream`.
    ///
    /// Returns the event and the number of bytes consumed.
    pub fn parse(stream: &[u8]) -> Result<(Self, usize)> {
        let (serder, size) = Serder::from_raw(stream)?;
        let rest = &stream[size..];
        // Attachments are qb64 text; stop at anything that is not.
        let end = rest.iter().position(|b| !b.is_ascii()).unwrap_or(rest.len());
        let text = std::str::from_utf8(&rest[..end])
            .map_err(|e| KeystoneError::InvalidStream(e.to_string()))?;
        if text.is_empty() {
            return Err(KeystoneError::InvalidStream(format!(
                "event {} has no signatures",
                serder.said()?
            )));
        }
        let (code, sigers, used) = parse_sigers(text)?;
        if code != ctr::CONTROLLER_IDX_SIGS {
            return Err(KeystoneError::InvalidStream(format!(
                "expected controller signatures, got group {code}"
            )));
        }
        Ok((Self { serder, sigers }, size + used))
    }
}

/// Serialize a log of signed events back to back.
pub fn encode_kel(events: &[SignedEvent]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for event in events {
        out.extend(event.to_bytes()?);
    }
    Ok(out)
}

/// Parse a stream of signed events until it is exhausted.
pub fn parse_kel(mut stream: &[u8]) -> Result<Vec<SignedEvent>> {
    let mut events = Vec::new();
    while !stream.is_empty() {
        let (event, used) = SignedEvent::parse(stream)?;
        events.push(event);
        stream = &stream[used..];
    }
    Ok(events)
}

/// Validate a log from its inception and return the final key state.
///
/// Every event must carry signatures satisfying its thresholds; the first
/// failure stops the replay.
pub fn verify_kel(events: &[SignedEvent]) -> Result<KeyState> {
    let mut events = events.iter();
    let first = events
        .next()
        .ok_or_else(|| KeystoneError::InvalidStream("empty key event log".into()))?;
    let mut state = validate_event(None, &first.serder, &first.sigers)?;
    for event in events {
        state = validate_event(Some(&state), &event.serder, &event.sigers)?;
    }
    debug!(pre = %state.prefix, sn = %state.sn, "verified key event log");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_cesr::Signer;
    use keystone_event::InceptionBuilder;

    fn signed_inception() -> SignedEvent {
        let signer = Signer::from_seed(&[7u8; 32], true);
        let serder = InceptionBuilder::new(vec![signer.verfer().clone()])
            .build()
            .unwrap();
        let siger = signer.sign_indexed(serder.raw(), 0, None, false).unwrap();
        SignedEvent::new(serder, vec![siger])
    }

    #[test]
    fn test_signed_event_stream() {
        let event = signed_inception();
        let bytes = event.to_bytes().unwrap();
        assert_eq!(&bytes[event.serder.size()..event.serder.size() + 4], b"-AAB");

        let (parsed, used) = SignedEvent::parse(&bytes).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(used, bytes.len());
    }

    #[test]
    fn test_missing_signatures() {
        let event = signed_inception();
        assert!(matches!(
            SignedEvent::parse(event.serder.raw()),
            Err(KeystoneError::InvalidStream(_))
        ));
    }

    #[test]
    fn test_verify_kel() {
        let event = signed_inception();
        let stream = encode_kel(&[event.clone()]).unwrap();
        let events = parse_kel(&stream).unwrap();
        let state = verify_kel(&events).unwrap();
        assert_eq!(state.said, event.serder.said().unwrap());
        assert!(verify_kel(&[]).is_err());

        let unsigned = SignedEvent::new(event.serder, Vec::new());
        assert!(matches!(
            verify_kel(&[unsigned]),
            Err(KeystoneError::Event(_))
        ));
    }
}
