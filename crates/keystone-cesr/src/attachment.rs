//! Attachment groups: a counter followed by that many indexed signatures.

use crate::codes::ctr;
use crate::counter::Counter;
use crate::error::{CesrError, Result};
use crate::indexer::Siger;

/// Frame indexed signatures under a counter code such as
/// [`ctr::CONTROLLER_IDX_SIGS`].
pub fn encode_sigers(code: &str, sigers: &[Siger]) -> Result<String> {
    if code != ctr::CONTROLLER_IDX_SIGS && code != ctr::WITNESS_IDX_SIGS {
        return Err(CesrError::UnsupportedCode {
            code: code.to_string(),
            context: "indexed signature group",
        });
    }
    let counter = Counter::new(code, sigers.len() as u64)?;
    let mut out = counter.qb64();
    for siger in sigers {
        out.push_str(&siger.qb64());
    }
    Ok(out)
}

/// Parse one indexed signature group from the front of `text`.
///
/// Returns the counter code, the signatures and the characters consumed.
pub fn parse_sigers(text: &str) -> Result<(&'static str, Vec<Siger>, usize)> {
    let (counter, mut used) = Counter::parse_qb64(text)?;
    if counter.code() != ctr::CONTROLLER_IDX_SIGS && counter.code() != ctr::WITNESS_IDX_SIGS {
        return Err(CesrError::UnsupportedCode {
            code: counter.code().to_string(),
            context: "indexed signature group",
        });
    }
    let mut sigers = Vec::with_capacity(counter.count() as usize);
    for _ in 0..counter.count() {
        let (siger, size) = Siger::parse_qb64(&text[used..])?;
        sigers.push(siger);
        used += size;
    }
    Ok((counter.code(), sigers, used))
}
