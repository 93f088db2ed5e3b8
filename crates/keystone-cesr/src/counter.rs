//! Group framing codes.
//!
//! A counter has no raw part: its soft part is the number of items (or
//! quadlets) in the group that follows it.

use std::fmt;

use crate::b64;
use crate::codes::{counter_hard_size, counter_sizage, CounterSizage};
use crate::error::{CesrError, Result};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Counter {
    code: &'static str,
    count: u64,
}

impl Counter {
    pub fn new(code: &str, count: u64) -> Result<Self> {
        let (code, sizage) =
            counter_sizage(code).ok_or_else(|| CesrError::UnknownCode(code.to_string()))?;
        let max = b64::max_for(sizage.ss);
        if count > max {
            return Err(CesrError::CountOutOfRange {
                code: code.to_string(),
                count,
                max,
            });
        }
        Ok(Self { code, count })
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    fn sizage(&self) -> CounterSizage {
        counter_sizage(self.code)
            .map(|(_, s)| s)
            .unwrap_or(CounterSizage { hs: 2, ss: 2 })
    }

    pub fn full_size(&self) -> usize {
        self.sizage().fs()
    }

    pub fn qb64(&self) -> String {
        let sizage = self.sizage();
        let soft = b64::int_to_b64(self.count, sizage.ss).unwrap_or_default();
        format!("{}{soft}", self.code)
    }

    pub fn qb2(&self) -> Vec<u8> {
        b64::decode(&self.qb64()).unwrap_or_default()
    }

    pub fn from_qb64(qb64: &str) -> Result<Self> {
        let (counter, size) = Self::parse_qb64(qb64)?;
        if size != qb64.len() {
            return Err(CesrError::MalformedText(format!(
                "{} trailing characters after counter {}",
                qb64.len() - size,
                counter.code
            )));
        }
        Ok(counter)
    }

    /// Parse the leading counter of a text stream.
    pub fn parse_qb64(qb64: &str) -> Result<(Self, usize)> {
        if qb64.len() < 2 {
            return Err(CesrError::Shortage {
                needed: 2 - qb64.len(),
            });
        }
        let selector = qb64
            .get(..2)
            .ok_or_else(|| CesrError::MalformedText("non-ascii counter".into()))?;
        let hs = counter_hard_size(selector)
            .ok_or_else(|| CesrError::UnknownCode(selector.to_string()))?;
        if qb64.len() < hs {
            return Err(CesrError::Shortage {
                needed: hs - qb64.len(),
            });
        }
        let hard = qb64
            .get(..hs)
            .ok_or_else(|| CesrError::MalformedText("non-ascii counter".into()))?;
        let (_, sizage) =
            counter_sizage(hard).ok_or_else(|| CesrError::UnknownCode(hard.to_string()))?;
        let fs = sizage.fs();
        if qb64.len() < fs {
            return Err(CesrError::Shortage {
                needed: fs - qb64.len(),
            });
        }
        let soft = qb64
            .get(hs..fs)
            .ok_or_else(|| CesrError::MalformedText("non-ascii count".into()))?;
        let count = b64::b64_to_int(soft)?;
        Ok((Self::new(hard, count)?, fs))
    }

    pub fn from_qb2(qb2: &[u8]) -> Result<Self> {
        let (counter, size) = Self::parse_qb2(qb2)?;
        if size != qb2.len() {
            return Err(CesrError::MalformedText(format!(
                "{} trailing bytes after counter {}",
                qb2.len() - size,
                counter.code
            )));
        }
        Ok(counter)
    }

    pub fn parse_qb2(qb2: &[u8]) -> Result<(Self, usize)> {
        let selector = b64::sniff_b2(qb2, 2)?;
        let hs = counter_hard_size(&selector)
            .ok_or_else(|| CesrError::UnknownCode(selector.clone()))?;
        let hard = b64::sniff_b2(qb2, hs)?;
        let (_, sizage) =
            counter_sizage(&hard).ok_or_else(|| CesrError::UnknownCode(hard.clone()))?;
        let bfs = sizage.fs() / 4 * 3;
        if qb2.len() < bfs {
            return Err(CesrError::Shortage {
                needed: bfs - qb2.len(),
            });
        }
        let (counter, _) = Self::parse_qb64(&b64::encode(&qb2[..bfs]))?;
        Ok((counter, bfs))
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Counter({} x{})", self.code, self.count)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64())
    }
}
