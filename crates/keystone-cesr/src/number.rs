//! Non-negative integers as material, used for sequence numbers and
//! thresholds.

use std::fmt;

use crate::codes::{matter_sizage, mtr};
use crate::error::{CesrError, Result};
use crate::matter::{qb64_serde, Matter};

/// Big-endian integer in the smallest of four size tiers that fits.
///
/// | code | raw bytes |
/// |------|-----------|
/// | `M`  | 2         |
/// | `0H` | 4         |
/// | `N`  | 8         |
/// | `0A` | 16        |
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Number(Matter);

impl Number {
    pub fn new(num: u128) -> Self {
        let bytes = num.to_be_bytes();
        let code = mtr::NUMBERS
            .into_iter()
            .find(|code| bytes[..16 - raw_size(code)].iter().all(|b| *b == 0))
            .unwrap_or(mtr::HUGE);
        let size = raw_size(code);
        Self(Matter::from_parts(code, bytes[16 - size..].to_vec()))
    }

    /// Parse a hex string. The empty string is zero.
    pub fn from_numh(numh: &str) -> Result<Self> {
        if numh.is_empty() {
            return Ok(Self::new(0));
        }
        let num = u128::from_str_radix(numh, 16)
            .map_err(|e| CesrError::InvalidNumber(format!("{numh:?}: {e}")))?;
        Ok(Self::new(num))
    }

    pub fn from_matter(matter: Matter) -> Result<Self> {
        if !mtr::NUMBERS.contains(&matter.code()) {
            return Err(CesrError::UnsupportedCode {
                code: matter.code().to_string(),
                context: "number",
            });
        }
        Ok(Self(matter))
    }

    pub fn from_qb64(qb64: &str) -> Result<Self> {
        Self::from_matter(Matter::from_qb64(qb64)?)
    }

    pub fn from_qb2(qb2: &[u8]) -> Result<Self> {
        Self::from_matter(Matter::from_qb2(qb2)?)
    }

    /// The integer value.
    pub fn num(&self) -> u128 {
        self.0
            .raw()
            .iter()
            .fold(0u128, |acc, b| (acc << 8) | u128::from(*b))
    }

    /// Lowercase hex without leading zeros.
    pub fn numh(&self) -> String {
        format!("{:x}", self.num())
    }

    /// Whether the value fits in `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        u64::try_from(self.num()).ok()
    }

    pub fn code(&self) -> &'static str {
        self.0.code()
    }

    pub fn qb64(&self) -> String {
        self.0.qb64()
    }

    pub fn qb2(&self) -> Vec<u8> {
        self.0.qb2()
    }

    pub fn as_matter(&self) -> &Matter {
        &self.0
    }
}

fn raw_size(code: &str) -> usize {
    matter_sizage(code)
        .and_then(|(_, s)| s.raw_size())
        .unwrap_or(16)
}

impl From<u64> for Number {
    fn from(num: u64) -> Self {
        Self::new(u128::from(num))
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number({})", self.num())
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qb64())
    }
}

qb64_serde!(Number);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_values() {
        assert_eq!(Number::new(0).qb64(), "MAAA");
        assert_eq!(Number::new(1).qb64(), "MAAB");
        assert_eq!(Number::new(0).numh(), "0");
        assert_eq!(Number::from_numh("").unwrap().num(), 0);
        assert_eq!(Number::from_numh("ff").unwrap().num(), 255);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Number::new(0xffff).code(), mtr::SHORT);
        assert_eq!(Number::new(0x1_0000).code(), mtr::LONG);
        assert_eq!(Number::new(0xffff_ffff).code(), mtr::LONG);
        assert_eq!(Number::new(0x1_0000_0000).code(), mtr::BIG);
        assert_eq!(Number::new(u128::from(u64::MAX)).code(), mtr::BIG);
        assert_eq!(Number::new(u128::from(u64::MAX) + 1).code(), mtr::HUGE);
        assert_eq!(Number::new(u128::MAX).num(), u128::MAX);
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(
            Number::from_numh("xyz"),
            Err(CesrError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_rejects_key_code() {
        let key = Matter::new(mtr::ED25519, vec![0u8; 32]).unwrap();
        assert!(Number::from_qb64(&key.qb64()).is_err());
    }

    proptest! {
        #[test]
        fn prop_number_text_roundtrip(n in any::<u128>()) {
            let number = Number::new(n);
            let back = Number::from_qb64(&number.qb64()).unwrap();
            prop_assert_eq!(back.num(), n);
            prop_assert_eq!(Number::from_numh(&number.numh()).unwrap(), number);
        }
    }
}
