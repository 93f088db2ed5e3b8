//! Derivation code tables.
//!
//! Three closed code families share the same framing rules:
//!
//! - [`mtr`] - plain material (keys, digests, numbers, salts, text)
//! - [`idx`] - indexed signatures
//! - [`ctr`] - attachment group counters
//!
//! Each code maps to a size descriptor. The tables are `const` data and
//! never mutated, so lookups are safe from any thread.

/// Size descriptor for a plain material code.
///
/// `hs` hard size, `ss` soft size, `fs` full text size (`None` for variable
/// sized codes whose soft part carries the length in quadlets), `ls` lead
/// bytes prepended to raw before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizage {
    pub hs: usize,
    pub ss: usize,
    pub fs: Option<usize>,
    pub ls: usize,
}

impl Sizage {
    const fn fixed(hs: usize, fs: usize) -> Self {
        Self {
            hs,
            ss: 0,
            fs: Some(fs),
            ls: 0,
        }
    }

    const fn variable(hs: usize, ss: usize, ls: usize) -> Self {
        Self {
            hs,
            ss,
            fs: None,
            ls,
        }
    }

    /// Hard plus soft size.
    pub const fn cs(&self) -> usize {
        self.hs + self.ss
    }

    /// Raw byte size for fixed codes.
    pub fn raw_size(&self) -> Option<usize> {
        self.fs.map(|fs| (fs - self.cs()) * 3 / 4 - self.ls)
    }
}

/// Plain material codes.
pub mod mtr {
    pub const ED25519_SEED: &str = "A";
    pub const ED25519N: &str = "B";
    pub const X25519: &str = "C";
    pub const ED25519: &str = "D";
    pub const BLAKE3_256: &str = "E";
    pub const BLAKE2B_256: &str = "F";
    pub const BLAKE2S_256: &str = "G";
    pub const SHA3_256: &str = "H";
    pub const SHA2_256: &str = "I";
    pub const ECDSA_256K1_SEED: &str = "J";
    pub const ED448_SEED: &str = "K";
    pub const X448: &str = "L";
    pub const SHORT: &str = "M";
    pub const BIG: &str = "N";
    pub const X25519_PRIVATE: &str = "O";
    pub const X25519_CIPHER_SEED: &str = "P";
    pub const ECDSA_256R1_SEED: &str = "Q";
    pub const SALT_128: &str = "0A";
    pub const ED25519_SIG: &str = "0B";
    pub const ECDSA_256K1_SIG: &str = "0C";
    pub const BLAKE3_512: &str = "0D";
    pub const BLAKE2B_512: &str = "0E";
    pub const SHA3_512: &str = "0F";
    pub const SHA2_512: &str = "0G";
    pub const LONG: &str = "0H";
    pub const ECDSA_256R1_SIG: &str = "0I";
    pub const ECDSA_256K1N: &str = "1AAA";
    pub const ECDSA_256K1: &str = "1AAB";
    pub const ED448N: &str = "1AAC";
    pub const ED448: &str = "1AAD";
    pub const ED448_SIG: &str = "1AAE";
    pub const TERN: &str = "1AAF";
    pub const DATE_TIME: &str = "1AAG";
    pub const X25519_CIPHER_SALT: &str = "1AAH";
    pub const ECDSA_256R1N: &str = "1AAI";
    pub const ECDSA_256R1: &str = "1AAJ";
    pub const NULL: &str = "1AAK";
    pub const NO: &str = "1AAL";
    pub const YES: &str = "1AAM";
    pub const STR_B64_L0: &str = "4A";
    pub const STR_B64_L1: &str = "5A";
    pub const STR_B64_L2: &str = "6A";
    pub const STR_B64_BIG_L0: &str = "7AAA";
    pub const STR_B64_BIG_L1: &str = "8AAA";
    pub const STR_B64_BIG_L2: &str = "9AAA";
    pub const BYTES_L0: &str = "4B";
    pub const BYTES_L1: &str = "5B";
    pub const BYTES_L2: &str = "6B";
    pub const BYTES_BIG_L0: &str = "7AAB";
    pub const BYTES_BIG_L1: &str = "8AAB";
    pub const BYTES_BIG_L2: &str = "9AAB";

    /// Sixteen byte numbers share their code with 128 bit salts.
    pub const HUGE: &str = "0A";

    /// Number codes ordered smallest to largest.
    pub const NUMBERS: [&str; 4] = [SHORT, LONG, BIG, HUGE];

    /// Digest codes.
    pub const DIGESTS: [&str; 9] = [
        BLAKE3_256,
        BLAKE2B_256,
        BLAKE2S_256,
        SHA3_256,
        SHA2_256,
        BLAKE3_512,
        BLAKE2B_512,
        SHA3_512,
        SHA2_512,
    ];

    /// Non-transferable public key codes (basic prefixes that cannot rotate).
    pub const NON_TRANSFERABLE: [&str; 4] = [ED25519N, ECDSA_256K1N, ED448N, ECDSA_256R1N];

    /// Verification key codes.
    pub const VERIFIERS: [&str; 8] = [
        ED25519N,
        ED25519,
        ECDSA_256K1N,
        ECDSA_256K1,
        ED448N,
        ED448,
        ECDSA_256R1N,
        ECDSA_256R1,
    ];

    /// Base64 text codes (small then big, by lead size).
    pub const STR_B64_SMALL: [&str; 3] = [STR_B64_L0, STR_B64_L1, STR_B64_L2];
    pub const STR_B64_LARGE: [&str; 3] = [STR_B64_BIG_L0, STR_B64_BIG_L1, STR_B64_BIG_L2];
    pub const BYTES_SMALL: [&str; 3] = [BYTES_L0, BYTES_L1, BYTES_L2];
    pub const BYTES_LARGE: [&str; 3] = [BYTES_BIG_L0, BYTES_BIG_L1, BYTES_BIG_L2];
}

const MATTER_SIZES: &[(&str, Sizage)] = &[
    (mtr::ED25519_SEED, Sizage::fixed(1, 44)),
    (mtr::ED25519N, Sizage::fixed(1, 44)),
    (mtr::X25519, Sizage::fixed(1, 44)),
    (mtr::ED25519, Sizage::fixed(1, 44)),
    (mtr::BLAKE3_256, Sizage::fixed(1, 44)),
    (mtr::BLAKE2B_256, Sizage::fixed(1, 44)),
    (mtr::BLAKE2S_256, Sizage::fixed(1, 44)),
    (mtr::SHA3_256, Sizage::fixed(1, 44)),
    (mtr::SHA2_256, Sizage::fixed(1, 44)),
    (mtr::ECDSA_256K1_SEED, Sizage::fixed(1, 44)),
    (mtr::ED448_SEED, Sizage::fixed(1, 76)),
    (mtr::X448, Sizage::fixed(1, 76)),
    (mtr::SHORT, Sizage::fixed(1, 4)),
    (mtr::BIG, Sizage::fixed(1, 12)),
    (mtr::X25519_PRIVATE, Sizage::fixed(1, 44)),
    (mtr::X25519_CIPHER_SEED, Sizage::fixed(1, 124)),
    (mtr::ECDSA_256R1_SEED, Sizage::fixed(1, 44)),
    (mtr::SALT_128, Sizage::fixed(2, 24)),
    (mtr::ED25519_SIG, Sizage::fixed(2, 88)),
    (mtr::ECDSA_256K1_SIG, Sizage::fixed(2, 88)),
    (mtr::BLAKE3_512, Sizage::fixed(2, 88)),
    (mtr::BLAKE2B_512, Sizage::fixed(2, 88)),
    (mtr::SHA3_512, Sizage::fixed(2, 88)),
    (mtr::SHA2_512, Sizage::fixed(2, 88)),
    (mtr::LONG, Sizage::fixed(2, 8)),
    (mtr::ECDSA_256R1_SIG, Sizage::fixed(2, 88)),
    (mtr::ECDSA_256K1N, Sizage::fixed(4, 48)),
    (mtr::ECDSA_256K1, Sizage::fixed(4, 48)),
    (mtr::ED448N, Sizage::fixed(4, 80)),
    (mtr::ED448, Sizage::fixed(4, 80)),
    (mtr::ED448_SIG, Sizage::fixed(4, 156)),
    (mtr::TERN, Sizage::fixed(4, 8)),
    (mtr::DATE_TIME, Sizage::fixed(4, 36)),
    (mtr::X25519_CIPHER_SALT, Sizage::fixed(4, 100)),
    (mtr::ECDSA_256R1N, Sizage::fixed(4, 48)),
    (mtr::ECDSA_256R1, Sizage::fixed(4, 48)),
    (mtr::NULL, Sizage::fixed(4, 4)),
    (mtr::NO, Sizage::fixed(4, 4)),
    (mtr::YES, Sizage::fixed(4, 4)),
    (mtr::STR_B64_L0, Sizage::variable(2, 2, 0)),
    (mtr::STR_B64_L1, Sizage::variable(2, 2, 1)),
    (mtr::STR_B64_L2, Sizage::variable(2, 2, 2)),
    (mtr::STR_B64_BIG_L0, Sizage::variable(4, 4, 0)),
    (mtr::STR_B64_BIG_L1, Sizage::variable(4, 4, 1)),
    (mtr::STR_B64_BIG_L2, Sizage::variable(4, 4, 2)),
    (mtr::BYTES_L0, Sizage::variable(2, 2, 0)),
    (mtr::BYTES_L1, Sizage::variable(2, 2, 1)),
    (mtr::BYTES_L2, Sizage::variable(2, 2, 2)),
    (mtr::BYTES_BIG_L0, Sizage::variable(4, 4, 0)),
    (mtr::BYTES_BIG_L1, Sizage::variable(4, 4, 1)),
    (mtr::BYTES_BIG_L2, Sizage::variable(4, 4, 2)),
];

/// Look up a plain material code, returning the canonical static code.
pub fn matter_sizage(code: &str) -> Option<(&'static str, Sizage)> {
    MATTER_SIZES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(c, s)| (*c, *s))
}

/// All plain material codes in table order.
pub fn matter_codes() -> impl Iterator<Item = &'static str> {
    MATTER_SIZES.iter().map(|(c, _)| *c)
}

/// Hard size selected by the first character of a plain material code.
pub fn matter_hard_size(first: char) -> Option<usize> {
    match first {
        'A'..='Z' | 'a'..='z' => Some(1),
        '0' | '4' | '5' | '6' => Some(2),
        '1' | '2' | '3' | '7' | '8' | '9' => Some(4),
        _ => None,
    }
}

/// Size descriptor for indexed signature codes.
///
/// The soft part holds the main index in `ss - os` characters followed by
/// the other index ("ondex") in `os` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSizage {
    pub hs: usize,
    pub ss: usize,
    pub os: usize,
    pub fs: usize,
    pub ls: usize,
}

impl IndexSizage {
    const fn new(hs: usize, ss: usize, os: usize, fs: usize) -> Self {
        Self {
            hs,
            ss,
            os,
            fs,
            ls: 0,
        }
    }

    pub const fn cs(&self) -> usize {
        self.hs + self.ss
    }

    /// Characters used by the main index.
    pub const fn ms(&self) -> usize {
        self.ss - self.os
    }

    pub fn raw_size(&self) -> usize {
        (self.fs - self.cs()) * 3 / 4 - self.ls
    }
}

/// Indexed signature codes.
///
/// `*_CRT_*` codes sign with a current key only and carry no ondex. The
/// others ("both") may also reference a prior next key by ondex.
pub mod idx {
    pub const ED25519_SIG: &str = "A";
    pub const ED25519_CRT_SIG: &str = "B";
    pub const ECDSA_256K1_SIG: &str = "C";
    pub const ECDSA_256K1_CRT_SIG: &str = "D";
    pub const ECDSA_256R1_SIG: &str = "E";
    pub const ECDSA_256R1_CRT_SIG: &str = "F";
    pub const ED448_SIG: &str = "0A";
    pub const ED448_CRT_SIG: &str = "0B";
    pub const ED25519_BIG_SIG: &str = "2A";
    pub const ED25519_BIG_CRT_SIG: &str = "2B";
    pub const ECDSA_256K1_BIG_SIG: &str = "2C";
    pub const ECDSA_256K1_BIG_CRT_SIG: &str = "2D";
    pub const ECDSA_256R1_BIG_SIG: &str = "2E";
    pub const ECDSA_256R1_BIG_CRT_SIG: &str = "2F";
    pub const ED448_BIG_SIG: &str = "3A";
    pub const ED448_BIG_CRT_SIG: &str = "3B";

    pub const CURRENT_ONLY: [&str; 8] = [
        ED25519_CRT_SIG,
        ECDSA_256K1_CRT_SIG,
        ECDSA_256R1_CRT_SIG,
        ED448_CRT_SIG,
        ED25519_BIG_CRT_SIG,
        ECDSA_256K1_BIG_CRT_SIG,
        ECDSA_256R1_BIG_CRT_SIG,
        ED448_BIG_CRT_SIG,
    ];
}

const INDEX_SIZES: &[(&str, IndexSizage)] = &[
    (idx::ED25519_SIG, IndexSizage::new(1, 1, 0, 88)),
    (idx::ED25519_CRT_SIG, IndexSizage::new(1, 1, 0, 88)),
    (idx::ECDSA_256K1_SIG, IndexSizage::new(1, 1, 0, 88)),
    (idx::ECDSA_256K1_CRT_SIG, IndexSizage::new(1, 1, 0, 88)),
    (idx::ECDSA_256R1_SIG, IndexSizage::new(1, 1, 0, 88)),
    (idx::ECDSA_256R1_CRT_SIG, IndexSizage::new(1, 1, 0, 88)),
    (idx::ED448_SIG, IndexSizage::new(2, 2, 1, 156)),
    (idx::ED448_CRT_SIG, IndexSizage::new(2, 2, 1, 156)),
    (idx::ED25519_BIG_SIG, IndexSizage::new(2, 4, 2, 92)),
    (idx::ED25519_BIG_CRT_SIG, IndexSizage::new(2, 4, 2, 92)),
    (idx::ECDSA_256K1_BIG_SIG, IndexSizage::new(2, 4, 2, 92)),
    (idx::ECDSA_256K1_BIG_CRT_SIG, IndexSizage::new(2, 4, 2, 92)),
    (idx::ECDSA_256R1_BIG_SIG, IndexSizage::new(2, 4, 2, 92)),
    (idx::ECDSA_256R1_BIG_CRT_SIG, IndexSizage::new(2, 4, 2, 92)),
    (idx::ED448_BIG_SIG, IndexSizage::new(2, 6, 3, 160)),
    (idx::ED448_BIG_CRT_SIG, IndexSizage::new(2, 6, 3, 160)),
];

pub fn index_sizage(code: &str) -> Option<(&'static str, IndexSizage)> {
    INDEX_SIZES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(c, s)| (*c, *s))
}

pub fn index_codes() -> impl Iterator<Item = &'static str> {
    INDEX_SIZES.iter().map(|(c, _)| *c)
}

pub fn index_hard_size(first: char) -> Option<usize> {
    match first {
        'A'..='Z' | 'a'..='z' => Some(1),
        '0'..='4' => Some(2),
        _ => None,
    }
}

/// Counter (group framing) codes.
pub mod ctr {
    pub const CONTROLLER_IDX_SIGS: &str = "-A";
    pub const WITNESS_IDX_SIGS: &str = "-B";
    pub const NON_TRANS_RECEIPT_COUPLES: &str = "-C";
    pub const TRANS_RECEIPT_QUADRUPLES: &str = "-D";
    pub const FIRST_SEEN_REPLAY_COUPLES: &str = "-E";
    pub const TRANS_IDX_SIG_GROUPS: &str = "-F";
    pub const SEAL_SOURCE_COUPLES: &str = "-G";
    pub const TRANS_LAST_IDX_SIG_GROUPS: &str = "-H";
    pub const SEAL_SOURCE_TRIPLES: &str = "-I";
    pub const SAD_PATH_SIG: &str = "-J";
    pub const SAD_PATH_SIG_GROUP: &str = "-K";
    pub const PATHED_MATERIAL_QUADLETS: &str = "-L";
    pub const ATTACHED_MATERIAL_QUADLETS: &str = "-V";
    pub const BIG_ATTACHED_MATERIAL_QUADLETS: &str = "-0V";
    pub const KERI_PROTOCOL_STACK: &str = "--AAA";
}

/// Size descriptor for counters: the full size equals `hs + ss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSizage {
    pub hs: usize,
    pub ss: usize,
}

impl CounterSizage {
    pub const fn fs(&self) -> usize {
        self.hs + self.ss
    }
}

const COUNTER_SIZES: &[(&str, CounterSizage)] = &[
    (ctr::CONTROLLER_IDX_SIGS, CounterSizage { hs: 2, ss: 2 }),
    (ctr::WITNESS_IDX_SIGS, CounterSizage { hs: 2, ss: 2 }),
    (ctr::NON_TRANS_RECEIPT_COUPLES, CounterSizage { hs: 2, ss: 2 }),
    (ctr::TRANS_RECEIPT_QUADRUPLES, CounterSizage { hs: 2, ss: 2 }),
    (ctr::FIRST_SEEN_REPLAY_COUPLES, CounterSizage { hs: 2, ss: 2 }),
    (ctr::TRANS_IDX_SIG_GROUPS, CounterSizage { hs: 2, ss: 2 }),
    (ctr::SEAL_SOURCE_COUPLES, CounterSizage { hs: 2, ss: 2 }),
    (ctr::TRANS_LAST_IDX_SIG_GROUPS, CounterSizage { hs: 2, ss: 2 }),
    (ctr::SEAL_SOURCE_TRIPLES, CounterSizage { hs: 2, ss: 2 }),
    (ctr::SAD_PATH_SIG, CounterSizage { hs: 2, ss: 2 }),
    (ctr::SAD_PATH_SIG_GROUP, CounterSizage { hs: 2, ss: 2 }),
    (ctr::PATHED_MATERIAL_QUADLETS, CounterSizage { hs: 2, ss: 2 }),
    (ctr::ATTACHED_MATERIAL_QUADLETS, CounterSizage { hs: 2, ss: 2 }),
    (ctr::BIG_ATTACHED_MATERIAL_QUADLETS, CounterSizage { hs: 3, ss: 5 }),
    (ctr::KERI_PROTOCOL_STACK, CounterSizage { hs: 5, ss: 3 }),
];

pub fn counter_sizage(code: &str) -> Option<(&'static str, CounterSizage)> {
    COUNTER_SIZES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(c, s)| (*c, *s))
}

pub fn counter_codes() -> impl Iterator<Item = &'static str> {
    COUNTER_SIZES.iter().map(|(c, _)| *c)
}

/// Hard size selected by the first two characters of a counter.
pub fn counter_hard_size(selector: &str) -> Option<usize> {
    let mut chars = selector.chars();
    if chars.next() != Some('-') {
        return None;
    }
    match chars.next() {
        Some('A'..='Z' | 'a'..='z') => Some(2),
        Some('0') => Some(3),
        Some('-') => Some(5),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sizes_align() {
        // Pad chars must equal cs % 4 for every fixed code.
        for code in matter_codes() {
            let (_, s) = matter_sizage(code).unwrap();
            assert_eq!(matter_hard_size(code.chars().next().unwrap()), Some(s.hs));
            if let Some(fs) = s.fs {
                assert_eq!(fs % 4, 0, "{code}");
                let rs = s.raw_size().unwrap();
                let ps = (3 - (rs + s.ls) % 3) % 3;
                assert_eq!(ps, s.cs() % 4, "{code}");
            } else {
                assert_eq!(s.cs() % 4, 0, "{code}");
            }
        }
    }

    #[test]
    fn test_known_raw_sizes() {
        assert_eq!(matter_sizage(mtr::ED25519).unwrap().1.raw_size(), Some(32));
        assert_eq!(matter_sizage(mtr::ED25519_SIG).unwrap().1.raw_size(), Some(64));
        assert_eq!(matter_sizage(mtr::SALT_128).unwrap().1.raw_size(), Some(16));
        assert_eq!(matter_sizage(mtr::SHORT).unwrap().1.raw_size(), Some(2));
        assert_eq!(matter_sizage(mtr::LONG).unwrap().1.raw_size(), Some(4));
        assert_eq!(matter_sizage(mtr::BIG).unwrap().1.raw_size(), Some(8));
        assert_eq!(matter_sizage(mtr::ED448_SIG).unwrap().1.raw_size(), Some(114));
        assert_eq!(matter_sizage(mtr::NULL).unwrap().1.raw_size(), Some(0));
    }

    #[test]
    fn test_index_sizes_align() {
        for code in index_codes() {
            let (_, s) = index_sizage(code).unwrap();
            assert_eq!(index_hard_size(code.chars().next().unwrap()), Some(s.hs));
            let ps = (3 - (s.raw_size() + s.ls) % 3) % 3;
            assert_eq!(ps, s.cs() % 4, "{code}");
        }
        assert_eq!(index_sizage(idx::ED25519_SIG).unwrap().1.raw_size(), 64);
    }

    #[test]
    fn test_counter_hard_sizes() {
        for code in counter_codes() {
            let (_, s) = counter_sizage(code).unwrap();
            assert_eq!(counter_hard_size(&code[..2]), Some(s.hs), "{code}");
            assert_eq!(s.fs() % 4, 0);
        }
        assert_eq!(counter_hard_size("AB"), None);
    }
}
