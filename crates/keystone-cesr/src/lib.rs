//! # Keystone CESR
//!
//! Composable Event Streaming Representation: self-framing, typed
//! cryptographic material with a text domain (qb64, base64url) and a binary
//! domain (qb2) that convert losslessly into each other.
//!
//! ## Key Types
//!
//! - [`Matter`] - Any `(code, raw)` material
//! - [`Siger`] - Indexed signature
//! - [`Counter`] - Attachment group framing
//! - [`Diger`], [`Number`], [`Bexter`], [`Prefixer`] - Typed material
//! - [`Signer`], [`Verfer`], [`Cigar`], [`Salter`] - Keys and signatures
//!
//! This crate does no I/O. Code tables are immutable and every type is
//! `Send + Sync`.

pub mod attachment;
pub mod b64;
pub mod bexter;
pub mod codes;
pub mod counter;
pub mod crypto;
pub mod diger;
pub mod error;
pub mod indexer;
pub mod matter;
pub mod number;
pub mod prefixer;

pub use attachment::{encode_sigers, parse_sigers};
pub use bexter::Bexter;
pub use codes::{ctr, idx, mtr};
pub use counter::Counter;
pub use crypto::{Cigar, Salter, Signer, Tier, Verfer};
pub use diger::{digest, Diger};
pub use error::{CesrError, Result};
pub use indexer::Siger;
pub use matter::Matter;
pub use number::Number;
pub use prefixer::Prefixer;
