//! # Keystone
//!
//! Self-certifying identifiers with pre-rotated keys: CESR-encoded
//! material, KERI key events and key management in one API.
//!
//! ## Overview
//!
//! - **Material**: Typed, self-framing cryptographic primitives (qb64/qb2)
//! - **Events**: Inception, rotation and interaction events with SAIDs
//! - **Key state**: The result of replaying a key event log
//! - **Keepers**: Key stores that commit to next keys at every rotation
//!
//! ## Key Concepts
//!
//! - **Prefix**: The identifier, derived from the inception event.
//! - **Pre-rotation**: Each establishment event commits to digests of the
//!   next keys; a rotation may only reveal keys matching that commitment.
//! - **Threshold**: How many (or which weighted) keys must sign.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use keystone::{verify_kel, Controller, ControllerConfig, RotationConfig};
//! use keystone::keeper::RandyKeeper;
//!
//! let keeper = Arc::new(RandyKeeper::new());
//! let mut controller = Controller::incept(keeper, ControllerConfig::default()).unwrap();
//! controller.rotate(RotationConfig::default()).unwrap();
//!
//! let state = verify_kel(controller.kel()).unwrap();
//! assert_eq!(state.prefix.qb64(), controller.prefix());
//! ```
//!
//! ## Re-exports
//!
//! - `keystone::cesr` - Material codec and primitives
//! - `keystone::event` - Events, thresholds and key state
//! - `keystone::keeper` - Keepers and the key manager

pub mod controller;
pub mod error;
pub mod kel;

// Re-export component crates
pub use keystone_cesr as cesr;
pub use keystone_event as event;
pub use keystone_keeper as keeper;

// Re-export main types for convenience
pub use controller::{Controller, ControllerConfig, RotationConfig};
pub use error::{KeystoneError, Result};
pub use kel::{encode_kel, parse_kel, verify_kel, SignedEvent};

// Re-export commonly used types
pub use keystone_cesr::{Cigar, Diger, Prefixer, Salter, Siger, Signer, Tier, Verfer};
pub use keystone_event::{Ilk, KeyState, SealEvent, Serder, Tholder};
pub use keystone_keeper::{KeyManager, Keeper, ManagerConfig, SaltyConfig};
