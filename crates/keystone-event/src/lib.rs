//! # Keystone Event
//!
//! KERI key events: inception, rotation and interaction, with
//! self-addressing identifiers, signing thresholds and key state.
//!
//! This crate contains no I/O and holds no secrets. Events are built from
//! public keys and commitments; signing happens in `keystone-keeper`.
//!
//! ## Key Types
//!
//! - [`Serder`] - An event body and its canonical serialization
//! - [`Tholder`] - Unweighted or weighted signing threshold
//! - [`KeyState`] - Identifier state after replaying its events
//! - [`InceptionBuilder`], [`RotationBuilder`], [`InteractionBuilder`]
//!
//! ## Serialization
//!
//! Events are compact JSON in fixed field order, led by a version string
//! that declares the serialized size. See [`said`] and [`version`].

pub mod error;
pub mod eventing;
pub mod said;
pub mod serder;
pub mod state;
pub mod tholder;
pub mod validation;
pub mod version;

pub use error::{EventError, Result};
pub use eventing::{
    ample, next_digests, rotate_witnesses, verify_commitment, InceptionBuilder,
    InteractionBuilder, RotationBuilder, SealEvent, TRAIT_ESTABLISHMENT_ONLY,
};
pub use said::{saidify, saidify_all, sizeify, verify_said, verify_said_all};
pub use serder::{sniff, Serder};
pub use state::{replay, KeyState, LastEstablishment};
pub use tholder::{default_next_threshold, default_signing_threshold, Tholder, Weight};
pub use validation::{validate_event, verify_sigers};
pub use version::{deversify, versify, Ilk, Version};
