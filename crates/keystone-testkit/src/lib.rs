//! # Keystone Testkit
//!
//! Testing utilities for Keystone.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Inception events with known SAIDs for cross-implementation checks
//! - **Generators**: Proptest strategies for keys, thresholds and identifiers
//! - **Fixtures**: Salted key managers, controllers and group members
//!
//! ## Golden Vectors
//!
//! ```rust
//! use keystone_testkit::vectors::{all_vectors, inception_from_vector};
//!
//! for vector in all_vectors() {
//!     let icp = inception_from_vector(&vector);
//!     assert_eq!(icp.said().unwrap(), vector.expected_said);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keystone_testkit::generators::{controller_from_params, IdentifierParams};
//!
//! proptest! {
//!     #[test]
//!     fn prefix_is_deterministic(params: IdentifierParams) {
//!         let a = controller_from_params(&params);
//!         let b = controller_from_params(&params);
//!         prop_assert_eq!(a.prefix(), b.prefix());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use keystone_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let controller = fixture.controller();
//! assert_eq!(controller.kel().len(), 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{group_fixture, multi_party_fixtures, TestFixture};
pub use generators::{controller_from_params, IdentifierParams};
pub use vectors::{all_vectors, inception_from_vector, verify_all_vectors, GoldenVector};
