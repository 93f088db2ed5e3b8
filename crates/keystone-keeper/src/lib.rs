//! # Keystone Keeper
//!
//! Key management with pre-rotation: every inception and rotation commits
//! to the digests of the next keys, and a rotation only promotes keys that
//! match that commitment.
//!
//! ## Keepers
//!
//! - [`SaltyKeeper`] - Keys stretched from a root salt and indexed path
//! - [`RandyKeeper`] - Random keys
//! - [`GroupKeeper`] - One member's keys within a group identifier
//! - [`ExternKeeper`] - Keys held by an injected [`ExternalKeyModule`]
//!
//! [`KeyManager`] creates keepers and tracks them by identifier prefix.

pub mod creator;
pub mod error;
pub mod external;
pub mod group;
pub mod keeper;
pub mod local;
pub mod manager;

pub use creator::{Algo, Creator, Derivation, RandyCreator, SaltyCreator};
pub use error::{KeeperError, Result};
pub use external::{ExternKeeper, ExternalKeyModule};
pub use group::GroupKeeper;
pub use keeper::{Keeper, KeeperParams};
pub use local::{LocalKeeper, RandyKeeper, SaltyKeeper};
pub use manager::{KeyManager, ManagerConfig, SaltyConfig};
