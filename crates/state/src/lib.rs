//! Shared simulation state.
//!
//! [`StateStore`] owns the network graph, actor accounts, the IP blocklist
//! and global flags. It is built from a validated [`Scenario`] and cloned
//! in O(1) for snapshots and rollback. [`RandomStream`] is the single seeded
//! source of randomness for action resolution.

mod error;
mod rng;
mod scenario;
mod store;

pub use error::{ScenarioError, StateError};
pub use rng::RandomStream;
pub use scenario::Scenario;
pub use store::{NodeUpdate, StateStore};
