//! alto-core: Topology model for the ALTO portal
//!
//! This crate holds everything the protocol layer reads but never mutates:
//! - Provider-defined identifiers (PIDs) and typed endpoint addresses
//! - The network map (PID -> address prefixes) with longest-prefix lookup
//! - Cost tables behind a pluggable [`CostSource`], ordinal ranking, and
//!   cost constraints
//! - The [`TopologyStore`] that bundles them, loaded once at startup
//!
//! # Lifecycle
//!
//! A [`TopologyStore`] is built exactly once (from a topology file or in code)
//! and then shared read-only across request handlers. There is no mutation path
//! after construction, so concurrent readers need no locking.

mod cost;
mod cost_map;
mod endpoint;
mod error;
mod network_map;
mod pid;
mod topology;

pub use cost::{rank_ordinal, Constraint, ConstraintOp, CostMode, CostType};
pub use cost_map::{CostSource, StaticCostTable};
pub use endpoint::{parse_endpoint, AddressFamily, EndpointAddress, IpPrefix};
pub use error::{DecodeError, TopologyError};
pub use network_map::NetworkMap;
pub use pid::{parse_pid, Pid};
pub use topology::{TopologyFile, TopologyStore};

pub type Result<T> = std::result::Result<T, TopologyError>;

/// Endpoint properties the portal knows how to answer
pub mod properties {
    /// Owning PID of an endpoint
    pub const PID: &str = "pid";

    /// All recognized property names
    pub const SUPPORTED: &[&str] = &[PID];
}
