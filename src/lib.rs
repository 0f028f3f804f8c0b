//! alto-portal: ALTO server workspace
//!
//! Re-exports the topology model and the protocol layer.

pub use alto_core as topology;
pub use alto_server as protocol;

pub use alto_core::TopologyStore;
pub use alto_server::{AltoServer, ServerBuilder, ServerConfig};
