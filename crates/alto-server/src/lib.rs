//! alto-server: ALTO protocol layer
//!
//! Serves the information resource directory, network map, cost map,
//! endpoint property and endpoint cost resources over HTTP from a loaded
//! [`alto_core::TopologyStore`].
//!
//! A request flows resolve -> decode/validate -> handle -> encode; any step
//! may end it with a [`ServerError`], which always renders as an
//! `application/alto-error+json` document.

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod payload;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use catalog::{media, resolve, Resource, ResourceDescriptor};
pub use config::{ConfigError, ServerConfig};
pub use error::{ErrorDocument, ServerError};
pub use handlers::handle;
pub use metrics::init_prometheus_recorder;
pub use payload::ResponsePayload;
pub use request::{decode_and_validate, RequestEnvelope, ValidationError};
pub use response::{encode, negotiate};
pub use routes::{create_router, create_router_with_metrics};
pub use server::{AltoServer, ServerBuilder};
pub use state::{create_shared_state, ServerState, SharedState};
