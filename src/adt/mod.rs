// src/adt/mod.rs
// =============================================================================
// Everything that talks to the ADT service.
//
// Submodules:
// - transport: the HTTP seam (trait + reqwest implementation)
// - endpoints: fixed endpoint paths and URL construction
// - session: CSRF token + cookie handshake
// - nodes: node records and the node-structure XML parser
// - fetch: one authenticated listing per package, with failure isolation
// - search: SEARCH_GENERIC object references (single-pass variant)
// =============================================================================

mod endpoints;
mod fetch;
mod nodes;
mod search;
mod session;
mod transport;

pub use fetch::NodeFetcher;
pub use nodes::NodeRecord;
pub use search::{join_by_name, search_objects};
pub use session::{fetch_credentials, Credentials};
pub use transport::{ReqwestTransport, Transport};

#[cfg(test)]
pub use endpoints::node_structure_url;
#[cfg(test)]
pub use transport::mock;
