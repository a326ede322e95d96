pub mod geo;
pub mod query;
pub mod uri;

// Foundation crate: small, well-tested primitives only.
pub use geo::*;
pub use query::*;
pub use uri::*;
