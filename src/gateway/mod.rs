//! Gateway lifecycle: connect-all-then-serve, serve-then-disconnect-all.

mod lifecycle;

pub use lifecycle::{Gateway, GatewayOptions, GatewayPhase, StartupError};
