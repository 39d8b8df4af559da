// Curator API - JSON-RPC surface
//
// The collaborator-facing launch/status/delivery endpoints, exposed over
// localhost TCP.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
