//! HTTP layer: error mapping, shared context, endpoints, router, and
//! server lifecycle.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;
pub mod ui;
