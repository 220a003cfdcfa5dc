//! HTTP API
//!
//! Adapts the wire format onto the ledger handlers.

pub mod routes;

pub use routes::create_router;
