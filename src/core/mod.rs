//! Core Server Framework Module
//!
//! - config.rs: environment-driven server configuration
//! - random.rs: injectable random source lent to tools
//! - registry.rs: tool registration, argument validation and invocation
//! - server.rs: MCP JSON-RPC dispatch with HTTP and STDIO transports

pub mod config;
pub mod random;
pub mod registry;
pub mod server;
