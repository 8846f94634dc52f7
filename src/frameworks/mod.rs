// Frameworks: configuration, tracing and server bootstrap.

pub mod config;
pub mod server;
