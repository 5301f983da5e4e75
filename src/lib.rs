// src/lib.rs
pub mod config;
pub mod dashboard;
pub mod metrics;
pub mod probe;
pub mod server;
pub mod sites;
