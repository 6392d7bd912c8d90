//! HTTP transport for vendor requests

pub mod client;

pub use client::{Endpoint, HttpTransport};
