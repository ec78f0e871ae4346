//! alchemiscale-fah-client - Rust client for Folding@Home adaptive sampling servers
//!
//! This crate provides:
//! - HTTP transport with mutual TLS for assignment and work servers
//! - `FahAdaptiveSamplingClient` with typed methods for the AS and WS APIs
//! - Model types for API payloads
//! - Key, certificate and CSR tooling for obtaining FAH credentials

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod keys;
pub mod model;

pub use client::FahAdaptiveSamplingClient;
pub use config::FahClientConfig;
pub use error::{FahError, Result};
pub use http::FahHttpClient;
pub use keys::{Certificate, Identity, KeyAlgorithm, PrivateKey};
pub use model::*;
