//! Vocab Client Library
//!
//! Schema-driven capability layer for a flashcard / spaced-repetition
//! backend whose HTTP API is described at runtime by an OpenAPI-style
//! document.
//!
//! # Features
//!
//! - **Capability Discovery**: heuristic, confidence-scored mapping of
//!   endpoints to a fixed set of learning capabilities
//! - **Schema Resolution**: `$ref` and `allOf` handling for example payloads
//! - **Failsafes**: bounded linear-backoff retries, timeouts, cancellation
//! - **Caching**: description documents cached with a TTL between runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capability;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod failsafe;
pub mod schema;
pub mod session;
pub mod transport;

pub use error::{ApiError, Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
