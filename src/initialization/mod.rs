//! Initialization of shared runtime components.
//!
//! Logger, HTTP client, and DNS resolver setup used by both the CLI binary
//! and the library entry points.

mod client;
mod logger;
mod resolver;

pub use client::init_client;
pub use logger::init_logger_with;
pub use resolver::init_resolver;
