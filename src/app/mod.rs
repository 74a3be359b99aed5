//! Application-level helpers for the batch run loop.

mod logging;
mod shutdown;

pub use logging::log_progress;
pub use shutdown::shutdown_gracefully;
