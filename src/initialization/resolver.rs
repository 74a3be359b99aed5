//! DNS resolver initialization.

use std::sync::Arc;
use std::time::Duration;

use crate::error_handling::InitializationError;
use hickory_resolver::TokioAsyncResolver;

/// Initializes the DNS resolver used for reverse PTR lookups.
///
/// Uses the default resolver configuration (Google DNS) with short timeouts
/// so a dead nameserver cannot stall an enrichment worker. Reverse DNS is a
/// fallback data source, so failing fast is preferable to waiting.
///
/// # Errors
///
/// Returns `InitializationError::DnsResolverError` if the resolver cannot be
/// constructed (the default configuration should not fail in practice).
pub fn init_resolver() -> Result<Arc<TokioAsyncResolver>, InitializationError> {
    use hickory_resolver::config::{ResolverConfig, ResolverOpts};

    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(crate::config::DNS_TIMEOUT_SECS);
    opts.attempts = 2;
    // ndots = 0 prevents search domain appending on bare names
    opts.ndots = 0;

    Ok(Arc::new(TokioAsyncResolver::tokio(
        ResolverConfig::default(),
        opts,
    )))
}
