//! address_intel library: firewall rule address extraction and enrichment
//!
//! This library extracts IPv4/IPv6 addresses and CIDR blocks from nftables
//! rule files, deduplicates them, and enriches each address with registry
//! ownership data (RDAP), geolocation, and reverse DNS. Results are cached
//! on disk, progress is persisted so interrupted runs can resume, and the
//! final records can be exported as CSV or JSON.
//!
//! # Example
//!
//! ```no_run
//! use address_intel::{enrich_batch, EnrichmentConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EnrichmentConfig {
//!     rules_dir: std::path::PathBuf::from("./rules"),
//!     parallelism: 4,
//!     ..Default::default()
//! };
//!
//! let report = enrich_batch(config, CancellationToken::new()).await?;
//! println!(
//!     "Enriched {} of {} addresses ({} from cache)",
//!     report.enriched, report.total_addresses, report.cache_hits
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or call library functions within an async context.

#![warn(missing_docs)]

mod app;
mod cache;
pub mod config;
mod error_handling;
pub mod export;
mod geo;
mod http;
pub mod initialization;
mod models;
mod parser;
mod progress;
mod rate_limiter;
mod rdap;

// Re-export public API
pub use cache::ResultCache;
pub use config::{EnrichmentConfig, LogFormat, LogLevel, Opt, Registry};
pub use error_handling::{EnrichmentError, ErrorType, ProcessingStats};
pub use http::RetryingClient;
pub use models::{AddressRecord, EnrichmentSnapshot, ScannerKind};
pub use parser::{extract_addresses, SourceInfo, SourceMap};
pub use progress::ProgressTracker;
pub use run::{enrich_batch, enrich_one, BatchReport};

// Internal run module (contains the main enrichment logic)
mod run {
    use anyhow::{Context, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::stream::FuturesUnordered;
    use futures::StreamExt;
    use log::{info, warn};
    use tokio::sync::{Mutex, Semaphore};
    use tokio_util::sync::CancellationToken;

    use crate::app::{log_progress, shutdown_gracefully};
    use crate::cache::ResultCache;
    use crate::config::{
        EnrichmentConfig, RegistryEndpoint, GEO_BASE_URL, LOGGING_INTERVAL_SECS,
        PROGRESS_PERSIST_INTERVAL,
    };
    use crate::error_handling::{EnrichmentError, ErrorType, ProcessingStats};
    use crate::http::RetryingClient;
    use crate::initialization::{init_client, init_resolver};
    use crate::models::AddressRecord;
    use crate::parser::{extract_addresses, SourceMap};
    use crate::progress::ProgressTracker;
    use crate::rate_limiter::IntervalLimiter;
    use hickory_resolver::TokioAsyncResolver;

    /// Results of a bulk enrichment run.
    #[derive(Debug, Clone)]
    pub struct BatchReport {
        /// All records, in extraction order, with whatever enrichment each
        /// address accumulated.
        pub records: Vec<AddressRecord>,
        /// Number of unique addresses extracted from the rule files.
        pub total_addresses: usize,
        /// Addresses enriched over the network during this run.
        pub enriched: usize,
        /// Addresses satisfied entirely from the on-disk cache.
        pub cache_hits: usize,
        /// Addresses skipped because a resumed run had already processed them.
        pub resumed: usize,
        /// Addresses for which every enrichment source came back empty.
        pub failed: usize,
        /// True when the run was cancelled before draining its queue.
        pub cancelled: bool,
        /// Elapsed time in seconds.
        pub elapsed_seconds: f64,
    }

    /// How one address left the worker pool.
    enum Outcome {
        Enriched,
        CacheHit,
        Resumed,
        Failed,
        Cancelled,
    }

    /// Mutable run state shared by the workers.
    ///
    /// Cache and progress are updated together under one lock so the
    /// persisted files never disagree about which addresses are done.
    struct RunState {
        cache: ResultCache,
        progress: ProgressTracker,
        progress_path: std::path::PathBuf,
    }

    impl RunState {
        /// Records one finished address. Every few completions it hands back
        /// the serialized state so the caller can write it to disk after
        /// releasing the lock.
        fn complete(&mut self, record: &AddressRecord) -> Option<PersistPayload> {
            if !record.enrichment.is_empty() {
                self.cache.update(record);
            }
            self.progress.record_processed(&record.address);

            if self.progress.processed_count % PROGRESS_PERSIST_INTERVAL == 0 {
                match self.payload() {
                    Ok(payload) => return Some(payload),
                    Err(e) => warn!("{e}"),
                }
            }
            None
        }

        fn payload(&self) -> Result<PersistPayload, EnrichmentError> {
            Ok(PersistPayload {
                progress_path: self.progress_path.clone(),
                progress_json: self.progress.serialize(&self.progress_path)?,
                cache_path: self.cache.path().to_path_buf(),
                cache_json: self.cache.serialize()?,
            })
        }
    }

    /// Serialized cache and progress state, captured under the run lock and
    /// written to disk without holding it.
    struct PersistPayload {
        progress_path: std::path::PathBuf,
        progress_json: String,
        cache_path: std::path::PathBuf,
        cache_json: String,
    }

    impl PersistPayload {
        async fn write(&self) -> Result<(), EnrichmentError> {
            tokio::fs::write(&self.progress_path, &self.progress_json)
                .await
                .map_err(|e| EnrichmentError::ProgressSave {
                    path: self.progress_path.clone(),
                    source: e,
                })?;
            tokio::fs::write(&self.cache_path, &self.cache_json)
                .await
                .map_err(|e| EnrichmentError::CacheSave {
                    path: self.cache_path.clone(),
                    source: e,
                })
        }
    }

    /// Runs a bulk enrichment with the provided configuration.
    ///
    /// This is the main entry point for the library. It extracts addresses
    /// from the rule files under `config.rules_dir`, maps each one to its
    /// source scanner file, and enriches them concurrently through the
    /// configured registries with geolocation and reverse-DNS fallback.
    ///
    /// A previously interrupted run resumes automatically: addresses the
    /// progress file lists as processed are not re-enriched. Pass a
    /// [`CancellationToken`] to stop the run early; already-completed work is
    /// persisted and the partial records are returned.
    ///
    /// # Errors
    ///
    /// This function returns an error if:
    /// - The rules directory does not exist
    /// - The HTTP client or DNS resolver cannot be initialized
    /// - The cache or progress file cannot be written at the end of the run
    ///
    /// Per-address enrichment failures are counted, logged, and do not fail
    /// the run.
    pub async fn enrich_batch(
        config: EnrichmentConfig,
        cancel: CancellationToken,
    ) -> Result<BatchReport> {
        let addresses = extract_addresses(&config.rules_dir)
            .context("Failed to extract addresses from rule files")?;
        let sources =
            SourceMap::build(&config.rules_dir).context("Failed to map addresses to sources")?;
        info!(
            "Extracted {} unique addresses from {}",
            addresses.len(),
            config.rules_dir.display()
        );

        let mut records: Vec<AddressRecord> = addresses
            .iter()
            .enumerate()
            .map(|(i, address)| {
                let mut record = AddressRecord::new(i + 1, address.clone());
                sources.apply(&mut record);
                record
            })
            .collect();

        let cache = ResultCache::load(&config.cache_path, config.effective_cache_ttl_hours());
        info!(
            "Result cache: {} fresh entries (TTL {}h)",
            cache.len(),
            cache.ttl_hours()
        );

        let loaded = ProgressTracker::load(&config.progress_path);
        let progress = if loaded.is_resumable() && loaded.total == records.len() {
            info!(
                "Resuming interrupted run: {}/{} addresses already processed",
                loaded.processed_count, loaded.total
            );
            loaded
        } else {
            ProgressTracker::new(
                records.len(),
                config.effective_parallelism(),
                config.throttle_seconds,
            )
        };

        let client = init_client(config.timeout_seconds)
            .context("Failed to initialize HTTP client")?;
        let resolver = init_resolver().context("Failed to initialize DNS resolver")?;
        let endpoints: Arc<[RegistryEndpoint]> = config.registry_endpoints().into();
        let geo_base: Arc<str> = config
            .geo_base_url
            .as_deref()
            .unwrap_or(GEO_BASE_URL)
            .into();

        let limiter = Arc::new(IntervalLimiter::new(config.throttle_seconds));
        let stats = Arc::new(ProcessingStats::new());
        let semaphore = Arc::new(Semaphore::new(config.effective_parallelism()));
        let state = Arc::new(Mutex::new(RunState {
            cache,
            progress,
            progress_path: config.progress_path.clone(),
        }));

        let start_time = std::time::Instant::now();
        let completed = Arc::new(AtomicUsize::new(0));
        let total = records.len();

        let logging_cancel = cancel.child_token();
        let completed_for_logging = Arc::clone(&completed);
        let logging_task = Some(tokio::task::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(LOGGING_INTERVAL_SECS));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        log_progress(start_time, &completed_for_logging, total);
                    }
                    _ = logging_cancel.cancelled() => {
                        break;
                    }
                }
            }
        }));

        let mut tasks = FuturesUnordered::new();
        for (index, record) in records.drain(..).enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Semaphore closed, skipping address: {}", record.address);
                    continue;
                }
            };

            let client = client.clone();
            let resolver = Arc::clone(&resolver);
            let endpoints = Arc::clone(&endpoints);
            let geo_base = Arc::clone(&geo_base);
            let limiter = Arc::clone(&limiter);
            let stats = Arc::clone(&stats);
            let state = Arc::clone(&state);
            let cancel = cancel.clone();
            let completed = Arc::clone(&completed);

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let outcome = process_address(
                    record,
                    &client,
                    &resolver,
                    &endpoints,
                    &geo_base,
                    &limiter,
                    &stats,
                    &state,
                    &cancel,
                )
                .await;
                if matches!(outcome.1, Outcome::Enriched | Outcome::CacheHit) {
                    completed.fetch_add(1, Ordering::SeqCst);
                }
                (index, outcome)
            }));
        }

        let mut finished: Vec<Option<AddressRecord>> = (0..total).map(|_| None).collect();
        let mut enriched = 0usize;
        let mut cache_hits = 0usize;
        let mut resumed = 0usize;
        let mut failed = 0usize;
        let mut cancelled_count = 0usize;

        while let Some(task_result) = tasks.next().await {
            match task_result {
                Ok((index, (record, outcome))) => {
                    match outcome {
                        Outcome::Enriched => enriched += 1,
                        Outcome::CacheHit => cache_hits += 1,
                        Outcome::Resumed => resumed += 1,
                        Outcome::Failed => failed += 1,
                        Outcome::Cancelled => cancelled_count += 1,
                    }
                    finished[index] = Some(record);
                }
                Err(join_error) => {
                    warn!("Worker task panicked: {join_error:?}");
                }
            }
        }

        let was_cancelled = cancel.is_cancelled() || cancelled_count > 0;

        // A cancelled run keeps the progress file so the next run can resume
        let payload = {
            let mut state = state.lock().await;
            if !was_cancelled {
                state.progress.mark_complete();
            }
            state.payload()
        };
        let persisted = match payload {
            Ok(payload) => payload.write().await,
            Err(e) => Err(e),
        };

        shutdown_gracefully(cancel, logging_task).await;
        log_progress(start_time, &completed, total);
        stats.log_summary();

        persisted.context("Failed to persist run state")?;
        if !was_cancelled {
            if let Err(e) = ProgressTracker::clear(&config.progress_path) {
                warn!("{e}");
            }
        }

        let records: Vec<AddressRecord> = finished.into_iter().flatten().collect();

        Ok(BatchReport {
            records,
            total_addresses: total,
            enriched,
            cache_hits,
            resumed,
            failed,
            cancelled: was_cancelled,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }

    /// Enriches one address through the cache, registries, geolocation, and
    /// reverse DNS, returning the record and how it was satisfied.
    #[allow(clippy::too_many_arguments)]
    async fn process_address(
        mut record: AddressRecord,
        client: &RetryingClient,
        resolver: &TokioAsyncResolver,
        endpoints: &[RegistryEndpoint],
        geo_base: &str,
        limiter: &IntervalLimiter,
        stats: &ProcessingStats,
        state: &Mutex<RunState>,
        cancel: &CancellationToken,
    ) -> (AddressRecord, Outcome) {
        if cancel.is_cancelled() {
            return (record, Outcome::Cancelled);
        }

        // Cache and resume checks happen before any network traffic
        {
            let mut state = state.lock().await;
            if state.cache.apply_to(&mut record) {
                state.progress.record_processed(&record.address);
                return (record, Outcome::CacheHit);
            }
            if state.progress.is_processed(&record.address) {
                return (record, Outcome::Resumed);
            }
        }

        limiter.wait().await;
        if cancel.is_cancelled() {
            return (record, Outcome::Cancelled);
        }

        match crate::rdap::lookup(client, endpoints, &record.address, stats).await {
            Ok(snapshot) => record.apply_snapshot(&snapshot),
            Err(e) => {
                stats.increment(ErrorType::NoRegistryResponded);
                warn!("{e}");
            }
        }

        let geo = crate::geo::lookup(client, geo_base, record.host_address()).await;
        if geo.is_empty() {
            stats.increment(ErrorType::GeolocationEmpty);
        } else {
            record.apply_snapshot(&geo);
        }

        if record.enrichment.reverse_dns.is_none() {
            match crate::geo::reverse_dns(resolver, record.host_address()).await {
                Some(name) => {
                    record.enrichment.reverse_dns = Some(name);
                }
                None => {
                    stats.increment(ErrorType::ReverseDnsError);
                }
            }
        }

        let outcome = if record.enrichment.is_empty() {
            Outcome::Failed
        } else {
            Outcome::Enriched
        };

        let payload = {
            let mut state = state.lock().await;
            state.complete(&record)
        };
        // Periodic saves are best effort; the final save at the end of the
        // run reports failures to the caller
        if let Some(payload) = payload {
            if let Err(e) = payload.write().await {
                warn!("{e}");
            }
        }
        (record, outcome)
    }

    /// Enriches a single address outside of any rule-file context.
    ///
    /// Uses the same cache, registry order, and fallbacks as a bulk run, but
    /// skips progress tracking. The cache is updated and saved when the
    /// lookup produced any data.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or DNS resolver cannot be
    /// initialized, or if the updated cache cannot be written back. A fully
    /// failed lookup still returns the (empty) record.
    pub async fn enrich_one(address: &str, config: &EnrichmentConfig) -> Result<AddressRecord> {
        let mut record = AddressRecord::new(1, address);

        let mut cache = ResultCache::load(&config.cache_path, config.effective_cache_ttl_hours());
        if cache.apply_to(&mut record) {
            info!("Cache hit for {address}");
            return Ok(record);
        }

        let client = init_client(config.timeout_seconds)
            .context("Failed to initialize HTTP client")?;
        let resolver = init_resolver().context("Failed to initialize DNS resolver")?;
        let endpoints = config.registry_endpoints();
        let geo_base = config.geo_base_url.as_deref().unwrap_or(GEO_BASE_URL);
        let stats = ProcessingStats::new();

        match crate::rdap::lookup(&client, &endpoints, &record.address, &stats).await {
            Ok(snapshot) => record.apply_snapshot(&snapshot),
            Err(e) => warn!("{e}"),
        }

        let geo = crate::geo::lookup(&client, geo_base, record.host_address()).await;
        if !geo.is_empty() {
            record.apply_snapshot(&geo);
        }

        if record.enrichment.reverse_dns.is_none() {
            if let Some(name) = crate::geo::reverse_dns(&resolver, record.host_address()).await {
                record.enrichment.reverse_dns = Some(name);
            }
        }

        if !record.enrichment.is_empty() {
            cache.update(&record);
            cache.save().context("Failed to save result cache")?;
        }

        Ok(record)
    }
}
