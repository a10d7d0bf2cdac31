//! Telemetry metric name constants.
//!
//! Centralised metric names for colloquy operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Common labels
//!
//! - `provider`: provider family ("anthropic", "openai")
//! - `operation`: "summarize" or "answer"
//! - `status`: "ok" or "error"

/// Total provider calls issued by the dispatcher.
///
/// Labels: `provider`, `operation`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "colloquy_requests_total";

/// Provider call duration in seconds.
///
/// Labels: `provider`, `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "colloquy_request_duration_seconds";

/// Summary cache hits.
///
/// Labels: `operation`.
pub const CACHE_HITS_TOTAL: &str = "colloquy_cache_hits_total";

/// Summary cache misses.
///
/// Labels: `operation`.
pub const CACHE_MISSES_TOTAL: &str = "colloquy_cache_misses_total";

/// Generated summaries that could not be written back to the cache.
pub const CACHE_WRITE_FAILURES_TOTAL: &str = "colloquy_cache_write_failures_total";
