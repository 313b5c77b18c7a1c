pub mod fetcher;
mod session;
pub mod stooq;
pub mod yahoo;

pub use fetcher::{AuditRecord, HistoryFetcher, Source, CONSTITUENT_MIN_BARS, INDEX_MIN_BARS};
pub use stooq::StooqClient;
pub use yahoo::YahooClient;

/// Why a single fetch attempt failed. Transient failures are retried with
/// backoff; structural ones abort the symbol immediately.
#[derive(Debug)]
pub(crate) enum FetchFailure {
    Transient(String),
    Structural(String),
}

/// Shared retry policy: hard per-attempt timeout, linear backoff between
/// transient failures.
pub(crate) mod policy {
    use std::time::Duration;

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const BACKOFF_BASE: Duration = Duration::from_millis(500);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
}
