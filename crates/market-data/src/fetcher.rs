use std::collections::BTreeMap;
use std::time::Duration;

use futures_util::future::join_all;

use sentiment_core::{Bar, Constituent, SymbolPair};

use crate::policy::DEFAULT_MAX_ATTEMPTS;
use crate::{StooqClient, YahooClient};

/// Minimum bar count for an index-grade series before the secondary provider
/// is consulted.
pub const INDEX_MIN_BARS: usize = 50;
/// Minimum bar count for a constituent series.
pub const CONSTITUENT_MIN_BARS: usize = 20;

/// Constituents fetched per concurrent batch.
const BATCH_SIZE: usize = 5;
/// Pause between batches, to stay friendly with provider-side rate limits.
const BATCH_PACING: Duration = Duration::from_millis(300);
/// Pause between sequential audit requests (secondary provider allows ~3 req/s).
const AUDIT_PACING: Duration = Duration::from_millis(350);

const INDEX_RANGE: &str = "2y";
const CONSTITUENT_RANGE: &str = "1y";

/// Which provider ultimately served a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Primary,
    Secondary,
}

/// Outcome of one audit probe.
#[derive(Debug)]
pub struct AuditRecord {
    pub ticker: String,
    pub bars: usize,
    pub source: Option<Source>,
}

/// Multi-source series acquisition: per-symbol primary-then-secondary
/// fallback, batched universe fan-out, paced sequential auditing.
pub struct HistoryFetcher {
    yahoo: YahooClient,
    stooq: StooqClient,
}

impl HistoryFetcher {
    pub fn new() -> Self {
        Self {
            yahoo: YahooClient::new(),
            stooq: StooqClient::new(),
        }
    }

    /// Fetch an index-grade series, trying the secondary provider whenever
    /// the primary comes back unavailable or short. The two providers are
    /// never queried concurrently for the same symbol.
    pub async fn fetch_index_series(&self, pair: SymbolPair) -> Option<Vec<Bar>> {
        let primary = self
            .yahoo
            .fetch_series(pair.primary, INDEX_RANGE, DEFAULT_MAX_ATTEMPTS)
            .await;

        if let Some(ref bars) = primary {
            if bars.len() >= INDEX_MIN_BARS {
                tracing::info!("{}: {} bars from primary", pair.primary, bars.len());
                return primary;
            }
            tracing::warn!(
                "{}: only {} bars from primary (need {}), trying secondary",
                pair.primary, bars.len(), INDEX_MIN_BARS
            );
        } else {
            tracing::warn!("{}: primary unavailable, trying secondary", pair.primary);
        }

        let secondary = self.stooq.fetch_series(pair.secondary, DEFAULT_MAX_ATTEMPTS).await;
        best_of(primary, secondary, pair.primary)
    }

    /// Fetch the whole constituent universe in fixed-size concurrent batches
    /// with inter-batch pacing. A symbol that fails on both providers is
    /// simply absent from the map; batch siblings are unaffected.
    pub async fn fetch_universe(&self, universe: &[Constituent]) -> BTreeMap<String, Vec<Bar>> {
        let mut series: BTreeMap<String, Vec<Bar>> = BTreeMap::new();
        let batches = universe.chunks(BATCH_SIZE).collect::<Vec<_>>();
        let total = batches.len();

        for (batch_no, batch) in batches.into_iter().enumerate() {
            let fetches = batch.iter().map(|c| async move {
                (c.ticker.clone(), self.fetch_constituent(c).await)
            });

            for (ticker, outcome) in join_all(fetches).await {
                match outcome {
                    Some((bars, _)) => {
                        series.insert(ticker, bars);
                    }
                    None => tracing::warn!("{}: excluded from this run (no data)", ticker),
                }
            }

            tracing::debug!(
                "Universe batch {}/{} done ({} series so far)",
                batch_no + 1, total, series.len()
            );

            if batch_no + 1 < total {
                tokio::time::sleep(BATCH_PACING).await;
            }
        }

        tracing::info!(
            "Universe fetch complete: {}/{} symbols usable",
            series.len(), universe.len()
        );
        series
    }

    /// Sequential per-symbol coverage probe at the rate-limited pacing.
    /// Used by the audit path, never by the scoring run.
    pub async fn audit_universe(&self, universe: &[Constituent]) -> Vec<AuditRecord> {
        let mut records = Vec::with_capacity(universe.len());
        for (i, c) in universe.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(AUDIT_PACING).await;
            }
            let outcome = self.fetch_constituent(c).await;
            records.push(AuditRecord {
                ticker: c.ticker.clone(),
                bars: outcome.as_ref().map(|(b, _)| b.len()).unwrap_or(0),
                source: outcome.map(|(_, s)| s),
            });
        }
        records
    }

    async fn fetch_constituent(&self, c: &Constituent) -> Option<(Vec<Bar>, Source)> {
        let primary = self
            .yahoo
            .fetch_series(&c.ticker, CONSTITUENT_RANGE, DEFAULT_MAX_ATTEMPTS)
            .await;

        if let Some(bars) = primary {
            if bars.len() >= CONSTITUENT_MIN_BARS {
                return Some((bars, Source::Primary));
            }
            tracing::debug!(
                "{}: {} bars from primary (need {}), trying secondary",
                c.ticker, bars.len(), CONSTITUENT_MIN_BARS
            );
        }

        let secondary = self
            .stooq
            .fetch_series(&c.secondary_ticker, DEFAULT_MAX_ATTEMPTS)
            .await?;
        if secondary.len() >= CONSTITUENT_MIN_BARS {
            Some((secondary, Source::Secondary))
        } else {
            None
        }
    }
}

impl Default for HistoryFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep whichever series is usable; when both exist prefer the longer one.
fn best_of(primary: Option<Vec<Bar>>, secondary: Option<Vec<Bar>>, symbol: &str) -> Option<Vec<Bar>> {
    match (primary, secondary) {
        (Some(p), Some(s)) => {
            if s.len() > p.len() {
                tracing::info!("{}: using secondary series ({} bars)", symbol, s.len());
                Some(s)
            } else {
                Some(p)
            }
        }
        (Some(p), None) => Some(p),
        (None, Some(s)) => {
            tracing::info!("{}: using secondary series ({} bars)", symbol, s.len());
            Some(s)
        }
        (None, None) => {
            tracing::warn!("{}: unavailable on both providers", symbol);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn test_best_of_prefers_longer_secondary() {
        let picked = best_of(Some(bars(10)), Some(bars(60)), "X").unwrap();
        assert_eq!(picked.len(), 60);
    }

    #[test]
    fn test_best_of_keeps_primary_on_tie() {
        let mut primary = bars(30);
        primary[0].close = 42.0;
        let picked = best_of(Some(primary), Some(bars(30)), "X").unwrap();
        assert_eq!(picked[0].close, 42.0);
    }

    #[test]
    fn test_best_of_both_unavailable() {
        assert!(best_of(None, None, "X").is_none());
    }
}
