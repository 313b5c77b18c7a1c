use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use sentiment_core::Bar;

use crate::policy::{BACKOFF_BASE, REQUEST_TIMEOUT};
use crate::session::SessionCache;
use crate::FetchFailure;

const CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Primary provider: columnar chart JSON (timestamp array plus parallel
/// OHLCV arrays), authenticated by a cached crumb/cookie session.
pub struct YahooClient {
    http: Client,
    session: SessionCache,
}

impl YahooClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT + Duration::from_secs(5))
            .user_agent("Mozilla/5.0 (compatible; fng-engine/0.1)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            session: SessionCache::new(),
        }
    }

    /// Fetch one symbol's daily series. None means unavailable: retries
    /// exhausted, a structural provider failure, or zero valid bars.
    pub async fn fetch_series(
        &self,
        symbol: &str,
        range: &str,
        max_attempts: u32,
    ) -> Option<Vec<Bar>> {
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(BACKOFF_BASE * (attempt - 1)).await;
            }

            match self.attempt(symbol, range).await {
                Ok(bars) if bars.is_empty() => {
                    tracing::warn!("Chart API returned no valid bars for {}", symbol);
                    return None;
                }
                Ok(bars) => return Some(bars),
                Err(FetchFailure::Transient(reason)) => {
                    tracing::warn!(
                        "Chart API {} attempt {}/{} failed ({}), retrying",
                        symbol, attempt, max_attempts, reason
                    );
                }
                Err(FetchFailure::Structural(reason)) => {
                    tracing::warn!("Chart API {} failed structurally: {}", symbol, reason);
                    return None;
                }
            }
        }

        tracing::warn!("Chart API {}: retries exhausted", symbol);
        None
    }

    async fn attempt(&self, symbol: &str, range: &str) -> Result<Vec<Bar>, FetchFailure> {
        let url = format!("{}/{}", CHART_BASE, symbol);
        let mut request = self
            .http
            .get(&url)
            .query(&[("range", range), ("interval", "1d"), ("includePrePost", "false")]);

        if let Some(session) = self.session.get(&self.http).await {
            request = request
                .query(&[("crumb", session.crumb.as_str())])
                .header(reqwest::header::COOKIE, session.cookie);
        }

        // Hard timeout: dropping the in-flight future aborts the request.
        let response = match tokio::time::timeout(REQUEST_TIMEOUT, request.send()).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(FetchFailure::Transient(format!("network: {}", e))),
            Err(_) => {
                return Err(FetchFailure::Transient(format!(
                    "timeout after {:?}",
                    REQUEST_TIMEOUT
                )))
            }
        };

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(FetchFailure::Transient(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(FetchFailure::Structural(format!("HTTP {}", status)));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| FetchFailure::Structural(format!("malformed payload: {}", e)))?;

        Ok(parse_chart(body))
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten the columnar payload into bars, discarding any row with a missing,
/// non-finite, or non-positive close and collapsing duplicate dates
/// (first occurrence wins).
fn parse_chart(body: ChartResponse) -> Vec<Bar> {
    let result = match body.chart.result.and_then(|mut r| {
        if r.is_empty() { None } else { Some(r.remove(0)) }
    }) {
        Some(r) => r,
        None => return Vec::new(),
    };

    let quote = match result.indicators.quote.into_iter().next() {
        Some(q) => q,
        None => return Vec::new(),
    };

    let mut bars: Vec<Bar> = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let close = match quote.close.get(i).copied().flatten() {
            Some(c) if c.is_finite() && c > 0.0 => c,
            _ => continue,
        };

        let date = match DateTime::from_timestamp(ts, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };

        if bars.last().map(|b: &Bar| b.date) == Some(date) {
            continue;
        }

        let field = |col: &Vec<Option<f64>>| {
            col.get(i)
                .copied()
                .flatten()
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(close)
        };

        bars.push(Bar {
            date,
            open: field(&quote.open),
            high: field(&quote.high),
            low: field(&quote.low),
            close,
            volume: quote
                .volume
                .get(i)
                .copied()
                .flatten()
                .unwrap_or(0),
        });
    }

    bars
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}
