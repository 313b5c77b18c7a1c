use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;

use sentiment_core::Bar;

use crate::policy::{BACKOFF_BASE, REQUEST_TIMEOUT};
use crate::FetchFailure;

const DOWNLOAD_URL: &str = "https://stooq.com/q/d/l/";

/// Secondary provider: daily CSV download
/// (`Date,Open,High,Low,Close,Volume`, oldest row first).
pub struct StooqClient {
    http: Client,
}

impl StooqClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT + Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { http }
    }

    /// Fetch one symbol's daily series. None means unavailable (same contract
    /// as the primary client).
    pub async fn fetch_series(&self, symbol: &str, max_attempts: u32) -> Option<Vec<Bar>> {
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(BACKOFF_BASE * (attempt - 1)).await;
            }

            match self.attempt(symbol).await {
                Ok(bars) if bars.len() < 2 => {
                    tracing::warn!("CSV provider returned a short file for {} ({} rows)", symbol, bars.len());
                    return None;
                }
                Ok(bars) => return Some(bars),
                Err(FetchFailure::Transient(reason)) => {
                    tracing::warn!(
                        "CSV provider {} attempt {}/{} failed ({}), retrying",
                        symbol, attempt, max_attempts, reason
                    );
                }
                Err(FetchFailure::Structural(reason)) => {
                    tracing::warn!("CSV provider {} failed structurally: {}", symbol, reason);
                    return None;
                }
            }
        }

        tracing::warn!("CSV provider {}: retries exhausted", symbol);
        None
    }

    async fn attempt(&self, symbol: &str) -> Result<Vec<Bar>, FetchFailure> {
        let request = self
            .http
            .get(DOWNLOAD_URL)
            .query(&[("s", symbol), ("i", "d")]);

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

        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::Transient(format!("body read: {}", e)))?;

        Ok(parse_csv(&body))
    }
}

impl Default for StooqClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the CSV table into bars. Rows with a missing/non-numeric/non-positive
/// close are dropped without aborting the rest of the file; duplicate dates
/// keep the first occurrence. Output stays sorted ascending.
fn parse_csv(body: &str) -> Vec<Bar> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut bars: Vec<Bar> = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => continue,
        };

        let date = match record.get(0).and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()) {
            Some(d) => d,
            None => continue,
        };

        let close = match record.get(4).and_then(|s| s.trim().parse::<f64>().ok()) {
            Some(c) if c.is_finite() && c > 0.0 => c,
            _ => continue,
        };

        let num = |i: usize| {
            record
                .get(i)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(close)
        };

        let bar = Bar {
            date,
            open: num(1),
            high: num(2),
            low: num(3),
            close,
            volume: record
                .get(5)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
                .unwrap_or(0),
        };

        if bars.last().map(|b| b.date) == Some(bar.date) {
            continue;
        }
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_basic() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-01,100,101,99,100.5,1000\n\
                    2024-01-02,101,102,100,101.5,2000\n\
                    2024-01-03,102,103,101,102.5,3000\n";
        let bars = parse_csv(body);
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(bars[2].close, 102.5);
        assert_eq!(bars[1].volume, 2000);
    }

    #[test]
    fn test_parse_csv_drops_non_numeric_close_row_only() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-01,100,101,99,100.5,1000\n\
                    2024-01-02,101,102,100,N/A,2000\n\
                    2024-01-03,102,103,101,102.5,3000\n";
        let bars = parse_csv(body);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[1].close, 102.5);
    }

    #[test]
    fn test_parse_csv_drops_non_positive_close() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-01,100,101,99,0,1000\n\
                    2024-01-02,101,102,100,-5,2000\n\
                    2024-01-03,102,103,101,102.5,3000\n";
        let bars = parse_csv(body);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 102.5);
    }

    #[test]
    fn test_parse_csv_missing_volume_column() {
        let body = "Date,Open,High,Low,Close\n\
                    2024-01-01,100,101,99,100.5\n\
                    2024-01-02,101,102,100,101.5\n";
        let bars = parse_csv(body);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, 0);
    }

    #[test]
    fn test_parse_csv_duplicate_dates_first_wins() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-01,100,101,99,100.5,1000\n\
                    2024-01-01,200,201,199,200.5,9000\n\
                    2024-01-02,101,102,100,101.5,2000\n";
        let bars = parse_csv(body);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 100.5);
    }

    #[test]
    fn test_parse_csv_empty_and_header_only() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("Date,Open,High,Low,Close,Volume\n").is_empty());
    }
}
