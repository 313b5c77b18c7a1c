//! sentiment-runner: one full fetch-compute-persist cycle of the NSE
//! Fear & Greed index.
//!
//! Pulls the index-grade series concurrently, fans out over the constituent
//! universe in paced batches, computes the seven sub-indicators, aggregates
//! them with weight redistribution, and upserts today's entry into the
//! history store. Partial data degrades gracefully; the process exits
//! non-zero only when zero indicators could be computed (the store is left
//! untouched in that case).
//!
//! Usage:
//!   sentiment-runner              # scoring run
//!   sentiment-runner --audit      # sequential per-symbol coverage probe
//!
//! Environment:
//!   FNG_HISTORY_PATH    history JSON document (default: fng-history.json)
//!   FNG_UNIVERSE_PATH   optional universe JSON file (default: built-in table)

use chrono::Utc;
use std::path::PathBuf;

use history_store::{HistoryEntry, HistoryStore};
use indicator_engine::MarketData;
use market_data::{HistoryFetcher, Source, INDEX_MIN_BARS};
use sentiment_core::{
    default_universe, load_universe, Bar, Constituent, BENCHMARK_INDEX, BROAD_INDEX, SAFE_HAVEN,
    SMALLCAP_INDEX,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentiment_runner=info,market_data=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let audit = args.iter().any(|a| a == "--audit");

    let universe = load_configured_universe()?;
    let fetcher = HistoryFetcher::new();

    if audit {
        run_audit(&fetcher, &universe).await;
        return Ok(());
    }

    run_scoring(&fetcher, &universe).await
}

fn load_configured_universe() -> anyhow::Result<Vec<Constituent>> {
    match std::env::var("FNG_UNIVERSE_PATH") {
        Ok(path) => {
            let universe = load_universe(std::path::Path::new(&path))?;
            tracing::info!("Loaded {} constituents from {}", universe.len(), path);
            Ok(universe)
        }
        Err(_) => {
            let universe = default_universe();
            tracing::info!("Using built-in universe ({} constituents)", universe.len());
            Ok(universe)
        }
    }
}

fn history_path() -> PathBuf {
    std::env::var("FNG_HISTORY_PATH")
        .unwrap_or_else(|_| "fng-history.json".to_string())
        .into()
}

async fn run_scoring(fetcher: &HistoryFetcher, universe: &[Constituent]) -> anyhow::Result<()> {
    let started = std::time::Instant::now();

    // The four index-grade pulls are independent; fire them together.
    let (benchmark, broad, small_cap, safe_haven) = tokio::join!(
        fetcher.fetch_index_series(BENCHMARK_INDEX),
        fetcher.fetch_index_series(BROAD_INDEX),
        fetcher.fetch_index_series(SMALLCAP_INDEX),
        fetcher.fetch_index_series(SAFE_HAVEN),
    );

    let benchmark = pick_benchmark(benchmark, broad);
    let constituent_series = fetcher.fetch_universe(universe).await;

    let slots = indicator_engine::compute_all(&MarketData {
        benchmark: benchmark.as_deref(),
        small_cap: small_cap.as_deref(),
        safe_haven: safe_haven.as_deref(),
        universe: &constituent_series,
    });

    let Some(composite) = composite_engine::aggregate(slots) else {
        // Total aggregation failure: nothing is written, the exit status
        // is the only signal.
        anyhow::bail!("no indicators could be computed, history left untouched");
    };

    let path = history_path();
    let mut store = HistoryStore::load(&path);
    store.upsert(HistoryEntry::from_composite(Utc::now().date_naive(), &composite));
    store.save()?;

    tracing::info!(
        "{} ({}) from {}/{} indicators in {:.1}s -> {}",
        composite.value,
        composite.label.as_str(),
        composite.indicators_used,
        composite.indicators_total,
        started.elapsed().as_secs_f64(),
        path.display()
    );
    Ok(())
}

/// The NIFTY 50 pull is the benchmark; if it came back missing or short, the
/// broad NIFTY 500 series stands in so the benchmark-driven indicators still
/// run.
fn pick_benchmark(benchmark: Option<Vec<Bar>>, broad: Option<Vec<Bar>>) -> Option<Vec<Bar>> {
    match (&benchmark, &broad) {
        (Some(b), _) if b.len() >= INDEX_MIN_BARS => benchmark,
        (_, Some(wide)) => {
            tracing::warn!(
                "Benchmark series unusable, substituting broad index ({} bars)",
                wide.len()
            );
            broad
        }
        _ => benchmark,
    }
}

async fn run_audit(fetcher: &HistoryFetcher, universe: &[Constituent]) {
    tracing::info!("Auditing {} constituents (sequential, paced)", universe.len());
    let records = fetcher.audit_universe(universe).await;

    let mut covered = 0usize;
    for r in &records {
        match r.source {
            Some(Source::Primary) => {
                covered += 1;
                tracing::info!("{:<16} {:>4} bars (primary)", r.ticker, r.bars);
            }
            Some(Source::Secondary) => {
                covered += 1;
                tracing::info!("{:<16} {:>4} bars (secondary)", r.ticker, r.bars);
            }
            None => tracing::warn!("{:<16} no data on either provider", r.ticker),
        }
    }

    tracing::info!("Audit complete: {}/{} symbols covered", covered, records.len());
}
