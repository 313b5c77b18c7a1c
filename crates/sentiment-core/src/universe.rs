use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::SentimentError;

/// Primary/secondary provider symbols for one logical instrument.
#[derive(Debug, Clone, Copy)]
pub struct SymbolPair {
    pub primary: &'static str,
    pub secondary: &'static str,
}

/// NIFTY 50 — benchmark index for momentum/volatility/relative indicators.
pub const BENCHMARK_INDEX: SymbolPair = SymbolPair { primary: "^NSEI", secondary: "^nsei" };
/// NIFTY 500 — broad index, fallback benchmark when the NIFTY 50 pull is short.
pub const BROAD_INDEX: SymbolPair = SymbolPair { primary: "^CRSLDX", secondary: "^crsldx" };
/// NIFTY Smallcap 100 — small-cap leg of the size-rotation indicator.
pub const SMALLCAP_INDEX: SymbolPair = SymbolPair { primary: "^CNXSC", secondary: "^cnxsc" };
/// Gold futures — safe-haven reference instrument.
pub const SAFE_HAVEN: SymbolPair = SymbolPair { primary: "GC=F", secondary: "xauusd" };

/// One constituent of the sampled universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constituent {
    /// Primary provider ticker, e.g. "RELIANCE.NS".
    pub ticker: String,
    /// Secondary provider ticker, e.g. "reliance.in".
    pub secondary_ticker: String,
    pub sector: String,
    /// NIFTY 50 membership.
    pub in_benchmark: bool,
}

/// (ticker, sector, NIFTY 50 member). Secondary symbols are derived.
const DEFAULT_TABLE: &[(&str, &str, bool)] = &[
    // Financials
    ("HDFCBANK.NS", "Financials", true),
    ("ICICIBANK.NS", "Financials", true),
    ("SBIN.NS", "Financials", true),
    ("KOTAKBANK.NS", "Financials", true),
    ("AXISBANK.NS", "Financials", true),
    ("BAJFINANCE.NS", "Financials", true),
    ("BAJAJFINSV.NS", "Financials", true),
    ("INDUSINDBK.NS", "Financials", true),
    ("HDFCLIFE.NS", "Financials", true),
    ("SBILIFE.NS", "Financials", true),
    ("PNB.NS", "Financials", false),
    ("BANKBARODA.NS", "Financials", false),
    ("IDFCFIRSTB.NS", "Financials", false),
    ("CHOLAFIN.NS", "Financials", false),
    // Information Technology
    ("TCS.NS", "Information Technology", true),
    ("INFY.NS", "Information Technology", true),
    ("HCLTECH.NS", "Information Technology", true),
    ("WIPRO.NS", "Information Technology", true),
    ("TECHM.NS", "Information Technology", true),
    ("LTIM.NS", "Information Technology", true),
    ("PERSISTENT.NS", "Information Technology", false),
    ("COFORGE.NS", "Information Technology", false),
    ("MPHASIS.NS", "Information Technology", false),
    // Energy
    ("RELIANCE.NS", "Energy", true),
    ("ONGC.NS", "Energy", true),
    ("NTPC.NS", "Energy", true),
    ("POWERGRID.NS", "Energy", true),
    ("COALINDIA.NS", "Energy", true),
    ("BPCL.NS", "Energy", true),
    ("IOC.NS", "Energy", false),
    ("GAIL.NS", "Energy", false),
    ("TATAPOWER.NS", "Energy", false),
    ("ADANIGREEN.NS", "Energy", false),
    // Consumer
    ("HINDUNILVR.NS", "Consumer Staples", true),
    ("ITC.NS", "Consumer Staples", true),
    ("NESTLEIND.NS", "Consumer Staples", true),
    ("BRITANNIA.NS", "Consumer Staples", true),
    ("TATACONSUM.NS", "Consumer Staples", true),
    ("DABUR.NS", "Consumer Staples", false),
    ("GODREJCP.NS", "Consumer Staples", false),
    ("MARICO.NS", "Consumer Staples", false),
    ("COLPAL.NS", "Consumer Staples", false),
    // Automobiles
    ("MARUTI.NS", "Automobiles", true),
    ("M&M.NS", "Automobiles", true),
    ("TATAMOTORS.NS", "Automobiles", true),
    ("BAJAJ-AUTO.NS", "Automobiles", true),
    ("EICHERMOT.NS", "Automobiles", true),
    ("HEROMOTOCO.NS", "Automobiles", true),
    ("TVSMOTOR.NS", "Automobiles", false),
    ("ASHOKLEY.NS", "Automobiles", false),
    // Healthcare
    ("SUNPHARMA.NS", "Healthcare", true),
    ("DRREDDY.NS", "Healthcare", true),
    ("CIPLA.NS", "Healthcare", true),
    ("DIVISLAB.NS", "Healthcare", true),
    ("APOLLOHOSP.NS", "Healthcare", true),
    ("LUPIN.NS", "Healthcare", false),
    ("AUROPHARMA.NS", "Healthcare", false),
    ("ALKEM.NS", "Healthcare", false),
    // Metals & Mining
    ("TATASTEEL.NS", "Metals", true),
    ("JSWSTEEL.NS", "Metals", true),
    ("HINDALCO.NS", "Metals", true),
    ("VEDL.NS", "Metals", false),
    ("NMDC.NS", "Metals", false),
    ("SAIL.NS", "Metals", false),
    // Industrials / Infrastructure
    ("LT.NS", "Industrials", true),
    ("ADANIPORTS.NS", "Industrials", true),
    ("ADANIENT.NS", "Industrials", true),
    ("SIEMENS.NS", "Industrials", false),
    ("ABB.NS", "Industrials", false),
    ("HAL.NS", "Industrials", false),
    ("BEL.NS", "Industrials", false),
    ("CUMMINSIND.NS", "Industrials", false),
    // Cement & Materials
    ("ULTRACEMCO.NS", "Materials", true),
    ("GRASIM.NS", "Materials", true),
    ("SHREECEM.NS", "Materials", false),
    ("AMBUJACEM.NS", "Materials", false),
    ("PIDILITIND.NS", "Materials", false),
    ("ASIANPAINT.NS", "Materials", true),
    ("BERGEPAINT.NS", "Materials", false),
    // Telecom & Media
    ("BHARTIARTL.NS", "Communication Services", true),
    ("IDEA.NS", "Communication Services", false),
    ("ZEEL.NS", "Communication Services", false),
    // Consumer Discretionary
    ("TITAN.NS", "Consumer Discretionary", true),
    ("TRENT.NS", "Consumer Discretionary", false),
    ("DMART.NS", "Consumer Discretionary", false),
    ("HAVELLS.NS", "Consumer Discretionary", false),
    ("VOLTAS.NS", "Consumer Discretionary", false),
    ("PAGEIND.NS", "Consumer Discretionary", false),
    // Chemicals & Agri
    ("UPL.NS", "Chemicals", true),
    ("SRF.NS", "Chemicals", false),
    ("PIIND.NS", "Chemicals", false),
    ("TATACHEM.NS", "Chemicals", false),
];

/// Built-in constituent table, used when no universe file is configured.
pub fn default_universe() -> Vec<Constituent> {
    DEFAULT_TABLE
        .iter()
        .map(|&(ticker, sector, in_benchmark)| Constituent {
            ticker: ticker.to_string(),
            secondary_ticker: derive_secondary(ticker),
            sector: sector.to_string(),
            in_benchmark,
        })
        .collect()
}

/// Load a universe file (JSON array of `Constituent`).
pub fn load_universe(path: &Path) -> Result<Vec<Constituent>, SentimentError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SentimentError::ConfigError(format!("read {}: {}", path.display(), e)))?;
    let universe: Vec<Constituent> = serde_json::from_str(&raw)
        .map_err(|e| SentimentError::ConfigError(format!("parse {}: {}", path.display(), e)))?;
    if universe.is_empty() {
        return Err(SentimentError::ConfigError(format!(
            "universe file {} is empty",
            path.display()
        )));
    }
    Ok(universe)
}

/// Secondary provider symbols are the NSE ticker lowercased with an `.in`
/// suffix in place of `.NS`.
fn derive_secondary(ticker: &str) -> String {
    let base = ticker.strip_suffix(".NS").unwrap_or(ticker);
    format!("{}.in", base.to_lowercase())
}
