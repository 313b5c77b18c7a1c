use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Number of sub-indicators feeding the composite score.
pub const INDICATOR_COUNT: usize = 7;

/// One trading session's OHLCV for a symbol.
///
/// Only `close` is guaranteed meaningful; open/high/low fall back to close
/// when a provider omits them. Bars with a non-finite or non-positive close
/// never survive parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// The seven sub-indicators, in canonical (reporting) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Momentum,
    VolumeStrength,
    MarketBreadth,
    Volatility,
    HighsLows,
    SmallVsLarge,
    SafeHaven,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; INDICATOR_COUNT] = [
        IndicatorKind::Momentum,
        IndicatorKind::VolumeStrength,
        IndicatorKind::MarketBreadth,
        IndicatorKind::Volatility,
        IndicatorKind::HighsLows,
        IndicatorKind::SmallVsLarge,
        IndicatorKind::SafeHaven,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IndicatorKind::Momentum => "Market Momentum",
            IndicatorKind::VolumeStrength => "Volume Strength",
            IndicatorKind::MarketBreadth => "Market Breadth",
            IndicatorKind::Volatility => "Market Volatility",
            IndicatorKind::HighsLows => "New Highs vs Lows",
            IndicatorKind::SmallVsLarge => "Small vs Large Cap",
            IndicatorKind::SafeHaven => "Safe-Haven Demand",
        }
    }
}

/// Five-way sentiment classification shared by indicators and the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl SentimentLabel {
    /// Classify a 0-100 score. Boundaries: 24/44/55/74.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => SentimentLabel::ExtremeFear,
            25..=44 => SentimentLabel::Fear,
            45..=55 => SentimentLabel::Neutral,
            56..=74 => SentimentLabel::Greed,
            _ => SentimentLabel::ExtremeGreed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::ExtremeFear => "Extreme Fear",
            SentimentLabel::Fear => "Fear",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Greed => "Greed",
            SentimentLabel::ExtremeGreed => "Extreme Greed",
        }
    }

    /// Fixed palette matching the label thresholds.
    pub fn color(&self) -> &'static str {
        match self {
            SentimentLabel::ExtremeFear => "#e74c3c",
            SentimentLabel::Fear => "#e67e22",
            SentimentLabel::Neutral => "#f1c40f",
            SentimentLabel::Greed => "#2ecc71",
            SentimentLabel::ExtremeGreed => "#27ae60",
        }
    }
}

/// One computed sub-indicator with its evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub name: String,
    /// 0-100, clamped.
    pub value: u8,
    pub label: SentimentLabel,
    pub description: String,
    /// Numeric inputs behind the score, for the evidence panel.
    pub details: serde_json::Value,
}

impl Indicator {
    pub fn new(kind: IndicatorKind, value: u8, description: String, details: serde_json::Value) -> Self {
        Self {
            kind,
            name: kind.name().to_string(),
            value,
            label: SentimentLabel::from_score(value),
            description,
            details,
        }
    }
}

/// The aggregated daily sentiment score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeResult {
    pub value: u8,
    pub label: SentimentLabel,
    pub color: String,
    /// Only the indicators that actually contributed, canonical order.
    pub indicators: Vec<Indicator>,
    pub indicators_used: usize,
    pub indicators_total: usize,
    pub updated_at: DateTime<Utc>,
}

/// Map `value` onto 0-100: clamp to [lo, hi] then scale linearly.
/// A degenerate range (`lo == hi`) maps to neutral 50.
pub fn scale_linear(value: f64, lo: f64, hi: f64) -> f64 {
    if lo == hi {
        return 50.0;
    }
    let clamped = value.clamp(lo, hi);
    (clamped - lo) / (hi - lo) * 100.0
}

/// Round a raw 0-100 score to the integer scale, clamping defensively.
pub fn clamp_score(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}
