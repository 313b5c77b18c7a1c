use chrono::Utc;

use sentiment_core::{
    clamp_score, CompositeResult, Indicator, IndicatorKind, SentimentLabel, INDICATOR_COUNT,
};

/// Canonical indicator weights. They sum to 1.0; when indicators are missing
/// the surviving weights are renormalized so they still do.
pub fn canonical_weight(kind: IndicatorKind) -> f64 {
    match kind {
        IndicatorKind::Momentum => 0.20,
        IndicatorKind::VolumeStrength => 0.10,
        IndicatorKind::MarketBreadth => 0.20,
        IndicatorKind::Volatility => 0.15,
        IndicatorKind::HighsLows => 0.15,
        IndicatorKind::SmallVsLarge => 0.10,
        IndicatorKind::SafeHaven => 0.10,
    }
}

/// Fold the available sub-indicators into one composite score.
///
/// Null slots are discarded; the canonical weights of the survivors are
/// renormalized to sum to 1.0, so a thin run still yields a full-scale score
/// (degradation is visible only through `indicators_used`). Returns None when
/// nothing survived — the run has no composite.
pub fn aggregate(slots: [Option<Indicator>; INDICATOR_COUNT]) -> Option<CompositeResult> {
    let survivors: Vec<Indicator> = slots.into_iter().flatten().collect();
    if survivors.is_empty() {
        tracing::error!("All {} indicators unavailable, no composite", INDICATOR_COUNT);
        return None;
    }

    let total_weight: f64 = survivors.iter().map(|i| canonical_weight(i.kind)).sum();
    let weighted_sum: f64 = survivors
        .iter()
        .map(|i| i.value as f64 * (canonical_weight(i.kind) / total_weight))
        .sum();

    let value = clamp_score(weighted_sum);
    let label = SentimentLabel::from_score(value);

    tracing::info!(
        "Composite: {} ({}) from {}/{} indicators",
        value,
        label.as_str(),
        survivors.len(),
        INDICATOR_COUNT
    );

    Some(CompositeResult {
        value,
        label,
        color: label.color().to_string(),
        indicators_used: survivors.len(),
        indicators_total: INDICATOR_COUNT,
        indicators: survivors,
        updated_at: Utc::now(),
    })
}
