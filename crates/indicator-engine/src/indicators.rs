use serde_json::json;
use std::collections::BTreeMap;

use sentiment_core::{clamp_score, scale_linear, Bar, Indicator, IndicatorKind, INDICATOR_COUNT};

/// Sessions in the momentum moving average.
const MOMENTUM_WINDOW: usize = 125;
/// Trailing sessions summed for up/down volume.
const VOLUME_SESSIONS: usize = 30;
/// Sessions in the breadth moving average.
const BREADTH_WINDOW: usize = 50;
/// Short and long volatility windows (daily returns).
const VOL_SHORT_WINDOW: usize = 20;
const VOL_LONG_WINDOW: usize = 252;
/// Minimum bars for the volatility indicator.
const VOL_MIN_BARS: usize = 60;
/// Minimum bars per symbol for the highs/lows scan.
const HIGHLOW_MIN_BARS: usize = 100;
/// Proximity band around the window max/min close.
const HIGHLOW_BAND: f64 = 0.05;
/// Sessions in the relative-return indicators.
const RETURN_SESSIONS: usize = 20;
/// Breadth-style indicators need at least this many usable symbols.
const MIN_UNIVERSE_SYMBOLS: usize = 10;

/// Everything a scoring run managed to acquire. Any piece may be missing;
/// each indicator checks its own preconditions.
pub struct MarketData<'a> {
    pub benchmark: Option<&'a [Bar]>,
    pub small_cap: Option<&'a [Bar]>,
    pub safe_haven: Option<&'a [Bar]>,
    pub universe: &'a BTreeMap<String, Vec<Bar>>,
}

/// Compute all seven sub-indicators in canonical order. A None slot means
/// the indicator's preconditions were unmet; it is logged and excluded
/// downstream, never an error.
pub fn compute_all(data: &MarketData) -> [Option<Indicator>; INDICATOR_COUNT] {
    let slots = [
        data.benchmark.and_then(momentum),
        volume_strength(data.universe),
        market_breadth(data.universe),
        data.benchmark.and_then(volatility),
        highs_lows(data.universe),
        match (data.small_cap, data.benchmark) {
            (Some(s), Some(b)) => small_vs_large(s, b),
            _ => None,
        },
        match (data.benchmark, data.safe_haven) {
            (Some(b), Some(h)) => safe_haven_demand(b, h),
            _ => None,
        },
    ];

    for (kind, slot) in IndicatorKind::ALL.iter().zip(slots.iter()) {
        match slot {
            Some(ind) => tracing::info!("{}: {} ({})", kind.name(), ind.value, ind.label.as_str()),
            None => tracing::warn!("{}: unavailable this run", kind.name()),
        }
    }

    slots
}

/// #1 Momentum: current close vs 125-session SMA, +-10% band.
pub fn momentum(benchmark: &[Bar]) -> Option<Indicator> {
    if benchmark.len() < MOMENTUM_WINDOW {
        tracing::debug!("momentum: {} bars, need {}", benchmark.len(), MOMENTUM_WINDOW);
        return None;
    }

    let closes = closes(benchmark);
    let sma = trailing_mean(&closes, MOMENTUM_WINDOW)?;
    if sma <= 0.0 {
        return None;
    }

    let current = *closes.last()?;
    let deviation_pct = (current - sma) / sma * 100.0;
    let value = clamp_score(scale_linear(deviation_pct, -10.0, 10.0));

    Some(Indicator::new(
        IndicatorKind::Momentum,
        value,
        format!(
            "Benchmark index is {:+.1}% versus its {}-session average",
            deviation_pct, MOMENTUM_WINDOW
        ),
        json!({
            "current": current,
            "sma": sma,
            "window": MOMENTUM_WINDOW,
            "deviation_pct": deviation_pct,
        }),
    ))
}

/// #2 Volume Strength: up-day volume vs down-day volume over the trailing
/// 30 sessions, across the universe. Ratio 0.5 -> 0, 1.0 -> 50, 1.5 -> 100.
pub fn volume_strength(universe: &BTreeMap<String, Vec<Bar>>) -> Option<Indicator> {
    let qualifying: Vec<&Vec<Bar>> = universe
        .values()
        .filter(|s| s.len() >= VOLUME_SESSIONS + 1)
        .collect();
    if qualifying.len() < MIN_UNIVERSE_SYMBOLS {
        tracing::debug!(
            "volume_strength: {} qualifying symbols, need {}",
            qualifying.len(), MIN_UNIVERSE_SYMBOLS
        );
        return None;
    }

    let mut up_volume = 0.0f64;
    let mut down_volume = 0.0f64;
    for series in &qualifying {
        let tail = &series[series.len() - (VOLUME_SESSIONS + 1)..];
        for pair in tail.windows(2) {
            if pair[1].close > pair[0].close {
                up_volume += pair[1].volume as f64;
            } else if pair[1].close < pair[0].close {
                down_volume += pair[1].volume as f64;
            }
        }
    }

    let ratio = if down_volume > 0.0 {
        up_volume / down_volume
    } else if up_volume > 0.0 {
        // No down-day volume at all: saturate at the greed end.
        1.5
    } else {
        tracing::debug!("volume_strength: zero traded volume in window");
        return None;
    };

    let value = clamp_score(scale_linear(ratio, 0.5, 1.5));
    Some(Indicator::new(
        IndicatorKind::VolumeStrength,
        value,
        format!(
            "Up-day volume is {:.2}x down-day volume over the last {} sessions",
            ratio, VOLUME_SESSIONS
        ),
        json!({
            "up_volume": up_volume,
            "down_volume": down_volume,
            "ratio": ratio,
            "symbols": qualifying.len(),
        }),
    ))
}

/// #3 Market Breadth: share of symbols trading above their 50-session SMA.
pub fn market_breadth(universe: &BTreeMap<String, Vec<Bar>>) -> Option<Indicator> {
    let mut qualifying = 0usize;
    let mut above = 0usize;
    for series in universe.values() {
        if series.len() < BREADTH_WINDOW {
            continue;
        }
        let closes = closes(series);
        let Some(sma) = trailing_mean(&closes, BREADTH_WINDOW) else { continue };
        qualifying += 1;
        if *closes.last().unwrap_or(&0.0) > sma {
            above += 1;
        }
    }

    if qualifying < MIN_UNIVERSE_SYMBOLS {
        tracing::debug!(
            "market_breadth: {} qualifying symbols, need {}",
            qualifying, MIN_UNIVERSE_SYMBOLS
        );
        return None;
    }

    let percent = above as f64 / qualifying as f64 * 100.0;
    let value = clamp_score(percent);
    Some(Indicator::new(
        IndicatorKind::MarketBreadth,
        value,
        format!(
            "{:.0}% of {} sampled stocks trade above their {}-session average",
            percent, qualifying, BREADTH_WINDOW
        ),
        json!({
            "above": above,
            "qualifying": qualifying,
            "percent": percent,
        }),
    ))
}

/// #4 Volatility (inverted): 20-session annualized volatility against the
/// trailing-year baseline. Ratio 1.5 -> 0 (panic), 0.5 -> 100 (calm).
pub fn volatility(benchmark: &[Bar]) -> Option<Indicator> {
    if benchmark.len() < VOL_MIN_BARS {
        tracing::debug!("volatility: {} bars, need {}", benchmark.len(), VOL_MIN_BARS);
        return None;
    }

    let returns = daily_returns(benchmark);
    if returns.len() < VOL_SHORT_WINDOW {
        return None;
    }

    let short = annualized_volatility(&returns[returns.len() - VOL_SHORT_WINDOW..]);
    let long_window = returns.len().min(VOL_LONG_WINDOW);
    let long = annualized_volatility(&returns[returns.len() - long_window..]);
    if long == 0.0 {
        tracing::debug!("volatility: degenerate baseline (zero variance)");
        return None;
    }

    let ratio = short / long;
    let value = clamp_score(100.0 - scale_linear(ratio, 0.5, 1.5));
    Some(Indicator::new(
        IndicatorKind::Volatility,
        value,
        format!(
            "Recent volatility is {:.2}x the trailing-year baseline ({:.1}% vs {:.1}% annualized)",
            ratio,
            short * 100.0,
            long * 100.0
        ),
        json!({
            "short_vol": short,
            "long_vol": long,
            "ratio": ratio,
        }),
    ))
}

/// #5 New Highs vs Lows: symbols within 5% of their window-max close against
/// symbols within 5% of their window-min close.
pub fn highs_lows(universe: &BTreeMap<String, Vec<Bar>>) -> Option<Indicator> {
    let qualifying: Vec<&Vec<Bar>> = universe
        .values()
        .filter(|s| s.len() >= HIGHLOW_MIN_BARS)
        .collect();
    if qualifying.len() < MIN_UNIVERSE_SYMBOLS {
        tracing::debug!(
            "highs_lows: {} qualifying symbols, need {}",
            qualifying.len(), MIN_UNIVERSE_SYMBOLS
        );
        return None;
    }

    let mut highs = 0usize;
    let mut lows = 0usize;
    for series in &qualifying {
        let closes = closes(series);
        let current = *closes.last().unwrap_or(&0.0);
        let max = closes.iter().copied().fold(f64::MIN, f64::max);
        let min = closes.iter().copied().fold(f64::MAX, f64::min);
        if current >= max * (1.0 - HIGHLOW_BAND) {
            highs += 1;
        } else if current <= min * (1.0 + HIGHLOW_BAND) {
            lows += 1;
        }
    }

    let value = if highs + lows == 0 {
        50
    } else {
        clamp_score(highs as f64 / (highs + lows) as f64 * 100.0)
    };

    Some(Indicator::new(
        IndicatorKind::HighsLows,
        value,
        format!(
            "{} stocks near their highs vs {} near their lows (of {} sampled)",
            highs, lows, qualifying.len()
        ),
        json!({
            "near_high": highs,
            "near_low": lows,
            "qualifying": qualifying.len(),
        }),
    ))
}

/// #6 Small vs Large Cap: 20-session return differential, small-cap minus
/// benchmark, +-5 percentage-point band.
pub fn small_vs_large(small_cap: &[Bar], benchmark: &[Bar]) -> Option<Indicator> {
    let small_ret = window_return_pct(small_cap, RETURN_SESSIONS)?;
    let bench_ret = window_return_pct(benchmark, RETURN_SESSIONS)?;
    let diff = small_ret - bench_ret;
    let value = clamp_score(scale_linear(diff, -5.0, 5.0));

    Some(Indicator::new(
        IndicatorKind::SmallVsLarge,
        value,
        format!(
            "Small caps {} large caps by {:.1} points over {} sessions",
            if diff >= 0.0 { "lead" } else { "trail" },
            diff.abs(),
            RETURN_SESSIONS
        ),
        json!({
            "small_cap_return_pct": small_ret,
            "benchmark_return_pct": bench_ret,
            "differential": diff,
        }),
    ))
}

/// #7 Safe-Haven Demand: 20-session return differential, benchmark minus the
/// safe-haven asset, +-5 percentage-point band.
pub fn safe_haven_demand(benchmark: &[Bar], safe_haven: &[Bar]) -> Option<Indicator> {
    let bench_ret = window_return_pct(benchmark, RETURN_SESSIONS)?;
    let haven_ret = window_return_pct(safe_haven, RETURN_SESSIONS)?;
    let diff = bench_ret - haven_ret;
    let value = clamp_score(scale_linear(diff, -5.0, 5.0));

    Some(Indicator::new(
        IndicatorKind::SafeHaven,
        value,
        format!(
            "Stocks {} the safe-haven asset by {:.1} points over {} sessions",
            if diff >= 0.0 { "outperform" } else { "underperform" },
            diff.abs(),
            RETURN_SESSIONS
        ),
        json!({
            "benchmark_return_pct": bench_ret,
            "safe_haven_return_pct": haven_ret,
            "differential": diff,
        }),
    ))
}

fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Mean of the last `window` values.
fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(values[values.len() - window..].iter().sum::<f64>() / window as f64)
}

/// Simple daily returns, skipping pairs with a non-positive base.
fn daily_returns(bars: &[Bar]) -> Vec<f64> {
    bars.windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect()
}

/// Population standard deviation of daily returns, annualized over 252
/// trading sessions.
fn annualized_volatility(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt() * (252.0f64).sqrt()
}

/// Percent return over the last `sessions` sessions (needs sessions + 1 bars).
fn window_return_pct(bars: &[Bar], sessions: usize) -> Option<f64> {
    if bars.len() < sessions + 1 {
        tracing::debug!("window return: {} bars, need {}", bars.len(), sessions + 1);
        return None;
    }
    let base = bars[bars.len() - sessions - 1].close;
    if base <= 0.0 {
        return None;
    }
    let current = bars.last()?.close;
    Some((current - base) / base * 100.0)
}
