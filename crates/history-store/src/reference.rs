use serde::Serialize;

use crate::store::HistoryEntry;

/// Reference offsets, counted back from the end of the history (the current
/// entry is the last one). Guarded by history length.
const OFFSET_PREVIOUS_CLOSE: usize = 2;
const OFFSET_WEEK_AGO: usize = 6;
const OFFSET_MONTH_AGO: usize = 23;
const OFFSET_YEAR_AGO: usize = 253;

/// Latest score plus derived reference points for the read-only surface.
/// Built only from a non-empty history; an empty/missing/corrupt store is the
/// caller's "not yet available" condition.
#[derive(Debug, Clone, Serialize)]
pub struct ReadView {
    pub current: HistoryEntry,
    pub previous_close: Option<u8>,
    pub week_ago: Option<u8>,
    pub month_ago: Option<u8>,
    pub year_ago: Option<u8>,
    pub all_time_low: u8,
    pub all_time_high: u8,
}

impl ReadView {
    pub fn from_entries(entries: &[HistoryEntry]) -> Option<Self> {
        let current = entries.last()?.clone();
        let value_back = |offset: usize| {
            entries
                .len()
                .checked_sub(offset)
                .and_then(|i| entries.get(i))
                .map(|e| e.value)
        };

        Some(Self {
            current,
            previous_close: value_back(OFFSET_PREVIOUS_CLOSE),
            week_ago: value_back(OFFSET_WEEK_AGO),
            month_ago: value_back(OFFSET_MONTH_AGO),
            year_ago: value_back(OFFSET_YEAR_AGO),
            all_time_low: entries.iter().map(|e| e.value).min().unwrap_or(0),
            all_time_high: entries.iter().map(|e| e.value).max().unwrap_or(0),
        })
    }
}
