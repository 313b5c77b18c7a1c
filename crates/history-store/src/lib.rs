pub mod reference;
pub mod store;

pub use reference::ReadView;
pub use store::{HistoryEntry, HistoryStore, MAX_HISTORY_ENTRIES};
