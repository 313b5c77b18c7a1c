pub mod error;
pub mod types;
pub mod universe;

pub use error::SentimentError;
pub use types::*;
pub use universe::{
    default_universe, load_universe, Constituent, SymbolPair, BENCHMARK_INDEX, BROAD_INDEX,
    SAFE_HAVEN, SMALLCAP_INDEX,
};
