use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("No indicators could be computed")]
    NoIndicators,
}
