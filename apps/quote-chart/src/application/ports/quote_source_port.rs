//! Quote Source Port (Driver Port)
//!
//! Batches of quote records arriving from upstream.

use async_trait::async_trait;

use crate::domain::quote::QuoteRecord;

/// Quote feed error.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Reading the underlying input failed.
    #[error("feed I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A batch could not be decoded.
    #[error("malformed batch on line {line}: {source}")]
    Malformed {
        /// 1-based input line.
        line: usize,
        /// Decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Source of quote batches, in arrival order.
#[async_trait]
pub trait QuoteSourcePort: Send {
    /// Next batch, or `None` once the source is exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<QuoteRecord>>, FeedError>;
}
