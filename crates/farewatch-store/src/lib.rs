//! Append-only JSON history of every price check.

mod history;

pub use history::{history_key, HistoryStore, PriceHistory};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access history file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
