use thiserror::Error;

/// Fatal: nothing works without a provider session. Propagated to main,
/// which exits non-zero.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session open failed: {0}")]
    Open(#[source] reqwest::Error),
    #[error("session close failed: {0}")]
    Close(#[source] reqwest::Error),
    #[error("session rejected by provider: code={code} msg={msg}")]
    Rejected { code: i32, msg: String },
}

/// Recoverable: one instrument's fetch failed this cycle. The poller logs
/// and moves on; the next cycle is the retry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {ticker} failed: {source}")]
    Transport {
        ticker: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider error for {ticker}: code={code} msg={msg}")]
    Provider { ticker: String, code: i32, msg: String },
    #[error("decode response for {ticker} failed: {source}")]
    Decode {
        ticker: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Recoverable, replay-side only: a persisted row that cannot be read back.
/// The row is dropped and replay continues.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("row {row} of {key}: bad timestamp {value:?}")]
    Timestamp { key: String, row: u64, value: String },
    #[error("row {row} of {key}: expected {expected} columns, got {got}")]
    ColumnCount {
        key: String,
        row: u64,
        expected: usize,
        got: usize,
    },
    #[error("row {row} of {key}: {source}")]
    Malformed {
        key: String,
        row: u64,
        #[source]
        source: csv::Error,
    },
}
