pub mod http;

use async_trait::async_trait;

use crate::error::{FetchError, SessionError};
use crate::types::TabularRecord;

/// Abstraction for market data providers (HTTP gateway, desktop-session
/// bridge, test doubles). Ok(None) means the provider answered but has no
/// data for the instrument; transport and provider-side failures are typed
/// errors so the poller can skip without unwinding.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Open the provider session. Everything else requires it.
    async fn open_session(&self) -> Result<(), SessionError>;

    /// Close the provider session.
    async fn close_session(&self) -> Result<(), SessionError>;

    /// Fetch the named fields for one ticker.
    async fn fetch_fields(
        &self,
        ticker: &str,
        fields: &[String],
    ) -> Result<Option<TabularRecord>, FetchError>;

    /// Fetch the volatility matrix for one underlying. Distinct call shape:
    /// the provider decides the columns.
    async fn fetch_surface(&self, ticker: &str) -> Result<Option<TabularRecord>, FetchError>;
}

pub use http::HttpProvider;
