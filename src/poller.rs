use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::append_log::CsvAppendLog;
use crate::cache::LatestCache;
use crate::provider::MarketDataProvider;
use crate::registry::{InstrumentKind, InstrumentSpec, Universe};
use crate::stats::Stats;
use crate::types::TabularRecord;

/// Drives the ingestion pass: one sequential fetch over the universe per
/// interval, each success appended to the log and installed in the cache.
/// One instrument failing never blocks the rest of the cycle.
pub struct Poller {
    provider: Arc<dyn MarketDataProvider>,
    universe: Universe,
    cache: LatestCache,
    log: CsvAppendLog,
    stats: Arc<Stats>,
    interval: Duration,
}

impl Poller {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        universe: Universe,
        cache: LatestCache,
        log: CsvAppendLog,
        stats: Arc<Stats>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            universe,
            cache,
            log,
            stats,
            interval,
        }
    }

    /// Session open plus the one-time surface fetch. A session failure is
    /// fatal: without it no instrument can be fetched.
    pub async fn startup(&self) -> Result<()> {
        tracing::info!("opening provider session");
        self.provider
            .open_session()
            .await
            .context("cannot open provider session")?;

        // The volatility matrix is fetched once per process lifetime, not
        // on every cycle.
        if let Some(spec) = self.universe.surface() {
            self.fetch_surface(spec).await;
        }
        Ok(())
    }

    /// Poll until the shutdown channel flips, then close the session.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.startup().await?;

        let mut tick = tokio::time::interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => self.run_cycle().await,
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!("shutting down, closing provider session");
        if let Err(e) = self.provider.close_session().await {
            tracing::error!(error = %e, "session close failed");
        }
        Ok(())
    }

    /// One fetch pass across the universe, surface excluded.
    pub async fn run_cycle(&self) {
        self.stats.inc_cycle();

        for spec in self.universe.iter() {
            if spec.kind == InstrumentKind::VolSurface {
                continue;
            }

            tracing::debug!(key = %spec.key, ticker = %spec.ticker, "fetching");
            match self.provider.fetch_fields(&spec.ticker, &spec.fields).await {
                Ok(Some(rec)) => {
                    self.stats.inc_fetch_ok();
                    self.persist(&spec.key, rec);
                }
                Ok(None) => {
                    self.stats.inc_fetch_empty();
                    tracing::warn!(key = %spec.key, ticker = %spec.ticker, "no data for instrument");
                }
                Err(e) => {
                    self.stats.inc_fetch_err();
                    tracing::error!(key = %spec.key, ticker = %spec.ticker, error = %e, "fetch failed, skipping");
                }
            }
        }
    }

    async fn fetch_surface(&self, spec: &InstrumentSpec) {
        tracing::info!(key = %spec.key, ticker = %spec.ticker, "fetching volatility matrix");
        match self.provider.fetch_surface(&spec.ticker).await {
            Ok(Some(rec)) => {
                self.stats.inc_fetch_ok();
                self.persist(&spec.key, rec);
            }
            Ok(None) => {
                self.stats.inc_fetch_empty();
                tracing::warn!(key = %spec.key, "no surface data");
            }
            Err(e) => {
                self.stats.inc_fetch_err();
                tracing::error!(key = %spec.key, error = %e, "surface fetch failed");
            }
        }
    }

    /// Append first, cache second: the cache must only ever hold a record
    /// that is also the last row of the log.
    fn persist(&self, key: &str, rec: TabularRecord) {
        match self.log.append(key, rec) {
            Ok(Some(obs)) => {
                self.stats.inc_rows_appended();
                self.cache.update(obs);
            }
            Ok(None) => {} // empty record, warned by the writer
            Err(e) => {
                tracing::error!(key, error = %e, "append failed, cache left unchanged");
            }
        }
    }
}
