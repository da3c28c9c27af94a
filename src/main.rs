use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use rates_dashboard_bot::append_log::CsvAppendLog;
use rates_dashboard_bot::cache::LatestCache;
use rates_dashboard_bot::config::Settings;
use rates_dashboard_bot::poller::Poller;
use rates_dashboard_bot::provider::HttpProvider;
use rates_dashboard_bot::registry::default_universe;
use rates_dashboard_bot::stats::Stats;
use rates_dashboard_bot::view::DashboardView;

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

async fn maybe_write_jsonl(path: &Option<String>, line: &str) {
    if let Some(p) = path.as_ref().map(|x| x.trim().to_string()).filter(|x| !x.is_empty()) {
        if let Ok(mut f) = tokio::fs::OpenOptions::new().create(true).append(true).open(&p).await {
            use tokio::io::AsyncWriteExt;
            let _ = f.write_all(line.as_bytes()).await;
            let _ = f.write_all(b"\n").await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let s = Settings::from_env()?;
    let universe = default_universe();
    tracing::info!(
        instruments = universe.len(),
        interval_secs = s.interval_secs,
        data_dir = %s.data_dir,
        "starting ingestion"
    );

    let cache = LatestCache::new();
    let log = CsvAppendLog::new(s.data_dir.clone())?;
    let stats = Stats::new(now_ms());
    let provider = Arc::new(HttpProvider::new(s.provider_host.clone()));

    let poller = Poller::new(
        provider,
        universe.clone(),
        cache.clone(),
        log,
        stats.clone(),
        Duration::from_secs(s.interval_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut ingest = tokio::spawn(async move { poller.run(shutdown_rx).await });

    let mut summary_tick =
        tokio::time::interval(Duration::from_secs(s.dashboard_log_secs.max(1)));
    summary_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("ctrl-c received, stopping poller");
                let _ = shutdown_tx.send(true);
                break;
            }
            res = &mut ingest => {
                // The poller only returns early on a fatal session error.
                res??;
                return Ok(());
            }
            _ = summary_tick.tick() => {
                if s.dashboard_log_secs > 0 {
                    DashboardView::from_cache(&cache, &universe).log_summary();
                }

                let t = now_ms();
                if stats.should_log(t, s.stats_log_sec) {
                    let ss = stats.snapshot(t);
                    stats.mark_logged(t);

                    tracing::info!(
                        up_sec = ss.up_sec,
                        cycles = ss.cycles,
                        fetch_ok = ss.fetch_ok,
                        fetch_empty = ss.fetch_empty,
                        fetch_err = ss.fetch_err,
                        rows_appended = ss.rows_appended,
                        cached = cache.len(),
                        "stats"
                    );

                    let line = serde_json::to_string(&ss).unwrap_or_default();
                    maybe_write_jsonl(&s.stats_jsonl_path, &line).await;
                }
            }
        }
    }

    ingest.await??;
    tracing::info!("shutdown complete");
    Ok(())
}
