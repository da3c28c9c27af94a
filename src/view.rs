use serde::Serialize;

use crate::append_log::CsvAppendLog;
use crate::cache::LatestCache;
use crate::registry::{InstrumentKind, Universe};
use crate::types::ObservationRecord;

/// One instrument's latest observation, labelled for display.
#[derive(Debug, Clone, Serialize)]
pub struct GroupRow {
    pub key: String,
    pub record: ObservationRecord,
}

/// Grouped latest values as the dashboard shows them: fed-fund futures in
/// contract-month order, FOMC meetings chronological, treasury tenors, and
/// the single volatility-matrix view. Instruments never observed simply
/// have no row.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardView {
    pub fed_fund_futures: Vec<GroupRow>,
    pub fomc_meetings: Vec<GroupRow>,
    pub treasuries: Vec<GroupRow>,
    pub vol_matrix: Option<GroupRow>,
}

impl DashboardView {
    /// Read the latest values straight from the shared cache.
    pub fn from_cache(cache: &LatestCache, universe: &Universe) -> Self {
        Self::build(universe, |key| cache.get(key))
    }

    /// Rebuild the latest values by replaying the append logs. Used by
    /// out-of-process consumers; unreadable rows and missing files are
    /// already tolerated by the replay.
    pub fn from_logs(log: &CsvAppendLog, universe: &Universe) -> Self {
        Self::build(universe, |key| match log.latest_row(key) {
            Ok(rec) => rec,
            Err(e) => {
                tracing::warn!(key, error = %e, "log replay failed, rendering nothing");
                None
            }
        })
    }

    fn build(universe: &Universe, mut latest: impl FnMut(&str) -> Option<ObservationRecord>) -> Self {
        let mut rows = |kind: InstrumentKind| -> Vec<GroupRow> {
            universe
                .of_kind(kind)
                .filter_map(|spec| {
                    latest(&spec.key).map(|record| GroupRow {
                        key: spec.key.clone(),
                        record,
                    })
                })
                .collect()
        };

        let fed_fund_futures = rows(InstrumentKind::FedFundsFuture);
        let fomc_meetings = rows(InstrumentKind::FomcMeeting);
        let treasuries = rows(InstrumentKind::Treasury);
        let vol_matrix = rows(InstrumentKind::VolSurface).into_iter().next();

        Self {
            fed_fund_futures,
            fomc_meetings,
            treasuries,
            vol_matrix,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fed_fund_futures.is_empty()
            && self.fomc_meetings.is_empty()
            && self.treasuries.is_empty()
            && self.vol_matrix.is_none()
    }

    /// Log the grouped latest values, one line per instrument.
    pub fn log_summary(&self) {
        if self.is_empty() {
            tracing::info!("dashboard: no observations yet");
            return;
        }
        for (group, rows) in [
            ("fed_fund_futures", &self.fed_fund_futures),
            ("fomc_meetings", &self.fomc_meetings),
            ("treasuries", &self.treasuries),
        ] {
            for row in rows {
                tracing::info!(
                    group,
                    key = %row.key,
                    ts = %row.record.ts,
                    values = %compact(&row.record),
                    "latest"
                );
            }
        }
        if let Some(row) = &self.vol_matrix {
            tracing::info!(
                group = "vol_matrix",
                key = %row.key,
                ts = %row.record.ts,
                cols = row.record.data.columns.len(),
                "latest"
            );
        }
    }
}

fn compact(rec: &ObservationRecord) -> String {
    rec.data
        .columns
        .iter()
        .zip(&rec.data.values)
        .map(|(c, v)| format!("{}={}", c, v.to_csv_field()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_universe;
    use crate::types::{FieldValue, TabularRecord};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn obs(key: &str, bid: rust_decimal::Decimal) -> ObservationRecord {
        ObservationRecord {
            instrument_key: key.to_string(),
            ts: chrono::Utc::now(),
            data: TabularRecord::new(vec!["BID".into()], vec![FieldValue::Num(bid)]),
        }
    }

    #[test]
    fn futures_keep_contract_month_order() {
        let cache = LatestCache::new();
        // Inserted out of display order on purpose.
        cache.update(obs("FFZ24", dec!(95.1)));
        cache.update(obs("FFQ24", dec!(94.7)));
        cache.update(obs("FFU24", dec!(94.9)));

        let view = DashboardView::from_cache(&cache, &default_universe());
        let keys: Vec<&str> = view.fed_fund_futures.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["FFQ24", "FFU24", "FFZ24"]);
    }

    #[test]
    fn missing_instruments_render_nothing() {
        let cache = LatestCache::new();
        cache.update(obs("2Y_Spot", dec!(100.1)));

        let view = DashboardView::from_cache(&cache, &default_universe());
        assert_eq!(view.treasuries.len(), 1);
        assert!(view.fed_fund_futures.is_empty());
        assert!(view.fomc_meetings.is_empty());
        assert!(view.vol_matrix.is_none());
        assert!(!view.is_empty());
    }

    #[test]
    fn empty_cache_renders_empty_view() {
        let view = DashboardView::from_cache(&LatestCache::new(), &default_universe());
        assert!(view.is_empty());
    }

    #[test]
    fn replay_view_matches_appended_rows() {
        let tmp = TempDir::new().unwrap();
        let log = CsvAppendLog::new(tmp.path()).unwrap();

        log.append(
            "FOMC_Sep24",
            TabularRecord::new(vec!["IMPLD_BPS".into()], vec![FieldValue::Num(dec!(-31.5))]),
        )
        .unwrap();
        let latest = log
            .append(
                "FOMC_Sep24",
                TabularRecord::new(vec!["IMPLD_BPS".into()], vec![FieldValue::Num(dec!(-28.0))]),
            )
            .unwrap()
            .unwrap();

        let view = DashboardView::from_logs(&log, &default_universe());
        assert_eq!(view.fomc_meetings.len(), 1);
        assert_eq!(view.fomc_meetings[0].record, latest);
    }

    #[test]
    fn vol_matrix_appears_in_its_own_slot() {
        let cache = LatestCache::new();
        cache.update(ObservationRecord {
            instrument_key: "sraz24_volc_matrix".to_string(),
            ts: chrono::Utc::now(),
            data: TabularRecord::new(
                vec!["95.0".into(), "95.25".into()],
                vec![FieldValue::Num(dec!(12.4)), FieldValue::Num(dec!(11.9))],
            ),
        });

        let view = DashboardView::from_cache(&cache, &default_universe());
        let row = view.vol_matrix.unwrap();
        assert_eq!(row.key, "sraz24_volc_matrix");
        assert_eq!(row.record.data.columns.len(), 2);
    }
}
