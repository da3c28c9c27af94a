use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::types::ObservationRecord;

/// Shared latest-observation map: instrument key to the most recent record.
/// Cloned handles see the same underlying map; the poller writes, the
/// dashboard side reads. Lock sections never hold across an await.
#[derive(Clone, Default)]
pub struct LatestCache {
    inner: Arc<RwLock<HashMap<String, ObservationRecord>>>,
}

impl LatestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally overwrite the entry for the record's instrument.
    pub fn update(&self, record: ObservationRecord) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(record.instrument_key.clone(), record);
    }

    /// Point-in-time read. None for keys never successfully fetched.
    pub fn get(&self, key: &str) -> Option<ObservationRecord> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldValue, TabularRecord};
    use rust_decimal_macros::dec;

    fn obs(key: &str, bid: rust_decimal::Decimal) -> ObservationRecord {
        ObservationRecord {
            instrument_key: key.to_string(),
            ts: chrono::Utc::now(),
            data: TabularRecord::new(vec!["BID".into()], vec![FieldValue::Num(bid)]),
        }
    }

    #[test]
    fn get_unknown_key_is_none() {
        let cache = LatestCache::new();
        assert!(cache.get("2Y_Spot").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn update_overwrites() {
        let cache = LatestCache::new();
        cache.update(obs("2Y_Spot", dec!(100.1)));
        cache.update(obs("2Y_Spot", dec!(100.3)));
        let rec = cache.get("2Y_Spot").unwrap();
        assert_eq!(rec.data.value("BID"), Some(&FieldValue::Num(dec!(100.3))));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn handles_share_one_map() {
        let cache = LatestCache::new();
        let reader = cache.clone();
        cache.update(obs("FFQ24", dec!(94.7)));
        assert!(reader.get("FFQ24").is_some());
    }

    #[test]
    fn concurrent_reads_and_writes() {
        let cache = LatestCache::new();
        let writer = cache.clone();
        let w = std::thread::spawn(move || {
            for i in 0..200 {
                writer.update(obs("10Y_Spot", rust_decimal::Decimal::from(i)));
            }
        });
        let reader = cache.clone();
        let r = std::thread::spawn(move || {
            for _ in 0..200 {
                let _ = reader.get("10Y_Spot");
            }
        });
        w.join().unwrap();
        r.join().unwrap();
        assert_eq!(cache.len(), 1);
    }
}
