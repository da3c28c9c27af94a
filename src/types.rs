use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One scalar cell of an observation: numeric quote, text, or absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Num(Decimal),
    Text(String),
}

impl FieldValue {
    /// Render for a CSV cell. Null is an empty cell.
    pub fn to_csv_field(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Num(d) => d.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Parse a CSV cell back. Anything numeric becomes Num.
    pub fn from_csv_field(s: &str) -> FieldValue {
        if s.is_empty() {
            return FieldValue::Null;
        }
        match parse_dec(s) {
            Some(d) => FieldValue::Num(d),
            None => FieldValue::Text(s.to_string()),
        }
    }
}

/// Columnar record as returned by the provider: column names plus one row
/// of values in the same order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularRecord {
    pub columns: Vec<String>,
    pub values: Vec<FieldValue>,
}

impl TabularRecord {
    pub fn new(columns: Vec<String>, values: Vec<FieldValue>) -> Self {
        Self { columns, values }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn value(&self, column: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }
}

/// A persisted observation: one fetched record stamped with its ingestion
/// time. The same value lands in the append log and the latest-value cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRecord {
    pub instrument_key: String,
    pub ts: DateTime<Utc>,
    pub data: TabularRecord,
}

pub fn parse_dec(s: &str) -> Option<Decimal> {
    s.trim().parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn csv_field_round_trip() {
        assert_eq!(FieldValue::from_csv_field(""), FieldValue::Null);
        assert_eq!(FieldValue::from_csv_field("100.25"), FieldValue::Num(dec!(100.25)));
        assert_eq!(
            FieldValue::from_csv_field("US2YT=RR"),
            FieldValue::Text("US2YT=RR".to_string())
        );
        assert_eq!(FieldValue::Num(dec!(99.5)).to_csv_field(), "99.5");
        assert_eq!(FieldValue::Null.to_csv_field(), "");
    }

    #[test]
    fn record_value_by_column() {
        let rec = TabularRecord::new(
            vec!["BID".into(), "ASK".into()],
            vec![FieldValue::Num(dec!(100.1)), FieldValue::Num(dec!(100.2))],
        );
        assert_eq!(rec.value("ASK"), Some(&FieldValue::Num(dec!(100.2))));
        assert_eq!(rec.value("TRDPRC_1"), None);
        assert!(!rec.is_empty());
    }
}
