use anyhow::{Context, Result};
use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Utc};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::ParseError;
use crate::types::{FieldValue, ObservationRecord, TabularRecord};

/// Per-instrument append-only CSV log. One `<key>.csv` per instrument under
/// the data directory, header row written once, every observation appended
/// as a new row with the ingestion timestamp in the first column. Rows are
/// never rewritten or removed by this process.
pub struct CsvAppendLog {
    dir: PathBuf,
}

impl CsvAppendLog {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("create data dir {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), "append log initialized");
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.csv"))
    }

    /// Stamp the record with the ingestion time and append it as one row.
    /// Creates the file with a header row on first write for the key.
    /// An empty record is a warning, not an error, and writes nothing.
    pub fn append(&self, key: &str, data: TabularRecord) -> Result<Option<ObservationRecord>> {
        if data.is_empty() {
            tracing::warn!(key, "empty record, nothing to append");
            return Ok(None);
        }

        // Truncate to the persisted millisecond precision so the cached
        // record and the replayed row compare equal.
        let ts = Utc::now();
        let ts = ts.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(ts);

        let path = self.path_for(key);
        let write_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        let mut w = csv::Writer::from_writer(file);

        if write_header {
            let mut header = Vec::with_capacity(data.columns.len() + 1);
            header.push("Timestamp");
            header.extend(data.columns.iter().map(String::as_str));
            w.write_record(&header)
                .with_context(|| format!("write header for {key}"))?;
        }

        let mut row = Vec::with_capacity(data.values.len() + 1);
        row.push(ts.to_rfc3339_opts(SecondsFormat::Millis, true));
        row.extend(data.values.iter().map(FieldValue::to_csv_field));
        w.write_record(&row)
            .with_context(|| format!("append row for {key}"))?;
        w.flush().with_context(|| format!("flush {}", path.display()))?;

        Ok(Some(ObservationRecord {
            instrument_key: key.to_string(),
            ts,
            data,
        }))
    }

    /// Replay the log and return the last well-formed row. Malformed or
    /// truncated rows (a file caught mid-append) are dropped with a warning;
    /// a missing or empty file is None.
    pub fn latest_row(&self, key: &str) -> Result<Option<ObservationRecord>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        read_latest_row(key, &path)
    }
}

fn read_latest_row(key: &str, path: &Path) -> Result<Option<ObservationRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;

    let header = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .clone();
    if header.is_empty() {
        return Ok(None);
    }

    let mut latest: Option<ObservationRecord> = None;
    for (i, rec) in reader.records().enumerate() {
        let row = (i + 2) as u64; // 1-based, after the header line
        let parsed = match rec {
            Ok(rec) => parse_row(key, &header, &rec, row),
            Err(source) => Err(ParseError::Malformed {
                key: key.to_string(),
                row,
                source,
            }),
        };
        match parsed {
            Ok(obs) => latest = Some(obs),
            Err(e) => tracing::warn!(key, error = %e, "dropping unreadable log row"),
        }
    }

    Ok(latest)
}

fn parse_row(
    key: &str,
    header: &csv::StringRecord,
    rec: &csv::StringRecord,
    row: u64,
) -> Result<ObservationRecord, ParseError> {
    if rec.len() != header.len() {
        return Err(ParseError::ColumnCount {
            key: key.to_string(),
            row,
            expected: header.len(),
            got: rec.len(),
        });
    }

    let ts_raw = rec.get(0).unwrap_or_default();
    let ts = DateTime::parse_from_rfc3339(ts_raw)
        .map_err(|_| ParseError::Timestamp {
            key: key.to_string(),
            row,
            value: ts_raw.to_string(),
        })?
        .with_timezone(&Utc);

    let columns: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
    let values: Vec<FieldValue> = rec.iter().skip(1).map(FieldValue::from_csv_field).collect();

    Ok(ObservationRecord {
        instrument_key: key.to_string(),
        ts,
        data: TabularRecord::new(columns, values),
    })
}
