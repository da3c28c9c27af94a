use serde::Serialize;
use std::collections::HashMap;

/// Display grouping for an instrument. Matches the dashboard sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstrumentKind {
    Treasury,
    FedFundsFuture,
    FomcMeeting,
    VolSurface,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentSpec {
    pub key: String,
    pub ticker: String,
    /// Requested provider fields, in output column order. Empty for the
    /// volatility surface, which goes through the surface fetch path.
    pub fields: Vec<String>,
    pub kind: InstrumentKind,
}

impl InstrumentSpec {
    fn new(key: &str, ticker: &str, fields: &[&str], kind: InstrumentKind) -> Self {
        Self {
            key: key.to_string(),
            ticker: ticker.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            kind,
        }
    }
}

/// The fetch universe: ordered specs plus an O(1) key index. Built once at
/// startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Universe {
    specs: Vec<InstrumentSpec>,
    index: HashMap<String, usize>,
}

impl Universe {
    pub fn new(specs: Vec<InstrumentSpec>) -> Self {
        let mut index = HashMap::with_capacity(specs.len());
        for (i, s) in specs.iter().enumerate() {
            let prev = index.insert(s.key.clone(), i);
            assert!(prev.is_none(), "duplicate instrument key: {}", s.key);
        }
        Self { specs, index }
    }

    pub fn get(&self, key: &str) -> Option<&InstrumentSpec> {
        self.index.get(key).map(|&i| &self.specs[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstrumentSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The designated volatility-surface entry, if the universe has one.
    pub fn surface(&self) -> Option<&InstrumentSpec> {
        self.specs.iter().find(|s| s.kind == InstrumentKind::VolSurface)
    }

    pub fn of_kind(&self, kind: InstrumentKind) -> impl Iterator<Item = &InstrumentSpec> {
        self.specs.iter().filter(move |s| s.kind == kind)
    }
}

const TREASURY_FIELDS: &[&str] = &["BID", "ASK", "RT_YIELD_1"];
const FUTURE_FIELDS: &[&str] = &["BID", "ASK", "TRDPRC_1", "OPEN_PRC", "CLOSE_PRC"];
const FOMC_FIELDS: &[&str] = &["IMPLD_BPS"];

/// The production universe: treasury spots, fed-fund futures in contract
/// order, FOMC implied rates in meeting order, and the SRAZ24 vol matrix.
pub fn default_universe() -> Universe {
    use InstrumentKind::*;

    let mut specs = vec![
        InstrumentSpec::new("2Y_Spot", "US2YT=RR", TREASURY_FIELDS, Treasury),
        InstrumentSpec::new("5Y_Spot", "US5YT=RR", TREASURY_FIELDS, Treasury),
        InstrumentSpec::new("10Y_Spot", "US10YT=RR", TREASURY_FIELDS, Treasury),
    ];

    for contract in [
        "FFQ24", "FFU24", "FFV24", "FFX24", "FFZ24", "FFF25", "FFG25", "FFH25", "FFM25",
        "FFK25", "FFN25",
    ] {
        specs.push(InstrumentSpec::new(contract, contract, FUTURE_FIELDS, FedFundsFuture));
    }

    // Implied rates in basis points, one proxy ticker per FOMC meeting.
    for (key, ticker) in [
        ("FOMC_Sep24", "USIRP25F1=R"),
        ("FOMC_Nov24", "USIRP25F2=R"),
        ("FOMC_Dec24", "USIRP25F3=R"),
        ("FOMC_Jan25", "USIRP25F4=R"),
        ("FOMC_Mar25", "USIRP25F5=R"),
        ("FOMC_May25", "USIRP25F6=R"),
        ("FOMC_Jun25", "USIRP25F7=R"),
        ("FOMC_Jul25", "USIRP25F8=R"),
        ("FOMC_Sep25", "USIRP25F9=R"),
    ] {
        specs.push(InstrumentSpec::new(key, ticker, FOMC_FIELDS, FomcMeeting));
    }

    specs.push(InstrumentSpec::new("sraz24_volc_matrix", "SRAZ24", &[], VolSurface));

    Universe::new(specs)
}
