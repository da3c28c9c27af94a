use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{FetchError, SessionError};
use crate::provider::MarketDataProvider;
use crate::types::{parse_dec, FieldValue, TabularRecord};

/// Market data gateway client. The vendor session lives behind a small HTTP
/// service; this client only speaks its JSON envelope.
pub struct HttpProvider {
    host: String,
    http: reqwest::Client,
}

impl HttpProvider {
    pub fn new(host: String) -> Self {
        Self {
            host,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), path)
    }

    async fn get_record(
        &self,
        url: String,
        query: &[(&str, &str)],
        ticker: &str,
    ) -> Result<Option<TabularRecord>, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            ticker: ticker.to_string(),
            source,
        };

        let body = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .text()
            .await
            .map_err(transport)?;

        let resp: ApiResponse<DataResult> =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode {
                ticker: ticker.to_string(),
                source,
            })?;

        if resp.code != 0 {
            return Err(FetchError::Provider {
                ticker: ticker.to_string(),
                code: resp.code,
                msg: resp.msg,
            });
        }

        Ok(resp.result.map(convert_result).filter(|r| !r.is_empty()))
    }

    async fn post_session(&self, path: &str) -> Result<ApiResponse<IgnoredResult>, reqwest::Error> {
        self.http
            .post(self.url(path))
            .send()
            .await?
            .error_for_status()?
            .json::<ApiResponse<IgnoredResult>>()
            .await
    }
}

#[async_trait]
impl MarketDataProvider for HttpProvider {
    async fn open_session(&self) -> Result<(), SessionError> {
        let resp = self
            .post_session("/session/open")
            .await
            .map_err(SessionError::Open)?;
        if resp.code != 0 {
            return Err(SessionError::Rejected {
                code: resp.code,
                msg: resp.msg,
            });
        }
        tracing::info!(host = %self.host, "provider session opened");
        Ok(())
    }

    async fn close_session(&self) -> Result<(), SessionError> {
        let resp = self
            .post_session("/session/close")
            .await
            .map_err(SessionError::Close)?;
        if resp.code != 0 {
            return Err(SessionError::Rejected {
                code: resp.code,
                msg: resp.msg,
            });
        }
        tracing::info!("provider session closed");
        Ok(())
    }

    async fn fetch_fields(
        &self,
        ticker: &str,
        fields: &[String],
    ) -> Result<Option<TabularRecord>, FetchError> {
        let fields = fields.join(",");
        self.get_record(
            self.url("/data"),
            &[("ticker", ticker), ("fields", fields.as_str())],
            ticker,
        )
        .await
    }

    async fn fetch_surface(&self, ticker: &str) -> Result<Option<TabularRecord>, FetchError> {
        self.get_record(self.url("/surface"), &[("ticker", ticker)], ticker)
            .await
    }
}

/// Gateway envelope for all responses.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    result: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct IgnoredResult {}

/// One tabular record on the wire: columns plus a single row of cells.
#[derive(Debug, Default, Deserialize)]
struct DataResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    row: Vec<WireValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Null,
    Num(f64),
    Text(String),
}

fn convert_result(r: DataResult) -> TabularRecord {
    let values = r.row.into_iter().map(convert_value).collect();
    TabularRecord::new(r.columns, values)
}

fn convert_value(v: WireValue) -> FieldValue {
    match v {
        WireValue::Null => FieldValue::Null,
        WireValue::Num(n) => match Decimal::from_f64(n) {
            Some(d) => FieldValue::Num(d.normalize()),
            None => FieldValue::Text(n.to_string()),
        },
        // Numeric strings ("100.25") normalize to Num; the rest stays text.
        WireValue::Text(s) => match parse_dec(&s) {
            Some(d) => FieldValue::Num(d),
            None => FieldValue::Text(s),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decode_data_response() {
        let body = r#"{
            "code": 0,
            "msg": "",
            "result": {
                "columns": ["BID", "ASK", "RT_YIELD_1"],
                "row": [100.1, "100.2", null]
            }
        }"#;
        let resp: ApiResponse<DataResult> = serde_json::from_str(body).unwrap();
        assert_eq!(resp.code, 0);

        let rec = convert_result(resp.result.unwrap());
        assert_eq!(rec.columns, vec!["BID", "ASK", "RT_YIELD_1"]);
        assert_eq!(rec.value("BID"), Some(&FieldValue::Num(dec!(100.1))));
        assert_eq!(rec.value("ASK"), Some(&FieldValue::Num(dec!(100.2))));
        assert_eq!(rec.value("RT_YIELD_1"), Some(&FieldValue::Null));
    }

    #[test]
    fn decode_no_data_response() {
        let body = r#"{"code": 0, "msg": "", "result": null}"#;
        let resp: ApiResponse<DataResult> = serde_json::from_str(body).unwrap();
        assert!(resp.result.is_none());
    }

    #[test]
    fn decode_missing_result_field() {
        let body = r#"{"code": 0, "msg": ""}"#;
        let resp: ApiResponse<DataResult> = serde_json::from_str(body).unwrap();
        assert!(resp.result.is_none());
    }

    #[test]
    fn decode_provider_error() {
        let body = r#"{"code": 412, "msg": "ticker not permissioned", "result": null}"#;
        let resp: ApiResponse<DataResult> = serde_json::from_str(body).unwrap();
        assert_eq!(resp.code, 412);
        assert_eq!(resp.msg, "ticker not permissioned");
    }

    #[test]
    fn surface_columns_come_from_provider() {
        let body = r#"{
            "code": 0,
            "msg": "",
            "result": {
                "columns": ["95.0", "95.25", "95.5"],
                "row": [12.4, 11.9, 12.1]
            }
        }"#;
        let resp: ApiResponse<DataResult> = serde_json::from_str(body).unwrap();
        let rec = convert_result(resp.result.unwrap());
        assert_eq!(rec.columns.len(), 3);
        assert_eq!(rec.value("95.25"), Some(&FieldValue::Num(dec!(11.9))));
    }
}
