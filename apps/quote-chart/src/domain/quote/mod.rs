//! Quote Records
//!
//! Top-of-book quote snapshots as produced by the upstream quote server.
//! These are read-only inputs to the chart; the component never mutates them.
//!
//! # Wire Format (JSON)
//!
//! ```json
//! {
//!   "stock": "ABC",
//!   "top_ask": {"price": 121.2, "size": 36},
//!   "top_bid": {"price": 120.48, "size": 109},
//!   "timestamp": "2019-02-11 22:06:30.572453"
//! }
//! ```
//!
//! Either side of the book may be `null` or missing entirely. A side without
//! a numeric `price` (`{}`, `{"price": null}`, `[]`, ...) is treated as absent
//! so that one odd quote never costs the rest of its batch.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Naive timestamp layout emitted by the upstream server (interpreted as UTC).
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Best price and size on one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price at the top of the book.
    pub price: f64,
    /// Size available at that price.
    #[serde(default)]
    pub size: u64,
}

impl PriceLevel {
    /// Create a new price level.
    #[must_use]
    pub const fn new(price: f64, size: u64) -> Self {
        Self { price, size }
    }
}

/// One stock's best ask/bid snapshot at a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Stock identifier.
    pub stock: String,

    /// Best ask, if the book has one.
    #[serde(default, deserialize_with = "deserialize_side")]
    pub top_ask: Option<PriceLevel>,

    /// Best bid, if the book has one.
    #[serde(default, deserialize_with = "deserialize_side")]
    pub top_bid: Option<PriceLevel>,

    /// Time of the snapshot.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl QuoteRecord {
    /// Create a quote with both sides absent.
    #[must_use]
    pub fn new(stock: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            stock: stock.into(),
            top_ask: None,
            top_bid: None,
            timestamp,
        }
    }

    /// Set the best ask.
    #[must_use]
    pub const fn with_ask(mut self, price: f64, size: u64) -> Self {
        self.top_ask = Some(PriceLevel::new(price, size));
        self
    }

    /// Set the best bid.
    #[must_use]
    pub const fn with_bid(mut self, price: f64, size: u64) -> Self {
        self.top_bid = Some(PriceLevel::new(price, size));
        self
    }
}

/// Parse a timestamp in either RFC 3339 or the server's naive layout.
///
/// # Errors
///
/// Returns the naive-layout parse error when neither form matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Accept any JSON value for a book side; only a numeric `price` makes it present.
fn deserialize_side<'de, D>(deserializer: D) -> Result<Option<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw
        .get("price")
        .and_then(serde_json::Value::as_f64)
        .map(|price| {
            let size = raw
                .get("size")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or_default();
            PriceLevel::new(price, size)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test]
    fn deserialize_full_quote() {
        let json = r#"{
            "stock": "ABC",
            "top_ask": {"price": 121.2, "size": 36},
            "top_bid": {"price": 120.48, "size": 109},
            "timestamp": "2019-02-11 22:06:30.572453"
        }"#;

        let quote: QuoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(quote.stock, "ABC");
        assert_eq!(quote.top_ask, Some(PriceLevel::new(121.2, 36)));
        assert_eq!(quote.top_bid, Some(PriceLevel::new(120.48, 109)));
        assert_eq!(
            quote.timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            "2019-02-11 22:06:30.572453"
        );
    }

    #[test]
    fn deserialize_missing_sides() {
        let json = r#"{"stock": "DEF", "top_ask": null, "timestamp": "2023-01-01T00:00:00Z"}"#;

        let quote: QuoteRecord = serde_json::from_str(json).unwrap();
        assert!(quote.top_ask.is_none());
        assert!(quote.top_bid.is_none());
        assert_eq!(
            quote.timestamp,
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn deserialize_rejects_garbage_timestamp() {
        let json = r#"{"stock": "ABC", "timestamp": "yesterday"}"#;
        assert!(serde_json::from_str::<QuoteRecord>(json).is_err());
    }

    #[test]
    fn parse_timestamp_with_offset() {
        let ts = parse_timestamp("2023-01-01T02:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn builder_sets_sides() {
        let ts = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let quote = QuoteRecord::new("AAPL", ts).with_ask(150.5, 100);
        assert_eq!(quote.top_ask, Some(PriceLevel::new(150.5, 100)));
        assert!(quote.top_bid.is_none());
    }

    #[test_case(r#"{}"# ; "empty object")]
    #[test_case(r#"{"size": 5}"# ; "size without price")]
    #[test_case(r#"{"price": null, "size": 5}"# ; "null price")]
    #[test_case(r#"{"price": "121.2"}"# ; "string price")]
    #[test_case(r#"[]"# ; "empty array")]
    #[test_case(r#"121.2"# ; "bare number")]
    #[test_case(r#""n/a""# ; "bare string")]
    fn unusable_side_reads_as_absent(side: &str) {
        let json = format!(
            r#"{{"stock": "ABC", "top_ask": {side}, "top_bid": {side}, "timestamp": "2023-01-01T00:00:00Z"}}"#
        );

        let quote: QuoteRecord = serde_json::from_str(&json).unwrap();
        assert!(quote.top_ask.is_none());
        assert!(quote.top_bid.is_none());
    }

    #[test]
    fn side_with_odd_size_keeps_price() {
        let json = r#"{"stock": "ABC", "top_ask": {"price": 121.2, "size": "many"}, "timestamp": "2023-01-01T00:00:00Z"}"#;

        let quote: QuoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(quote.top_ask, Some(PriceLevel::new(121.2, 0)));
    }
}
