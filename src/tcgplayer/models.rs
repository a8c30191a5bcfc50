//! Data models for TCGplayer price history responses.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Date format used by the pricing API and by chart tick labels.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised when a price bucket is present but malformed.
///
/// A malformed bucket fails the whole fetch for that product instead of
/// silently dropping the point - a partial series would mislead the chart's
/// date axis.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("bucket is missing the '{0}' field")]
    MissingField(&'static str),

    #[error("could not parse market price from {0:?}")]
    InvalidPrice(String),

    #[error("could not parse bucket date {value:?}: {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },
}

/// One price sample: a calendar date and the market price on that date.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Ordered price history for a single product.
///
/// Points keep the bucket order returned by the API; they are not re-sorted.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    pub product_id: String,
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Creates an empty history for a product (the soft-failure result).
    pub fn empty(product_id: impl Into<String>) -> Self {
        Self { product_id: product_id.into(), points: Vec::new() }
    }

    /// Returns true if there is nothing to chart.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns number of price points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns the (earliest, latest) dates across all points.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.points.iter().map(|p| p.date).min()?;
        let max = self.points.iter().map(|p| p.date).max()?;
        Some((min, max))
    }

    /// Returns the (lowest, highest) prices across all points.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.points.iter().map(|p| p.price);
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some((min, max))
    }
}

/// Raw response shape of `GET /price/history/<id>/detailed`.
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    result: Vec<HistoryResult>,
}

#[derive(Debug, Deserialize)]
struct HistoryResult {
    #[serde(default)]
    buckets: Vec<RawBucket>,
}

/// One time-windowed price sample as returned by the API.
///
/// Fields stay loose here (the API serves `marketPrice` as either a JSON
/// number or a numeric string); conversion to [`PricePoint`] enforces the
/// strict contract.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBucket {
    market_price: Option<Value>,
    bucket_start_date: Option<String>,
}

impl RawBucket {
    fn into_point(self) -> Result<PricePoint, PriceError> {
        let price = match self.market_price {
            Some(Value::Number(n)) => {
                n.as_f64().ok_or_else(|| PriceError::InvalidPrice(n.to_string()))?
            }
            Some(Value::String(s)) => {
                s.trim().parse::<f64>().map_err(|_| PriceError::InvalidPrice(s))?
            }
            Some(other) => return Err(PriceError::InvalidPrice(other.to_string())),
            None => return Err(PriceError::MissingField("marketPrice")),
        };

        let raw_date = self.bucket_start_date.ok_or(PriceError::MissingField("bucketStartDate"))?;
        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
            .map_err(|source| PriceError::InvalidDate { value: raw_date, source })?;

        Ok(PricePoint { date, price })
    }
}

/// Parses a price history API body into an ordered series.
///
/// An absent or unrecognizable nested structure is a soft failure (logged,
/// empty history); a present-but-malformed bucket is a hard [`PriceError`].
pub fn parse_price_history(product_id: &str, body: &str) -> Result<PriceHistory, PriceError> {
    let response: HistoryResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            warn!("Unexpected response structure for product {}: {}", product_id, e);
            return Ok(PriceHistory::empty(product_id));
        }
    };

    let Some(result) = response.result.into_iter().next() else {
        warn!("No price data available for product {}", product_id);
        return Ok(PriceHistory::empty(product_id));
    };

    let points = result
        .buckets
        .into_iter()
        .map(RawBucket::into_point)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PriceHistory { product_id: product_id.to_string(), points })
}
