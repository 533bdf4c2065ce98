use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::core::time::datetime_to_unix_seconds;
use crate::error::{OverlayError, OverlayResult};

/// Host series kinds an overlay can be rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Line,
    Area,
    Bar,
    Baseline,
    Histogram,
    Candlestick,
    Marker,
}

impl SeriesKind {
    /// Kinds backed by one scalar value per time step.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Candlestick | Self::Bar | Self::Marker)
    }
}

/// One scalar sample of a value series, time in normalized Unix seconds.
///
/// `color` carries an optional per-point override (histogram bars).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: i64,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SeriesPoint {
    #[must_use]
    pub fn new(time: i64, value: f64) -> Self {
        Self {
            time,
            value,
            color: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Converts strongly-typed temporal/decimal input into a sample.
    pub fn from_decimal_time(time: DateTime<Utc>, value: Decimal) -> OverlayResult<Self> {
        Ok(Self::new(
            datetime_to_unix_seconds(time),
            decimal_to_f64(value, "value")?,
        ))
    }
}

/// One OHLC sample, time in normalized Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl OhlcPoint {
    /// Builds a validated OHLC sample from raw floating values.
    ///
    /// Invariants:
    /// - all values are finite
    /// - `low <= high`
    /// - `open` and `close` are within `[low, high]`
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> OverlayResult<Self> {
        if !open.is_finite() || !high.is_finite() || !low.is_finite() || !close.is_finite() {
            return Err(OverlayError::Validation(
                "ohlc values must be finite".to_owned(),
            ));
        }
        if low > high {
            return Err(OverlayError::Validation(
                "ohlc low must be <= high".to_owned(),
            ));
        }
        if open < low || open > high || close < low || close > high {
            return Err(OverlayError::Validation(
                "ohlc open/close must be within low/high range".to_owned(),
            ));
        }
        Ok(Self {
            time,
            open,
            high,
            low,
            close,
        })
    }

    /// Converts strongly-typed temporal/decimal input into a validated sample.
    pub fn from_decimal_time(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> OverlayResult<Self> {
        Self::new(
            datetime_to_unix_seconds(time),
            decimal_to_f64(open, "open")?,
            decimal_to_f64(high, "high")?,
            decimal_to_f64(low, "low")?,
            decimal_to_f64(close, "close")?,
        )
    }

    #[must_use]
    pub fn is_bullish(self) -> bool {
        self.close >= self.open
    }
}

/// Canonical data payload of one overlay series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverlayData {
    Scalar(Vec<SeriesPoint>),
    Ohlc(Vec<OhlcPoint>),
}

impl OverlayData {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(points) => points.len(),
            Self::Ohlc(points) => points.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn last_time(&self) -> Option<i64> {
        match self {
            Self::Scalar(points) => points.last().map(|p| p.time),
            Self::Ohlc(points) => points.last().map(|p| p.time),
        }
    }
}

/// Single-sample incremental update applied with realtime semantics:
/// append when newer than the latest sample, replace in place when equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesUpdate {
    Scalar(SeriesPoint),
    Ohlc(OhlcPoint),
}

impl SeriesUpdate {
    #[must_use]
    pub fn time(&self) -> i64 {
        match self {
            Self::Scalar(point) => point.time,
            Self::Ohlc(point) => point.time,
        }
    }
}

/// Inclusive price interval, used for autoscale reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn union_opt(lhs: Option<Self>, rhs: Option<Self>) -> Option<Self> {
        match (lhs, rhs) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }
}

/// Presentation options forwarded to the host when a series is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesStyle {
    pub color: Option<String>,
    pub line_width: Option<f64>,
    pub up_color: Option<String>,
    pub down_color: Option<String>,
    pub base_value: Option<f64>,
    pub price_line_visible: Option<bool>,
}

pub(crate) fn decimal_to_f64(value: Decimal, field_name: &str) -> OverlayResult<f64> {
    value.to_f64().ok_or_else(|| {
        OverlayError::Validation(format!("{field_name} cannot be represented as f64"))
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn ohlc_rejects_values_outside_the_low_high_range() {
        assert!(OhlcPoint::new(1, 5.0, 6.0, 4.0, 5.5).is_ok());
        assert!(OhlcPoint::new(1, 7.0, 6.0, 4.0, 5.5).is_err());
        assert!(OhlcPoint::new(1, 5.0, 4.0, 6.0, 5.5).is_err());
        assert!(OhlcPoint::new(1, f64::NAN, 6.0, 4.0, 5.5).is_err());
    }

    #[test]
    fn bullishness_includes_the_doji_case() {
        let bar = OhlcPoint::new(1, 5.0, 6.0, 4.0, 5.0).expect("valid bar");
        assert!(bar.is_bullish());
        let down = OhlcPoint::new(1, 5.0, 6.0, 4.0, 4.5).expect("valid bar");
        assert!(!down.is_bullish());
    }

    #[test]
    fn decimal_constructors_normalize_time_and_value() {
        let at = chrono::Utc
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .expect("valid timestamp");
        let point = SeriesPoint::from_decimal_time(at, Decimal::new(12345, 2))
            .expect("representable value");
        assert_eq!(point.time, 1_700_000_000);
        assert_eq!(point.value, 123.45);

        let bar = OhlcPoint::from_decimal_time(
            at,
            Decimal::new(100, 0),
            Decimal::new(110, 0),
            Decimal::new(90, 0),
            Decimal::new(105, 0),
        )
        .expect("valid bar");
        assert_eq!(bar.close, 105.0);
    }

    #[test]
    fn per_point_color_override_is_preserved() {
        let point = SeriesPoint::new(1, 2.0).with_color("#26a69a");
        assert_eq!(point.color.as_deref(), Some("#26a69a"));
    }
}
