//! Shared transform pipeline from raw upstream points to canonical series
//! data.
//!
//! Every ingest path runs the same steps: time-key extraction and
//! normalization, value extraction by series kind, dropping of unusable
//! points, de-duplication by time (last write wins), and ascending sort.

use serde_json::Value;
use tracing::warn;

use crate::core::{OhlcPoint, OverlayData, SeriesKind, SeriesPoint, TimeInput, normalize_time};
use crate::markers::MarkerSpec;
use crate::registry::descriptor::{MarkerSeriesSpec, SeriesDescriptor};

const HISTOGRAM_UP_FALLBACK: &str = "#26a69a";
const HISTOGRAM_DOWN_FALLBACK: &str = "#ef5350";

fn extract_time(point: &Value) -> Option<i64> {
    let raw = point.get("time")?;
    let input: TimeInput = serde_json::from_value(raw.clone()).ok()?;
    normalize_time(&input).ok()
}

/// Numeric field that may arrive as a JSON number or a quoted string.
fn extract_numeric(point: &Value, field: &str) -> Option<f64> {
    match point.get(field)? {
        Value::Number(number) => number.as_f64().filter(|v| v.is_finite()),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn extract_color(point: &Value) -> Option<String> {
    point
        .get("color")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Sorts ascending and de-duplicates by time, keeping the last write.
fn canonicalize_by_time<P>(mut points: Vec<P>, time_of: impl Fn(&P) -> i64) -> (Vec<P>, usize) {
    points.sort_by_key(|p| time_of(p));
    let mut deduped: Vec<P> = Vec::with_capacity(points.len());
    let mut duplicates = 0_usize;
    for point in points {
        if let Some(last) = deduped.last_mut() {
            if time_of(&point) == time_of(last) {
                *last = point;
                duplicates += 1;
                continue;
            }
        }
        deduped.push(point);
    }
    (deduped, duplicates)
}

fn transform_scalar(values: &[Value], descriptor: &SeriesDescriptor) -> Vec<SeriesPoint> {
    let is_histogram = descriptor.kind == SeriesKind::Histogram;
    let mut extracted = Vec::with_capacity(values.len());
    for point in values {
        let Some(time) = extract_time(point) else {
            continue;
        };
        let Some(value) = extract_numeric(point, "value") else {
            continue;
        };
        // Upstream emits exact zero as a "no data" sentinel for scalar
        // series; such points are dropped rather than plotted.
        if value == 0.0 {
            continue;
        }
        let color = if is_histogram {
            Some(extract_color(point).unwrap_or_else(|| {
                let fallback = if value >= 0.0 {
                    descriptor.style.up_color.as_deref().unwrap_or(HISTOGRAM_UP_FALLBACK)
                } else {
                    descriptor
                        .style
                        .down_color
                        .as_deref()
                        .unwrap_or(HISTOGRAM_DOWN_FALLBACK)
                };
                fallback.to_owned()
            }))
        } else {
            None
        };
        extracted.push(SeriesPoint {
            time,
            value,
            color,
        });
    }

    let original = values.len();
    let (canonical, duplicates) = canonicalize_by_time(extracted, |p| p.time);
    log_drops("scalar", original, canonical.len(), duplicates);
    canonical
}

fn transform_ohlc(values: &[Value]) -> Vec<OhlcPoint> {
    let mut extracted = Vec::with_capacity(values.len());
    for point in values {
        let Some(time) = extract_time(point) else {
            continue;
        };
        let (Some(open), Some(high), Some(low), Some(close)) = (
            extract_numeric(point, "open"),
            extract_numeric(point, "high"),
            extract_numeric(point, "low"),
            extract_numeric(point, "close"),
        ) else {
            continue;
        };
        match OhlcPoint::new(time, open, high, low, close) {
            Ok(bar) => extracted.push(bar),
            Err(err) => warn!(time, error = %err, "dropping inconsistent ohlc point"),
        }
    }

    let original = values.len();
    let (canonical, duplicates) = canonicalize_by_time(extracted, |p| p.time);
    log_drops("ohlc", original, canonical.len(), duplicates);
    canonical
}

fn log_drops(kind: &str, original: usize, canonical: usize, duplicates: usize) {
    let filtered = original.saturating_sub(canonical + duplicates);
    if filtered > 0 || duplicates > 0 {
        warn!(
            kind,
            filtered,
            duplicates,
            canonical,
            "canonicalized points on ingest"
        );
    }
}

/// Runs the shared pipeline for a series of the descriptor's kind.
#[must_use]
pub fn transform_points(values: &[Value], descriptor: &SeriesDescriptor) -> OverlayData {
    match descriptor.kind {
        SeriesKind::Candlestick | SeriesKind::Bar => OverlayData::Ohlc(transform_ohlc(values)),
        _ => OverlayData::Scalar(transform_scalar(values, descriptor)),
    }
}

/// Exact-time inner join of a price field and a condition field.
///
/// A point missing either field is dropped. Survivors where the condition
/// equals the configured value become markers priced from the value field.
#[must_use]
pub fn join_marker_points(
    value_points: &[Value],
    condition_points: &[Value],
    spec: &MarkerSeriesSpec,
) -> Vec<MarkerSpec> {
    let mut conditions = std::collections::HashMap::with_capacity(condition_points.len());
    for point in condition_points {
        let (Some(time), Some(value)) = (extract_time(point), extract_numeric(point, "value"))
        else {
            continue;
        };
        conditions.insert(time, value);
    }

    let mut joined = Vec::new();
    for point in value_points {
        let (Some(time), Some(price)) = (extract_time(point), extract_numeric(point, "value"))
        else {
            continue;
        };
        // Exact timestamp equality; time-offset upstream arrays produce no
        // marker here.
        let Some(&condition) = conditions.get(&time) else {
            continue;
        };
        if condition != spec.condition_value {
            continue;
        }
        joined.push(MarkerSpec {
            time,
            price: Some(price),
            shape: spec.shape,
            position: spec.position,
            color: spec.color.clone(),
            text: spec.text.clone(),
        });
    }

    let (canonical, _) = canonicalize_by_time(joined, |m| m.time);
    canonical
}
