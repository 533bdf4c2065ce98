//! Domain-space shape descriptors.
//!
//! Raw variants mirror the upstream JSON payloads with unnormalized times;
//! normalized variants carry integer Unix seconds and are what the renderers
//! consume. Pixel coordinates are always derived fresh from descriptors,
//! never cached as source of truth.

use serde::{Deserialize, Serialize};

use crate::core::{TimeInput, normalize_time};
use crate::error::{OverlayError, OverlayResult};

/// Stroke/fill appearance of a shape, as supplied upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeStyle {
    pub color: String,
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            color: "#2962ff".to_owned(),
            width: 1.0,
            dash: None,
            fill_color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    Up,
    Down,
}

/// Glyph vocabulary accepted from upstream payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GlyphShapeVocab {
    #[default]
    Circle,
    Square,
    Triangle,
}

// Raw payload structs: times may be ISO strings, date-like values, or Unix
// seconds/milliseconds.

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBox {
    pub time1: TimeInput,
    pub time2: TimeInput,
    pub price1: f64,
    pub price2: f64,
    #[serde(default)]
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLine {
    pub time1: TimeInput,
    pub time2: TimeInput,
    pub price1: f64,
    pub price2: f64,
    #[serde(default)]
    pub style: ShapeStyle,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArrow {
    pub time: TimeInput,
    pub price: f64,
    pub direction: ArrowDirection,
    #[serde(default)]
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarkerGlyph {
    pub time: TimeInput,
    pub price: f64,
    #[serde(default)]
    pub shape: GlyphShapeVocab,
    #[serde(default)]
    pub style: ShapeStyle,
    #[serde(default)]
    pub text: Option<String>,
}

// Normalized descriptors: times as integer Unix seconds.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxShape {
    pub time1: i64,
    pub time2: i64,
    pub price1: f64,
    pub price2: f64,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineShape {
    pub time1: i64,
    pub time2: i64,
    pub price1: f64,
    pub price2: f64,
    pub style: ShapeStyle,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrowShape {
    pub time: i64,
    pub price: f64,
    pub direction: ArrowDirection,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphShape {
    pub time: i64,
    pub price: f64,
    pub shape: GlyphShapeVocab,
    pub style: ShapeStyle,
    pub text: Option<String>,
}

fn validated_price(value: f64, field: &str) -> OverlayResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OverlayError::Validation(format!("{field} must be finite")))
    }
}

impl BoxShape {
    pub fn from_raw(raw: RawBox) -> OverlayResult<Self> {
        Ok(Self {
            time1: normalize_time(&raw.time1)?,
            time2: normalize_time(&raw.time2)?,
            price1: validated_price(raw.price1, "box price1")?,
            price2: validated_price(raw.price2, "box price2")?,
            style: raw.style,
        })
    }
}

impl LineShape {
    pub fn from_raw(raw: RawLine) -> OverlayResult<Self> {
        Ok(Self {
            time1: normalize_time(&raw.time1)?,
            time2: normalize_time(&raw.time2)?,
            price1: validated_price(raw.price1, "line price1")?,
            price2: validated_price(raw.price2, "line price2")?,
            style: raw.style,
            label: raw.label,
        })
    }
}

impl ArrowShape {
    pub fn from_raw(raw: RawArrow) -> OverlayResult<Self> {
        Ok(Self {
            time: normalize_time(&raw.time)?,
            price: validated_price(raw.price, "arrow price")?,
            direction: raw.direction,
            style: raw.style,
        })
    }
}

impl GlyphShape {
    pub fn from_raw(raw: RawMarkerGlyph) -> OverlayResult<Self> {
        Ok(Self {
            time: normalize_time(&raw.time)?,
            price: validated_price(raw.price, "glyph price")?,
            shape: raw.shape,
            style: raw.style,
            text: raw.text,
        })
    }
}
