//! Per-series metadata as delivered by indicator/strategy activation
//! responses.

use serde::{Deserialize, Serialize};

use crate::core::{SeriesKind, SeriesStyle};
use crate::markers::{MarkerPositionVocab, MarkerShapeVocab};

/// Metadata of one (sub-)series in an API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDescriptor {
    pub kind: SeriesKind,
    #[serde(default)]
    pub style: SeriesStyle,
    /// Required when `kind` is `Marker`; ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerSeriesSpec>,
}

impl SeriesDescriptor {
    #[must_use]
    pub fn new(kind: SeriesKind) -> Self {
        Self {
            kind,
            style: SeriesStyle::default(),
            marker: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: SeriesStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: MarkerSeriesSpec) -> Self {
        self.marker = Some(marker);
        self
    }
}

/// Configuration of a marker-kind sub-series: which named field arrays to
/// join, the equality condition filtering survivors, and the glyph style the
/// survivors get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSeriesSpec {
    /// Field array carrying the marker price.
    pub value_field: String,
    /// Field array carrying the condition value.
    pub condition_field: String,
    pub condition_value: f64,
    #[serde(default)]
    pub shape: MarkerShapeVocab,
    #[serde(default)]
    pub position: MarkerPositionVocab,
    #[serde(default = "default_marker_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn default_marker_color() -> String {
    "#e91e63".to_owned()
}
