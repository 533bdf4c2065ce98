//! Wire model of indicator/strategy activation responses.
//!
//! The payload is opaque JSON from upstream producers; parsing is lenient at
//! the element level so one malformed entry never blocks its siblings.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{OverlayError, OverlayResult};
use crate::registry::descriptor::SeriesDescriptor;

/// One indicator/strategy activation response.
///
/// `per_series_metadata` describes each sub-series; `per_series_data` holds
/// the matching point arrays keyed the same way, plus any extra named field
/// arrays marker sub-series join over.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiResponse {
    pub per_series_metadata: IndexMap<String, SeriesDescriptor>,
    pub per_series_data: IndexMap<String, Vec<Value>>,
    pub shapes: Option<ShapesPayload>,
}

impl ApiResponse {
    pub fn from_json_str(input: &str) -> OverlayResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| OverlayError::Validation(format!("failed to parse api response: {e}")))
    }

    pub fn from_json_value(input: Value) -> OverlayResult<Self> {
        serde_json::from_value(input)
            .map_err(|e| OverlayError::Validation(format!("failed to parse api response: {e}")))
    }

    #[must_use]
    pub fn data_for(&self, sub_key: &str) -> &[Value] {
        self.per_series_data
            .get(sub_key)
            .map_or(&[], Vec::as_slice)
    }
}

/// Shape arrays carried alongside series data.
///
/// Arrays stay as raw values here; each element is parsed independently at
/// ingestion so a bad `boxes` array never blocks `lines` or `markers`.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapesPayload {
    pub boxes: Vec<Value>,
    pub lines: Vec<Value>,
    pub arrows: Vec<Value>,
    pub markers: Vec<Value>,
}

impl ShapesPayload {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
            && self.lines.is_empty()
            && self.arrows.is_empty()
            && self.markers.is_empty()
    }
}
