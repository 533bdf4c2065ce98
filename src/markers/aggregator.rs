//! Marker aggregation.
//!
//! The host supports exactly one marker collection per base series, so every
//! feature that wants markers registers a named set here; the aggregator
//! keeps the union time-sorted and pushes it to the injected sink as one call
//! per change.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OverlayResult;
use crate::host::{HostMarker, HostMarkerPosition, HostMarkerShape, MarkerSink};

/// Shape vocabulary accepted from upstream feature configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShapeVocab {
    #[default]
    Circle,
    Square,
    Triangle,
}

/// Position vocabulary accepted from upstream feature configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPositionVocab {
    #[default]
    Above,
    Below,
    InBar,
}

/// One marker before translation into the host's native vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub time: i64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub shape: MarkerShapeVocab,
    #[serde(default)]
    pub position: MarkerPositionVocab,
    pub color: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Maps the descriptive vocabulary into host enums. A triangle becomes the
/// directional arrow matching its anchoring side.
fn to_host_marker(spec: &MarkerSpec) -> HostMarker {
    let position = match spec.position {
        MarkerPositionVocab::Above => HostMarkerPosition::AboveBar,
        MarkerPositionVocab::Below => HostMarkerPosition::BelowBar,
        MarkerPositionVocab::InBar => HostMarkerPosition::InBar,
    };
    let shape = match (spec.shape, spec.position) {
        (MarkerShapeVocab::Circle, _) => HostMarkerShape::Circle,
        (MarkerShapeVocab::Square, _) => HostMarkerShape::Square,
        (MarkerShapeVocab::Triangle, MarkerPositionVocab::Above) => HostMarkerShape::ArrowDown,
        (MarkerShapeVocab::Triangle, _) => HostMarkerShape::ArrowUp,
    };
    HostMarker {
        time: spec.time,
        position,
        shape,
        color: spec.color.clone(),
        text: spec.text.clone(),
        price: spec.price,
    }
}

pub struct MarkerAggregator {
    sink: Rc<RefCell<dyn MarkerSink>>,
    sets: IndexMap<String, Vec<HostMarker>>,
}

impl std::fmt::Debug for MarkerAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerAggregator")
            .field("set_count", &self.sets.len())
            .finish_non_exhaustive()
    }
}

impl MarkerAggregator {
    /// The sink is an explicit construction-time dependency; the aggregator
    /// never reaches for a globally retrievable hook.
    #[must_use]
    pub fn new(sink: Rc<RefCell<dyn MarkerSink>>) -> Self {
        Self {
            sink,
            sets: IndexMap::new(),
        }
    }

    /// Registers or replaces a named marker set and pushes the new union.
    pub fn set_markers(&mut self, name: &str, markers: Vec<MarkerSpec>) -> OverlayResult<()> {
        let mut normalized: Vec<HostMarker> = markers.iter().map(to_host_marker).collect();
        normalized.sort_by_key(|m| m.time);
        debug!(name, count = normalized.len(), "registered marker set");
        self.sets.insert(name.to_owned(), normalized);
        self.flush()
    }

    /// Removes a named set. Removing a never-registered name is a no-op.
    pub fn remove_markers(&mut self, name: &str) -> bool {
        if self.sets.shift_remove(name).is_none() {
            return false;
        }
        if let Err(err) = self.flush() {
            warn!(name, error = %err, "marker push failed after removal");
        }
        true
    }

    /// Removes every set whose name starts with `prefix`.
    pub fn remove_markers_by_prefix(&mut self, prefix: &str) -> usize {
        let before = self.sets.len();
        self.sets.retain(|name, _| !name.starts_with(prefix));
        let removed = before - self.sets.len();
        if removed > 0 {
            if let Err(err) = self.flush() {
                warn!(prefix, error = %err, "marker push failed after prefix removal");
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        if self.sets.is_empty() {
            return;
        }
        self.sets.clear();
        if let Err(err) = self.flush() {
            warn!(error = %err, "marker push failed after clear");
        }
    }

    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn has_set(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Recomputes the time-sorted union of all live sets and pushes it as one
    /// call to the host marker facility.
    fn flush(&mut self) -> OverlayResult<()> {
        let mut union: Vec<HostMarker> = self.sets.values().flatten().cloned().collect();
        union.sort_by_key(|m| m.time);
        self.sink.borrow_mut().set_markers(&union)
    }
}
