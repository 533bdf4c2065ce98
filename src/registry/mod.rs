//! Identifier-keyed registry of chart overlays.
//!
//! The registry owns every overlay the UI knows about: value-series overlays
//! fanned out from indicator/strategy payloads, marker sets produced by
//! marker-kind sub-series, and the annotation shapes/fills ingested alongside
//! them. All mutation happens on the single UI thread; one API response is
//! always applied as one uninterrupted synchronous pass.

pub mod api_response;
pub mod descriptor;
pub mod pipeline;

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{PriceRange, SeriesKind, SeriesUpdate};
use crate::host::{HostSeriesId, PaneContext, PanePrimitive, SeriesHost};
use crate::markers::MarkerAggregator;
use crate::shapes::{FillBetweenConfig, ShapeFrame, ShapeOverlayStore};

pub use api_response::{ApiResponse, ShapesPayload};
pub use descriptor::{MarkerSeriesSpec, SeriesDescriptor};

/// One tracked overlay. Marker-kind overlays live in the aggregator and have
/// no host series handle.
#[derive(Debug, Clone)]
struct OverlayEntry {
    host_id: Option<HostSeriesId>,
    descriptor: SeriesDescriptor,
}

/// Shape payload parked until the host signals readiness.
#[derive(Debug)]
struct DeferredShapes {
    namespace: String,
    payload: ShapesPayload,
}

/// Diagnostic snapshot of the registry contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    pub series: Vec<SeriesSnapshotEntry>,
    pub shape_namespaces: usize,
    pub fill_overlays: usize,
    pub marker_sets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSnapshotEntry {
    pub id: String,
    pub kind: SeriesKind,
    pub attached: bool,
}

pub struct OverlayRegistry {
    host: Rc<RefCell<dyn SeriesHost>>,
    markers: MarkerAggregator,
    shapes: ShapeOverlayStore,
    series: IndexMap<String, OverlayEntry>,
    deferred_shapes: Vec<DeferredShapes>,
}

impl std::fmt::Debug for OverlayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRegistry")
            .field("series_count", &self.series.len())
            .field("shape_namespaces", &self.shapes.namespace_count())
            .finish_non_exhaustive()
    }
}

impl OverlayRegistry {
    #[must_use]
    pub fn new(host: Rc<RefCell<dyn SeriesHost>>, markers: MarkerAggregator) -> Self {
        Self {
            host,
            markers,
            shapes: ShapeOverlayStore::new(),
            series: IndexMap::new(),
            deferred_shapes: Vec::new(),
        }
    }

    // ---- value-series overlays ------------------------------------------

    /// Adds one overlay series from raw upstream points.
    ///
    /// Fails (returning `false`, with no partial state) when the id is
    /// already present, the host surface is unavailable, or the transform
    /// pipeline leaves zero valid points.
    pub fn add_series(&mut self, id: &str, points: &[Value], descriptor: &SeriesDescriptor) -> bool {
        if self.series.contains_key(id) {
            warn!(id, "overlay id already present");
            return false;
        }
        if descriptor.kind == SeriesKind::Marker {
            warn!(id, "marker-kind overlays are created via api responses");
            return false;
        }

        let data = pipeline::transform_points(points, descriptor);
        if data.is_empty() {
            warn!(id, "no valid points after transform pipeline");
            return false;
        }

        let host_id = {
            let mut host = self.host.borrow_mut();
            if !host.is_ready() {
                warn!(id, "host chart surface is not available");
                return false;
            }
            let host_id = match host.create_series(descriptor.kind, &descriptor.style) {
                Ok(host_id) => host_id,
                Err(err) => {
                    warn!(id, error = %err, "host refused series creation");
                    return false;
                }
            };
            if let Err(err) = host.set_series_data(host_id, data) {
                // Tear the partially-created handle down; no orphans.
                warn!(id, error = %err, "host refused series data, tearing down");
                let _ = host.remove_series(host_id);
                return false;
            }
            host_id
        };

        debug!(id, kind = ?descriptor.kind, "added overlay series");
        self.series.insert(
            id.to_owned(),
            OverlayEntry {
                host_id: Some(host_id),
                descriptor: descriptor.clone(),
            },
        );
        true
    }

    /// Re-runs the transform pipeline and replaces the series data.
    /// No-op returning `false` when the id is absent.
    pub fn update_series(&mut self, id: &str, points: &[Value]) -> bool {
        let Some(entry) = self.series.get(id) else {
            warn!(id, "update for absent overlay id");
            return false;
        };
        let Some(host_id) = entry.host_id else {
            warn!(id, "marker-kind overlays are replaced via api responses");
            return false;
        };
        let data = pipeline::transform_points(points, &entry.descriptor);
        if data.is_empty() {
            warn!(id, "no valid points after transform pipeline");
            return false;
        }
        match self.host.borrow_mut().set_series_data(host_id, data) {
            Ok(()) => true,
            Err(err) => {
                warn!(id, error = %err, "host refused series data");
                false
            }
        }
    }

    /// Applies one incremental sample to an overlay's host series.
    pub fn apply_update(&mut self, id: &str, update: SeriesUpdate) -> bool {
        let Some(entry) = self.series.get(id) else {
            return false;
        };
        let Some(host_id) = entry.host_id else {
            return false;
        };
        match self.host.borrow_mut().update_series(host_id, update) {
            Ok(()) => true,
            Err(err) => {
                warn!(id, error = %err, "incremental update rejected");
                false
            }
        }
    }

    /// Removes one overlay. Idempotent; removing an absent id returns
    /// `false`.
    pub fn remove_series(&mut self, id: &str) -> bool {
        let Some(entry) = self.series.shift_remove(id) else {
            return false;
        };
        if let Some(host_id) = entry.host_id {
            if let Err(err) = self.host.borrow_mut().remove_series(host_id) {
                warn!(id, error = %err, "host refused series removal");
            }
        }
        if entry.descriptor.kind == SeriesKind::Marker {
            self.markers.remove_markers(id);
        }
        debug!(id, "removed overlay series");
        true
    }

    /// Removes every overlay whose id starts with `prefix`. Returns the
    /// number removed.
    pub fn remove_series_by_prefix(&mut self, prefix: &str) -> usize {
        let ids: Vec<String> = self
            .series
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        for id in &ids {
            self.remove_series(id);
        }
        ids.len()
    }

    #[must_use]
    pub fn has_series(&self, id: &str) -> bool {
        self.series.contains_key(id)
    }

    #[must_use]
    pub fn all_series_ids(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    // ---- api-response fan-out -------------------------------------------

    /// Ingests one activation response.
    ///
    /// More than one metadata entry fans out to one overlay per sub-key named
    /// `{id}_{sub_key}`; exactly one entry creates a single overlay under
    /// `id`. Marker-kind sub-series are joined and registered as marker sets.
    /// A `shapes` payload is delegated to shape ingestion namespaced by `id`.
    /// The whole response is applied in one synchronous pass.
    pub fn add_from_api_response(&mut self, id: &str, response: &ApiResponse) -> bool {
        if response.per_series_metadata.is_empty() && response.shapes.is_none() {
            warn!(id, "api response carries no series metadata and no shapes");
            return false;
        }

        let fan_out = response.per_series_metadata.len() > 1;
        let mut created = 0_usize;

        for (sub_key, descriptor) in &response.per_series_metadata {
            let overlay_id = if fan_out {
                format!("{id}_{sub_key}")
            } else {
                id.to_owned()
            };

            if descriptor.kind == SeriesKind::Marker {
                if self.add_marker_sub_series(&overlay_id, descriptor, response) {
                    created += 1;
                }
                continue;
            }

            if self.add_series(&overlay_id, response.data_for(sub_key), descriptor) {
                created += 1;
            }
        }

        if let Some(shapes) = &response.shapes {
            let ingested = self.ingest_shapes(id, shapes);
            if ingested > 0 {
                created += 1;
            }
        }

        created > 0
    }

    /// Marker-kind sub-series: exact-time inner join of two named field
    /// arrays, filtered by the configured equality condition. A missing
    /// correlated field yields zero markers, logged, never thrown.
    fn add_marker_sub_series(
        &mut self,
        overlay_id: &str,
        descriptor: &SeriesDescriptor,
        response: &ApiResponse,
    ) -> bool {
        if self.series.contains_key(overlay_id) {
            warn!(overlay_id, "overlay id already present");
            return false;
        }
        let Some(spec) = &descriptor.marker else {
            warn!(overlay_id, "marker-kind sub-series without marker spec");
            return false;
        };
        if !response.per_series_data.contains_key(&spec.value_field)
            || !response.per_series_data.contains_key(&spec.condition_field)
        {
            warn!(
                overlay_id,
                value_field = %spec.value_field,
                condition_field = %spec.condition_field,
                "correlated marker field missing, zero markers"
            );
        }
        let markers = pipeline::join_marker_points(
            response.data_for(&spec.value_field),
            response.data_for(&spec.condition_field),
            spec,
        );
        debug!(overlay_id, count = markers.len(), "joined marker sub-series");
        if let Err(err) = self.markers.set_markers(overlay_id, markers) {
            warn!(overlay_id, error = %err, "marker set registration failed");
            return false;
        }
        self.series.insert(
            overlay_id.to_owned(),
            OverlayEntry {
                host_id: None,
                descriptor: descriptor.clone(),
            },
        );
        true
    }

    // ---- shape ingestion -------------------------------------------------

    /// Ingests every shape array of a payload under one namespace. Each
    /// array and each element fails in isolation.
    pub fn ingest_shapes(&mut self, namespace: &str, payload: &ShapesPayload) -> usize {
        let mut accepted = 0_usize;
        if !payload.boxes.is_empty() {
            accepted += self.shapes.add_boxes(namespace, &payload.boxes);
        }
        if !payload.lines.is_empty() {
            accepted += self.shapes.add_lines(namespace, &payload.lines);
        }
        if !payload.arrows.is_empty() {
            accepted += self.shapes.add_arrows(namespace, &payload.arrows);
        }
        if !payload.markers.is_empty() {
            accepted += self.shapes.add_marker_glyphs(namespace, &payload.markers);
        }
        accepted
    }

    pub fn add_boxes(&mut self, namespace: &str, values: &[Value]) -> usize {
        self.shapes.add_boxes(namespace, values)
    }

    pub fn add_lines(&mut self, namespace: &str, values: &[Value]) -> usize {
        self.shapes.add_lines(namespace, values)
    }

    pub fn add_arrows(&mut self, namespace: &str, values: &[Value]) -> usize {
        self.shapes.add_arrows(namespace, values)
    }

    pub fn add_marker_glyphs(&mut self, namespace: &str, values: &[Value]) -> usize {
        self.shapes.add_marker_glyphs(namespace, values)
    }

    pub fn update_boxes(&mut self, namespace: &str, values: &[Value]) -> usize {
        self.shapes.update_boxes(namespace, values)
    }

    pub fn update_lines(&mut self, namespace: &str, values: &[Value]) -> usize {
        self.shapes.update_lines(namespace, values)
    }

    pub fn update_arrows(&mut self, namespace: &str, values: &[Value]) -> usize {
        self.shapes.update_arrows(namespace, values)
    }

    pub fn update_marker_glyphs(&mut self, namespace: &str, values: &[Value]) -> usize {
        self.shapes.update_marker_glyphs(namespace, values)
    }

    pub fn remove_boxes(&mut self, namespace: &str) -> bool {
        self.shapes.remove_boxes(namespace)
    }

    pub fn remove_lines(&mut self, namespace: &str) -> bool {
        self.shapes.remove_lines(namespace)
    }

    pub fn remove_arrows(&mut self, namespace: &str) -> bool {
        self.shapes.remove_arrows(namespace)
    }

    pub fn remove_marker_glyphs(&mut self, namespace: &str) -> bool {
        self.shapes.remove_marker_glyphs(namespace)
    }

    pub fn remove_shape_namespace(&mut self, namespace: &str) -> bool {
        self.shapes.remove_namespace(namespace)
    }

    pub fn clear_all_shapes(&mut self) {
        self.shapes.clear_all();
        self.cancel_deferred_shapes();
    }

    // ---- fill-between ----------------------------------------------------

    pub fn add_fill_between(&mut self, id: &str, config: FillBetweenConfig) -> bool {
        self.shapes.add_fill_between(id, config)
    }

    pub fn update_fill_between(&mut self, id: &str, config: FillBetweenConfig) -> bool {
        self.shapes.update_fill_between(id, config)
    }

    pub fn remove_fill_between(&mut self, id: &str) -> bool {
        self.shapes.remove_fill_between(id)
    }

    // ---- marker sets -----------------------------------------------------

    pub fn add_shape_markers(
        &mut self,
        name: &str,
        markers: Vec<crate::markers::MarkerSpec>,
    ) -> bool {
        match self.markers.set_markers(name, markers) {
            Ok(()) => true,
            Err(err) => {
                warn!(name, error = %err, "marker set registration failed");
                false
            }
        }
    }

    pub fn remove_shape_markers(&mut self, name: &str) -> bool {
        self.markers.remove_markers(name)
    }

    // ---- deferred attachment --------------------------------------------

    /// Parks a shape payload until the host signals readiness. A deferral is
    /// always cancellable; nothing here sleeps.
    pub fn defer_shapes(&mut self, namespace: &str, payload: ShapesPayload) {
        debug!(namespace, "deferring shape attachment until host is ready");
        self.deferred_shapes.push(DeferredShapes {
            namespace: namespace.to_owned(),
            payload,
        });
    }

    #[must_use]
    pub fn deferred_shape_count(&self) -> usize {
        self.deferred_shapes.len()
    }

    pub fn cancel_deferred_shapes(&mut self) -> usize {
        let cancelled = self.deferred_shapes.len();
        self.deferred_shapes.clear();
        cancelled
    }

    /// Host-ready signal: flushes every parked payload in arrival order.
    pub fn on_host_ready(&mut self) -> usize {
        let parked = std::mem::take(&mut self.deferred_shapes);
        let mut accepted = 0_usize;
        for deferred in parked {
            accepted += self.ingest_shapes(&deferred.namespace, &deferred.payload);
        }
        accepted
    }

    // ---- diagnostics -----------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            series: self
                .series
                .iter()
                .map(|(id, entry)| SeriesSnapshotEntry {
                    id: id.clone(),
                    kind: entry.descriptor.kind,
                    attached: entry.host_id.is_some(),
                })
                .collect(),
            shape_namespaces: self.shapes.namespace_count(),
            fill_overlays: self.shapes.fill_count(),
            marker_sets: self.markers.set_count(),
        }
    }
}

impl PanePrimitive for OverlayRegistry {
    fn update_all_views(&mut self, ctx: &PaneContext<'_>) {
        self.shapes.update_all_views(ctx);
    }

    fn pane_views(&self) -> &ShapeFrame {
        self.shapes.pane_views()
    }

    fn autoscale_info(&self) -> Option<PriceRange> {
        self.shapes.autoscale_info()
    }
}
