//! Namespaced store of annotation shapes and fills.
//!
//! One `ShapeOverlayStore` is attached to the host as a single primitive; it
//! fans repaint work out to the per-kind renderers and merges their batched
//! frames. Namespaces group the shapes that arrived with one indicator or
//! strategy so they can be replaced or removed together.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::core::PriceRange;
use crate::host::{PaneContext, PanePrimitive};
use crate::shapes::box_renderer::BoxRenderer;
use crate::shapes::descriptor::{
    ArrowShape, BoxShape, GlyphShape, LineShape, RawArrow, RawBox, RawLine, RawMarkerGlyph,
};
use crate::shapes::fill_between::{FillBetweenConfig, FillBetweenRenderer};
use crate::shapes::frame::ShapeFrame;
use crate::shapes::glyph_renderer::GlyphRenderer;
use crate::shapes::line_renderer::LineRenderer;
use crate::shapes::arrow_renderer::ArrowRenderer;

#[derive(Debug, Default)]
struct NamespaceShapes {
    lines: LineRenderer,
    boxes: BoxRenderer,
    arrows: ArrowRenderer,
    glyphs: GlyphRenderer,
}

impl NamespaceShapes {
    fn is_empty(&self) -> bool {
        self.lines.is_empty()
            && self.boxes.is_empty()
            && self.arrows.is_empty()
            && self.glyphs.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ShapeOverlayStore {
    namespaces: IndexMap<String, NamespaceShapes>,
    fills: IndexMap<String, FillBetweenRenderer>,
    merged: ShapeFrame,
}

/// Parses each element independently; a malformed entry is logged and
/// skipped without affecting its siblings.
fn parse_each<R: DeserializeOwned>(kind: &str, values: &[serde_json::Value]) -> Vec<R> {
    let mut parsed = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        match serde_json::from_value::<R>(value.clone()) {
            Ok(raw) => parsed.push(raw),
            Err(err) => warn!(kind, index, error = %err, "skipping malformed shape entry"),
        }
    }
    parsed
}

fn normalize_each<R, S>(
    kind: &str,
    raw: Vec<R>,
    normalize: impl Fn(R) -> crate::error::OverlayResult<S>,
) -> Vec<S> {
    let mut shapes = Vec::with_capacity(raw.len());
    for (index, entry) in raw.into_iter().enumerate() {
        match normalize(entry) {
            Ok(shape) => shapes.push(shape),
            Err(err) => warn!(kind, index, error = %err, "skipping unnormalizable shape entry"),
        }
    }
    shapes
}

impl ShapeOverlayStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace_mut(&mut self, namespace: &str) -> &mut NamespaceShapes {
        self.namespaces.entry(namespace.to_owned()).or_default()
    }

    /// Appends boxes parsed from raw payload values. Returns how many were
    /// accepted.
    pub fn add_boxes(&mut self, namespace: &str, values: &[serde_json::Value]) -> usize {
        let shapes = normalize_each("box", parse_each::<RawBox>("box", values), BoxShape::from_raw);
        let accepted = shapes.len();
        let entry = self.namespace_mut(namespace);
        let mut all = entry.boxes.boxes().to_vec();
        all.extend(shapes);
        entry.boxes.set_boxes(all);
        debug!(namespace, accepted, "added boxes");
        accepted
    }

    pub fn add_lines(&mut self, namespace: &str, values: &[serde_json::Value]) -> usize {
        let shapes =
            normalize_each("line", parse_each::<RawLine>("line", values), LineShape::from_raw);
        let accepted = shapes.len();
        let entry = self.namespace_mut(namespace);
        let mut all = entry.lines.lines().to_vec();
        all.extend(shapes);
        entry.lines.set_lines(all);
        debug!(namespace, accepted, "added lines");
        accepted
    }

    pub fn add_arrows(&mut self, namespace: &str, values: &[serde_json::Value]) -> usize {
        let shapes = normalize_each(
            "arrow",
            parse_each::<RawArrow>("arrow", values),
            ArrowShape::from_raw,
        );
        let accepted = shapes.len();
        let entry = self.namespace_mut(namespace);
        let mut all = entry.arrows.arrows().to_vec();
        all.extend(shapes);
        entry.arrows.set_arrows(all);
        debug!(namespace, accepted, "added arrows");
        accepted
    }

    pub fn add_marker_glyphs(&mut self, namespace: &str, values: &[serde_json::Value]) -> usize {
        let shapes = normalize_each(
            "markerGlyph",
            parse_each::<RawMarkerGlyph>("markerGlyph", values),
            GlyphShape::from_raw,
        );
        let accepted = shapes.len();
        let entry = self.namespace_mut(namespace);
        let mut all = entry.glyphs.glyphs().to_vec();
        all.extend(shapes);
        entry.glyphs.set_glyphs(all);
        debug!(namespace, accepted, "added marker glyphs");
        accepted
    }

    /// Replaces the full set of one shape kind in a namespace.
    pub fn update_boxes(&mut self, namespace: &str, values: &[serde_json::Value]) -> usize {
        self.remove_boxes(namespace);
        self.add_boxes(namespace, values)
    }

    pub fn update_lines(&mut self, namespace: &str, values: &[serde_json::Value]) -> usize {
        self.remove_lines(namespace);
        self.add_lines(namespace, values)
    }

    pub fn update_arrows(&mut self, namespace: &str, values: &[serde_json::Value]) -> usize {
        self.remove_arrows(namespace);
        self.add_arrows(namespace, values)
    }

    pub fn update_marker_glyphs(&mut self, namespace: &str, values: &[serde_json::Value]) -> usize {
        self.remove_marker_glyphs(namespace);
        self.add_marker_glyphs(namespace, values)
    }

    pub fn remove_boxes(&mut self, namespace: &str) -> bool {
        let Some(entry) = self.namespaces.get_mut(namespace) else {
            return false;
        };
        let removed = !entry.boxes.is_empty();
        entry.boxes.set_boxes(Vec::new());
        self.prune(namespace);
        removed
    }

    pub fn remove_lines(&mut self, namespace: &str) -> bool {
        let Some(entry) = self.namespaces.get_mut(namespace) else {
            return false;
        };
        let removed = !entry.lines.is_empty();
        entry.lines.set_lines(Vec::new());
        self.prune(namespace);
        removed
    }

    pub fn remove_arrows(&mut self, namespace: &str) -> bool {
        let Some(entry) = self.namespaces.get_mut(namespace) else {
            return false;
        };
        let removed = !entry.arrows.is_empty();
        entry.arrows.set_arrows(Vec::new());
        self.prune(namespace);
        removed
    }

    pub fn remove_marker_glyphs(&mut self, namespace: &str) -> bool {
        let Some(entry) = self.namespaces.get_mut(namespace) else {
            return false;
        };
        let removed = !entry.glyphs.is_empty();
        entry.glyphs.set_glyphs(Vec::new());
        self.prune(namespace);
        removed
    }

    /// Removes every shape in a namespace. Idempotent.
    pub fn remove_namespace(&mut self, namespace: &str) -> bool {
        self.namespaces.shift_remove(namespace).is_some()
    }

    pub fn clear_all(&mut self) {
        self.namespaces.clear();
        self.fills.clear();
        self.merged.clear();
    }

    fn prune(&mut self, namespace: &str) {
        if self
            .namespaces
            .get(namespace)
            .is_some_and(NamespaceShapes::is_empty)
        {
            self.namespaces.shift_remove(namespace);
        }
    }

    pub fn add_fill_between(&mut self, id: &str, config: FillBetweenConfig) -> bool {
        if self.fills.contains_key(id) {
            warn!(id, "fill-between id already present");
            return false;
        }
        self.fills
            .insert(id.to_owned(), FillBetweenRenderer::new(config));
        true
    }

    pub fn update_fill_between(&mut self, id: &str, config: FillBetweenConfig) -> bool {
        match self.fills.get_mut(id) {
            Some(renderer) => {
                renderer.set_config(config);
                true
            }
            None => false,
        }
    }

    pub fn remove_fill_between(&mut self, id: &str) -> bool {
        self.fills.shift_remove(id).is_some()
    }

    #[must_use]
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    #[must_use]
    pub fn fill_count(&self) -> usize {
        self.fills.len()
    }

    #[must_use]
    pub fn shape_count(&self, namespace: &str) -> usize {
        self.namespaces.get(namespace).map_or(0, |entry| {
            entry.lines.lines().len()
                + entry.boxes.boxes().len()
                + entry.arrows.arrows().len()
                + entry.glyphs.glyphs().len()
        })
    }
}

impl PanePrimitive for ShapeOverlayStore {
    fn update_all_views(&mut self, ctx: &PaneContext<'_>) {
        self.merged.clear();
        // Fills go first so strokes and glyphs draw on top of shaded regions.
        for renderer in self.fills.values_mut() {
            renderer.update_all_views(ctx);
            self.merged.extend_from(renderer.pane_views());
        }
        for entry in self.namespaces.values_mut() {
            entry.boxes.update_all_views(ctx);
            self.merged.extend_from(entry.boxes.pane_views());
            entry.lines.update_all_views(ctx);
            self.merged.extend_from(entry.lines.pane_views());
            entry.arrows.update_all_views(ctx);
            self.merged.extend_from(entry.arrows.pane_views());
            entry.glyphs.update_all_views(ctx);
            self.merged.extend_from(entry.glyphs.pane_views());
        }
    }

    fn pane_views(&self) -> &ShapeFrame {
        &self.merged
    }

    fn autoscale_info(&self) -> Option<PriceRange> {
        let mut span = None;
        for entry in self.namespaces.values() {
            span = PriceRange::union_opt(span, entry.lines.autoscale_info());
            span = PriceRange::union_opt(span, entry.boxes.autoscale_info());
            span = PriceRange::union_opt(span, entry.arrows.autoscale_info());
            span = PriceRange::union_opt(span, entry.glyphs.autoscale_info());
        }
        for renderer in self.fills.values() {
            span = PriceRange::union_opt(span, renderer.autoscale_info());
        }
        span
    }
}
