//! Backend-agnostic draw commands produced by the shape renderers.
//!
//! Geometry is expressed in bitmap (device pixel) coordinates, already snapped
//! by the helpers in [`crate::core::geometry`]. Strokes are pre-grouped by
//! style so a backend issues exactly one path per distinct style.

use ordered_float::OrderedFloat;
use smallvec::SmallVec;

use crate::error::{OverlayError, OverlayResult};

/// Stroke appearance. Doubles as the batching key: the per-frame canvas state
/// change count is bounded by the number of distinct `StrokeStyle` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrokeStyle {
    pub color: String,
    pub width: OrderedFloat<f64>,
    pub dash: SmallVec<[OrderedFloat<f64>; 4]>,
}

impl StrokeStyle {
    #[must_use]
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width: OrderedFloat(width),
            dash: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_dash(mut self, dash: &[f64]) -> Self {
        self.dash = dash.iter().copied().map(OrderedFloat).collect();
        self
    }
}

/// One line segment in bitmap coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    pub fn validate(self) -> OverlayResult<()> {
        if !self.x1.is_finite() || !self.y1.is_finite() || !self.x2.is_finite() || !self.y2.is_finite()
        {
            return Err(OverlayError::Validation(
                "segment coordinates must be finite".to_owned(),
            ));
        }
        Ok(())
    }
}

/// All segments sharing one stroke style; drawn as a single path.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeBatch {
    pub style: StrokeStyle,
    pub segments: Vec<Segment>,
}

/// Polygon vertex in bitmap coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

/// Fill paint for one batch of polygons.
#[derive(Debug, Clone, PartialEq)]
pub enum FillPaint {
    Solid(String),
    /// Vertical linear gradient spanning the pixel bounds of each polygon.
    VerticalGradient { top: String, bottom: String },
}

/// Polygons sharing one paint; drawn as a single fill pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FillBatch {
    pub paint: FillPaint,
    pub polygons: Vec<Vec<Vertex>>,
}

/// Marker glyph vocabulary understood by backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Circle,
    Square,
    TriangleUp,
    TriangleDown,
    ArrowUp,
    ArrowDown,
}

/// One positioned glyph in bitmap coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphCommand {
    pub kind: GlyphKind,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
}

/// Horizontal text alignment relative to `TextCommand::x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextHAlign {
    Left,
    Center,
    Right,
}

/// One label in bitmap coordinates. Labels are drawn in one batched pass
/// after all strokes and fills.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub h_align: TextHAlign,
}

/// Batched scene for one repaint of one shape layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeFrame {
    pub strokes: Vec<StrokeBatch>,
    pub fills: Vec<FillBatch>,
    pub glyphs: Vec<GlyphCommand>,
    pub texts: Vec<TextCommand>,
}

impl ShapeFrame {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.fills.clear();
        self.glyphs.clear();
        self.texts.clear();
    }

    /// Appends another frame's batches, preserving draw order.
    pub fn extend_from(&mut self, other: &Self) {
        self.strokes.extend(other.strokes.iter().cloned());
        self.fills.extend(other.fills.iter().cloned());
        self.glyphs.extend(other.glyphs.iter().cloned());
        self.texts.extend(other.texts.iter().cloned());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
            && self.fills.is_empty()
            && self.glyphs.is_empty()
            && self.texts.is_empty()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.strokes.iter().map(|batch| batch.segments.len()).sum()
    }

    pub fn validate(&self) -> OverlayResult<()> {
        for batch in &self.strokes {
            for segment in &batch.segments {
                segment.validate()?;
            }
        }
        for batch in &self.fills {
            for polygon in &batch.polygons {
                for vertex in polygon {
                    if !vertex.x.is_finite() || !vertex.y.is_finite() {
                        return Err(OverlayError::Validation(
                            "fill vertex must be finite".to_owned(),
                        ));
                    }
                }
            }
        }
        for glyph in &self.glyphs {
            if !glyph.x.is_finite() || !glyph.y.is_finite() {
                return Err(OverlayError::Validation(
                    "glyph coordinates must be finite".to_owned(),
                ));
            }
            if !glyph.size.is_finite() || glyph.size <= 0.0 {
                return Err(OverlayError::Validation(
                    "glyph size must be finite and > 0".to_owned(),
                ));
            }
        }
        for text in &self.texts {
            if text.text.is_empty() {
                return Err(OverlayError::Validation(
                    "text command must not be empty".to_owned(),
                ));
            }
            if !text.x.is_finite() || !text.y.is_finite() {
                return Err(OverlayError::Validation(
                    "text coordinates must be finite".to_owned(),
                ));
            }
        }
        Ok(())
    }
}
