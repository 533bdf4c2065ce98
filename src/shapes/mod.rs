pub mod arrow_renderer;
pub mod box_renderer;
pub mod descriptor;
pub mod fill_between;
pub mod frame;
pub mod glyph_renderer;
pub mod line_renderer;
pub mod resolve;
pub mod store;

pub use arrow_renderer::ArrowRenderer;
pub use box_renderer::BoxRenderer;
pub use descriptor::{
    ArrowDirection, ArrowShape, BoxShape, GlyphShape, GlyphShapeVocab, LineShape, RawArrow, RawBox,
    RawLine, RawMarkerGlyph, ShapeStyle,
};
pub use fill_between::{
    ExternalSeries, FillBetweenConfig, FillBetweenRenderer, FillColorMode, FillMode, FillSource,
    PriceComponent,
};
pub use frame::{
    FillBatch, FillPaint, GlyphCommand, GlyphKind, Segment, ShapeFrame, StrokeBatch, StrokeStyle,
    TextCommand, TextHAlign, Vertex,
};
pub use glyph_renderer::GlyphRenderer;
pub use line_renderer::LineRenderer;
pub use store::ShapeOverlayStore;
