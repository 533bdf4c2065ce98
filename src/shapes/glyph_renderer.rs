//! Free-floating marker glyph renderer (circle/square/triangle at an exact
//! time/price anchor, optionally labeled).

use tracing::trace;

use crate::core::PriceRange;
use crate::host::{PaneContext, PanePrimitive};
use crate::shapes::descriptor::{GlyphShape, GlyphShapeVocab};
use crate::shapes::frame::{GlyphCommand, GlyphKind, ShapeFrame, TextCommand, TextHAlign};
use crate::shapes::resolve::{resolve_time_x, visible_time_window};

const DEFAULT_GLYPH_SIZE_PX: f64 = 8.0;

#[derive(Debug, Default)]
pub struct GlyphRenderer {
    glyphs: Vec<GlyphShape>,
    frame: ShapeFrame,
    price_span: Option<PriceRange>,
}

impl GlyphRenderer {
    #[must_use]
    pub fn new(glyphs: Vec<GlyphShape>) -> Self {
        let price_span = price_span_of(&glyphs);
        Self {
            glyphs,
            frame: ShapeFrame::new(),
            price_span,
        }
    }

    pub fn set_glyphs(&mut self, glyphs: Vec<GlyphShape>) {
        self.price_span = price_span_of(&glyphs);
        self.glyphs = glyphs;
        self.frame.clear();
    }

    #[must_use]
    pub fn glyphs(&self) -> &[GlyphShape] {
        &self.glyphs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

fn price_span_of(glyphs: &[GlyphShape]) -> Option<PriceRange> {
    glyphs.iter().fold(None, |acc, g| {
        PriceRange::union_opt(acc, Some(PriceRange::new(g.price, g.price)))
    })
}

impl PanePrimitive for GlyphRenderer {
    fn update_all_views(&mut self, ctx: &PaneContext<'_>) {
        self.frame.clear();
        if self.glyphs.is_empty() {
            return;
        }

        let window = visible_time_window(ctx.coords);
        let ratio = ctx.pixel_ratio;
        let mut dropped = 0_usize;

        for glyph in &self.glyphs {
            if let Some((window_start, window_end)) = window {
                if glyph.time < window_start || glyph.time > window_end {
                    continue;
                }
            }

            let Some(x) = resolve_time_x(ctx.coords, glyph.time) else {
                dropped += 1;
                continue;
            };
            let Some(y) = ctx.coords.price_to_coordinate(glyph.price) else {
                dropped += 1;
                continue;
            };

            let kind = match glyph.shape {
                GlyphShapeVocab::Circle => GlyphKind::Circle,
                GlyphShapeVocab::Square => GlyphKind::Square,
                GlyphShapeVocab::Triangle => GlyphKind::TriangleUp,
            };
            let size = DEFAULT_GLYPH_SIZE_PX * glyph.style.width.max(1.0) * ratio;
            let snapped_x = (x * ratio).round();
            let snapped_y = (y * ratio).round();
            self.frame.glyphs.push(GlyphCommand {
                kind,
                x: snapped_x,
                y: snapped_y,
                size,
                color: glyph.style.color.clone(),
            });

            if let Some(text) = &glyph.text {
                self.frame.texts.push(TextCommand {
                    text: text.clone(),
                    x: snapped_x,
                    y: snapped_y - size,
                    color: glyph.style.color.clone(),
                    h_align: TextHAlign::Center,
                });
            }
        }

        if dropped > 0 {
            trace!(dropped, "marker glyphs unresolved for current frame");
        }
    }

    fn pane_views(&self) -> &ShapeFrame {
        &self.frame
    }

    fn autoscale_info(&self) -> Option<PriceRange> {
        self.price_span
    }
}
