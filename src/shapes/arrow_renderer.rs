//! Directional arrow glyph renderer.

use tracing::trace;

use crate::core::PriceRange;
use crate::host::{PaneContext, PanePrimitive};
use crate::shapes::descriptor::{ArrowDirection, ArrowShape};
use crate::shapes::frame::{GlyphCommand, GlyphKind, ShapeFrame};
use crate::shapes::resolve::{resolve_time_x, visible_time_window};

const DEFAULT_ARROW_SIZE_PX: f64 = 10.0;

#[derive(Debug, Default)]
pub struct ArrowRenderer {
    arrows: Vec<ArrowShape>,
    frame: ShapeFrame,
    price_span: Option<PriceRange>,
}

impl ArrowRenderer {
    #[must_use]
    pub fn new(arrows: Vec<ArrowShape>) -> Self {
        let price_span = price_span_of(&arrows);
        Self {
            arrows,
            frame: ShapeFrame::new(),
            price_span,
        }
    }

    pub fn set_arrows(&mut self, arrows: Vec<ArrowShape>) {
        self.price_span = price_span_of(&arrows);
        self.arrows = arrows;
        self.frame.clear();
    }

    #[must_use]
    pub fn arrows(&self) -> &[ArrowShape] {
        &self.arrows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty()
    }
}

fn price_span_of(arrows: &[ArrowShape]) -> Option<PriceRange> {
    arrows.iter().fold(None, |acc, a| {
        PriceRange::union_opt(acc, Some(PriceRange::new(a.price, a.price)))
    })
}

impl PanePrimitive for ArrowRenderer {
    fn update_all_views(&mut self, ctx: &PaneContext<'_>) {
        self.frame.clear();
        if self.arrows.is_empty() {
            return;
        }

        let window = visible_time_window(ctx.coords);
        let ratio = ctx.pixel_ratio;
        let mut dropped = 0_usize;

        for arrow in &self.arrows {
            if let Some((window_start, window_end)) = window {
                if arrow.time < window_start || arrow.time > window_end {
                    continue;
                }
            }

            let Some(x) = resolve_time_x(ctx.coords, arrow.time) else {
                dropped += 1;
                continue;
            };
            let Some(y) = ctx.coords.price_to_coordinate(arrow.price) else {
                dropped += 1;
                continue;
            };

            let kind = match arrow.direction {
                ArrowDirection::Up => GlyphKind::ArrowUp,
                ArrowDirection::Down => GlyphKind::ArrowDown,
            };
            self.frame.glyphs.push(GlyphCommand {
                kind,
                x: (x * ratio).round(),
                y: (y * ratio).round(),
                size: DEFAULT_ARROW_SIZE_PX * arrow.style.width.max(1.0) * ratio,
                color: arrow.style.color.clone(),
            });
        }

        if dropped > 0 {
            trace!(dropped, "arrows unresolved for current frame");
        }
    }

    fn pane_views(&self) -> &ShapeFrame {
        &self.frame
    }

    fn autoscale_info(&self) -> Option<PriceRange> {
        self.price_span
    }
}
