//! Rectangle (zone) renderer over `[time1, time2] × [price1, price2]`.

use indexmap::IndexMap;
use tracing::trace;

use crate::core::{PriceRange, positions_box};
use crate::host::{PaneContext, PanePrimitive};
use crate::shapes::descriptor::BoxShape;
use crate::shapes::frame::{FillBatch, FillPaint, ShapeFrame, Vertex};
use crate::shapes::resolve::{resolve_time_x, visible_time_window};

#[derive(Debug, Default)]
pub struct BoxRenderer {
    boxes: Vec<BoxShape>,
    frame: ShapeFrame,
    price_span: Option<PriceRange>,
}

impl BoxRenderer {
    #[must_use]
    pub fn new(boxes: Vec<BoxShape>) -> Self {
        let price_span = price_span_of(&boxes);
        Self {
            boxes,
            frame: ShapeFrame::new(),
            price_span,
        }
    }

    pub fn set_boxes(&mut self, boxes: Vec<BoxShape>) {
        self.price_span = price_span_of(&boxes);
        self.boxes = boxes;
        self.frame.clear();
    }

    #[must_use]
    pub fn boxes(&self) -> &[BoxShape] {
        &self.boxes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

fn price_span_of(boxes: &[BoxShape]) -> Option<PriceRange> {
    boxes.iter().fold(None, |acc, b| {
        PriceRange::union_opt(acc, Some(PriceRange::new(b.price1, b.price2)))
    })
}

impl PanePrimitive for BoxRenderer {
    fn update_all_views(&mut self, ctx: &PaneContext<'_>) {
        self.frame.clear();
        if self.boxes.is_empty() {
            return;
        }

        let window = visible_time_window(ctx.coords);
        let ratio = ctx.pixel_ratio;
        let mut batches: IndexMap<String, Vec<Vec<Vertex>>> = IndexMap::new();
        let mut dropped = 0_usize;

        for shape in &self.boxes {
            if let Some((window_start, window_end)) = window {
                let earliest = shape.time1.min(shape.time2);
                let latest = shape.time1.max(shape.time2);
                if latest < window_start || earliest > window_end {
                    continue;
                }
            }

            let (Some(x1), Some(x2)) = (
                resolve_time_x(ctx.coords, shape.time1),
                resolve_time_x(ctx.coords, shape.time2),
            ) else {
                dropped += 1;
                continue;
            };
            let (Some(y1), Some(y2)) = (
                ctx.coords.price_to_coordinate(shape.price1),
                ctx.coords.price_to_coordinate(shape.price2),
            ) else {
                dropped += 1;
                continue;
            };

            // Snap both axes so adjacent zones share pixel edges at any ratio.
            let h_span = positions_box(x1, x2, ratio);
            let v_span = positions_box(y1, y2, ratio);
            let left = h_span.position as f64;
            let top = v_span.position as f64;
            let right = left + h_span.length as f64;
            let bottom = top + v_span.length as f64;

            let fill = shape
                .style
                .fill_color
                .clone()
                .unwrap_or_else(|| shape.style.color.clone());
            batches.entry(fill).or_default().push(vec![
                Vertex { x: left, y: top },
                Vertex { x: right, y: top },
                Vertex { x: right, y: bottom },
                Vertex { x: left, y: bottom },
            ]);
        }

        if dropped > 0 {
            trace!(dropped, "boxes unresolved for current frame");
        }

        self.frame.fills = batches
            .into_iter()
            .map(|(color, polygons)| FillBatch {
                paint: FillPaint::Solid(color),
                polygons,
            })
            .collect();
    }

    fn pane_views(&self) -> &ShapeFrame {
        &self.frame
    }

    fn autoscale_info(&self) -> Option<PriceRange> {
        self.price_span
    }
}
