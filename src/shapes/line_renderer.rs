//! Trend-line renderer.
//!
//! Lines are grouped by (color, width, dash) before drawing so exactly one
//! stroke path is issued per distinct style; labels follow in one batched
//! pass. Unresolved endpoints drop a line for the current frame only.

use indexmap::IndexMap;
use tracing::trace;

use crate::core::{PriceRange, positions_line};
use crate::host::{PaneContext, PanePrimitive};
use crate::shapes::descriptor::LineShape;
use crate::shapes::frame::{Segment, ShapeFrame, StrokeBatch, StrokeStyle, TextCommand, TextHAlign};
use crate::shapes::resolve::{resolve_time_x, visible_time_window};

#[derive(Debug, Default)]
pub struct LineRenderer {
    lines: Vec<LineShape>,
    frame: ShapeFrame,
    price_span: Option<PriceRange>,
}

impl LineRenderer {
    #[must_use]
    pub fn new(lines: Vec<LineShape>) -> Self {
        let price_span = price_span_of(&lines);
        Self {
            lines,
            frame: ShapeFrame::new(),
            price_span,
        }
    }

    pub fn set_lines(&mut self, lines: Vec<LineShape>) {
        self.price_span = price_span_of(&lines);
        self.lines = lines;
        self.frame.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[LineShape] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn price_span_of(lines: &[LineShape]) -> Option<PriceRange> {
    lines.iter().fold(None, |acc, line| {
        let span = PriceRange::new(line.price1.min(line.price2), line.price1.max(line.price2));
        PriceRange::union_opt(acc, Some(span))
    })
}

impl PanePrimitive for LineRenderer {
    fn update_all_views(&mut self, ctx: &PaneContext<'_>) {
        self.frame.clear();
        if self.lines.is_empty() {
            return;
        }

        let window = visible_time_window(ctx.coords);
        let ratio = ctx.pixel_ratio;
        let mut batches: IndexMap<StrokeStyle, Vec<Segment>> = IndexMap::new();
        let mut labels: Vec<TextCommand> = Vec::new();
        let mut dropped = 0_usize;

        for line in &self.lines {
            if let Some((window_start, window_end)) = window {
                let earliest = line.time1.min(line.time2);
                let latest = line.time1.max(line.time2);
                if latest < window_start || earliest > window_end {
                    continue;
                }
            }

            let Some(x1) = resolve_time_x(ctx.coords, line.time1) else {
                dropped += 1;
                continue;
            };
            let Some(x2) = resolve_time_x(ctx.coords, line.time2) else {
                dropped += 1;
                continue;
            };
            let Some(y1) = ctx.coords.price_to_coordinate(line.price1) else {
                dropped += 1;
                continue;
            };
            let Some(y2) = ctx.coords.price_to_coordinate(line.price2) else {
                dropped += 1;
                continue;
            };

            let width_span = positions_line(0.0, ratio, line.style.width, false);
            let mut style = StrokeStyle::new(line.style.color.clone(), width_span.length.max(1) as f64);
            if let Some(dash) = &line.style.dash {
                style = style.with_dash(dash);
            }
            batches.entry(style).or_default().push(Segment {
                x1: x1 * ratio,
                y1: y1 * ratio,
                x2: x2 * ratio,
                y2: y2 * ratio,
            });

            if let Some(label) = &line.label {
                labels.push(TextCommand {
                    text: label.clone(),
                    x: x1.min(x2) * ratio,
                    y: (y1.min(y2) - 4.0) * ratio,
                    color: line.style.color.clone(),
                    h_align: TextHAlign::Left,
                });
            }
        }

        if dropped > 0 {
            trace!(dropped, "lines unresolved for current frame");
        }

        self.frame.strokes = batches
            .into_iter()
            .map(|(style, segments)| StrokeBatch { style, segments })
            .collect();
        self.frame.texts = labels;
    }

    fn pane_views(&self) -> &ShapeFrame {
        &self.frame
    }

    fn autoscale_info(&self) -> Option<PriceRange> {
        self.price_span
    }
}
