//! Fill-between renderer.
//!
//! Fills the region between two price sources, either as one full-width
//! rectangle between constant levels (`Hline` mode) or as per-step
//! quadrilaterals between resolved series values (`Series` mode). Only
//! visible-range time steps (±1 step padding) are evaluated per frame.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{OhlcPoint, PriceRange, SeriesPoint, positions_box};
use crate::host::{PaneContext, PanePrimitive};
use crate::shapes::frame::{FillBatch, FillPaint, ShapeFrame, Vertex};

/// Named OHLC-derived price component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceComponent {
    Open,
    High,
    Low,
    Close,
    Hl2,
    Hlc3,
    Ohlc4,
}

impl PriceComponent {
    #[must_use]
    pub fn resolve(self, bar: &OhlcPoint) -> f64 {
        match self {
            Self::Open => bar.open,
            Self::High => bar.high,
            Self::Low => bar.low,
            Self::Close => bar.close,
            Self::Hl2 => (bar.high + bar.low) / 2.0,
            Self::Hlc3 => (bar.high + bar.low + bar.close) / 3.0,
            Self::Ohlc4 => (bar.open + bar.high + bar.low + bar.close) / 4.0,
        }
    }
}

/// One side of the filled region.
#[derive(Debug, Clone, PartialEq)]
pub enum FillSource {
    /// Constant price level.
    Level(f64),
    /// Price component of the backing candle series.
    Component(PriceComponent),
    /// Externally supplied series, resolved through a time→value lookup
    /// table built at construction.
    External(ExternalSeries),
}

impl FillSource {
    fn resolve(&self, bar: &OhlcPoint) -> Option<f64> {
        match self {
            Self::Level(level) => Some(*level),
            Self::Component(component) => Some(component.resolve(bar)),
            Self::External(series) => series.value_at(bar.time),
        }
    }

    fn constant_level(&self) -> Option<f64> {
        match self {
            Self::Level(level) => Some(*level),
            _ => None,
        }
    }
}

/// Prebuilt time→value lookup over an external series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExternalSeries {
    lookup: HashMap<i64, f64>,
}

impl ExternalSeries {
    #[must_use]
    pub fn from_points(points: &[SeriesPoint]) -> Self {
        Self {
            lookup: points.iter().map(|p| (p.time, p.value)).collect(),
        }
    }

    #[must_use]
    pub fn value_at(&self, time: i64) -> Option<f64> {
        self.lookup.get(&time).copied()
    }
}

/// Per-step color decision callback for `FillColorMode::Conditional`.
pub type FillColorFn = Box<dyn Fn(f64, f64) -> String>;

/// Coloring strategy of the filled region.
pub enum FillColorMode {
    Static(String),
    /// Three-way comparison of source1 vs source2 at each step.
    Dynamic {
        above: String,
        below: String,
        equal: String,
    },
    /// Vertical linear gradient over the polygon pixel bounds.
    Gradient { top: String, bottom: String },
    /// Caller-supplied decision over the resolved (source1, source2) pair.
    Conditional(FillColorFn),
}

impl fmt::Debug for FillColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(color) => f.debug_tuple("Static").field(color).finish(),
            Self::Dynamic {
                above,
                below,
                equal,
            } => f
                .debug_struct("Dynamic")
                .field("above", above)
                .field("below", below)
                .field("equal", equal)
                .finish(),
            Self::Gradient { top, bottom } => f
                .debug_struct("Gradient")
                .field("top", top)
                .field("bottom", bottom)
                .finish(),
            Self::Conditional(_) => f.write_str("Conditional(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    Hline,
    Series,
}

/// Full configuration of one fill-between overlay.
#[derive(Debug)]
pub struct FillBetweenConfig {
    pub mode: FillMode,
    pub source1: FillSource,
    pub source2: FillSource,
    pub color: FillColorMode,
    /// In `Series` mode, substitute a missing source with the other source's
    /// value instead of skipping the step.
    pub fill_gaps: bool,
}

impl FillBetweenConfig {
    #[must_use]
    pub fn hline(level1: f64, level2: f64, color: FillColorMode) -> Self {
        Self {
            mode: FillMode::Hline,
            source1: FillSource::Level(level1),
            source2: FillSource::Level(level2),
            color,
            fill_gaps: false,
        }
    }

    #[must_use]
    pub fn series(source1: FillSource, source2: FillSource, color: FillColorMode) -> Self {
        Self {
            mode: FillMode::Series,
            source1,
            source2,
            color,
            fill_gaps: false,
        }
    }

    #[must_use]
    pub fn with_fill_gaps(mut self, fill_gaps: bool) -> Self {
        self.fill_gaps = fill_gaps;
        self
    }
}

#[derive(Debug)]
pub struct FillBetweenRenderer {
    config: FillBetweenConfig,
    frame: ShapeFrame,
}

impl FillBetweenRenderer {
    #[must_use]
    pub fn new(config: FillBetweenConfig) -> Self {
        Self {
            config,
            frame: ShapeFrame::new(),
        }
    }

    pub fn set_config(&mut self, config: FillBetweenConfig) {
        self.config = config;
        self.frame.clear();
    }

    #[must_use]
    pub fn config(&self) -> &FillBetweenConfig {
        &self.config
    }

    fn update_hline(&mut self, ctx: &PaneContext<'_>) {
        let (Some(level1), Some(level2)) = (
            self.config.source1.constant_level(),
            self.config.source2.constant_level(),
        ) else {
            trace!("hline fill requires two constant levels");
            return;
        };
        let Some(range) = ctx.coords.visible_logical_range() else {
            return;
        };
        let (Some(x_left), Some(x_right)) = (
            ctx.coords.logical_to_coordinate(range.from),
            ctx.coords.logical_to_coordinate(range.to),
        ) else {
            return;
        };
        let (Some(y1), Some(y2)) = (
            ctx.coords.price_to_coordinate(level1),
            ctx.coords.price_to_coordinate(level2),
        ) else {
            return;
        };

        let ratio = ctx.pixel_ratio;
        // positions_box makes the rectangle independent of level order.
        let h_span = positions_box(x_left, x_right, ratio);
        let v_span = positions_box(y1, y2, ratio);
        let left = h_span.position as f64;
        let top = v_span.position as f64;
        let right = left + h_span.length as f64;
        let bottom = top + v_span.length as f64;

        let paint = match &self.config.color {
            FillColorMode::Static(color) => FillPaint::Solid(color.clone()),
            FillColorMode::Gradient { top, bottom } => FillPaint::VerticalGradient {
                top: top.clone(),
                bottom: bottom.clone(),
            },
            FillColorMode::Dynamic {
                above,
                below,
                equal,
            } => FillPaint::Solid(three_way_color(level1, level2, above, below, equal).to_owned()),
            FillColorMode::Conditional(decide) => FillPaint::Solid(decide(level1, level2)),
        };
        self.frame.fills.push(FillBatch {
            paint,
            polygons: vec![vec![
                Vertex { x: left, y: top },
                Vertex { x: right, y: top },
                Vertex { x: right, y: bottom },
                Vertex { x: left, y: bottom },
            ]],
        });
    }

    fn update_series(&mut self, ctx: &PaneContext<'_>) {
        let Some(range) = ctx.coords.visible_logical_range() else {
            return;
        };
        if ctx.candles.len() < 2 {
            return;
        }
        let last = ctx.candles.len() - 1;
        // Visible window ±1 step padding; the full backing series is never
        // walked.
        let start = (range.from.floor() - 1.0).max(0.0) as usize;
        let end = ((range.to.ceil() + 1.0).max(0.0) as usize).min(last);
        if start >= end {
            return;
        }

        let ratio = ctx.pixel_ratio;
        let mut solid_batches: IndexMap<String, Vec<Vec<Vertex>>> = IndexMap::new();
        let mut gradient_polygons: Vec<Vec<Vertex>> = Vec::new();
        let mut skipped = 0_usize;

        for step in start..end {
            let bar_a = &ctx.candles[step];
            let bar_b = &ctx.candles[step + 1];

            let resolved = resolve_step_pair(&self.config, bar_a, bar_b);
            let Some((s1_a, s2_a, s1_b, s2_b)) = resolved else {
                skipped += 1;
                continue;
            };

            let (Some(x_a), Some(x_b)) = (
                ctx.coords.logical_to_coordinate(step as f64),
                ctx.coords.logical_to_coordinate((step + 1) as f64),
            ) else {
                skipped += 1;
                continue;
            };
            let (Some(y1_a), Some(y2_a), Some(y1_b), Some(y2_b)) = (
                ctx.coords.price_to_coordinate(s1_a),
                ctx.coords.price_to_coordinate(s2_a),
                ctx.coords.price_to_coordinate(s1_b),
                ctx.coords.price_to_coordinate(s2_b),
            ) else {
                skipped += 1;
                continue;
            };

            let quad = vec![
                Vertex {
                    x: x_a * ratio,
                    y: y1_a * ratio,
                },
                Vertex {
                    x: x_b * ratio,
                    y: y1_b * ratio,
                },
                Vertex {
                    x: x_b * ratio,
                    y: y2_b * ratio,
                },
                Vertex {
                    x: x_a * ratio,
                    y: y2_a * ratio,
                },
            ];

            match &self.config.color {
                FillColorMode::Static(color) => {
                    solid_batches.entry(color.clone()).or_default().push(quad);
                }
                FillColorMode::Dynamic {
                    above,
                    below,
                    equal,
                } => {
                    let color = three_way_color(s1_a, s2_a, above, below, equal);
                    solid_batches.entry(color.to_owned()).or_default().push(quad);
                }
                FillColorMode::Gradient { .. } => gradient_polygons.push(quad),
                FillColorMode::Conditional(decide) => {
                    solid_batches.entry(decide(s1_a, s2_a)).or_default().push(quad);
                }
            }
        }

        if skipped > 0 {
            trace!(skipped, "fill steps skipped for current frame");
        }

        self.frame.fills = solid_batches
            .into_iter()
            .map(|(color, polygons)| FillBatch {
                paint: FillPaint::Solid(color),
                polygons,
            })
            .collect();
        if !gradient_polygons.is_empty() {
            if let FillColorMode::Gradient { top, bottom } = &self.config.color {
                self.frame.fills.push(FillBatch {
                    paint: FillPaint::VerticalGradient {
                        top: top.clone(),
                        bottom: bottom.clone(),
                    },
                    polygons: gradient_polygons,
                });
            }
        }
    }
}

fn three_way_color<'a>(s1: f64, s2: f64, above: &'a str, below: &'a str, equal: &'a str) -> &'a str {
    if s1 > s2 {
        above
    } else if s1 < s2 {
        below
    } else {
        equal
    }
}

/// Resolves both sources at both step endpoints, applying the fill-gaps
/// substitution when exactly one source is missing.
fn resolve_step_pair(
    config: &FillBetweenConfig,
    bar_a: &OhlcPoint,
    bar_b: &OhlcPoint,
) -> Option<(f64, f64, f64, f64)> {
    let endpoint = |bar: &OhlcPoint| -> Option<(f64, f64)> {
        let v1 = config.source1.resolve(bar);
        let v2 = config.source2.resolve(bar);
        match (v1, v2) {
            (Some(a), Some(b)) => Some((a, b)),
            (Some(a), None) if config.fill_gaps => Some((a, a)),
            (None, Some(b)) if config.fill_gaps => Some((b, b)),
            _ => None,
        }
    };
    let (s1_a, s2_a) = endpoint(bar_a)?;
    let (s1_b, s2_b) = endpoint(bar_b)?;
    Some((s1_a, s2_a, s1_b, s2_b))
}

impl PanePrimitive for FillBetweenRenderer {
    fn update_all_views(&mut self, ctx: &PaneContext<'_>) {
        self.frame.clear();
        match self.config.mode {
            FillMode::Hline => self.update_hline(ctx),
            FillMode::Series => self.update_series(ctx),
        }
    }

    fn pane_views(&self) -> &ShapeFrame {
        &self.frame
    }

    fn autoscale_info(&self) -> Option<PriceRange> {
        // Constant levels extend the scale; series-derived sources already
        // belong to series the host scales by itself.
        let of_source = |source: &FillSource| {
            source
                .constant_level()
                .map(|level| PriceRange::new(level, level))
        };
        PriceRange::union_opt(of_source(&self.config.source1), of_source(&self.config.source2))
    }
}
