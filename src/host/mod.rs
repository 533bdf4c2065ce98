//! Interfaces of the external host chart engine.
//!
//! The overlay engine never talks to a concrete chart library. Everything it
//! needs from the host (coordinate conversion, typed series handles, the
//! single marker collection) is expressed as the traits in this module.

pub mod null_host;

use serde::{Deserialize, Serialize};

use crate::core::{OverlayData, PriceRange, SeriesKind, SeriesStyle, SeriesUpdate};
use crate::error::OverlayResult;
use crate::shapes::ShapeFrame;

pub use null_host::NullHost;

/// Visible bar-index window reported by the host time scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

/// Coordinate conversion services of the host chart surface.
///
/// Every conversion returns `None` when the input is not resolvable in the
/// current pan/zoom state; callers exclude the affected element from the
/// current frame only.
pub trait CoordinateService {
    fn time_to_coordinate(&self, time: i64) -> Option<f64>;
    fn logical_to_coordinate(&self, index: f64) -> Option<f64>;
    fn price_to_coordinate(&self, price: f64) -> Option<f64>;
    fn visible_logical_range(&self) -> Option<LogicalRange>;

    /// Times of the backing main series, ascending. Used for the
    /// nearest-bar-index fallback when direct time lookup fails.
    fn bar_times(&self) -> &[i64];
}

/// Opaque handle of one host series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostSeriesId(pub u64);

/// Series lifecycle surface of the host chart engine.
pub trait SeriesHost {
    /// `false` until the host surface finished its own construction.
    fn is_ready(&self) -> bool;

    fn create_series(&mut self, kind: SeriesKind, style: &SeriesStyle)
    -> OverlayResult<HostSeriesId>;
    fn set_series_data(&mut self, id: HostSeriesId, data: OverlayData) -> OverlayResult<()>;

    /// Applies one sample with realtime semantics: append when newer than the
    /// latest stored sample, replace in place when the time matches it.
    fn update_series(&mut self, id: HostSeriesId, update: SeriesUpdate) -> OverlayResult<()>;

    fn remove_series(&mut self, id: HostSeriesId) -> OverlayResult<()>;
}

/// Native marker shapes of the host marker collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostMarkerShape {
    Circle,
    Square,
    ArrowUp,
    ArrowDown,
}

/// Native marker anchoring of the host marker collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostMarkerPosition {
    AboveBar,
    BelowBar,
    InBar,
}

/// One marker in the host's native vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMarker {
    pub time: i64,
    pub position: HostMarkerPosition,
    pub shape: HostMarkerShape,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// The host supports exactly one marker collection per base series; each call
/// replaces the full array.
pub trait MarkerSink {
    fn set_markers(&mut self, markers: &[HostMarker]) -> OverlayResult<()>;
}

/// Per-repaint inputs handed to attached primitives.
pub struct PaneContext<'a> {
    pub coords: &'a dyn CoordinateService,
    pub candles: &'a [crate::core::OhlcPoint],
    pub pixel_ratio: f64,
}

/// Contract of an object attached to the host's primitive mechanism.
///
/// `update_all_views` recomputes pixel geometry for the current pan/zoom,
/// `pane_views` exposes the batched draw commands for the repaint, and
/// `autoscale_info` reports the primitive's price extent so host auto-scaling
/// includes annotation extents.
pub trait PanePrimitive {
    fn update_all_views(&mut self, ctx: &PaneContext<'_>);
    fn pane_views(&self) -> &ShapeFrame;
    fn autoscale_info(&self) -> Option<PriceRange>;
}
