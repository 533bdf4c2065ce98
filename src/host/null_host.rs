//! In-memory host double used by tests and headless embedders.
//!
//! It stores series data with the same realtime update semantics a real chart
//! engine provides and exposes a linear coordinate space over a configurable
//! time/price domain, so renderer output can be asserted deterministically.

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::core::{OverlayData, SeriesKind, SeriesStyle, SeriesUpdate};
use crate::error::{OverlayError, OverlayResult};
use crate::host::{
    CoordinateService, HostMarker, HostSeriesId, LogicalRange, MarkerSink, SeriesHost,
};

/// One series as stored by the host double.
#[derive(Debug, Clone)]
pub struct StoredSeries {
    pub kind: SeriesKind,
    pub style: SeriesStyle,
    pub data: OverlayData,
}

#[derive(Debug)]
pub struct NullHost {
    ready: bool,
    next_id: u64,
    series: IndexMap<HostSeriesId, StoredSeries>,
    markers: Vec<HostMarker>,
    marker_push_count: usize,
    bar_times: Vec<i64>,
    price_domain: (f64, f64),
    viewport: (f64, f64),
    visible: Option<LogicalRange>,
}

impl Default for NullHost {
    fn default() -> Self {
        Self {
            ready: true,
            next_id: 1,
            series: IndexMap::new(),
            markers: Vec::new(),
            marker_push_count: 0,
            bar_times: Vec::new(),
            price_domain: (0.0, 1.0),
            viewport: (1000.0, 500.0),
            visible: None,
        }
    }
}

impl NullHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose surface has not been constructed yet; every series
    /// operation fails with `HostUnavailable` until `mark_ready` is called.
    #[must_use]
    pub fn unready() -> Self {
        Self {
            ready: false,
            ..Self::default()
        }
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Configures the coordinate space used by conversion services.
    pub fn set_coordinate_space(
        &mut self,
        bar_times: Vec<i64>,
        price_min: f64,
        price_max: f64,
        viewport_width: f64,
        viewport_height: f64,
    ) {
        let bar_count = bar_times.len();
        self.bar_times = bar_times;
        self.price_domain = (price_min, price_max);
        self.viewport = (viewport_width, viewport_height);
        if bar_count > 0 {
            self.visible = Some(LogicalRange {
                from: 0.0,
                to: (bar_count - 1) as f64,
            });
        }
    }

    /// Narrows the visible window, emulating a pan/zoom state.
    pub fn set_visible_logical_range(&mut self, from: f64, to: f64) {
        self.visible = Some(LogicalRange { from, to });
    }

    #[must_use]
    pub fn series(&self, id: HostSeriesId) -> Option<&StoredSeries> {
        self.series.get(&id)
    }

    #[must_use]
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Series in creation order, for test assertions.
    #[must_use]
    pub fn series_at(&self, index: usize) -> Option<&StoredSeries> {
        self.series.get_index(index).map(|(_, stored)| stored)
    }

    #[must_use]
    pub fn markers(&self) -> &[HostMarker] {
        &self.markers
    }

    /// Number of full marker-array pushes received so far.
    #[must_use]
    pub fn marker_push_count(&self) -> usize {
        self.marker_push_count
    }

    fn require_ready(&self) -> OverlayResult<()> {
        if self.ready {
            Ok(())
        } else {
            Err(OverlayError::HostUnavailable)
        }
    }
}

impl SeriesHost for NullHost {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn create_series(
        &mut self,
        kind: SeriesKind,
        style: &SeriesStyle,
    ) -> OverlayResult<HostSeriesId> {
        self.require_ready()?;
        let id = HostSeriesId(self.next_id);
        self.next_id += 1;
        let data = if kind.is_scalar() {
            OverlayData::Scalar(Vec::new())
        } else {
            OverlayData::Ohlc(Vec::new())
        };
        self.series.insert(
            id,
            StoredSeries {
                kind,
                style: style.clone(),
                data,
            },
        );
        Ok(id)
    }

    fn set_series_data(&mut self, id: HostSeriesId, data: OverlayData) -> OverlayResult<()> {
        self.require_ready()?;
        let entry = self
            .series
            .get_mut(&id)
            .ok_or_else(|| OverlayError::Lookup(format!("unknown host series {id:?}")))?;
        entry.data = data;
        Ok(())
    }

    fn update_series(&mut self, id: HostSeriesId, update: SeriesUpdate) -> OverlayResult<()> {
        self.require_ready()?;
        let entry = self
            .series
            .get_mut(&id)
            .ok_or_else(|| OverlayError::Lookup(format!("unknown host series {id:?}")))?;
        match (&mut entry.data, update) {
            (OverlayData::Scalar(points), SeriesUpdate::Scalar(point)) => {
                apply_update(points, point, |p| p.time)
            }
            (OverlayData::Ohlc(points), SeriesUpdate::Ohlc(point)) => {
                apply_update(points, point, |p| p.time)
            }
            _ => Err(OverlayError::Validation(
                "update payload kind does not match series data kind".to_owned(),
            )),
        }
    }

    fn remove_series(&mut self, id: HostSeriesId) -> OverlayResult<()> {
        self.require_ready()?;
        self.series
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| OverlayError::Lookup(format!("unknown host series {id:?}")))
    }
}

/// Realtime update semantics shared by scalar and OHLC storage:
/// newer time appends, equal time replaces the latest sample in place,
/// older time is rejected.
fn apply_update<P>(points: &mut Vec<P>, point: P, time_of: impl Fn(&P) -> i64) -> OverlayResult<()> {
    match points
        .last()
        .map_or(Ordering::Greater, |last| time_of(&point).cmp(&time_of(last)))
    {
        Ordering::Less => Err(OverlayError::Validation(
            "update time must be >= latest stored time".to_owned(),
        )),
        Ordering::Equal => {
            if let Some(last) = points.last_mut() {
                *last = point;
            } else {
                points.push(point);
            }
            Ok(())
        }
        Ordering::Greater => {
            points.push(point);
            Ok(())
        }
    }
}

impl MarkerSink for NullHost {
    fn set_markers(&mut self, markers: &[HostMarker]) -> OverlayResult<()> {
        self.require_ready()?;
        self.markers = markers.to_vec();
        self.marker_push_count += 1;
        Ok(())
    }
}

impl CoordinateService for NullHost {
    fn time_to_coordinate(&self, time: i64) -> Option<f64> {
        let index = self.bar_times.binary_search(&time).ok()?;
        self.logical_to_coordinate(index as f64)
    }

    fn logical_to_coordinate(&self, index: f64) -> Option<f64> {
        let visible = self.visible?;
        let span = visible.to - visible.from;
        if span <= 0.0 {
            return None;
        }
        Some((index - visible.from) / span * self.viewport.0)
    }

    fn price_to_coordinate(&self, price: f64) -> Option<f64> {
        if !price.is_finite() {
            return None;
        }
        let (min, max) = self.price_domain;
        let span = max - min;
        if span <= 0.0 {
            return None;
        }
        Some((1.0 - (price - min) / span) * self.viewport.1)
    }

    fn visible_logical_range(&self) -> Option<LogicalRange> {
        self.visible
    }

    fn bar_times(&self) -> &[i64] {
        &self.bar_times
    }
}
