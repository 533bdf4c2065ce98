//! Shared coordinate resolution used by every shape renderer.

use crate::host::CoordinateService;

/// Index of the bar whose time is closest to `time`.
#[must_use]
pub fn nearest_bar_index(times: &[i64], time: i64) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    let insertion = times.partition_point(|&t| t < time);
    if insertion == 0 {
        return Some(0);
    }
    if insertion >= times.len() {
        return Some(times.len() - 1);
    }
    let before = insertion - 1;
    if (time - times[before]).abs() <= (times[insertion] - time).abs() {
        Some(before)
    } else {
        Some(insertion)
    }
}

/// Resolves a normalized time to an x coordinate.
///
/// Direct time lookup first; when the time is not exactly indexable the
/// nearest bar index in the backing series is converted instead. `None` means
/// the element is dropped for this frame only.
#[must_use]
pub fn resolve_time_x(coords: &dyn CoordinateService, time: i64) -> Option<f64> {
    if let Some(x) = coords.time_to_coordinate(time) {
        return Some(x);
    }
    let index = nearest_bar_index(coords.bar_times(), time)?;
    coords.logical_to_coordinate(index as f64)
}

/// Visible time window derived from the host's visible logical range,
/// clamped to the backing series. Used to cull shapes before any
/// coordinate resolution.
#[must_use]
pub fn visible_time_window(coords: &dyn CoordinateService) -> Option<(i64, i64)> {
    let range = coords.visible_logical_range()?;
    let times = coords.bar_times();
    if times.is_empty() {
        return None;
    }
    let last = times.len() - 1;
    let from = (range.from.floor().max(0.0) as usize).min(last);
    let to = (range.to.ceil().max(0.0) as usize).min(last);
    Some((times[from], times[to]))
}
