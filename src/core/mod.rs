pub mod geometry;
pub mod time;
pub mod types;

pub use geometry::{BitmapSpan, positions_box, positions_line};
pub use time::{MILLIS_HEURISTIC_CUTOFF, TimeInput, normalize_time, normalize_unix};
pub use types::{
    OhlcPoint, OverlayData, PriceRange, SeriesKind, SeriesPoint, SeriesStyle, SeriesUpdate,
};
