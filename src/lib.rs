//! chart-overlays: overlay management and shape rendering for candlestick
//! charts.
//!
//! The crate keeps indicator overlays and geometric annotations correct under
//! panning, zooming, and realtime ticking data: an id-keyed overlay registry,
//! shape primitive renderers producing batched pixel geometry every repaint,
//! a marker aggregator multiplexing feature marker sets into the host's
//! single marker collection, and a realtime router applying single-point
//! ticks to exactly the right overlay. The host chart engine itself is an
//! external collaborator, reached only through the traits in [`host`].

pub mod core;
pub mod error;
pub mod host;
pub mod markers;
pub mod realtime;
pub mod registry;
pub mod shapes;
pub mod telemetry;

pub use error::{OverlayError, OverlayResult};
pub use registry::{ApiResponse, OverlayRegistry, SeriesDescriptor};
pub use realtime::{RouterConfig, UpdateRouter};
