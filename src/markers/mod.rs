pub mod aggregator;

pub use aggregator::{MarkerAggregator, MarkerPositionVocab, MarkerShapeVocab, MarkerSpec};
