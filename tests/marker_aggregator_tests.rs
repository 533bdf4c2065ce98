use std::cell::RefCell;
use std::rc::Rc;

use chart_overlays::host::{HostMarkerPosition, HostMarkerShape, NullHost};
use chart_overlays::markers::{
    MarkerAggregator, MarkerPositionVocab, MarkerShapeVocab, MarkerSpec,
};

fn spec(time: i64, color: &str) -> MarkerSpec {
    MarkerSpec {
        time,
        price: None,
        shape: MarkerShapeVocab::Circle,
        position: MarkerPositionVocab::Above,
        color: color.to_owned(),
        text: None,
    }
}

fn new_rig() -> (Rc<RefCell<NullHost>>, MarkerAggregator) {
    let host = Rc::new(RefCell::new(NullHost::new()));
    let aggregator = MarkerAggregator::new(host.clone());
    (host, aggregator)
}

#[test]
fn union_of_sets_is_time_sorted() {
    let (host, mut aggregator) = new_rig();

    aggregator
        .set_markers("entries", vec![spec(30, "#0f0"), spec(10, "#0f0")])
        .expect("set registered");
    aggregator
        .set_markers("exits", vec![spec(20, "#f00")])
        .expect("set registered");

    let host = host.borrow();
    let times: Vec<i64> = host.markers().iter().map(|m| m.time).collect();
    assert_eq!(times, vec![10, 20, 30]);
}

#[test]
fn each_change_pushes_exactly_once() {
    let (host, mut aggregator) = new_rig();

    aggregator
        .set_markers("entries", vec![spec(10, "#0f0")])
        .expect("set registered");
    aggregator
        .set_markers("exits", vec![spec(20, "#f00")])
        .expect("set registered");
    assert!(aggregator.remove_markers("entries"));

    assert_eq!(host.borrow().marker_push_count(), 3);
    assert_eq!(host.borrow().markers().len(), 1);
}

#[test]
fn replacing_a_set_discards_its_previous_markers() {
    let (host, mut aggregator) = new_rig();

    aggregator
        .set_markers("entries", vec![spec(10, "#0f0"), spec(20, "#0f0")])
        .expect("set registered");
    aggregator
        .set_markers("entries", vec![spec(30, "#0f0")])
        .expect("set replaced");

    let host = host.borrow();
    assert_eq!(host.markers().len(), 1);
    assert_eq!(host.markers()[0].time, 30);
}

#[test]
fn removing_an_absent_set_is_a_silent_no_op() {
    let (host, mut aggregator) = new_rig();

    assert!(!aggregator.remove_markers("never-registered"));
    assert_eq!(host.borrow().marker_push_count(), 0, "no flush happened");
}

#[test]
fn prefix_removal_drops_matching_sets_in_one_push() {
    let (host, mut aggregator) = new_rig();

    aggregator
        .set_markers("strategy_a_entries", vec![spec(10, "#0f0")])
        .expect("set registered");
    aggregator
        .set_markers("strategy_a_exits", vec![spec(20, "#f00")])
        .expect("set registered");
    aggregator
        .set_markers("strategy_b_entries", vec![spec(30, "#00f")])
        .expect("set registered");
    let pushes_before = host.borrow().marker_push_count();

    assert_eq!(aggregator.remove_markers_by_prefix("strategy_a_"), 2);
    assert_eq!(aggregator.set_count(), 1);
    assert!(aggregator.has_set("strategy_b_entries"));

    let host = host.borrow();
    assert_eq!(host.marker_push_count(), pushes_before + 1);
    assert_eq!(host.markers().len(), 1);
    assert_eq!(host.markers()[0].time, 30);
}

#[test]
fn triangle_maps_to_the_directional_arrow_of_its_side() {
    let (host, mut aggregator) = new_rig();

    let above = MarkerSpec {
        shape: MarkerShapeVocab::Triangle,
        position: MarkerPositionVocab::Above,
        ..spec(10, "#0f0")
    };
    let below = MarkerSpec {
        shape: MarkerShapeVocab::Triangle,
        position: MarkerPositionVocab::Below,
        ..spec(20, "#f00")
    };
    aggregator
        .set_markers("signals", vec![above, below])
        .expect("set registered");

    let host = host.borrow();
    assert_eq!(host.markers()[0].shape, HostMarkerShape::ArrowDown);
    assert_eq!(host.markers()[0].position, HostMarkerPosition::AboveBar);
    assert_eq!(host.markers()[1].shape, HostMarkerShape::ArrowUp);
    assert_eq!(host.markers()[1].position, HostMarkerPosition::BelowBar);
}

#[test]
fn clear_on_an_empty_aggregator_never_touches_the_sink() {
    let (host, mut aggregator) = new_rig();
    aggregator.clear();
    assert_eq!(host.borrow().marker_push_count(), 0);
}

#[test]
fn clear_empties_the_host_collection() {
    let (host, mut aggregator) = new_rig();
    aggregator
        .set_markers("entries", vec![spec(10, "#0f0")])
        .expect("set registered");
    aggregator.clear();

    assert_eq!(aggregator.set_count(), 0);
    assert!(host.borrow().markers().is_empty());
}
