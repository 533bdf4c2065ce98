use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use chart_overlays::core::{OverlayData, SeriesKind};
use chart_overlays::host::NullHost;
use chart_overlays::markers::MarkerAggregator;
use chart_overlays::realtime::{
    ConnectionState, ContextKey, OutboundMessage, RouteOutcome, RouterConfig, UpdateRouter,
};
use chart_overlays::registry::{OverlayRegistry, SeriesDescriptor};

fn new_rig() -> (Rc<RefCell<NullHost>>, OverlayRegistry) {
    let host = Rc::new(RefCell::new(NullHost::new()));
    let markers = MarkerAggregator::new(host.clone());
    let registry = OverlayRegistry::new(host.clone(), markers);
    (host, registry)
}

fn context() -> ContextKey {
    ContextKey::new("binance", "BTCUSDT", "1m")
}

fn context_json() -> serde_json::Value {
    json!({"provider": "binance", "symbol": "BTCUSDT", "interval": "1m"})
}

fn add_main_series(registry: &mut OverlayRegistry) {
    let points = vec![
        json!({"time": 100, "open": 10.0, "high": 12.0, "low": 9.0, "close": 11.0}),
        json!({"time": 200, "open": 11.0, "high": 13.0, "low": 10.0, "close": 12.0}),
    ];
    assert!(registry.add_series(
        "main",
        &points,
        &SeriesDescriptor::new(SeriesKind::Candlestick),
    ));
}

fn connected_router() -> UpdateRouter {
    let mut router = UpdateRouter::new(RouterConfig::default());
    let token = router.connect(context());
    router.on_transport_open(token);
    router
}

#[test]
fn connect_advances_the_token_and_subscribes_on_open() {
    let mut router = UpdateRouter::new(RouterConfig::default());
    assert_eq!(router.state(), ConnectionState::Disconnected);

    let token = router.connect(context());
    assert_eq!(token, 1);
    assert_eq!(router.state(), ConnectionState::Connecting);

    router.on_transport_open(token);
    assert_eq!(router.state(), ConnectionState::Connected);
    assert_eq!(
        router.take_outbound(),
        vec![OutboundMessage::Subscribe { context: context() }]
    );
}

#[test]
fn reconnecting_while_connected_unsubscribes_the_old_context() {
    let mut router = connected_router();
    router.take_outbound();

    let other = ContextKey::new("binance", "ETHUSDT", "5m");
    let token = router.connect(other.clone());
    assert_eq!(token, 2);
    router.on_transport_open(token);

    assert_eq!(
        router.take_outbound(),
        vec![
            OutboundMessage::Unsubscribe { context: context() },
            OutboundMessage::Subscribe { context: other },
        ]
    );
}

#[test]
fn ticks_with_a_stale_token_are_discarded() {
    let (_host, mut registry) = new_rig();
    add_main_series(&mut registry);
    let mut router = connected_router();

    let raw = json!({
        "type": "candleUpdate",
        "context": context_json(),
        "candle": {"time": 300, "open": 12.0, "high": 14.0, "low": 11.0, "close": 13.0}
    })
    .to_string();

    // Token 0 predates the connect; the registry must stay untouched.
    assert_eq!(
        router.handle_raw(0, &raw, &mut registry),
        RouteOutcome::DroppedStale
    );
    assert_eq!(
        router.handle_raw(router.current_token(), &raw, &mut registry),
        RouteOutcome::AppliedCandle
    );
}

#[test]
fn disconnect_invalidates_in_flight_ticks() {
    let (_host, mut registry) = new_rig();
    add_main_series(&mut registry);
    let mut router = connected_router();
    let old_token = router.current_token();
    router.disconnect();

    let raw = json!({
        "type": "candleUpdate",
        "context": context_json(),
        "candle": {"time": 300, "open": 12.0, "high": 14.0, "low": 11.0, "close": 13.0}
    })
    .to_string();
    assert_eq!(
        router.handle_raw(old_token, &raw, &mut registry),
        RouteOutcome::DroppedStale
    );
}

#[test]
fn candle_tick_with_a_new_time_appends() {
    let (host, mut registry) = new_rig();
    add_main_series(&mut registry);
    let mut router = connected_router();

    let raw = json!({
        "type": "candleUpdate",
        "context": context_json(),
        "candle": {"time": 300, "open": 12.0, "high": 14.0, "low": 11.0, "close": 13.0}
    })
    .to_string();
    assert_eq!(
        router.handle_raw(router.current_token(), &raw, &mut registry),
        RouteOutcome::AppliedCandle
    );

    let host = host.borrow();
    let stored = host.series_at(0).expect("main series");
    let OverlayData::Ohlc(data) = &stored.data else {
        panic!("ohlc data expected");
    };
    assert_eq!(data.len(), 3);
    assert_eq!(data[2].time, 300);
}

#[test]
fn candle_tick_with_the_latest_time_replaces_in_place() {
    let (host, mut registry) = new_rig();
    add_main_series(&mut registry);
    let mut router = connected_router();

    let raw = json!({
        "type": "candleUpdate",
        "context": context_json(),
        "candle": {"time": 200, "open": 11.0, "high": 15.0, "low": 10.0, "close": 14.5}
    })
    .to_string();
    assert_eq!(
        router.handle_raw(router.current_token(), &raw, &mut registry),
        RouteOutcome::AppliedCandle
    );

    let host = host.borrow();
    let stored = host.series_at(0).expect("main series");
    let OverlayData::Ohlc(data) = &stored.data else {
        panic!("ohlc data expected");
    };
    assert_eq!(data.len(), 2, "no new bar was appended");
    assert_eq!(data[1].close, 14.5);
}

#[test]
fn candle_tick_for_an_inactive_context_is_dropped() {
    let (_host, mut registry) = new_rig();
    add_main_series(&mut registry);
    let mut router = connected_router();

    let raw = json!({
        "type": "candleUpdate",
        "context": {"provider": "binance", "symbol": "ETHUSDT", "interval": "1m"},
        "candle": {"time": 300, "open": 12.0, "high": 14.0, "low": 11.0, "close": 13.0}
    })
    .to_string();
    assert_eq!(
        router.handle_raw(router.current_token(), &raw, &mut registry),
        RouteOutcome::DroppedStale
    );
}

#[test]
fn indicator_tick_prefers_the_field_scoped_overlay() {
    let (_host, mut registry) = new_rig();
    let points = vec![json!({"time": 100, "value": 1.0})];
    assert!(registry.add_series(
        "indicator_macd_signal",
        &points,
        &SeriesDescriptor::new(SeriesKind::Line),
    ));
    assert!(registry.add_series(
        "indicator_macd",
        &points,
        &SeriesDescriptor::new(SeriesKind::Line),
    ));
    let mut router = connected_router();

    let raw = json!({
        "type": "indicatorUpdate",
        "context": context_json(),
        "indicatorId": "macd",
        "field": "signal",
        "time": 200,
        "value": 2.5
    })
    .to_string();
    assert_eq!(
        router.handle_raw(router.current_token(), &raw, &mut registry),
        RouteOutcome::AppliedIndicator {
            overlay_id: "indicator_macd_signal".to_owned()
        }
    );
}

#[test]
fn fieldless_indicator_tick_lands_on_the_bare_prefix_id() {
    let (host, mut registry) = new_rig();
    let points = vec![json!({"time": 100, "value": 1.0})];
    assert!(registry.add_series(
        "indicator_ema",
        &points,
        &SeriesDescriptor::new(SeriesKind::Line),
    ));
    let mut router = connected_router();

    let raw = json!({
        "type": "indicatorUpdate",
        "context": context_json(),
        "indicatorId": "ema",
        "time": 200,
        "value": 42.0
    })
    .to_string();
    assert_eq!(
        router.handle_raw(router.current_token(), &raw, &mut registry),
        RouteOutcome::AppliedIndicator {
            overlay_id: "indicator_ema".to_owned()
        }
    );

    let host = host.borrow();
    let stored = host.series_at(0).expect("indicator series");
    assert_eq!(stored.data.last_time(), Some(200));
}

#[test]
fn unroutable_indicator_tick_is_dropped_quietly() {
    let (_host, mut registry) = new_rig();
    let mut router = connected_router();

    let raw = json!({
        "type": "indicatorUpdate",
        "context": context_json(),
        "indicatorId": "never_added",
        "time": 200,
        "value": 42.0
    })
    .to_string();
    assert_eq!(
        router.handle_raw(router.current_token(), &raw, &mut registry),
        RouteOutcome::DroppedUnroutable
    );
}

#[test]
fn malformed_payloads_never_reach_the_registry() {
    let (host, mut registry) = new_rig();
    add_main_series(&mut registry);
    let mut router = connected_router();
    let token = router.current_token();

    assert_eq!(
        router.handle_raw(token, "{not json", &mut registry),
        RouteOutcome::DroppedMalformed
    );
    // Inconsistent candle values fail validation.
    let raw = json!({
        "type": "candleUpdate",
        "context": context_json(),
        "candle": {"time": 300, "open": 12.0, "high": 10.0, "low": 11.0, "close": 13.0}
    })
    .to_string();
    assert_eq!(
        router.handle_raw(token, &raw, &mut registry),
        RouteOutcome::DroppedMalformed
    );

    let host = host.borrow();
    assert_eq!(host.series_at(0).expect("main series").data.len(), 2);
}

#[test]
fn millisecond_tick_times_are_normalized_before_applying() {
    let (host, mut registry) = new_rig();
    let points = vec![json!({"time": 1_700_000_000, "value": 1.0})];
    assert!(registry.add_series(
        "indicator_ema",
        &points,
        &SeriesDescriptor::new(SeriesKind::Line),
    ));
    let mut router = connected_router();

    let raw = json!({
        "type": "indicatorUpdate",
        "context": context_json(),
        "indicatorId": "ema",
        "time": 1_700_000_060_000_i64,
        "value": 2.0
    })
    .to_string();
    assert_eq!(
        router.handle_raw(router.current_token(), &raw, &mut registry),
        RouteOutcome::AppliedIndicator {
            overlay_id: "indicator_ema".to_owned()
        }
    );

    let host = host.borrow();
    let stored = host.series_at(0).expect("indicator series");
    assert_eq!(stored.data.last_time(), Some(1_700_000_060));
}

#[test]
fn transport_error_for_the_live_token_enters_error_state() {
    let mut router = connected_router();
    let stale = router.current_token() - 1;

    router.on_transport_error(stale, "old socket died");
    assert_eq!(router.state(), ConnectionState::Connected);

    router.on_transport_error(router.current_token(), "socket died");
    assert_eq!(router.state(), ConnectionState::Error);

    let token = router.reconnect().expect("context is still set");
    assert_eq!(router.state(), ConnectionState::Connecting);
    router.on_transport_open(token);
    assert_eq!(router.state(), ConnectionState::Connected);
}
