//! Real-time update router.
//!
//! A per-context connection state machine that applies single-point ticks to
//! exactly the right overlay. The transport (out of scope) delivers raw JSON
//! together with the token it captured when the connection was established;
//! any tick whose token no longer matches the active subscription is
//! discarded, so a context switch can never leak stale data into the new
//! context.

use tracing::{debug, trace, warn};

use crate::core::{OhlcPoint, SeriesPoint, SeriesUpdate, normalize_time};
use crate::realtime::messages::{ContextKey, OutboundMessage, PushMessage, RawCandleTick};
use crate::registry::OverlayRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Naming scheme binding ticks to registry ids.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// Registry id of the main candlestick series.
    pub main_series_id: String,
    /// Prefix under which indicator overlays are registered; the overlay for
    /// indicator `x` is `{indicator_prefix}{x}` (plus fan-out suffixes).
    pub indicator_prefix: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            main_series_id: "main".to_owned(),
            indicator_prefix: "indicator_".to_owned(),
        }
    }
}

/// What the router did with one delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    AppliedCandle,
    AppliedIndicator { overlay_id: String },
    /// Token or context no longer matches the active subscription.
    DroppedStale,
    /// No candidate overlay id resolved; logged, never retried.
    DroppedUnroutable,
    DroppedMalformed,
    /// Control message requiring no registry work.
    Ignored,
}

#[derive(Debug)]
pub struct UpdateRouter {
    config: RouterConfig,
    state: ConnectionState,
    context: Option<ContextKey>,
    token: u64,
    outbound: Vec<OutboundMessage>,
}

impl UpdateRouter {
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
            context: None,
            token: 0,
            outbound: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn context(&self) -> Option<&ContextKey> {
        self.context.as_ref()
    }

    /// Token identifying the active subscription. Ticks delivered with an
    /// older token are discarded regardless of connection identity.
    #[must_use]
    pub fn current_token(&self) -> u64 {
        self.token
    }

    /// Begins connecting for a context. Any previous subscription is torn
    /// down by advancing the token, which invalidates in-flight ticks.
    pub fn connect(&mut self, context: ContextKey) -> u64 {
        if let (ConnectionState::Connected, Some(previous)) = (self.state, &self.context) {
            self.outbound.push(OutboundMessage::Unsubscribe {
                context: previous.clone(),
            });
        }
        self.token += 1;
        debug!(?context, token = self.token, "connecting push context");
        self.context = Some(context);
        self.state = ConnectionState::Connecting;
        self.token
    }

    /// Tears down and recreates the connection for the current context.
    pub fn reconnect(&mut self) -> Option<u64> {
        let context = self.context.clone()?;
        Some(self.connect(context))
    }

    pub fn disconnect(&mut self) {
        debug!(token = self.token, "disconnecting push context");
        self.token += 1;
        self.state = ConnectionState::Disconnected;
    }

    /// Transport-level open notification for the connection bound to
    /// `token`.
    pub fn on_transport_open(&mut self, token: u64) {
        if token != self.token {
            trace!(token, current = self.token, "open event for stale connection");
            return;
        }
        self.enter_connected();
    }

    pub fn on_transport_closed(&mut self, token: u64) {
        if token != self.token {
            return;
        }
        debug!(token, "push transport closed");
        self.state = ConnectionState::Disconnected;
    }

    pub fn on_transport_error(&mut self, token: u64, message: &str) {
        if token != self.token {
            return;
        }
        warn!(token, message, "push transport error");
        self.state = ConnectionState::Error;
    }

    /// Drains messages the transport should send.
    pub fn take_outbound(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbound)
    }

    /// Entering CONNECTED always (re)subscribes the active context.
    fn enter_connected(&mut self) {
        self.state = ConnectionState::Connected;
        if let Some(context) = &self.context {
            self.outbound.push(OutboundMessage::Subscribe {
                context: context.clone(),
            });
        }
    }

    /// Handles one raw push message delivered with the transport's captured
    /// token.
    pub fn handle_raw(
        &mut self,
        token: u64,
        raw: &str,
        registry: &mut OverlayRegistry,
    ) -> RouteOutcome {
        if token != self.token {
            trace!(token, current = self.token, "discarding tick for stale context");
            return RouteOutcome::DroppedStale;
        }
        let message: PushMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "malformed push message");
                return RouteOutcome::DroppedMalformed;
            }
        };
        self.handle_message(token, message, registry)
    }

    /// Typed variant of [`Self::handle_raw`].
    pub fn handle_message(
        &mut self,
        token: u64,
        message: PushMessage,
        registry: &mut OverlayRegistry,
    ) -> RouteOutcome {
        if token != self.token {
            return RouteOutcome::DroppedStale;
        }
        match message {
            PushMessage::Connected => {
                self.enter_connected();
                RouteOutcome::Ignored
            }
            PushMessage::ContextSubscribed { context } => {
                debug!(?context, "context subscription confirmed");
                RouteOutcome::Ignored
            }
            PushMessage::Error { message } => {
                warn!(message, "push channel reported error");
                self.state = ConnectionState::Error;
                RouteOutcome::Ignored
            }
            PushMessage::CandleUpdate { context, candle } => {
                if !self.is_active_context(&context) {
                    trace!(?context, "candle tick for inactive context");
                    return RouteOutcome::DroppedStale;
                }
                self.route_candle_tick(&candle, registry)
            }
            PushMessage::IndicatorUpdate {
                context,
                indicator_id,
                field,
                time,
                value,
            } => {
                if !self.is_active_context(&context) {
                    trace!(?context, "indicator tick for inactive context");
                    return RouteOutcome::DroppedStale;
                }
                self.route_indicator_tick(&indicator_id, field.as_deref(), &time, value, registry)
            }
        }
    }

    fn is_active_context(&self, context: &ContextKey) -> bool {
        self.context.as_ref() == Some(context)
    }

    /// Candle tick: incremental update of the main series; append when the
    /// time is new, in-place replace when it matches the latest stored
    /// point. Never a full reassignment.
    fn route_candle_tick(
        &self,
        candle: &RawCandleTick,
        registry: &mut OverlayRegistry,
    ) -> RouteOutcome {
        let time = match normalize_time(&candle.time) {
            Ok(time) => time,
            Err(err) => {
                warn!(error = %err, "candle tick with unusable time");
                return RouteOutcome::DroppedMalformed;
            }
        };
        let point = match OhlcPoint::new(time, candle.open, candle.high, candle.low, candle.close) {
            Ok(point) => point,
            Err(err) => {
                warn!(time, error = %err, "candle tick with inconsistent values");
                return RouteOutcome::DroppedMalformed;
            }
        };
        if registry.apply_update(&self.config.main_series_id, SeriesUpdate::Ohlc(point)) {
            RouteOutcome::AppliedCandle
        } else {
            warn!(
                main_series = %self.config.main_series_id,
                "candle tick had no main series to land on"
            );
            RouteOutcome::DroppedUnroutable
        }
    }

    /// Indicator tick: first match over an ordered candidate id list wins;
    /// no match drops the tick, logged, never retried.
    fn route_indicator_tick(
        &self,
        indicator_id: &str,
        field: Option<&str>,
        time: &crate::core::TimeInput,
        value: f64,
        registry: &mut OverlayRegistry,
    ) -> RouteOutcome {
        let time = match normalize_time(time) {
            Ok(time) => time,
            Err(err) => {
                warn!(indicator_id, error = %err, "indicator tick with unusable time");
                return RouteOutcome::DroppedMalformed;
            }
        };

        let prefix = format!("{}{indicator_id}", self.config.indicator_prefix);
        let mut candidates = Vec::with_capacity(3);
        if let Some(field) = field {
            candidates.push(format!("{prefix}_{field}"));
        }
        // Fan-out can register a sub-series under its own indicator id,
        // producing a doubled suffix (`indicator_macd_macd`).
        candidates.push(format!("{prefix}_{indicator_id}"));
        candidates.push(prefix.clone());

        for candidate in &candidates {
            if !registry.has_series(candidate) {
                continue;
            }
            let point = SeriesPoint::new(time, value);
            if registry.apply_update(candidate, SeriesUpdate::Scalar(point)) {
                return RouteOutcome::AppliedIndicator {
                    overlay_id: candidate.clone(),
                };
            }
        }

        warn!(prefix = %prefix, ?candidates, "indicator tick matched no overlay, dropped");
        RouteOutcome::DroppedUnroutable
    }
}
