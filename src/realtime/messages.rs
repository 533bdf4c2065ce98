//! Push-channel wire messages.

use serde::{Deserialize, Serialize};

use crate::core::TimeInput;

/// Identity of one streaming subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextKey {
    pub provider: String,
    pub symbol: String,
    pub interval: String,
}

impl ContextKey {
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        symbol: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            symbol: symbol.into(),
            interval: interval.into(),
        }
    }
}

/// One candle sample as pushed by the channel, time unnormalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandleTick {
    pub time: TimeInput,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Inbound push messages, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PushMessage {
    Connected,
    ContextSubscribed {
        context: ContextKey,
    },
    CandleUpdate {
        context: ContextKey,
        candle: RawCandleTick,
    },
    #[serde(rename_all = "camelCase")]
    IndicatorUpdate {
        context: ContextKey,
        indicator_id: String,
        #[serde(default)]
        field: Option<String>,
        time: TimeInput,
        value: f64,
    },
    Error {
        message: String,
    },
}

/// Outbound messages queued by the router for the transport to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    Subscribe { context: ContextKey },
    Unsubscribe { context: ContextKey },
}
