pub mod messages;
pub mod router;

pub use messages::{ContextKey, OutboundMessage, PushMessage, RawCandleTick};
pub use router::{ConnectionState, RouteOutcome, RouterConfig, UpdateRouter};
