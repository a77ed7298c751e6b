//! HTTP and WebSocket front end for heads-up hold'em sessions.
//!
//! The [`GameRegistry`] owns every live session; connections talk to it
//! over `/ws` and receive the events addressed to them through the
//! [`EventBus`].

pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod registry;
pub mod server;

pub use config::{ConfigError, ServerSettings};
pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use events::{
    event_channel, Delivery, EventBus, EventReceiver, EventSender, EventSubscription,
};
pub use handlers::ClientMessage;
pub use logging::{init_logging, init_test_logging, LogEntry, TestLogSubscriber};
pub use metrics::{MetricsCollector, MetricsSnapshot, RequestTimer};
pub use middleware::{log_response, with_request_logging, RequestMetrics};
pub use registry::{GameRegistry, LobbyEntry, RegistryError};
pub use server::{AppContext, ServerError, ServerHandle, WebServer};
