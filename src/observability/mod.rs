//! Observability subsystem for docstore
//!
//! - Structured log events through `tracing`
//! - Monotonic metrics
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. Every record carries `event` and `ns`; extra data goes in typed fields
//!
//! The library only emits events. Installing a subscriber is left to the
//! host process.

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event for a namespace, with optional `tracing` fields.
///
/// ```ignore
/// log_event!(Event::CursorOpened, coll.ns(), cursor_id = id.as_u64(), limit = ?limit);
/// ```
///
/// Fatal events go out at error level, warnings at warn, routine cursor
/// events at debug and the rest at info.
macro_rules! log_event {
    (@emit $event:expr, $ns:expr, { $($rest:tt)* }) => {{
        let event: $crate::observability::Event = $event;
        let ns: &str = $ns;
        let name = event.as_str();

        if event.is_fatal() {
            ::tracing::error!(event = name, ns = ns $($rest)*);
        } else if event.is_warning() {
            ::tracing::warn!(event = name, ns = ns $($rest)*);
        } else if event.is_routine() {
            ::tracing::debug!(event = name, ns = ns $($rest)*);
        } else {
            ::tracing::info!(event = name, ns = ns $($rest)*);
        }
    }};
    ($event:expr, $ns:expr) => {
        $crate::observability::log_event!(@emit $event, $ns, {})
    };
    ($event:expr, $ns:expr, $($field:tt)+) => {
        $crate::observability::log_event!(@emit $event, $ns, { , $($field)+ })
    };
}

pub(crate) use log_event;
