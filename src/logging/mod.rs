//! Logging infrastructure for structured console and file output.

mod subscriber;
mod utils;

pub use subscriber::{
    FileLayer, LOG_FILTER_ENV, LOG_TIMESTAMP_FORMAT, init_console, init_subscriber,
};

/// Events recorded by [`capture`], as `(level, message)` pairs.
#[cfg(test)]
pub(crate) type Captured = std::sync::Arc<std::sync::Mutex<Vec<(tracing::Level, String)>>>;

#[cfg(test)]
struct CaptureLayer(Captured);

#[cfg(test)]
impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        struct Message(String);
        impl tracing::field::Visit for Message {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{value:?}");
                }
            }
        }

        let mut message = Message(String::new());
        event.record(&mut message);
        if let Ok(mut events) = self.0.lock() {
            events.push((*event.metadata().level(), message.0));
        }
    }
}

/// Install a per-thread subscriber that records every event.
///
/// Keep the returned guard alive for the duration of the test; dropping it
/// restores the previous thread-local dispatcher.
#[cfg(test)]
pub(crate) fn capture() -> (Captured, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::layer::SubscriberExt as _;
    let events = Captured::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer(events.clone()));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (events, guard)
}

/// Number of captured events at `level`.
#[cfg(test)]
pub(crate) fn count_at(events: &Captured, level: tracing::Level) -> usize {
    events
        .lock()
        .map_or(0, |events| events.iter().filter(|(l, _)| *l == level).count())
}
