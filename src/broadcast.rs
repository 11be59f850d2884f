//! Event delivery: the sink trait the engine emits into, the broadcast
//! channel implementation used by the host, and the error reporter.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::{Severity, TriviaError};
use crate::protocol::TriviaEvent;

/// Capacity of the host event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Destination for engine events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: TriviaEvent);
}

impl EventSink for broadcast::Sender<TriviaEvent> {
    fn emit(&self, event: TriviaEvent) {
        tracing::debug!("Emitting event: {}", event.event_id());
        // No subscribers is fine
        let _ = self.send(event);
    }
}

/// Create the broadcast channel that fans events out to host subscribers
pub fn event_channel() -> (broadcast::Sender<TriviaEvent>, broadcast::Receiver<TriviaEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}

/// Logs a failure and forwards it to the sink as an error event
#[derive(Clone)]
pub struct ErrorReporter {
    sink: Arc<dyn EventSink>,
}

impl ErrorReporter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn report(&self, error: &TriviaError) {
        let message = error.to_string();
        let safe_message = error.safe_message();

        match error.severity() {
            Severity::Critical => {
                tracing::error!("Critical error occurred: {}", message);
                self.sink.emit(TriviaEvent::ErrorCritical {
                    message,
                    safe_message,
                });
            }
            Severity::Runtime => {
                tracing::warn!("Runtime error occurred: {}", message);
                self.sink.emit(TriviaEvent::ErrorRuntime {
                    message,
                    safe_message,
                });
            }
        }
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }
}
