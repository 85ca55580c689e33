//! Progress and status events.
//!
//! A [`Reporter`] is handed to every long-running call. Components that wrap
//! a transport pass their own reporter down, so whatever the transport emits
//! reaches the same subscriber as the wrapper's own messages.
//!
//! Reporters are `Send + Sync` and may be invoked from transfer worker
//! threads; subscribers must not assume a particular calling thread. A UI
//! that needs events on its own thread should use [`Reporter::channel`] and
//! drain the receiver on its own schedule.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// A single progress or status notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Event {
    /// `completed` of `total` items processed in the current pass.
    Progress { completed: usize, total: usize },
    /// Human-facing narration; not meant to be parsed.
    Status { message: String },
}

type Sink = dyn Fn(Event) + Send + Sync;

/// Cloneable handle to an event subscriber.
#[derive(Clone, Default)]
pub struct Reporter {
    sink: Option<Arc<Sink>>,
}

impl Reporter {
    /// A reporter that drops every event (status is still logged).
    pub fn silent() -> Self {
        Self::default()
    }

    /// Deliver events to a callback.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        Self {
            sink: Some(Arc::new(f)),
        }
    }

    /// Deliver events into a queue the caller drains.
    ///
    /// Events sent after the receiver is dropped are discarded.
    pub fn channel() -> (Self, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Self::from_sender(tx), rx)
    }

    pub fn from_sender(tx: Sender<Event>) -> Self {
        let tx = Mutex::new(tx);
        Self::from_fn(move |event| {
            if let Ok(tx) = tx.lock() {
                let _ = tx.send(event);
            }
        })
    }

    pub fn emit(&self, event: Event) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }

    pub fn progress(&self, completed: usize, total: usize) {
        self.emit(Event::Progress { completed, total });
    }

    /// Emit a status message and mirror it to the log.
    pub fn status(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.emit(Event::Status { message });
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("subscribed", &self.sink.is_some())
            .finish()
    }
}
