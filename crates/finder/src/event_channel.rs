// Chunk: docs/chunks/quick_open - Event channel back to the presentation context
//! Event channel for results produced off the presentation thread.
//!
//! Scans run on background threads and file watchers fire from their own
//! driver thread. Neither may touch presentation state directly, so both post
//! a [`FinderEvent`] through this channel and the presentation loop drains it.
//!
//! # Design
//!
//! The sender is cloneable and `Send`, so one clone goes to each background
//! producer. Every send calls the host-provided waker afterwards, which is how
//! a run loop that sleeps between events learns there is something to drain.
//! Send errors only happen once the receiver has been dropped (shutdown) and
//! are returned to the caller, who is free to ignore them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendError, Sender};

/// An externally visible result delivered to the presentation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinderEvent {
    /// A scan finished. Only the most recent generation is authoritative.
    ScanComplete {
        generation: u64,
        root: PathBuf,
        paths: Vec<String>,
    },
    /// The watched file was changed by something other than us.
    FileChanged(PathBuf),
}

/// Sender half of the event channel.
#[derive(Clone)]
pub struct FinderEventSender {
    inner: Arc<FinderEventSenderInner>,
}

struct FinderEventSenderInner {
    sender: Sender<FinderEvent>,
    /// Wakes the presentation loop after each send.
    waker: Box<dyn Fn() + Send + Sync>,
}

/// Receiver half of the event channel. Owned by the presentation loop.
pub struct FinderEventReceiver {
    receiver: Receiver<FinderEvent>,
}

/// Creates a new event channel pair.
///
/// `waker` runs on the sending thread after every event is queued. Pass a
/// no-op closure when the receiver polls.
pub fn create_event_channel(
    waker: impl Fn() + Send + Sync + 'static,
) -> (FinderEventSender, FinderEventReceiver) {
    let (sender, receiver) = crossbeam_channel::unbounded();

    let event_sender = FinderEventSender {
        inner: Arc::new(FinderEventSenderInner {
            sender,
            waker: Box::new(waker),
        }),
    };

    (event_sender, FinderEventReceiver { receiver })
}

impl FinderEventSender {
    /// Posts the result of a finished scan.
    pub fn send_scan_complete(
        &self,
        generation: u64,
        root: PathBuf,
        paths: Vec<String>,
    ) -> Result<(), SendError<FinderEvent>> {
        self.send(FinderEvent::ScanComplete {
            generation,
            root,
            paths,
        })
    }

    /// Posts a debounced external change to `path`.
    pub fn send_file_changed(&self, path: PathBuf) -> Result<(), SendError<FinderEvent>> {
        self.send(FinderEvent::FileChanged(path))
    }

    fn send(&self, event: FinderEvent) -> Result<(), SendError<FinderEvent>> {
        let result = self.inner.sender.send(event);
        (self.inner.waker)();
        result
    }
}

impl FinderEventReceiver {
    /// Returns the next event if one is queued.
    pub fn try_recv(&self) -> Option<FinderEvent> {
        self.receiver.try_recv().ok()
    }

    /// Blocks for up to `timeout` waiting for the next event.
    ///
    /// Returns `None` on timeout or when every sender is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FinderEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Yields every event currently queued without blocking.
    pub fn drain(&self) -> impl Iterator<Item = FinderEvent> + '_ {
        std::iter::from_fn(|| self.try_recv())
    }
}
