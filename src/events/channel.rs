//! Event channel built on crossbeam-channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sends events from the core library.
///
/// Cheap to clone and safe to share across rayon workers.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event.
    ///
    /// If the receiver is dropped, the event is silently discarded.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receives events from the core library.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Returns an iterator over received events
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A no-op event sender for headless runs and tests.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PipelineEvent, ScanEvent};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Scan(ScanEvent::PhotoFound {
                path: PathBuf::from("/test/a.png"),
            }));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Scan(ScanEvent::PhotoFound { path }) => {
                assert!(path.ends_with("a.png"));
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn try_recv_is_empty_after_drain() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Pipeline(PipelineEvent::Started));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }
}
