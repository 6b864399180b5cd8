/*
 * The event router serializes every host event through one queue with a single consumer.
 * Event sources (the stdin reader, or tests) never call the application logic directly;
 * they post `HostEvent`s through an `EventSink`, and the router hands each event to the
 * `HostEventHandler` only after the previous one was fully handled. Because the handler
 * owns the tree session, opening a file and re-parsing after a save can never interleave.
 */
use super::error::Result as PlatformResult;
use super::types::{HostEvent, HostEventHandler};
use std::sync::mpsc::{self, Receiver, Sender};

// Producer handle onto the router queue. Cheap to clone, one per source.
#[derive(Clone)]
pub struct EventSink {
    sender: Sender<HostEvent>,
    source: &'static str,
}

impl EventSink {
    /*
     * Queues `event` for the router. Returns `false` if the router has already stopped,
     * in which case the event is dropped.
     */
    pub fn post(&self, event: HostEvent) -> bool {
        match self.sender.send(event) {
            Ok(()) => true,
            Err(mpsc::SendError(event)) => {
                log::debug!(
                    "EventSink[{}]: Router stopped, dropped {event:?}",
                    self.source
                );
                false
            }
        }
    }

    pub fn source(&self) -> &'static str {
        self.source
    }
}

/*
 * An observable source of host events. `subscribe` receives the sink it must post to;
 * implementations typically move the sink into a reader thread.
 */
pub trait EventSource {
    fn name(&self) -> &'static str;
    fn subscribe(self: Box<Self>, sink: EventSink) -> PlatformResult<()>;
}

pub struct EventRouter {
    sender: Sender<HostEvent>,
    receiver: Receiver<HostEvent>,
}

impl EventRouter {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        EventRouter { sender, receiver }
    }

    pub fn sink(&self, source: &'static str) -> EventSink {
        EventSink {
            sender: self.sender.clone(),
            source,
        }
    }

    pub fn subscribe(&self, source: Box<dyn EventSource>) -> PlatformResult<()> {
        let name = source.name();
        log::debug!("EventRouter: Subscribing source '{name}'.");
        source.subscribe(self.sink(name))
    }

    /*
     * Runs the dispatch loop until a `Shutdown` event arrives or every sink has been
     * dropped. Events are handled strictly in queue order. Calls `on_quit` on the handler
     * before returning the number of events handled.
     */
    pub fn run(self, handler: &mut dyn HostEventHandler) -> usize {
        let EventRouter { sender, receiver } = self;
        drop(sender);

        let mut handled = 0;
        for event in receiver.iter() {
            if matches!(event, HostEvent::Shutdown) {
                log::info!("EventRouter: Shutdown requested.");
                break;
            }
            log::trace!("EventRouter: Dispatching {event:?}");
            handler.handle_event(event);
            handled += 1;
        }
        log::info!("EventRouter: Stopped after {handled} events.");
        handler.on_quit();
        handled
    }

    /*
     * Handles every event that is already queued, without blocking. Stops early at a
     * `Shutdown` event, which is consumed. Returns the number of events handled.
     */
    #[cfg(test)]
    pub fn dispatch_pending(&self, handler: &mut dyn HostEventHandler) -> usize {
        let mut handled = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(HostEvent::Shutdown) => break,
                Ok(event) => {
                    handler.handle_event(event);
                    handled += 1;
                }
                Err(mpsc::TryRecvError::Empty) | Err(mpsc::TryRecvError::Disconnected) => break,
            }
        }
        handled
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}
