//! Bridge from the synchronous loop thread into async consumers.
//!
//! A forwarding listener pushes clones into a bounded tokio channel with
//! `try_send`, so a slow consumer loses events instead of stalling capture.

use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use crate::event::{Event, EventCategory};
use crate::registry::{Listener, listener};

pub struct Subscription {
    category: EventCategory,
    listener: Listener,
    receiver: mpsc::Receiver<Event>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("category", &self.category)
            .field("listener", &"Arc<dyn Fn(&Event)>")
            .finish()
    }
}

impl Subscription {
    pub(crate) fn forwarding(category: EventCategory, capacity: usize) -> Self {
        let (tx, receiver) = mpsc::channel(capacity.max(1));

        let listener = listener(move |event: &Event| match tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("input: {} subscriber is lagging, event dropped", category);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::trace!("input: {} subscriber gone, event dropped", category);
            }
        });

        Self {
            category,
            listener,
            receiver,
        }
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// The registered forwarding listener, e.g. for `remove_listener`.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Event, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn into_receiver(self) -> mpsc::Receiver<Event> {
        self.receiver
    }
}
