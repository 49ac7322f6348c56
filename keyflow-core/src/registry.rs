//! Listener registry: category -> ordered listeners.
//!
//! Registration order is dispatch order. Identity is the `Arc` allocation,
//! so the same listener can sit under several categories, or twice under one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::AgentError;
use crate::event::{Event, EventCategory};

/// A callable invoked with every matching event.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Wrap a closure as a [`Listener`]. Keep the returned handle to remove it later.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Clone)]
pub struct ListenerRegistry {
    listeners: HashMap<EventCategory, Vec<Listener>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for category in EventCategory::ALL {
            if let Some(list) = self.listeners.get(&category) {
                map.entry(&category, &list.len());
            }
        }
        map.finish()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerRegistry {
    /// Empty registry addressing every category.
    pub fn new() -> Self {
        Self::with_categories(EventCategory::ALL)
    }

    /// Empty registry addressing only `categories`.
    pub fn with_categories<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = EventCategory>,
    {
        Self {
            listeners: categories.into_iter().map(|c| (c, Vec::new())).collect(),
        }
    }

    pub fn addresses(&self, category: EventCategory) -> bool {
        self.listeners.contains_key(&category)
    }

    /// Append `listener` to `category`. No de-duplication.
    pub fn add(&mut self, category: EventCategory, listener: Listener) -> Result<(), AgentError> {
        self.listeners
            .get_mut(&category)
            .ok_or_else(|| AgentError::UnknownCategory(category.to_string()))?
            .push(listener);
        Ok(())
    }

    /// Snapshot of `category` in registration order. Empty if not addressed.
    pub fn get(&self, category: EventCategory) -> Vec<Listener> {
        self.listeners.get(&category).cloned().unwrap_or_default()
    }

    /// Remove the first occurrence of `listener` from `category`.
    ///
    /// `Ok(false)` when the listener is not there: removal is idempotent.
    /// A category this registry does not address is an error.
    pub fn remove(
        &mut self,
        category: EventCategory,
        listener: &Listener,
    ) -> Result<bool, AgentError> {
        let list = self
            .listeners
            .get_mut(&category)
            .ok_or_else(|| AgentError::UnknownCategory(category.to_string()))?;

        match list.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(index) => {
                list.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn len(&self, category: EventCategory) -> usize {
        self.listeners.get(&category).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.values().all(Vec::is_empty)
    }

    /// Everyone who should see `event`, in dispatch order:
    /// the event's own category first, then the catch-all.
    pub fn targets(&self, event: &Event) -> Vec<Listener> {
        let category = event.category();
        let mut targets = if category.is_catch_all() {
            Vec::new()
        } else {
            self.get(category)
        };
        targets.extend(self.get(EventCategory::Input));
        targets
    }
}
