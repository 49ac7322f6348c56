use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use keyflow_io::{Capture, CaptureError, Platform, StdinCapture};
use tracing::{debug, error, info, trace, warn};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::event::{Event, EventCategory, Mode};
use crate::history::InputHistory;
use crate::registry::{Listener, ListenerRegistry};
use crate::subscription::Subscription;

/// Why the capture loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// `InputHandle::cancel` was observed.
    Cancelled,
    /// The capture source reported end of input.
    InputClosed,
}

/// State shared between caller threads and the loop thread.
/// Registry and mode are only touched under their locks.
struct Shared {
    config: AgentConfig,
    registry: Mutex<ListenerRegistry>,
    mode: Mutex<Mode>,
    history: Mutex<InputHistory>,
    started: AtomicBool,
}

/// The input agent. Cloning is cheap and every clone drives the same agent,
/// so listeners may hold one to switch modes or (un)register from the loop.
#[derive(Clone)]
pub struct InputAgent {
    shared: Arc<Shared>,
}

impl fmt::Debug for InputAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputAgent")
            .field("mode", &self.mode())
            .field("registry", &*lock(&self.shared.registry))
            .field("started", &self.is_started())
            .finish()
    }
}

impl Default for InputAgent {
    fn default() -> Self {
        Self::new(Mode::SingleKey)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking listener never holds these locks, but don't let poison wedge the agent.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InputAgent {
    pub fn new(starting_mode: Mode) -> Self {
        Self::from_config(AgentConfig {
            starting_mode,
            ..AgentConfig::default()
        })
    }

    pub fn from_config(config: AgentConfig) -> Self {
        Self::with_registry(config, ListenerRegistry::new())
    }

    /// Build around a prepared registry, e.g. one addressing fewer categories.
    pub fn with_registry(config: AgentConfig, registry: ListenerRegistry) -> Self {
        let shared = Shared {
            registry: Mutex::new(registry),
            mode: Mutex::new(config.starting_mode),
            history: Mutex::new(InputHistory::new(config.history_capacity)),
            started: AtomicBool::new(false),
            config,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.shared.config
    }

    // ════════════════════════════════════════════════════════════════════
    // Mode
    // ════════════════════════════════════════════════════════════════════

    pub fn mode(&self) -> Mode {
        *lock(&self.shared.mode)
    }

    /// Takes effect on the loop's next iteration. A capture already blocked
    /// keeps its path and its category.
    pub fn set_mode(&self, mode: Mode) {
        let mut current = lock(&self.shared.mode);
        if *current != mode {
            debug!("input: mode {} -> {}", *current, mode);
            *current = mode;
        }
    }

    // ════════════════════════════════════════════════════════════════════
    // Listeners
    // ════════════════════════════════════════════════════════════════════

    pub fn add_listener(
        &self,
        category: EventCategory,
        listener: Listener,
    ) -> Result<(), AgentError> {
        lock(&self.shared.registry).add(category, listener)
    }

    /// Snapshot in registration order; changing it does not touch the agent.
    pub fn get_listeners(&self, category: EventCategory) -> Vec<Listener> {
        lock(&self.shared.registry).get(category)
    }

    /// Removes the first occurrence. `Ok(false)` if it was not registered there.
    pub fn remove_listener(
        &self,
        category: EventCategory,
        listener: &Listener,
    ) -> Result<bool, AgentError> {
        lock(&self.shared.registry).remove(category, listener)
    }

    pub fn listener_count(&self, category: EventCategory) -> usize {
        lock(&self.shared.registry).len(category)
    }

    /// Register a channel-backed listener on `category` for async consumers.
    pub fn subscribe(&self, category: EventCategory) -> Result<Subscription, AgentError> {
        let subscription = Subscription::forwarding(category, self.shared.config.stream_capacity);
        self.add_listener(category, subscription.listener().clone())?;
        Ok(subscription)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> Result<bool, AgentError> {
        self.remove_listener(subscription.category(), subscription.listener())
    }

    // ════════════════════════════════════════════════════════════════════
    // History
    // ════════════════════════════════════════════════════════════════════

    /// Most recent dispatched units, oldest first. Empty keys are skipped,
    /// but empty sequence lines are recorded like any other line.
    pub fn recent_inputs(&self) -> Vec<String> {
        lock(&self.shared.history).entries()
    }

    pub fn clear_history(&self) {
        lock(&self.shared.history).clear();
    }

    // ════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ════════════════════════════════════════════════════════════════════

    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }

    /// Bind the platform capture strategy to stdin and launch the loop.
    /// Returns as soon as the thread is spawned.
    pub fn start(&self) -> Result<InputHandle, AgentError> {
        self.shared.config.validate()?;
        self.claim_start()?;

        let platform = match &self.shared.config.platform {
            Some(os) => Platform::from_os(os),
            None => Platform::detect(),
        };
        self.launch(StdinCapture::for_platform(&platform))
    }

    /// Launch the loop over a caller-provided capture source.
    pub fn start_with<C>(&self, capture: C) -> Result<InputHandle, AgentError>
    where
        C: Capture + 'static,
    {
        self.shared.config.validate()?;
        self.claim_start()?;
        self.launch(capture)
    }

    fn claim_start(&self) -> Result<(), AgentError> {
        if self.shared.started.swap(true, Ordering::AcqRel) {
            return Err(AgentError::AlreadyStarted);
        }
        Ok(())
    }

    fn launch<C>(&self, mut capture: C) -> Result<InputHandle, AgentError>
    where
        C: Capture + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let loop_stop = stop.clone();
        let agent = self.clone();

        info!("input: starting capture loop on {}", capture.describe());

        let thread = std::thread::Builder::new()
            .name(self.shared.config.thread_name.clone())
            .spawn(move || agent.run(&mut capture, &loop_stop))
            .map_err(|e| {
                self.shared.started.store(false, Ordering::Release);
                AgentError::Spawn(e)
            })?;

        Ok(InputHandle { thread, stop })
    }

    // ════════════════════════════════════════════════════════════════════
    // Loop
    // ════════════════════════════════════════════════════════════════════

    fn run<C: Capture>(&self, capture: &mut C, stop: &AtomicBool) -> Result<LoopExit, CaptureError> {
        loop {
            if stop.load(Ordering::Acquire) {
                info!("input: capture loop cancelled");
                return Ok(LoopExit::Cancelled);
            }

            // One read of the mode decides both the path and the category.
            let mode = self.mode();
            let unit = match capture.read(mode.capture_path()) {
                Ok(unit) => unit,
                Err(CaptureError::Closed) => {
                    info!("input: stream closed, capture loop ending");
                    return Ok(LoopExit::InputClosed);
                }
                Err(e @ CaptureError::Unimplemented { .. }) => {
                    error!("input: capture failed, stopping loop: {}", e);
                    return Err(e);
                }
                Err(CaptureError::Io(e)) => {
                    warn!("input: capture read failed, retrying: {}", e);
                    continue;
                }
            };

            if stop.load(Ordering::Acquire) {
                info!("input: capture loop cancelled, discarding last unit");
                return Ok(LoopExit::Cancelled);
            }

            if mode == Mode::SingleKey && unit.is_empty() {
                trace!("input: empty key, nothing to dispatch");
                continue;
            }

            lock(&self.shared.history).push(unit.as_str());
            self.dispatch(&Event::new(unit, mode.category()));
        }
    }

    /// Invoke the event's own listeners, then the catch-all ones, on this thread.
    /// The registry lock is released before any listener runs.
    fn dispatch(&self, event: &Event) {
        let targets = lock(&self.shared.registry).targets(event);
        debug!(
            "input: {} event {:?} -> {} listener(s)",
            event.category(),
            event.value(),
            targets.len()
        );

        for listener in &targets {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                error!("input: listener panicked on {} event", event.category());
            }
        }
    }
}

/// Owned handle to a running capture loop.
///
/// Dropping it detaches the loop, which then runs until the process exits
/// or input closes.
#[derive(Debug)]
pub struct InputHandle {
    thread: JoinHandle<Result<LoopExit, CaptureError>>,
    stop: Arc<AtomicBool>,
}

impl InputHandle {
    /// Ask the loop to stop. Observed before the next capture; a blocked read
    /// is not interrupted and whatever it returns is discarded.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread.thread().name()
    }

    /// Wait for the loop. A capture failure comes back as [`AgentError::Capture`].
    pub fn join(self) -> Result<LoopExit, AgentError> {
        match self.thread.join() {
            Ok(result) => result.map_err(AgentError::from),
            Err(_) => Err(AgentError::LoopPanicked),
        }
    }
}
