//! Simulated capture source.
//!
//! Feeds a queue of prepared units (or failures) to whichever path the loop
//! asks for. Used by tests and by anything that wants a synthetic session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::capture::{Capture, CaptureError, CapturePath};

#[derive(Debug)]
pub enum ScriptedUnit {
    Unit(String),
    Fail(CaptureError),
}

/// Shared record of which path every read went through.
#[derive(Debug, Clone, Default)]
pub struct CaptureJournal {
    reads: Arc<Mutex<Vec<CapturePath>>>,
}

impl CaptureJournal {
    pub fn reads(&self) -> Vec<CapturePath> {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, path: CapturePath) {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path);
    }
}

/// Once the script runs dry every read reports [`CaptureError::Closed`].
#[derive(Debug, Default)]
pub struct ScriptedCapture {
    script: VecDeque<ScriptedUnit>,
    journal: CaptureJournal,
}

impl ScriptedCapture {
    pub fn new<I, S>(units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: units
                .into_iter()
                .map(|u| ScriptedUnit::Unit(u.into()))
                .collect(),
            journal: CaptureJournal::default(),
        }
    }

    pub fn then(mut self, unit: impl Into<String>) -> Self {
        self.script.push_back(ScriptedUnit::Unit(unit.into()));
        self
    }

    pub fn then_fail(mut self, error: CaptureError) -> Self {
        self.script.push_back(ScriptedUnit::Fail(error));
        self
    }

    pub fn journal(&self) -> CaptureJournal {
        self.journal.clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next(&mut self, path: CapturePath) -> Result<String, CaptureError> {
        self.journal.record(path);
        match self.script.pop_front() {
            Some(ScriptedUnit::Unit(unit)) => Ok(unit),
            Some(ScriptedUnit::Fail(error)) => Err(error),
            None => Err(CaptureError::Closed),
        }
    }
}

impl Capture for ScriptedCapture {
    fn read_key(&mut self) -> Result<String, CaptureError> {
        self.next(CapturePath::Key)
    }

    fn read_line(&mut self) -> Result<String, CaptureError> {
        self.next(CapturePath::Line)
    }

    fn describe(&self) -> String {
        format!("scripted ({} queued)", self.script.len())
    }
}
