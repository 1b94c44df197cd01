use streamer_common::ScriptId;

use crate::event::{Propagation, ScriptEvent};

/// A script module that receives streamer events.
pub trait ScriptSink {
    fn script(&self) -> ScriptId;

    /// Handle one event. The meaning of the return value depends on the
    /// event's [`Propagation`].
    fn on_event(&mut self, event: &ScriptEvent) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("script {0:?} is already registered")]
    DuplicateScript(ScriptId),
}

/// Result of fanning one event out to the sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub invoked: usize,
    /// Some sink answered truthy.
    pub handled: bool,
    /// No invoked sink answered falsy.
    pub allowed: bool,
}

impl Default for DispatchOutcome {
    fn default() -> Self {
        Self {
            invoked: 0,
            handled: false,
            allowed: true,
        }
    }
}

/// Ordered registry of script sinks, invoked in registration order.
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn ScriptSink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sink: Box<dyn ScriptSink>) -> Result<(), DispatchError> {
        let script = sink.script();
        if self.sinks.iter().any(|s| s.script() == script) {
            return Err(DispatchError::DuplicateScript(script));
        }
        tracing::debug!(script = script.0, "script registered");
        self.sinks.push(sink);
        Ok(())
    }

    pub fn unregister(&mut self, script: ScriptId) -> Option<Box<dyn ScriptSink>> {
        let position = self.sinks.iter().position(|s| s.script() == script)?;
        tracing::debug!(script = script.0, "script unregistered");
        Some(self.sinks.remove(position))
    }

    pub fn scripts(&self) -> Vec<ScriptId> {
        self.sinks.iter().map(|s| s.script()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn dispatch(&mut self, event: &ScriptEvent) -> DispatchOutcome {
        let propagation = event.propagation();
        let mut outcome = DispatchOutcome::default();
        for sink in &mut self.sinks {
            let answer = sink.on_event(event);
            outcome.invoked += 1;
            outcome.handled |= answer;
            outcome.allowed &= answer;
            if answer && propagation == Propagation::StopOnTruthy {
                break;
            }
        }
        tracing::trace!(event = event.name(), invoked = outcome.invoked, "event dispatched");
        outcome
    }
}
