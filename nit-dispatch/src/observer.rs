//! Hooks notified as tools run and blocks finish.

use std::sync::{Arc, Mutex};

use nit_telemetry::{InvocationOutcome, InvocationRecord};
use tracing::{debug, info, warn};

use crate::record::{DispatchRecord, DispatchStatus};

/// Observer invoked for every tool call and every finished block.
pub trait DispatchObserver: Send + Sync {
    /// Records a completed tool invocation.
    fn on_invocation(&self, record: &InvocationRecord);

    /// Records the result of one script block. The default ignores it.
    fn on_block(&self, record: &DispatchRecord) {
        let _ = record;
    }
}

/// Observer that emits records to the tracing system.
#[derive(Debug, Default)]
pub struct TracingDispatchObserver;

impl DispatchObserver for TracingDispatchObserver {
    fn on_invocation(&self, record: &InvocationRecord) {
        match &record.outcome {
            InvocationOutcome::Success => debug!(
                tool = %record.tool,
                duration_ms = record.duration_ms,
                result = %record.result_preview,
                "invocation recorded"
            ),
            InvocationOutcome::Failure { error } => warn!(
                tool = %record.tool,
                duration_ms = record.duration_ms,
                error = %error,
                "failed invocation recorded"
            ),
        }
    }

    fn on_block(&self, record: &DispatchRecord) {
        match record.status {
            DispatchStatus::Success => info!(
                tools = ?record.executed_tools,
                "script block succeeded"
            ),
            DispatchStatus::Error | DispatchStatus::Blocked => warn!(
                status = ?record.status,
                tools = ?record.executed_tools,
                output = %record.output_text(),
                "script block did not complete"
            ),
        }
    }
}

/// Composite observer that forwards to a collection of observers.
#[derive(Default)]
pub struct CompositeDispatchObserver {
    observers: Vec<Arc<dyn DispatchObserver>>,
}

impl CompositeDispatchObserver {
    /// Creates a composite from the supplied observers.
    #[must_use]
    pub fn new<I>(observers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn DispatchObserver>>,
    {
        Self {
            observers: observers.into_iter().collect(),
        }
    }

    /// Adds an observer.
    pub fn push(&mut self, observer: Arc<dyn DispatchObserver>) {
        self.observers.push(observer);
    }
}

impl DispatchObserver for CompositeDispatchObserver {
    fn on_invocation(&self, record: &InvocationRecord) {
        for observer in &self.observers {
            observer.on_invocation(record);
        }
    }

    fn on_block(&self, record: &DispatchRecord) {
        for observer in &self.observers {
            observer.on_block(record);
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    invocations: Mutex<Vec<InvocationRecord>>,
    blocks: Mutex<Vec<DispatchRecord>>,
}

impl CollectingObserver {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations seen so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock has been poisoned.
    #[must_use]
    pub fn invocations(&self) -> Vec<InvocationRecord> {
        self.invocations
            .lock()
            .expect("collecting observer poisoned")
            .clone()
    }

    /// Block results seen so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock has been poisoned.
    #[must_use]
    pub fn blocks(&self) -> Vec<DispatchRecord> {
        self.blocks
            .lock()
            .expect("collecting observer poisoned")
            .clone()
    }
}

impl DispatchObserver for CollectingObserver {
    fn on_invocation(&self, record: &InvocationRecord) {
        self.invocations
            .lock()
            .expect("collecting observer poisoned")
            .push(record.clone());
    }

    fn on_block(&self, record: &DispatchRecord) {
        self.blocks
            .lock()
            .expect("collecting observer poisoned")
            .push(record.clone());
    }
}
