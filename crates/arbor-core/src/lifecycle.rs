//! Request lifecycle tracking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Lifecycle phases of a request moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Request received, processing started.
    Start,
    /// Action dispatch finished (or was skipped for a render-only request).
    ActionDispatched,
    /// The route has been resolved to a composed tree.
    RouteResolved,
    /// The response payload has been assembled.
    PayloadAssembled,
    /// Transport selected, response bytes are being produced.
    Streaming,
    /// Request completed successfully.
    Completion,
    /// An error occurred.
    Error(String),
}

/// Timing context for observability.
///
/// Stages record named marks. Clones share the underlying record, so a mark
/// made through one handle (the stream producer marks `first_chunk` and
/// `complete` on its clone) is visible through every other.
#[derive(Debug, Clone)]
pub struct TimingContext {
    inner: Arc<Mutex<TimingInner>>,
}

#[derive(Debug)]
struct TimingInner {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimingInner {
                start: Instant::now(),
                marks: HashMap::new(),
            })),
        }
    }

    /// Record a timing mark.
    pub fn mark(&self, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .marks
            .insert(name.to_string(), Instant::now());
    }

    /// Get elapsed time since request start.
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().unwrap().start.elapsed()
    }

    /// Time from request start to a recorded mark.
    pub fn time_to(&self, mark: &str) -> Option<Duration> {
        let inner = self.inner.lock().unwrap();
        inner.marks.get(mark).map(|t| t.duration_since(inner.start))
    }

    /// Time to the first response byte, if recorded.
    pub fn time_to_first_byte(&self) -> Option<Duration> {
        self.time_to("first_chunk")
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called when a pipeline phase is reached.
    fn on_phase(&self, phase: PipelinePhase, elapsed: Duration);
}
