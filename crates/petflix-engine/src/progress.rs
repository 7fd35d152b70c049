//! Progress broadcasting and cooperative cancellation.
//!
//! The tracker owns the monotonic aggregator and fans snapshots out over
//! a broadcast channel. Observers may come and go; a lagging or absent
//! observer never blocks the pipeline. Cancellation is a shared flag the
//! orchestrator checks at safe points between remote calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use petflix_models::{ProgressAggregator, ProgressState, Stage};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Requests cooperative cancellation of a running pipeline.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    live: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// Shared progress state for one orchestrator.
#[derive(Debug)]
pub struct ProgressTracker {
    aggregator: Mutex<ProgressAggregator>,
    sender: broadcast::Sender<ProgressState>,
    live: Arc<AtomicBool>,
    total_clips: u32,
}

impl ProgressTracker {
    pub fn new(total_clips: u32) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            aggregator: Mutex::new(ProgressAggregator::new()),
            sender,
            live: Arc::new(AtomicBool::new(true)),
            total_clips,
        }
    }

    /// New receiver for progress snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressState> {
        self.sender.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            live: Arc::clone(&self.live),
        }
    }

    /// Whether the current run is still wanted.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Re-arm for a fresh run.
    pub fn reset(&self) {
        self.live.store(true, Ordering::SeqCst);
        if let Ok(mut agg) = self.aggregator.lock() {
            agg.reset();
        }
    }

    /// Fold one update into the aggregator and broadcast the snapshot.
    pub fn emit(
        &self,
        stage: Stage,
        current_clip: Option<u32>,
        sub_progress: f64,
        message: impl Into<String>,
    ) -> ProgressState {
        let state = match self.aggregator.lock() {
            Ok(mut agg) => agg.update(stage, current_clip, self.total_clips, sub_progress, message),
            // A poisoned lock means an observer panicked mid-update; keep
            // the pipeline going with a detached snapshot.
            Err(poisoned) => poisoned.into_inner().update(
                stage,
                current_clip,
                self.total_clips,
                sub_progress,
                message,
            ),
        };
        // A cancelled run stops broadcasting; no receivers is also fine
        if self.is_live() {
            let _ = self.sender.send(state.clone());
        }
        state
    }
}
