//! Best-effort audit emission.
//!
//! `emit` pushes onto a bounded channel and returns immediately; a background
//! dispatcher forwards events to the sink. On a full queue the event is
//! dropped and counted, never surfaced to the caller. Delivery is
//! at-most-once: sink failures are logged and not retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use domain::AuditEvent;

use super::sink::AuditSink;

/// Handle for emitting audit events. Cheap to clone.
#[derive(Clone)]
pub struct AuditEmitter {
    tx: mpsc::Sender<AuditEvent>,
    dropped: Arc<AtomicU64>,
}

impl AuditEmitter {
    /// Start the background dispatcher and return the emitting handle.
    pub fn spawn(sink: Arc<dyn AuditSink>, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditEvent>(queue_capacity);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(err) = sink.deliver(&event).await {
                    warn!(
                        user_id = %event.user_id,
                        action = %event.action,
                        error = %err,
                        "audit event delivery failed"
                    );
                } else {
                    debug!(user_id = %event.user_id, action = %event.action, "audit event delivered");
                }
            }
        });

        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue an event without blocking. Saturation drops the event.
    pub fn emit(&self, event: AuditEvent) {
        if let Err(err) = self.tx.try_send(event) {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            let event = match err {
                mpsc::error::TrySendError::Full(ev) | mpsc::error::TrySendError::Closed(ev) => ev,
            };
            warn!(
                user_id = %event.user_id,
                action = %event.action,
                total_dropped = dropped,
                "audit queue saturated, event dropped"
            );
        }
    }

    /// Number of events dropped since startup.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
