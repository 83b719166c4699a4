//! Notification channel for high-severity alerts
//!
//! At-most-once and best-effort: [`NotificationQueue::enqueue`] never waits,
//! and [`NotificationWorker`] hands each job to its sink exactly once. A job
//! that fails delivery is logged and dropped.

pub mod sink;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{AlertPayload, GeoPoint, Priority, VehicleRecord, WATCHLIST_ALERT};

pub use sink::{LogSink, NotificationSink, PgJobSink};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification queue is full")]
    QueueFull,
    #[error("notification worker has stopped")]
    QueueClosed,
    #[error("notification delivery failed: {0}")]
    Delivery(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Alert summary carried by a notification job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAlert {
    pub alert_id: Uuid,
    pub plate: String,
    pub alert_type: String,
    pub priority: Priority,
    pub vehicle: Option<VehicleRecord>,
    pub vehicle_id: String,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

impl From<&AlertPayload> for NotificationAlert {
    fn from(p: &AlertPayload) -> Self {
        Self {
            alert_id: p.alert_id,
            plate: p.plate.clone(),
            alert_type: p.alert_type.clone(),
            priority: p.priority,
            vehicle: p.vehicle.clone(),
            vehicle_id: p.vehicle_id.clone(),
            location: p.location,
            timestamp: p.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationJob {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub alert: NotificationAlert,
    pub created_at: DateTime<Utc>,
}

impl NotificationJob {
    pub fn watchlist_alert(payload: &AlertPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: WATCHLIST_ALERT.to_string(),
            alert: NotificationAlert::from(payload),
            created_at: Utc::now(),
        }
    }
}

/// Producer side of the notification channel
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Hand a job to the worker without waiting.
    pub fn enqueue(&self, job: NotificationJob) -> Result<(), NotifyError> {
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::QueueFull,
            TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }
}

pub struct NotificationWorker {
    rx: mpsc::Receiver<NotificationJob>,
    sink: Box<dyn NotificationSink>,
}

impl NotificationWorker {
    pub fn new(rx: mpsc::Receiver<NotificationJob>, sink: Box<dyn NotificationSink>) -> Self {
        Self { rx, sink }
    }

    /// Drain jobs until cancelled or until every queue handle is dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(sink = self.sink.name(), "Notification worker started");
        let mut delivered = 0u64;
        let mut failed = 0u64;

        loop {
            let job = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                job = self.rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            match self.sink.deliver(&job).await {
                Ok(()) => {
                    delivered += 1;
                    debug!(job_id = %job.id, alert_id = %job.alert.alert_id, "Notification job delivered");
                }
                Err(e) => {
                    failed += 1;
                    warn!(job_id = %job.id, alert_id = %job.alert.alert_id, error = %e, "Notification job dropped");
                }
            }
        }

        info!(delivered, failed, "Notification worker stopped");
    }
}
