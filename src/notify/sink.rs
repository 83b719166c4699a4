//! Notification sinks

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::{NotificationJob, NotifyError};

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, job: &NotificationJob) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

/// Writes jobs to `notification_jobs` as `pending` for a downstream sender
/// (SMS, push, email) to claim.
pub struct PgJobSink {
    pool: PgPool,
}

impl PgJobSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgJobSink {
    async fn deliver(&self, job: &NotificationJob) -> Result<(), NotifyError> {
        let payload = serde_json::to_value(job).map_err(|e| NotifyError::Delivery(e.to_string()))?;

        sqlx::query(
            "INSERT INTO notification_jobs (id, job_type, payload, priority, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(job.id)
        .bind(&job.job_type)
        .bind(&payload)
        .bind(job.alert.priority.as_str())
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Logs jobs instead of handing them off. Used in in-memory mode.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, job: &NotificationJob) -> Result<(), NotifyError> {
        info!(
            job_id = %job.id,
            alert_id = %job.alert.alert_id,
            plate = %job.alert.plate,
            priority = %job.alert.priority,
            alert_type = %job.alert.alert_type,
            "Notification job (log sink)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
