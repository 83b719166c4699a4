//! Dashboard Hub actor - sole owner of the live viewer session set

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::message::{BroadcastEnvelope, ViewerMessage, PONG_FRAME};
use super::session::{Delivery, Session, SessionId};

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("dashboard hub is not running")]
    Closed,
}

/// Per-publish delivery counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    pub delivered: usize,
    /// Skipped because the session filters on a different vehicle
    pub filtered: usize,
    /// Delivery failed and the session was removed
    pub dropped: usize,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug)]
pub enum HubCommand {
    Connect {
        outbound: mpsc::Sender<String>,
        reply: oneshot::Sender<SessionId>,
    },
    /// Raw text frame received from a viewer
    Inbound { session_id: SessionId, text: String },
    Disconnect { session_id: SessionId },
    Publish {
        envelope: BroadcastEnvelope,
        reply: oneshot::Sender<FanoutReport>,
    },
    SessionCount { reply: oneshot::Sender<usize> },
}

// ============================================================================
// Actor Handle
// ============================================================================

/// Handle to the hub. Cheap to clone; every operation is a queued command.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Register a viewer whose frames will be pushed into `outbound`.
    pub async fn connect(&self, outbound: mpsc::Sender<String>) -> Result<SessionId, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Connect { outbound, reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    pub async fn inbound(&self, session_id: SessionId, text: String) -> Result<(), HubError> {
        self.send(HubCommand::Inbound { session_id, text }).await
    }

    pub async fn disconnect(&self, session_id: SessionId) -> Result<(), HubError> {
        self.send(HubCommand::Disconnect { session_id }).await
    }

    pub async fn publish(&self, envelope: BroadcastEnvelope) -> Result<FanoutReport, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Publish { envelope, reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    pub async fn session_count(&self) -> Result<usize, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::SessionCount { reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), HubError> {
        self.tx.send(cmd).await.map_err(|_| HubError::Closed)
    }
}

// ============================================================================
// Dashboard Hub
// ============================================================================

/// Processes one command at a time, so connect, filter updates, disconnect
/// and fanout never interleave. Delivery to a session is a non-blocking
/// enqueue; a session whose queue is full or closed is removed.
pub struct DashboardHub {
    rx: mpsc::Receiver<HubCommand>,
    sessions: HashMap<SessionId, Session>,
}

impl DashboardHub {
    pub fn new(queue_capacity: usize) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let hub = Self {
            rx,
            sessions: HashMap::new(),
        };
        (hub, HubHandle { tx })
    }

    /// Run until cancelled or until every handle is dropped. Dropping the
    /// session set on exit closes all viewer queues.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("DashboardHub starting");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
            }
        }

        info!(sessions = self.sessions.len(), "DashboardHub stopped");
    }

    fn handle(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Connect { outbound, reply } => {
                let session = Session::new(outbound);
                let id = session.id();
                self.sessions.insert(id, session);
                info!(session_id = %id, live = self.sessions.len(), "Viewer connected");
                if reply.send(id).is_err() {
                    // Caller gave up before learning its id
                    self.sessions.remove(&id);
                }
            }
            HubCommand::Inbound { session_id, text } => self.handle_inbound(session_id, &text),
            HubCommand::Disconnect { session_id } => {
                if self.sessions.remove(&session_id).is_some() {
                    info!(session_id = %session_id, live = self.sessions.len(), "Viewer disconnected");
                }
            }
            HubCommand::Publish { envelope, reply } => {
                let report = self.fanout(&envelope);
                let _ = reply.send(report);
            }
            HubCommand::SessionCount { reply } => {
                let _ = reply.send(self.sessions.len());
            }
        }
    }

    fn handle_inbound(&mut self, session_id: SessionId, text: &str) {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            debug!(session_id = %session_id, "Message for unknown session ignored");
            return;
        };

        match ViewerMessage::parse(text) {
            Ok(ViewerMessage::Subscribe { vehicle_id }) => {
                session.set_filter(vehicle_id);
                debug!(session_id = %session_id, filter = ?session.filter(), "Viewer subscription updated");
            }
            Ok(ViewerMessage::Ping) => {
                if session.try_send(PONG_FRAME.to_string()).is_err() {
                    warn!(session_id = %session_id, "Pong undeliverable, removing session");
                    self.sessions.remove(&session_id);
                }
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Ignoring malformed viewer message");
            }
        }
    }

    fn fanout(&mut self, envelope: &BroadcastEnvelope) -> FanoutReport {
        let mut report = FanoutReport::default();
        let frame = match serde_json::to_string(envelope) {
            Ok(f) => f,
            Err(e) => {
                warn!(kind = %envelope.kind, error = %e, "Broadcast envelope not serializable");
                return report;
            }
        };

        let target = envelope.vehicle_id();
        let mut failed = Vec::new();
        for (id, session) in &self.sessions {
            match session.deliver(target.as_deref(), &frame) {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Filtered => report.filtered += 1,
                Delivery::Failed => failed.push(*id),
            }
        }

        for id in failed {
            self.sessions.remove(&id);
            report.dropped += 1;
            warn!(session_id = %id, "Viewer delivery failed, session removed");
        }

        debug!(
            kind = %envelope.kind,
            vehicle_id = ?target,
            delivered = report.delivered,
            filtered = report.filtered,
            dropped = report.dropped,
            "Broadcast fanout complete"
        );
        report
    }
}
