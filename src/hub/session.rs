//! A live viewer session as seen by the hub

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

pub type SessionId = Uuid;

/// Outcome of routing one message to one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Filtered,
    /// Outbound queue full or closed; the session must be removed
    Failed,
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    outbound: mpsc::Sender<String>,
    filter: Option<String>,
}

impl Session {
    pub fn new(outbound: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            outbound,
            filter: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Replace the filter. Empty clears it.
    pub fn set_filter(&mut self, vehicle_id: Option<String>) {
        self.filter = vehicle_id.filter(|v| !v.is_empty());
    }

    /// Unfiltered sessions and untargeted messages always match.
    pub fn accepts(&self, vehicle_id: Option<&str>) -> bool {
        match (self.filter.as_deref(), vehicle_id) {
            (Some(filter), Some(target)) => filter == target,
            _ => true,
        }
    }

    /// Queue a frame without waiting.
    pub fn try_send(&self, frame: String) -> Result<(), TrySendError<String>> {
        self.outbound.try_send(frame)
    }

    pub fn deliver(&self, vehicle_id: Option<&str>, frame: &str) -> Delivery {
        if !self.accepts(vehicle_id) {
            return Delivery::Filtered;
        }
        match self.try_send(frame.to_string()) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Failed,
        }
    }
}
