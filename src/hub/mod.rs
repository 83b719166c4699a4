//! Dashboard Hub: live viewer sessions and filtered alert fanout
//!
//! ## Modules
//!
//! - `actor`   - the single-owner hub task and its cloneable handle
//! - `session` - per-viewer state (outbound queue and subscription filter)
//! - `message` - broadcast envelope and viewer control messages
//!
//! ## Fanout
//!
//! A message carrying `data.vehicle_id = V` reaches every session that is
//! unfiltered or filtered on `V`. A message without a vehicle id reaches all
//! sessions. A session whose delivery fails is removed; the others still
//! receive the message.

pub mod actor;
pub mod message;
pub mod session;

pub use actor::{DashboardHub, FanoutReport, HubCommand, HubError, HubHandle};
pub use message::{BroadcastEnvelope, ViewerMessage, PONG_FRAME};
pub use session::{Session, SessionId};
