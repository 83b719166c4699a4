//! Sighting-to-alert pipeline
//!
//! ```text
//! STEP 1: Validate + assign sighting id
//! STEP 2: Registry lookup (never fails; Unavailable on error/timeout)
//! STEP 3: Watchlist evaluation (never fails; at most one hit)
//! STEP 4: Persist sighting (ALWAYS; failure aborts the intake)
//! STEP 5: Dispatch alert (ONLY if a hit exists)
//!         5a. persist alert (failure surfaces to the caller)
//!         5b. broadcast to the dashboard hub (best-effort)
//!         5c. enqueue notification if priority >= high (best-effort)
//! ```
//!
//! There is no transaction across steps: a sighting can be stored without its
//! alert. Its denormalized `watchlist_hit`/`watchlist_priority` columns still
//! record that a hit occurred.

mod dispatcher;
mod intake;

pub use dispatcher::{AlertDispatcher, DispatchError, DispatchReport, DEFAULT_BROADCAST_TIMEOUT};
pub use intake::{IntakeError, IntakeOutcome, IntakeProcessor};
