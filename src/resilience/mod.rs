//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Client initialization:
//!     → backoff.rs (delay between attempts, capped, jittered)
//!
//! Bridge round trips and approval waits:
//!     → timeouts.rs (local deadline, 0 disables)
//! ```
//!
//! # Design Decisions
//! - Only initialization is retried; proposals and requests are not
//! - Every bridge call has a deadline

pub mod backoff;
pub mod timeouts;

pub use backoff::Backoff;
pub use timeouts::{with_deadline, TimedOut};
