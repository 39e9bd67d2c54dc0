//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Build controller → Init client (with retry) → View loop
//!
//! Shutdown (shutdown.rs):
//!     quit command or signal → broadcast → bridge tasks and event listener exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
