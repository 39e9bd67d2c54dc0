//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! view command
//!     → controller.rs (preconditions, state machine)
//!     → connector (connect / disconnect / request)
//!     → modal (pairing URI while approval is pending)
//!     → state.rs (Snapshot published on every change)
//!     → view re-renders
//!
//! connector session_delete
//!     → controller.rs event listener → reset → Snapshot
//! ```
//!
//! # Design Decisions
//! - Errors are returned, never swallowed; the view decides what to print
//! - "Connecting" is an explicit state so duplicate connects are rejected
//!   and the pending approval can be cancelled
//! - Disconnect clears local state even when the remote call fails

pub mod controller;
pub mod error;
pub mod state;
pub mod types;

pub use controller::{SessionController, DISCONNECT_CODE, DISCONNECT_MESSAGE};
pub use error::SessionError;
pub use state::{ClientStatus, ConnectionState, Snapshot};
pub use types::{Metadata, ProposalNamespace, ProposalNamespaces, Session, SessionNamespace};
