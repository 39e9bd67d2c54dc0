//! Dapp-side wallet session client.
//!
//! Pairs with a wallet through a sign-client bridge, shows the pairing URI,
//! and sends a single `eth_sendTransaction` over the approved session.

pub mod config;
pub mod connector;
pub mod lifecycle;
pub mod modal;
pub mod observability;
pub mod resilience;
pub mod session;
pub mod transaction;
pub mod ui;

pub use config::AppConfig;
pub use lifecycle::Shutdown;
pub use session::{SessionController, SessionError, Snapshot};
