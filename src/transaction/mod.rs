//! Transaction and identifier types.
//!
//! # Data Flow
//! ```text
//! Session accounts (CAIP-10)
//!     → types.rs (AccountId, strip chain prefix)
//!     → payload.rs (fixed eth_sendTransaction object)
//!     → connector request
//!     → TransactionResult (explorer link for display)
//! ```

pub mod payload;
pub mod types;

pub use payload::{TransactionPayload, SEND_TRANSACTION_METHOD};
pub use types::{AccountId, ChainId, TransactionError, TransactionResult};
