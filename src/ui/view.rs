//! Text rendering of the controller state.

use std::fmt::Write;

use crate::session::{ClientStatus, ConnectionState, Snapshot};

pub const TITLE: &str = "Sign v2 Standalone";

/// Render the single view.
///
/// Disconnected: a connect button, disabled until the client is ready.
/// Connected: the account, disconnect and send buttons, and the explorer
/// link for the last result.
pub fn render(snapshot: &Snapshot, explorer_tx_url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", TITLE);

    match &snapshot.client {
        ClientStatus::Uninitialized | ClientStatus::Initializing => {
            let _ = writeln!(out, "client: initializing");
        }
        ClientStatus::Ready => {}
        ClientStatus::Failed(reason) => {
            let _ = writeln!(out, "client: unavailable ({}), type `init` to retry", reason);
        }
    }

    match &snapshot.connection {
        ConnectionState::Disconnected => {
            if snapshot.can_connect() {
                let _ = writeln!(out, "[connect]");
            } else {
                let _ = writeln!(out, "[connect] (disabled)");
            }
        }
        ConnectionState::Connecting { .. } => {
            let _ = writeln!(out, "waiting for wallet approval...");
            let _ = writeln!(out, "[cancel]");
        }
        ConnectionState::Connected { account, .. } => {
            let _ = writeln!(out, "{}", account.address());
            let _ = writeln!(out, "[disconnect] [send]");
            if let Some(result) = &snapshot.last_result {
                let _ = writeln!(out, "transaction: {}", result.explorer_link(explorer_tx_url));
            }
        }
    }

    out
}
