//! Modal rendered as a framed block on a terminal.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::modal::{ModalPresenter, ModalRequest};

const RULE: &str = "+------------------------------------------------------------";

/// Writes the pairing URI to `W` (stdout in the binary).
pub struct TerminalModal<W> {
    out: Mutex<W>,
    open: AtomicBool,
}

impl TerminalModal<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalModal<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            open: AtomicBool::new(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn write_lines(&self, lines: &[String]) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                tracing::warn!(error = %e, "Modal write failed");
                return;
            }
        }
        let _ = out.flush();
    }

    /// Consume the modal and return the writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ModalPresenter for TerminalModal<W> {
    fn open(&self, request: &ModalRequest) {
        self.open.store(true, Ordering::SeqCst);
        self.write_lines(&[
            RULE.to_string(),
            "| Scan or paste this URI in your wallet".to_string(),
            "|".to_string(),
            format!("| {}", request.uri),
            "|".to_string(),
            format!("| chains: {}", request.chains.join(", ")),
            "| (type `cancel` to abort)".to_string(),
            RULE.to_string(),
        ]);
        tracing::debug!(chains = ?request.chains, "Modal opened");
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.write_lines(&["| pairing modal closed".to_string()]);
            tracing::debug!("Modal closed");
        }
    }
}
