//! Pairing modal.
//!
//! The controller owns exactly one presenter for its whole lifetime; it opens
//! it when a pairing URI arrives and closes it once the approval settles.

pub mod terminal;

pub use terminal::TerminalModal;

/// What the modal shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalRequest {
    pub uri: String,
    pub chains: Vec<String>,
}

/// Displays a pairing URI to the user.
pub trait ModalPresenter: Send + Sync {
    fn open(&self, request: &ModalRequest);

    /// Dismiss the modal. Closing a modal that is not open is a no-op.
    fn close(&self);
}
