//! Command dispatch.
//!
//! Every controller operation runs in its own task so the prompt stays
//! responsive; `cancel` must be typeable while `connect` waits for approval.
//! Outcomes come back as [`Notice`]s on an unbounded channel.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::session::{SessionController, SessionError};
use crate::ui::command::{Command, HELP};
use crate::ui::view::render;

/// Whether the input loop keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A line of feedback for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
    View(String),
}

pub struct App {
    controller: Arc<SessionController>,
    explorer_tx_url: String,
    notices: mpsc::UnboundedSender<Notice>,
}

impl App {
    pub fn new(
        controller: Arc<SessionController>,
        explorer_tx_url: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notices, rx) = mpsc::unbounded_channel();
        (
            Self {
                controller,
                explorer_tx_url: explorer_tx_url.into(),
                notices,
            },
            rx,
        )
    }

    pub fn explorer_tx_url(&self) -> &str {
        &self.explorer_tx_url
    }

    pub fn handle(&self, command: Command) -> Flow {
        match command {
            Command::Quit => return Flow::Quit,
            Command::Help => self.notify(Notice::Info(HELP.to_string())),
            Command::Status => {
                let controller = self.controller.clone();
                let notices = self.notices.clone();
                let url = self.explorer_tx_url.clone();
                tokio::spawn(async move {
                    let snapshot = controller.snapshot().await;
                    let _ = notices.send(Notice::View(render(&snapshot, &url)));
                });
            }
            Command::Init => self.run(|c| async move {
                c.initialize().await.map(|()| "client ready".to_string())
            }),
            Command::Connect => self.run(|c| async move {
                c.connect()
                    .await
                    .map(|session| format!("session {} established", session.topic))
            }),
            Command::Cancel => self.run(|c| async move {
                c.cancel_connect().await.map(|()| "connect cancelled".to_string())
            }),
            Command::Disconnect => self.run(|c| async move {
                c.disconnect().await.map(|()| "disconnected".to_string())
            }),
            Command::Send => self.run(|c| async move {
                c.send_transaction()
                    .await
                    .map(|result| format!("transaction submitted: {}", result))
            }),
        }
        Flow::Continue
    }

    fn run<F, Fut>(&self, op: F)
    where
        F: FnOnce(Arc<SessionController>) -> Fut,
        Fut: std::future::Future<Output = Result<String, SessionError>> + Send + 'static,
    {
        let fut = op(self.controller.clone());
        let notices = self.notices.clone();
        tokio::spawn(async move {
            let notice = match fut.await {
                Ok(message) => Notice::Info(message),
                // A cancelled connect is already reported by the cancel command.
                Err(SessionError::Cancelled) => return,
                Err(e) => Notice::Error(e.to_string()),
            };
            let _ = notices.send(notice);
        });
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }
}
