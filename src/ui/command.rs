//! Commands typed at the prompt.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Cancel,
    Disconnect,
    Send,
    Status,
    /// Retry client initialization after a failure.
    Init,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type `help`")]
    Unknown(String),
    #[error("empty input")]
    Empty,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim().to_ascii_lowercase();
        match word.as_str() {
            "" => Err(CommandError::Empty),
            "connect" | "c" => Ok(Command::Connect),
            "cancel" => Ok(Command::Cancel),
            "disconnect" | "d" => Ok(Command::Disconnect),
            "send" | "s" => Ok(Command::Send),
            "status" | "st" => Ok(Command::Status),
            "init" => Ok(Command::Init),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(s.trim().to_string())),
        }
    }
}

pub const HELP: &str = "\
commands:
  connect     propose a session and show the pairing URI
  cancel      abort a pending connect
  disconnect  end the active session
  send        request the wallet to send the demo transaction
  status      show the current view
  init        retry client initialization
  quit        exit";
