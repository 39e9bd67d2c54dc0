//! Terminal front end.
//!
//! ```text
//! stdin line → command.rs (parse) → app.rs (spawn controller op) → Notice
//! controller watch channel → view.rs (render) → stdout
//! ```

pub mod app;
pub mod command;
pub mod view;

pub use app::{App, Flow, Notice};
pub use command::{Command, CommandError, HELP};
pub use view::{render, TITLE};
