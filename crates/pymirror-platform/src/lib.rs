//! Locating and running the external programs pymirror collaborates with.

pub use self::command::Command;
pub use self::error::{Error, Result};
pub use self::tool::Tool;

mod command;
mod error;
mod tool;
