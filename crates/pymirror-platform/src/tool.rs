//! Configured external tools such as the resolver and the index builder.

use std::fmt;
use std::path::PathBuf;

use crate::command::Command;
use crate::error::{Error, Result};

/// A program plus leading arguments, e.g. `python -m piptools compile`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tool {
    program: String,
    args:    Vec<String>,
}

impl Tool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args:    Vec::new(),
        }
    }

    /// Split a configured command line on whitespace.
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(Error::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str { &self.program }

    /// Absolute path of the program, searched on `PATH`.
    pub fn locate(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| Error::CommandNotFound {
            cmd: self.program.clone(),
        })
    }

    /// Command for this tool with its leading arguments applied.
    pub fn command(&self) -> Result<Command> {
        let path = self.locate()?;
        Ok(Command::new(path).args(&self.args))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
