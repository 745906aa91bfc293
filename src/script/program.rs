use serde::Serialize;

use super::api_version::ApiVersion;
use super::command::Command;

/// A fully parsed script: the declared (or defaulted) API version and the
/// ordered command sequence. Built once by the parser and read-only from
/// then on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Program {
    api_version: ApiVersion,
    commands: Vec<Command>,
}

impl Program {
    pub fn new(api_version: ApiVersion, commands: Vec<Command>) -> Self {
        Self {
            api_version,
            commands,
        }
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn num_commands(&self) -> usize {
        self.commands.len()
    }

    pub fn command(&self, index: usize) -> &Command {
        &self.commands[index]
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}
