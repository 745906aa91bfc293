use core::fmt;

use super::token::{Location, Token};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One diagnostic. The location is taken from the implicated token when one
/// is available.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub severity: Severity,
    pub location: Option<Location>,
    pub text: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        match self.location {
            Some(location) => write!(f, "{}: {}: {}", severity, location, self.text),
            None => write!(f, "{}: unknown location: {}", severity, self.text),
        }
    }
}

/// Append-only diagnostic sink shared by the parser and the checker. A
/// routine that fails always reports here before returning failure.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self { messages: vec![] }
    }

    pub fn message(&mut self, severity: Severity, token: Option<&Token>, text: impl Into<String>) {
        self.messages.push(Message {
            severity,
            location: token.map(|token| token.location),
            text: text.into(),
        });
    }

    pub fn error(&mut self, token: Option<&Token>, text: impl Into<String>) {
        self.message(Severity::Error, token, text);
    }

    pub fn warning(&mut self, token: Option<&Token>, text: impl Into<String>) {
        self.message(Severity::Warning, token, text);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_string(&self, index: usize) -> String {
        self.messages[index].to_string()
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|message| message.severity == Severity::Error)
    }
}
