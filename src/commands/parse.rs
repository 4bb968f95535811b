//! Tokenizer for `/verb --key=value` commands.

use std::collections::BTreeMap;

use crate::error::RelayError;

/// A command split into its verb and keyed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Verb without the leading `/` or any `@bot` suffix.
    pub verb: String,
    /// Arguments by key.
    pub args: BTreeMap<String, String>,
}

/// Errors raised while parsing or running a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The text is not a well-formed command.
    #[error("invalid command: {reason}")]
    InvalidCommand {
        /// What was wrong.
        reason: String,
    },

    /// A required argument was not given.
    #[error("missing argument --{key}")]
    MissingArgument {
        /// The argument key.
        key: String,
    },

    /// An argument the command does not take was given.
    #[error("unknown argument --{key}")]
    UnknownArgument {
        /// The argument key.
        key: String,
    },

    /// The relay operation itself failed.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl CommandError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            reason: reason.into(),
        }
    }

    /// Whether the failure leaves store and live subscriptions out of step.
    pub fn requires_resync(&self) -> bool {
        matches!(self, Self::Relay(e) if e.requires_resync())
    }
}

impl ParsedCommand {
    /// The value of a required argument.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::MissingArgument`] when `key` was not given.
    pub fn require(&self, key: &str) -> Result<&str, CommandError> {
        self.args
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| CommandError::MissingArgument {
                key: key.to_owned(),
            })
    }

    /// Reject any argument outside `allowed`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownArgument`] for the first stray key.
    pub fn allow_only(&self, allowed: &[&str]) -> Result<(), CommandError> {
        match self.args.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(CommandError::UnknownArgument { key: key.clone() }),
            None => Ok(()),
        }
    }
}

/// Parse `/verb --key=value --key=value`.
///
/// A value runs from `=` to the next ` --` and is trimmed. Keys and values
/// must be non-empty and keys may not repeat.
///
/// # Errors
///
/// Returns [`CommandError::InvalidCommand`] for malformed input.
pub fn parse_command(text: &str) -> Result<ParsedCommand, CommandError> {
    let text = text.trim();
    let body = text
        .strip_prefix('/')
        .ok_or_else(|| CommandError::invalid("commands start with '/'"))?;

    let (head, rest) = match body.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest),
        None => (body, ""),
    };
    let verb = head.split('@').next().unwrap_or(head);
    if verb.is_empty() {
        return Err(CommandError::invalid("missing command name"));
    }

    let mut args = BTreeMap::new();
    let rest = rest.trim();
    if !rest.is_empty() {
        let Some(rest) = rest.strip_prefix("--") else {
            return Err(CommandError::invalid(format!(
                "expected --key=value, found {rest:?}"
            )));
        };
        for part in rest.split(" --") {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| CommandError::invalid(format!("expected --key=value in {part:?}")))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(CommandError::invalid("empty argument name"));
            }
            if value.is_empty() {
                return Err(CommandError::invalid(format!("empty value for --{key}")));
            }
            if args.insert(key.to_owned(), value.to_owned()).is_some() {
                return Err(CommandError::invalid(format!("--{key} given twice")));
            }
        }
    }

    Ok(ParsedCommand {
        verb: verb.to_owned(),
        args,
    })
}
