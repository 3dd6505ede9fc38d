use thiserror::Error;

/// Marker trait for capturable types that can formulate a flag in the Cli.
pub trait CliFlag {}

/// Marker trait for capturable types that can formulate an argument in the Cli.
pub trait CliArgument {}

/// Behaviour to capture an explicit generic type T from an input `&str`.
///
/// We use this at the bottom of the command line parser object graph so the compiler can maintain each field's type.
/// The capability methods (`is_boolean`, `is_cumulative`, `hints`) are how the parser learns what a field accepts.
pub trait GenericCapturable<'a, T> {
    /// Capture a value into the generic type T for this parameter.
    ///
    /// Capturing the same token into a non-cumulative field twice must leave the same state as capturing it once.
    fn capture(&mut self, token: &str) -> Result<(), InvalidCapture>;

    /// Whether the field is a boolean, enabling `--flag` without a value, and `--no-flag`.
    fn is_boolean(&self) -> bool {
        false
    }

    /// Whether the field accumulates repeated values.
    fn is_cumulative(&self) -> bool {
        false
    }

    /// Completion candidates the field knows about on its own (ex: an enumerated set).
    fn hints(&self) -> Vec<String> {
        Vec::default()
    }
}

/// The ways a field can refuse a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidCapture {
    /// The token does not convert to the field's type.
    #[error("cannot convert '{token}' to {type_name}")]
    InvalidConversion {
        /// The offending token.
        token: String,
        /// The type the token was converted to.
        type_name: &'static str,
    },
    /// The token converts, but is not amongst the allowed values.
    #[error("'{token}' is not one of {{{}}}", .choices.join(", "))]
    InvalidChoice {
        /// The offending token.
        token: String,
        /// The allowed values.
        choices: Vec<String>,
    },
}
