pub(crate) const HELP_NAME: &str = "help";
pub(crate) const HELP_SHORT: char = 'h';
pub(crate) const HELP_MESSAGE: &str = "Show this help message and exit.";
pub(crate) const HELP_COMMAND_MESSAGE: &str = "Show help for a command.";
pub(crate) const HELP_COMMAND_ARGUMENT: &str = "command";

pub(crate) const VERSION_NAME: &str = "version";
pub(crate) const VERSION_MESSAGE: &str = "Show the program version and exit.";

pub(crate) const COMPLETION_FLAG: &str = "--completion-bash";

pub(crate) const TERMINATOR: &str = "--";
pub(crate) const NEGATION_PREFIX: &str = "no-";
