use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::api::{InvalidCapture, Resolver, ResolverError};
use crate::model::{ClauseKind, Completion, ValueSource};
use crate::parser::ParseContext;
use crate::tokens::ShortFlags;

pub(crate) type CommandId = usize;
pub(crate) type FlagId = usize;
pub(crate) type ArgumentId = usize;

/// The root command always sits at the front of the arena.
pub(crate) const ROOT: CommandId = 0;

/// The error type returned by a failing dispatch, pre-action, validator or action.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub(crate) type Callback<'a> = Box<dyn FnMut(&ParseContext) -> Result<(), ActionError> + 'a>;
pub(crate) type HintAction<'a> = Box<dyn Fn() -> Vec<String> + 'a>;

/// A declaration error, detected when the parser is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Two flags share a long name within one effective namespace.
    #[error("duplicate flag '--{0}'")]
    DuplicateFlag(String),
    /// Two flags share a short name within one effective namespace.
    #[error("duplicate short flag '-{0}'")]
    DuplicateShortFlag(char),
    /// A command declares two arguments with the same name: (command, argument).
    #[error("command '{0}' has duplicate argument '{1}'")]
    DuplicateArgument(String, String),
    /// Two sibling commands share a name or alias.
    #[error("duplicate command '{0}'")]
    DuplicateCommand(String),
    /// A required flag/argument declares a default value that could never be used.
    #[error("'{0}' is required, so its default value would never be used")]
    RequiredWithDefault(String),
    /// A single valued flag/argument declares more than one default.
    #[error("'{0}' accepts a single value but declares multiple defaults")]
    MultipleDefaults(String),
    /// A required argument follows an optional one.
    #[error("required argument '{0}' cannot follow an optional argument")]
    RequiredAfterOptional(String),
    /// An argument consuming the remaining input is followed by another argument.
    #[error("argument '{0}' consumes the remaining input, so it must be last")]
    RemainderNotLast(String),
    /// A command declares both arguments and sub-commands.
    #[error("command '{0}' cannot mix arguments with sub-commands")]
    ArgumentsAndCommands(String),
    /// More than one sibling command is marked as the default.
    #[error("command '{0}' has more than one default sub-command")]
    MultipleDefaultCommands(String),
}

/// A failure to parse the command line input.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A bare `-`.
    #[error("expected a short flag after '-'")]
    MalformedShortFlag,
    /// A `--name` which no command in scope declares.
    #[error("unknown long flag '--{0}'")]
    UnknownLongFlag(String),
    /// A `-n` which no command in scope declares.
    #[error("unknown short flag '-{0}'")]
    UnknownShortFlag(char),
    /// A `--no-name` for a flag which is not a boolean.
    #[error("flag '--{0}' takes a value and cannot be negated")]
    NonNegatable(String),
    /// A flag which takes a value was not followed by one.
    #[error("expected argument for flag '{0}'")]
    ExpectedFlagArgument(String),
    /// A single valued flag was given more than once.
    #[error("flag '--{0}' cannot be repeated")]
    RepeatedFlag(String),
    /// Required flags with neither a command line nor a fallback value.
    #[error("{}", missing_flags(.0))]
    MissingRequiredFlags(Vec<String>),
    /// A required argument with neither a command line nor a fallback value.
    #[error("required argument '{0}' not provided")]
    MissingRequiredArgument(String),
    /// The input ended where a sub-command was expected.
    #[error("expected command but none was specified")]
    MissingCommand,
    /// A positional which names no sub-command.
    #[error("expected command but got '{0}'")]
    UnknownCommand(String),
    /// Input left over once every argument is satisfied.
    #[error("{}", unexpected_arguments(.0))]
    UnexpectedArguments(Vec<String>),
    /// A command line value the clause refused.
    #[error("invalid value for '{clause}': {source}")]
    InvalidValue {
        /// The refusing flag/argument.
        clause: String,
        /// Why the value was refused.
        source: InvalidCapture,
    },
    /// An environment, resolver or default value the clause refused.
    #[error("invalid {origin} value for '{clause}': {source}")]
    InvalidFallbackValue {
        /// The refusing flag/argument.
        clause: String,
        /// Where the value came from.
        origin: ValueSource,
        /// Why the value was refused.
        source: InvalidCapture,
    },
    /// A fallback produced several values for a single valued clause.
    #[error("'{clause}' accepts a single value, but the {origin} provided {count}")]
    MultipleValues {
        /// The single valued flag/argument.
        clause: String,
        /// Where the values came from.
        origin: ValueSource,
        /// How many values were provided.
        count: usize,
    },
    /// An `@path` argument file could not be read.
    #[error("cannot read arguments file '{path}': {source}")]
    ArgumentFile {
        /// The file named after `@`.
        path: String,
        /// The underlying read failure.
        source: std::io::Error,
    },
    /// A registered resolver failed.
    #[error("resolver failed for '{key}': {source}")]
    Resolver {
        /// The key being resolved.
        key: String,
        /// The resolver's error, unchanged.
        source: ResolverError,
    },
    /// A dispatch, pre-action, validator or action failed; carries the callback's error unchanged.
    #[error(transparent)]
    Action(ActionError),
}

fn missing_flags(names: &[String]) -> String {
    let flags: Vec<String> = names.iter().map(|name| format!("--{name}")).collect();

    if flags.len() == 1 {
        format!("required flag {} not provided", flags[0])
    } else {
        format!("required flags {} not provided", flags.join(", "))
    }
}

fn unexpected_arguments(tokens: &[String]) -> String {
    if tokens.len() == 1 {
        format!("unexpected argument '{}'", tokens[0])
    } else {
        format!("unexpected arguments '{}'", tokens.join(" "))
    }
}

/// Behaviour to capture an implicit generic type T from an input `&str`.
///
/// We use this at the middle/top of the parser object graph so that different types may all be captured in a single parser.
pub(crate) trait AnonymousCapturable {
    fn capture(&mut self, value: &str) -> Result<(), InvalidCapture>;

    fn is_boolean(&self) -> bool;

    fn is_cumulative(&self) -> bool;

    fn hints(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Help,
    Version,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Before,
    After,
}

#[derive(Default)]
pub(crate) struct Hints<'a> {
    pub(crate) options: Vec<String>,
    pub(crate) actions: Vec<HintAction<'a>>,
    pub(crate) files: bool,
    pub(crate) directories: bool,
}

/// A flag or argument, as held in the parser arena.
pub(crate) struct ClauseNode<'a> {
    pub(crate) kind: ClauseKind,
    pub(crate) name: String,
    pub(crate) short: Option<char>,
    pub(crate) help: Option<String>,
    pub(crate) placeholder: Option<String>,
    pub(crate) choices: BTreeMap<String, String>,
    pub(crate) required: bool,
    pub(crate) hidden: bool,
    pub(crate) defaults: Vec<String>,
    pub(crate) envar: Option<String>,
    pub(crate) no_envar: bool,
    pub(crate) value: Box<dyn AnonymousCapturable + 'a>,
    pub(crate) hints: Hints<'a>,
    pub(crate) dispatch: Option<Callback<'a>>,
    pub(crate) pre_actions: Vec<Callback<'a>>,
    pub(crate) actions: Vec<Callback<'a>>,
    pub(crate) owner: CommandId,
    pub(crate) builtin: Option<Builtin>,
}

impl<'a> ClauseNode<'a> {
    pub(crate) fn new(
        kind: ClauseKind,
        name: impl Into<String>,
        value: Box<dyn AnonymousCapturable + 'a>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            short: None,
            help: None,
            placeholder: None,
            choices: BTreeMap::default(),
            required: false,
            hidden: false,
            defaults: Vec::default(),
            envar: None,
            no_envar: false,
            value,
            hints: Hints::default(),
            dispatch: None,
            pre_actions: Vec::default(),
            actions: Vec::default(),
            owner: ROOT,
            builtin: None,
        }
    }

    pub(crate) fn is_boolean(&self) -> bool {
        self.value.is_boolean()
    }

    pub(crate) fn is_cumulative(&self) -> bool {
        self.value.is_cumulative()
    }

    /// How the clause reads in messages (ex: `--ttl` vs. `name`).
    pub(crate) fn display_name(&self) -> String {
        match self.kind {
            ClauseKind::Flag => format!("--{}", self.name),
            _ => self.name.clone(),
        }
    }

    fn has_user_hints(&self) -> bool {
        !self.choices.is_empty()
            || !self.hints.options.is_empty()
            || !self.hints.actions.is_empty()
            || self.hints.files
            || self.hints.directories
    }

    /// The completion candidates for this clause's value.
    /// Declared hints replace the value's own hints entirely.
    pub(crate) fn completion(&self) -> Completion {
        if !self.has_user_hints() {
            return Completion::words(self.value.hints());
        }

        let mut words: Vec<String> = self.choices.keys().cloned().collect();

        for option in &self.hints.options {
            if !words.contains(option) {
                words.push(option.clone());
            }
        }

        for action in &self.hints.actions {
            for word in action() {
                if !words.contains(&word) {
                    words.push(word);
                }
            }
        }

        Completion {
            directories: self.hints.directories,
            files: self.hints.files,
            words,
        }
    }

    pub(crate) fn callbacks(&mut self, phase: Phase) -> &mut Vec<Callback<'a>> {
        match phase {
            Phase::Before => &mut self.pre_actions,
            Phase::After => &mut self.actions,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FlagGroup {
    pub(crate) order: Vec<FlagId>,
    pub(crate) long: HashMap<String, FlagId>,
    pub(crate) short: HashMap<char, FlagId>,
}

/// A command, as held in the parser arena.
pub(crate) struct CommandNode<'a> {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) help: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) is_default: bool,
    pub(crate) parent: Option<CommandId>,
    pub(crate) envar_prefix: Option<String>,
    pub(crate) builtin: Option<Builtin>,
    pub(crate) flags: FlagGroup,
    pub(crate) arguments: Vec<ArgumentId>,
    pub(crate) children: Vec<CommandId>,
    pub(crate) validators: Vec<Callback<'a>>,
    pub(crate) pre_actions: Vec<Callback<'a>>,
    pub(crate) actions: Vec<Callback<'a>>,
}

impl<'a> CommandNode<'a> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::default(),
            help: None,
            hidden: false,
            is_default: false,
            parent: None,
            envar_prefix: None,
            builtin: None,
            flags: FlagGroup::default(),
            arguments: Vec::default(),
            children: Vec::default(),
            validators: Vec::default(),
            pre_actions: Vec::default(),
            actions: Vec::default(),
        }
    }

    pub(crate) fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    pub(crate) fn callbacks(&mut self, phase: Phase) -> &mut Vec<Callback<'a>> {
        match phase {
            Phase::Before => &mut self.pre_actions,
            Phase::After => &mut self.actions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) interspersed: bool,
    pub(crate) expand_files: bool,
    pub(crate) default_envars: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interspersed: true,
            expand_files: true,
            default_envars: false,
        }
    }
}

/// The command tree, flattened into an arena addressed by index.
pub(crate) struct Parser<'a> {
    pub(crate) program: String,
    pub(crate) commands: Vec<CommandNode<'a>>,
    pub(crate) flags: Vec<ClauseNode<'a>>,
    pub(crate) arguments: Vec<ClauseNode<'a>>,
    pub(crate) resolvers: Vec<Box<dyn Resolver + 'a>>,
    pub(crate) settings: Settings,
}

impl<'a> std::fmt::Debug for Parser<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("program", &self.program)
            .field("commands", &self.commands.len())
            .field("flags", &self.flags.len())
            .field("arguments", &self.arguments.len())
            .finish()
    }
}

impl<'a> Parser<'a> {
    /// Create a parser holding only the root command.
    pub(crate) fn new(program: impl Into<String>, root: CommandNode<'a>, settings: Settings) -> Self {
        let mut root = root;
        root.parent = None;
        Self {
            program: program.into(),
            commands: vec![root],
            flags: Vec::default(),
            arguments: Vec::default(),
            resolvers: Vec::default(),
            settings,
        }
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self::new("program", CommandNode::new("program"), Settings::default())
    }

    pub(crate) fn add_command(
        &mut self,
        parent: CommandId,
        mut command: CommandNode<'a>,
    ) -> Result<CommandId, ConfigError> {
        for &sibling in &self.commands[parent].children {
            let sibling = &self.commands[sibling];

            for name in std::iter::once(&command.name).chain(command.aliases.iter()) {
                if sibling.answers_to(name) {
                    return Err(ConfigError::DuplicateCommand(name.clone()));
                }
            }
        }

        let id = self.commands.len();
        command.parent = Some(parent);
        self.commands.push(command);
        self.commands[parent].children.push(id);
        Ok(id)
    }

    pub(crate) fn add_flag(
        &mut self,
        owner: CommandId,
        mut flag: ClauseNode<'a>,
    ) -> Result<FlagId, ConfigError> {
        let id = self.flags.len();
        let group = &mut self.commands[owner].flags;

        if group.long.contains_key(&flag.name) {
            return Err(ConfigError::DuplicateFlag(flag.name));
        }

        if let Some(short) = flag.short {
            if group.short.contains_key(&short) {
                return Err(ConfigError::DuplicateShortFlag(short));
            }

            group.short.insert(short, id);
        }

        group.long.insert(flag.name.clone(), id);
        group.order.push(id);
        flag.owner = owner;
        self.flags.push(flag);
        Ok(id)
    }

    pub(crate) fn add_argument(
        &mut self,
        owner: CommandId,
        mut argument: ClauseNode<'a>,
    ) -> Result<ArgumentId, ConfigError> {
        let id = self.arguments.len();
        let command = &self.commands[owner];

        if command
            .arguments
            .iter()
            .any(|&other| self.arguments[other].name == argument.name)
        {
            return Err(ConfigError::DuplicateArgument(
                command.name.clone(),
                argument.name,
            ));
        }

        argument.owner = owner;
        self.arguments.push(argument);
        self.commands[owner].arguments.push(id);
        Ok(id)
    }

    /// Check the declaration invariants which span more than one clause or command.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for command in &self.commands {
            if !command.arguments.is_empty() && !command.children.is_empty() {
                return Err(ConfigError::ArgumentsAndCommands(command.name.clone()));
            }

            let defaults = command
                .children
                .iter()
                .filter(|&&child| self.commands[child].is_default)
                .count();

            if defaults > 1 {
                return Err(ConfigError::MultipleDefaultCommands(command.name.clone()));
            }

            let mut optional_seen = false;

            for (index, &argument) in command.arguments.iter().enumerate() {
                let argument = &self.arguments[argument];

                if argument.required && optional_seen {
                    return Err(ConfigError::RequiredAfterOptional(argument.name.clone()));
                }

                if !argument.required {
                    optional_seen = true;
                }

                if argument.is_cumulative() && index + 1 < command.arguments.len() {
                    return Err(ConfigError::RemainderNotLast(argument.name.clone()));
                }
            }

            for &flag in &command.flags.order {
                let flag = &self.flags[flag];
                let mut ancestor = command.parent;

                while let Some(parent) = ancestor {
                    let group = &self.commands[parent].flags;

                    if group.long.contains_key(&flag.name) {
                        return Err(ConfigError::DuplicateFlag(flag.name.clone()));
                    }

                    if let Some(short) = flag.short {
                        if group.short.contains_key(&short) {
                            return Err(ConfigError::DuplicateShortFlag(short));
                        }
                    }

                    ancestor = self.commands[parent].parent;
                }
            }
        }

        for clause in self.flags.iter().chain(self.arguments.iter()) {
            if clause.required && !clause.defaults.is_empty() {
                return Err(ConfigError::RequiredWithDefault(clause.display_name()));
            }

            if !clause.is_cumulative() && clause.defaults.len() > 1 {
                return Err(ConfigError::MultipleDefaults(clause.display_name()));
            }
        }

        Ok(())
    }

    /// Find the long flag `name`, searching the scope chain innermost first.
    pub(crate) fn find_flag(&self, chain: &[CommandId], name: &str) -> Option<FlagId> {
        chain
            .iter()
            .rev()
            .find_map(|&command| self.commands[command].flags.long.get(name).copied())
    }

    /// Find the short flag `short`, searching the scope chain innermost first.
    pub(crate) fn find_short(&self, chain: &[CommandId], short: char) -> Option<FlagId> {
        chain
            .iter()
            .rev()
            .find_map(|&command| self.commands[command].flags.short.get(&short).copied())
    }

    pub(crate) fn child_named(&self, command: CommandId, name: &str) -> Option<CommandId> {
        self.commands[command]
            .children
            .iter()
            .copied()
            .find(|&child| self.commands[child].answers_to(name))
    }

    pub(crate) fn default_child(&self, command: CommandId) -> Option<CommandId> {
        self.commands[command]
            .children
            .iter()
            .copied()
            .find(|&child| self.commands[child].is_default)
    }

    /// The commands from the root down to (and including) `command`.
    pub(crate) fn lineage(&self, command: CommandId) -> Vec<CommandId> {
        let mut lineage = vec![command];
        let mut current = command;

        while let Some(parent) = self.commands[current].parent {
            lineage.push(parent);
            current = parent;
        }

        lineage.reverse();
        lineage
    }

    /// The canonical command names from below the root down to `command`.
    pub(crate) fn path_of(&self, command: CommandId) -> Vec<String> {
        self.lineage(command)
            .into_iter()
            .skip(1)
            .map(|id| self.commands[id].name.clone())
            .collect()
    }
}

/// The short flags visible from a scope chain.
pub(crate) struct Scope<'p, 'a> {
    pub(crate) parser: &'p Parser<'a>,
    pub(crate) chain: &'p [CommandId],
}

impl<'p, 'a> ShortFlags for Scope<'p, 'a> {
    fn takes_value(&self, short: char) -> bool {
        self.parser
            .find_short(self.chain, short)
            .map(|flag| !self.parser.flags[flag].is_boolean())
            .unwrap_or(false)
    }
}
