use crate::api::{Discard, Parameter, Resolver};
use crate::constant::*;
use crate::model::ClauseKind;
use crate::parser::{
    ActionError, Builtin, ClauseNode, CommandId, CommandNode, ConfigError, ConsoleInterface,
    GeneralParser, ParseContext, Parser, Settings, Terminate, UserInterface, ROOT,
};

/// A command as declared, before it is flattened into the parser.
struct Declaration<'a> {
    node: CommandNode<'a>,
    flags: Vec<ClauseNode<'a>>,
    arguments: Vec<ClauseNode<'a>>,
    children: Vec<Declaration<'a>>,
}

impl<'a> Declaration<'a> {
    fn new(name: impl Into<String>) -> Self {
        Self {
            node: CommandNode::new(name),
            flags: Vec::default(),
            arguments: Vec::default(),
            children: Vec::default(),
        }
    }

    fn add<T: 'a>(&mut self, parameter: Parameter<'a, T>) {
        match parameter.kind() {
            ClauseKind::Flag => self.flags.push(parameter.into_node()),
            _ => self.arguments.push(parameter.into_node()),
        }
    }

    fn uses_short(&self, short: char) -> bool {
        self.flags.iter().any(|flag| flag.short == Some(short))
            || self.children.iter().any(|child| child.uses_short(short))
    }

    /// Move the clauses and sub-commands into the parser, beneath `command`.
    fn populate(
        flags: Vec<ClauseNode<'a>>,
        arguments: Vec<ClauseNode<'a>>,
        children: Vec<Declaration<'a>>,
        parser: &mut Parser<'a>,
        command: CommandId,
    ) -> Result<(), ConfigError> {
        for flag in flags {
            parser.add_flag(command, flag)?;
        }

        for argument in arguments {
            parser.add_argument(command, argument)?;
        }

        for child in children {
            let Declaration {
                node,
                flags,
                arguments,
                children,
            } = child;
            let id = parser.add_command(command, node)?;
            Self::populate(flags, arguments, children, parser, id)?;
        }

        Ok(())
    }
}

fn builtin_flag<'a>(
    name: &str,
    short: Option<char>,
    help: &str,
    builtin: Builtin,
) -> ClauseNode<'a> {
    let mut node = Parameter::flag(Discard::switch(), name, short)
        .help(help)
        .no_envar()
        .into_node();
    node.builtin = Some(builtin);
    node
}

fn help_command<'a>() -> Declaration<'a> {
    let mut help = Declaration::new(HELP_NAME);
    help.node.help = Some(HELP_COMMAND_MESSAGE.to_string());
    help.node.builtin = Some(Builtin::Help);
    help.add(Parameter::argument(Discard::remainder(), HELP_COMMAND_ARGUMENT).no_envar());
    help
}

/// The base command line parser.
///
/// ### Example
/// ```
/// # use pinion_builder as pinion;
/// use pinion::{CommandLineParser};
///
/// let mut parser = CommandLineParser::new("program")
///     // Configure with CommandLineParser::add and CommandLineParser::command.
///     .build();
/// parser.parse_tokens(empty::slice()).unwrap();
/// ```
pub struct CommandLineParser<'a> {
    program: String,
    version: Option<String>,
    root: Declaration<'a>,
    resolvers: Vec<Box<dyn Resolver + 'a>>,
    settings: Settings,
    terminate: Option<Terminate<'a>>,
}

impl<'a> CommandLineParser<'a> {
    /// Create a command line parser.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::CommandLineParser;
    ///
    /// let mut parser = CommandLineParser::new("program")
    ///     .build();
    ///
    /// parser.parse_tokens(vec![].as_slice()).unwrap();
    /// ```
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            root: Declaration::new(program.clone()),
            program,
            version: None,
            resolvers: Vec::default(),
            settings: Settings::default(),
            terminate: None,
        }
    }

    /// Document the about message for this command line parser.
    /// If repeated, only the final help message will apply.
    ///
    /// An about message documents the command line parser in full sentence/paragraph format.
    /// We recommend allowing `pinion` to format this field (ex: it is not recommended to use line breaks `'\n'`).
    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.root.node.help.replace(description.into());
        self
    }

    /// Add a flag/argument to the command line parser.
    ///
    /// The order of argument parameters corresponds to their positional order during parsing.
    /// The order of flag parameters does not affect the command parser semantics.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{CommandLineParser, Parameter, Scalar};
    ///
    /// let mut a: u32 = 0;
    /// let mut b: u32 = 0;
    /// let mut parser = CommandLineParser::new("program")
    ///     .add(Parameter::argument(Scalar::new(&mut a), "a"))
    ///     .add(Parameter::argument(Scalar::new(&mut b), "b"))
    ///     .build();
    ///
    /// parser.parse_tokens(vec!["1", "2"].as_slice()).unwrap();
    /// drop(parser);
    ///
    /// assert_eq!(a, 1);
    /// assert_eq!(b, 2);
    /// ```
    pub fn add<T: 'a>(mut self, parameter: Parameter<'a, T>) -> Self {
        self.root.add(parameter);
        self
    }

    /// Setup a sub-command.
    ///
    /// A command declares either arguments or sub-commands, never both.
    /// Once sub-commands exist, an implicit `help [command...]` command is added as well.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{CommandLineParser, Parameter, Scalar, Switch};
    ///
    /// let mut verbose: bool = false;
    /// let mut name: String = String::default();
    /// let mut parser = CommandLineParser::new("program")
    ///     .add(Parameter::flag(Switch::new(&mut verbose), "verbose", Some('v')))
    ///     .command("remote", |remote| {
    ///         remote
    ///             .about("Manage the set of tracked repositories.")
    ///             .command("add", |add| {
    ///                 add.add(Parameter::argument(Scalar::new(&mut name), "name").required())
    ///             })
    ///     })
    ///     .build();
    ///
    /// let context = parser.parse_tokens(&["remote", "-v", "add", "origin"]).unwrap();
    /// drop(parser);
    ///
    /// assert_eq!(context.selected_command(), "remote add");
    /// assert!(verbose);
    /// assert_eq!(name, "origin");
    /// ```
    pub fn command(
        mut self,
        name: impl Into<String>,
        setup_fn: impl FnOnce(Command<'a>) -> Command<'a>,
    ) -> Self {
        let command = setup_fn(Command::new(name));
        self.root.children.push(command.inner);
        self
    }

    /// Add a `--version` flag, which prints `version` and terminates.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version.replace(version.into());
        self
    }

    /// Register a resolver, consulted for values missing from the command line and the environment.
    /// Resolvers are consulted in registration order; the first with a value wins.
    pub fn resolver(mut self, resolver: impl Resolver + 'a) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Whether flags may appear between positional arguments (default `true`).
    /// When `false`, everything after the first positional argument is positional.
    pub fn interspersed(mut self, interspersed: bool) -> Self {
        self.settings.interspersed = interspersed;
        self
    }

    /// Whether a token `@path` is replaced by the lines of the file at `path` (default `true`).
    pub fn file_expansion(mut self, expand: bool) -> Self {
        self.settings.expand_files = expand;
        self
    }

    /// Derive an environment variable for every flag without an explicit one: `PROGRAM_FLAG_NAME`.
    pub fn default_envars(mut self) -> Self {
        self.settings.default_envars = true;
        self
    }

    /// Prefix the environment variables of every clause with `prefix`.
    pub fn envar_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.root.node.envar_prefix.replace(prefix.into());
        self
    }

    /// Register a validator, run after all pre-actions and before any action.
    pub fn validate(
        mut self,
        validator: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.root.node.validators.push(Box::new(validator));
        self
    }

    /// Run `callback` after parsing, before any validators.
    pub fn pre_action(
        mut self,
        callback: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.root.node.pre_actions.push(Box::new(callback));
        self
    }

    /// Run `callback` after parsing and validation.
    pub fn action(
        mut self,
        callback: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.root.node.actions.push(Box::new(callback));
        self
    }

    /// Replace the termination handler, invoked with exit code `0` after help, the version, or completions are printed.
    /// Defaults to [`std::process::exit`].
    /// If the handler returns, the parse ends there without running any callbacks.
    pub fn terminate(mut self, handler: impl Fn(i32) + 'a) -> Self {
        self.terminate.replace(Box::new(handler));
        self
    }

    pub(crate) fn build_with_interface(
        self,
        user_interface: Box<dyn UserInterface + 'a>,
    ) -> Result<GeneralParser<'a>, ConfigError> {
        let CommandLineParser {
            program,
            version,
            mut root,
            resolvers,
            settings,
            terminate,
        } = self;
        let short = (!root.uses_short(HELP_SHORT)).then_some(HELP_SHORT);
        let mut builtins = vec![builtin_flag(HELP_NAME, short, HELP_MESSAGE, Builtin::Help)];

        if version.is_some() {
            builtins.push(builtin_flag(
                VERSION_NAME,
                None,
                VERSION_MESSAGE,
                Builtin::Version,
            ));
        }

        root.flags.splice(0..0, builtins);

        if !root.children.is_empty()
            && !root
                .children
                .iter()
                .any(|child| child.node.answers_to(HELP_NAME))
        {
            root.children.push(help_command());
        }

        let Declaration {
            node,
            flags,
            arguments,
            children,
        } = root;
        let mut parser = Parser::new(program, node, settings);
        parser.resolvers = resolvers;
        Declaration::populate(flags, arguments, children, &mut parser, ROOT)?;
        parser.validate()?;

        let terminate =
            terminate.unwrap_or_else(|| Box::new(|exit_code| std::process::exit(exit_code)));
        Ok(GeneralParser::new(
            version,
            parser,
            user_interface,
            terminate,
        ))
    }

    /// Build the command line parser as a Result.
    /// This finalizes the configuration and checks for errors (ex: a repeated flag name).
    pub fn build_parser(self) -> Result<GeneralParser<'a>, ConfigError> {
        self.build_with_interface(Box::new(ConsoleInterface::default()))
    }

    /// Build the command line parser.
    /// This finalizes the configuration and checks for errors (ex: a repeated flag name).
    /// If an error is encountered, exits with error code `1` (via [`std::process::exit`]).
    pub fn build(self) -> GeneralParser<'a> {
        match self.build_parser() {
            Ok(gp) => gp,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }
}

/// A sub-command.
///
/// Used with [`CommandLineParser::command`] and [`Command::command`].
pub struct Command<'a> {
    inner: Declaration<'a>,
}

impl<'a> Command<'a> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Declaration::new(name),
        }
    }

    /// *Available using 'unit_test' crate feature only.*</br></br>
    /// Build a [`Command`] for use in testing.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{Command, Parameter, Scalar};
    ///
    /// // Function under test.
    /// // We want to make sure the setup_fn is wired up correctly.
    /// pub fn setup_fn<'a>(value: &'a mut u32) -> impl FnOnce(Command<'a>) -> Command<'a> {
    ///     |command| command.add(Parameter::argument(Scalar::new(value), "value"))
    /// }
    ///
    /// let mut x: u32 = 1;
    /// let mut parser = setup_fn(&mut x)(Command::test_dummy()).build_parser().unwrap();
    /// parser.parse_tokens(vec!["2"].as_slice()).unwrap();
    /// drop(parser);
    /// assert_eq!(x, 2);
    /// ```
    #[cfg(feature = "unit_test")]
    pub fn test_dummy() -> Self {
        Command::new("test-dummy")
    }

    /// *Available using 'unit_test' crate feature only.*</br></br>
    /// Build a [`GeneralParser`] for testing.
    /// See [`Command::test_dummy`] for an example.
    #[cfg(feature = "unit_test")]
    pub fn build_parser(self) -> Result<GeneralParser<'a>, ConfigError> {
        let mut parser = CommandLineParser::new(self.inner.node.name.clone());
        parser.root = self.inner;
        parser.build_parser()
    }

    /// Add an alternative name for this command.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.inner.node.aliases.push(alias.into());
        self
    }

    /// Document the about message for this command.
    /// If repeated, only the final help message will apply.
    ///
    /// See [`CommandLineParser::command`] for usage.
    pub fn about(mut self, description: impl Into<String>) -> Self {
        self.inner.node.help.replace(description.into());
        self
    }

    /// Hide this command from help and completion; it can still be selected.
    pub fn hidden(mut self) -> Self {
        self.inner.node.hidden = true;
        self
    }

    /// Select this command when its parent is given no (matching) sub-command.
    /// At most one sibling may be the default.
    pub fn default(mut self) -> Self {
        self.inner.node.is_default = true;
        self
    }

    /// Add a flag/argument to the command.
    ///
    /// The command's flags are visible to all of its sub-commands.
    /// See [`CommandLineParser::add`] for details.
    pub fn add<T: 'a>(mut self, parameter: Parameter<'a, T>) -> Self {
        self.inner.add(parameter);
        self
    }

    /// Setup a nested sub-command.
    pub fn command(
        mut self,
        name: impl Into<String>,
        setup_fn: impl FnOnce(Command<'a>) -> Command<'a>,
    ) -> Self {
        let command = setup_fn(Command::new(name));
        self.inner.children.push(command.inner);
        self
    }

    /// Register a validator, run when this command is selected.
    pub fn validate(
        mut self,
        validator: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.inner.node.validators.push(Box::new(validator));
        self
    }

    /// Run `callback` when this command is selected, before any validators.
    pub fn pre_action(
        mut self,
        callback: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.inner.node.pre_actions.push(Box::new(callback));
        self
    }

    /// Run `callback` when this command is selected, after validation.
    pub fn action(
        mut self,
        callback: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.inner.node.actions.push(Box::new(callback));
        self
    }

    /// Prefix the environment variables of the clauses in this command (and beneath) with `prefix`.
    /// Prefixes combine along the command path: `PARENT_CHILD_NAME`.
    pub fn envar_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.inner.node.envar_prefix.replace(prefix.into());
        self
    }
}
