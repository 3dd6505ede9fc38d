use std::env;

use crate::constant::COMPLETION_FLAG;
use crate::model::Completion;
use crate::parser::base::*;
use crate::parser::interface::UserInterface;
use crate::parser::{ElementId, ParseContext};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

pub(crate) type Terminate<'a> = Box<dyn Fn(i32) + 'a>;

/// The configured command line parser.
/// Built via `CommandLineParser::build` (or `build_parser`).
pub struct GeneralParser<'a> {
    program: String,
    version: Option<String>,
    parser: Parser<'a>,
    user_interface: Box<dyn UserInterface + 'a>,
    terminate: Terminate<'a>,
}

impl<'a> std::fmt::Debug for GeneralParser<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneralParser")
            .field("program", &self.program)
            .field("version", &self.version)
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl<'a> GeneralParser<'a> {
    pub(crate) fn new(
        version: Option<String>,
        parser: Parser<'a>,
        user_interface: Box<dyn UserInterface + 'a>,
        terminate: Terminate<'a>,
    ) -> Self {
        Self {
            program: parser.program.clone(),
            version,
            parser,
            user_interface,
            terminate,
        }
    }

    /// Run the command line parser against the input tokens, without reporting errors.
    ///
    /// Parsing happens in two phases:
    /// 1. Structural resolution matches the tokens to commands, flags and arguments, capturing each value into its bound variable as it is matched.
    /// Flags and arguments not on the command line are settled through their environment variable, the registered resolvers, and finally their default.
    /// 2. Callbacks run over the selected command path: pre-actions, then validators, then actions.
    ///
    /// When help or the version is requested, it is printed and the termination handler is invoked with `0`.
    /// The same happens for a `--completion-bash` request, which prints one completion candidate per line.
    /// If the termination handler returns, the context is handed back as it stands: structural errors are dropped and no callbacks run.
    pub fn try_parse_tokens(&mut self, tokens: &[&str]) -> Result<ParseContext, ParseError> {
        if let Some((&COMPLETION_FLAG, partial)) = tokens.split_first() {
            let (mut context, completion) = self.parser.resolve_completions(partial);

            for word in &completion.words {
                self.user_interface.print(word.clone());
            }

            context.completion = Some(completion);
            (self.terminate)(0);
            return Ok(context);
        }

        let mut context = ParseContext::new(tokens, self.parser.settings.expand_files);
        let result = self.parser.resolve_command(&mut context, ROOT);

        if context.help_requested {
            let target = self.help_target(&context)?;
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Printing help for command #{target}.");
            }
            self.parser
                .help_printer(target)
                .print_help(&*self.user_interface);
            (self.terminate)(0);
            context.path = self.parser.path_of(context.current());
            return Ok(context);
        }

        if context.version_requested {
            if let Some(version) = &self.version {
                self.user_interface.print(version.clone());
            }

            (self.terminate)(0);
            context.path = self.parser.path_of(context.current());
            return Ok(context);
        }

        context.path = result?;
        self.parser.run_callbacks(&context)?;
        Ok(context)
    }

    /// Run the command line parser against the input tokens.
    ///
    /// Any error is reported through the user interface as `"{program}: error: {error}"`, after which this returns with `Err(1)`.
    /// See [`GeneralParser::try_parse_tokens`] for details.
    pub fn parse_tokens(&mut self, tokens: &[&str]) -> Result<ParseContext, i32> {
        self.try_parse_tokens(tokens).map_err(|error| {
            self.user_interface.print_error(&self.program, &error);
            1
        })
    }

    /// Run the command line parser against the Cli [`env::args`].
    ///
    /// If the parser encounters an error, it will exit with error code `1` (via `std::process::exit`).
    /// See [`GeneralParser::try_parse_tokens`] for details.
    pub fn parse(mut self) -> ParseContext {
        let command_input: Vec<String> = env::args().skip(1).collect();
        let tokens: Vec<&str> = command_input.iter().map(AsRef::as_ref).collect();

        match self.parse_tokens(tokens.as_slice()) {
            Ok(context) => context,
            Err(exit_code) => std::process::exit(exit_code),
        }
    }

    /// The completion candidates for a partially typed command line (excluding the program name).
    ///
    /// Nothing is captured and no callbacks run.
    pub fn complete(&mut self, partial: &[&str]) -> Completion {
        self.parser.resolve_completions(partial).1
    }

    /// The command to describe: the selected one, or the path named by the `help` command.
    fn help_target(&self, context: &ParseContext) -> Result<CommandId, ParseError> {
        let current = context.current();

        if self.parser.commands[current].builtin != Some(Builtin::Help) {
            return Ok(current);
        }

        let mut target = ROOT;

        for element in context.elements() {
            if let ElementId::Argument(argument) = element.id {
                if self.parser.arguments[argument].owner == current {
                    let name = element.value().unwrap_or_default();
                    target = self
                        .parser
                        .child_named(target, name)
                        .ok_or_else(|| ParseError::UnknownCommand(name.to_string()))?;
                }
            }
        }

        Ok(target)
    }
}
