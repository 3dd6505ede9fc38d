use std::fmt::Display;
use std::marker::PhantomData;

use crate::api::{CliArgument, CliFlag, GenericCapturable};
use crate::model::ClauseKind;
use crate::parser::{ActionError, AnonymousCapturable, ClauseNode, ParseContext};
use crate::prelude::Choices;
use crate::InvalidCapture;

pub(crate) struct AnonymousCapture<'a, T: 'a> {
    field: Box<dyn GenericCapturable<'a, T> + 'a>,
}

impl<'a, T> AnonymousCapture<'a, T> {
    pub(crate) fn bind(field: impl GenericCapturable<'a, T> + 'a) -> Self {
        Self {
            field: Box::new(field),
        }
    }
}

impl<'a, T> AnonymousCapturable for AnonymousCapture<'a, T> {
    fn capture(&mut self, value: &str) -> Result<(), InvalidCapture> {
        self.field.capture(value)
    }

    fn is_boolean(&self) -> bool {
        self.field.is_boolean()
    }

    fn is_cumulative(&self) -> bool {
        self.field.is_cumulative()
    }

    fn hints(&self) -> Vec<String> {
        self.field.hints()
    }
}

/// A flag/argument for the command line parser.
/// Used with [`CommandLineParser::add`](./struct.CommandLineParser.html#method.add) and [`Command::add`](./struct.Command.html#method.add).
pub struct Parameter<'a, T> {
    inner: ClauseNode<'a>,
    _phantom: PhantomData<T>,
}

impl<'a, T> std::fmt::Debug for Parameter<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short = match &self.inner.short {
            Some(s) => format!(" -{s},"),
            None => "".to_string(),
        };

        write!(
            f,
            "{kind:?}[{t},{short} {name}]",
            kind = self.inner.kind,
            t = std::any::type_name::<T>(),
            name = self.inner.display_name(),
        )
    }
}

impl<'a, T: 'a> Parameter<'a, T> {
    fn new(kind: ClauseKind, field: impl GenericCapturable<'a, T> + 'a, name: String) -> Self {
        Self {
            inner: ClauseNode::new(kind, name, Box::new(AnonymousCapture::bind(field))),
            _phantom: PhantomData,
        }
    }

    /// Create a flag parameter.
    /// Flags match `--name` (and `-short` when given), anywhere in the scope of their command.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{Parameter, Switch};
    ///
    /// let mut verbose: bool = false;
    /// Parameter::flag(Switch::new(&mut verbose), "verbose", Some('v'));
    /// ```
    pub fn flag(
        field: impl GenericCapturable<'a, T> + CliFlag + 'a,
        name: impl Into<String>,
        short: Option<char>,
    ) -> Self {
        let mut parameter = Self::new(ClauseKind::Flag, field, name.into());
        parameter.inner.short = short;
        parameter
    }

    /// Create a positional argument parameter.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{Parameter, Scalar};
    ///
    /// let mut host: String = String::default();
    /// Parameter::argument(Scalar::new(&mut host), "host");
    /// ```
    pub fn argument(
        field: impl GenericCapturable<'a, T> + CliArgument + 'a,
        name: impl Into<String>,
    ) -> Self {
        Self::new(ClauseKind::Argument, field, name.into())
    }

    /// Document the help message for this parameter.
    /// If repeated, only the final message will apply to the parameter.
    ///
    /// A help message describes the parameter in full sentence/paragraph format.
    /// We recommend allowing `pinion` to format this field (ex: it is not recommended to use line breaks `'\n'`).
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{Parameter, Switch};
    ///
    /// let mut verbose: bool = false;
    /// Parameter::flag(Switch::new(&mut verbose), "verbose", None)
    ///     .help("--this will get discarded--")
    ///     .help("Make the program output verbose.  Description may include multiple sentences.");
    /// ```
    pub fn help(mut self, description: impl Into<String>) -> Self {
        self.inner.help = Some(description.into());
        self
    }

    /// Require this parameter.
    /// A required parameter may not declare a default (checked when the parser is built).
    pub fn required(mut self) -> Self {
        self.inner.required = true;
        self
    }

    /// Hide this parameter from help and completion; it still parses.
    pub fn hidden(mut self) -> Self {
        self.inner.hidden = true;
        self
    }

    /// The name of the value in help messages (ex: `--ttl DURATION`).
    /// Defaults to the upper-cased parameter name.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.inner.placeholder = Some(placeholder.into());
        self
    }

    /// Read the value from the environment variable `name` when the parameter is not on the command line.
    ///
    /// The name is combined with the envar prefixes of the enclosing commands.
    /// An empty environment variable counts as unset.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{Parameter, Scalar};
    ///
    /// let mut token: String = String::default();
    /// Parameter::flag(Scalar::new(&mut token), "token", None)
    ///     .envar("API_TOKEN");
    /// ```
    pub fn envar(mut self, name: impl Into<String>) -> Self {
        self.inner.envar = Some(name.into());
        self
    }

    /// Never read this parameter from the environment, even under `default_envars`.
    pub fn no_envar(mut self) -> Self {
        self.inner.envar = None;
        self.inner.no_envar = true;
        self
    }

    /// Declare a static default, used when neither the command line, the environment, nor a resolver provides a value.
    /// If repeated, the values accumulate (a non-cumulative parameter accepts only one, checked when the parser is built).
    pub fn default(mut self, value: T) -> Self
    where
        T: Display,
    {
        self.inner.defaults.push(value.to_string());
        self
    }

    /// Declare several static defaults at once, for cumulative parameters.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{Collection, Parameter};
    ///
    /// let mut ports: Vec<u16> = Vec::default();
    /// Parameter::flag(Collection::new(&mut ports), "port", Some('p'))
    ///     .defaults([80, 443]);
    /// ```
    pub fn defaults(mut self, values: impl IntoIterator<Item = T>) -> Self
    where
        T: Display,
    {
        self.inner
            .defaults
            .extend(values.into_iter().map(|value| value.to_string()));
        self
    }

    /// Offer fixed completion candidates for the value.
    pub fn hint_options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inner
            .hints
            .options
            .extend(options.into_iter().map(Into::into));
        self
    }

    /// Offer completion candidates computed on demand (only when completing).
    pub fn hint_action(mut self, action: impl Fn() -> Vec<String> + 'a) -> Self {
        self.inner.hints.actions.push(Box::new(action));
        self
    }

    /// Ask the shell to complete file names for the value.
    pub fn hint_files(mut self) -> Self {
        self.inner.hints.files = true;
        self
    }

    /// Ask the shell to complete directory names for the value.
    pub fn hint_directories(mut self) -> Self {
        self.inner.hints.directories = true;
        self
    }

    /// Run `callback` the moment this parameter is matched on the command line, before the rest of the line is parsed.
    /// Replaces any previous dispatch callback.
    pub fn dispatch(
        mut self,
        callback: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.inner.dispatch = Some(Box::new(callback));
        self
    }

    /// Run `callback` after parsing, before any validators, when this parameter was matched.
    pub fn pre_action(
        mut self,
        callback: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.inner.pre_actions.push(Box::new(callback));
        self
    }

    /// Run `callback` after parsing and validation, when this parameter was matched.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{ActionError, CommandLineParser, Parameter, ParseContext, Switch};
    ///
    /// let mut debug: bool = false;
    /// let mut parser = CommandLineParser::new("program")
    ///     .add(
    ///         Parameter::flag(Switch::new(&mut debug), "debug", None)
    ///             .action(|context: &ParseContext| -> Result<(), ActionError> {
    ///                 println!("debugging {}", context.selected_command());
    ///                 Ok(())
    ///             }),
    ///     )
    ///     .build();
    ///
    /// parser.parse_tokens(&["--debug"]).unwrap();
    /// drop(parser);
    /// assert!(debug);
    /// ```
    pub fn action(
        mut self,
        callback: impl FnMut(&ParseContext) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.inner.actions.push(Box::new(callback));
        self
    }

    pub(crate) fn kind(&self) -> ClauseKind {
        self.inner.kind
    }

    pub(crate) fn into_node(self) -> ClauseNode<'a> {
        self.inner
    }
}

impl<'a, T: Display> Choices<T> for Parameter<'a, T> {
    /// Document a choice's help message for this parameter.
    /// If repeated for the same `variant` of `T`, only the final message will apply to the parameter.
    /// Repeat using different variants to document multiple choices.
    /// Needn't be exhaustive.
    ///
    /// Documented choices are offered as completion candidates, but *do not* restrict the values the parser accepts.
    /// To restrict the values, use a [`Choice`](./struct.Choice.html) field.
    ///
    /// ### Example
    /// ```
    /// # use pinion_builder as pinion;
    /// use pinion::{prelude::*, Parameter, Scalar};
    ///
    /// let mut door: u32 = 0;
    /// Parameter::argument(Scalar::new(&mut door), "door")
    ///     .choice(1, "--this will get discarded--")
    ///     .choice(1, "Enter door #1.")
    ///     .choice(2, "Enter door #2.  Description may include multiple sentences.");
    /// ```
    fn choice(mut self, variant: T, description: impl Into<String>) -> Self {
        self.inner
            .choices
            .insert(variant.to_string(), description.into());
        self
    }
}
