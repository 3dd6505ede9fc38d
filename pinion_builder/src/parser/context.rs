use std::collections::HashSet;

use crate::model::{ClauseKind, Completion, ValueSource};
use crate::parser::{ArgumentId, CommandId, FlagId, ParseError, Parser, Scope, ROOT};
use crate::tokens::{Token, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ElementId {
    Flag(FlagId),
    Argument(ArgumentId),
    Command(CommandId),
}

/// One clause matched on the command line, in the order it was matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseElement {
    pub(crate) id: ElementId,
    pub(crate) name: String,
    pub(crate) value: Option<String>,
}

impl ParseElement {
    /// Whether this element is a flag, argument or command.
    pub fn kind(&self) -> ClauseKind {
        match self.id {
            ElementId::Flag(_) => ClauseKind::Flag,
            ElementId::Argument(_) => ClauseKind::Argument,
            ElementId::Command(_) => ClauseKind::Command,
        }
    }

    /// The declared name of the matched clause (the canonical name for commands).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value the clause matched with; `None` for commands.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedValue {
    pub(crate) id: ElementId,
    pub(crate) name: String,
    pub(crate) values: Vec<String>,
    pub(crate) source: ValueSource,
}

/// The state of a single parse.
///
/// Resolvers and callbacks receive this read-only; after a successful parse it describes what was matched.
#[derive(Debug)]
pub struct ParseContext {
    pub(crate) tokens: TokenStream,
    pub(crate) chain: Vec<CommandId>,
    pub(crate) path: Vec<String>,
    pub(crate) elements: Vec<ParseElement>,
    pub(crate) resolved: Vec<ResolvedValue>,
    pub(crate) touched: HashSet<FlagId>,
    pub(crate) help_requested: bool,
    pub(crate) version_requested: bool,
    pub(crate) dry_run: bool,
    pub(crate) completion: Option<Completion>,
}

impl ParseContext {
    pub(crate) fn new(args: &[&str], expand_files: bool) -> Self {
        Self {
            tokens: TokenStream::new(args, expand_files),
            chain: Vec::default(),
            path: Vec::default(),
            elements: Vec::default(),
            resolved: Vec::default(),
            touched: HashSet::default(),
            help_requested: false,
            version_requested: false,
            dry_run: false,
            completion: None,
        }
    }

    /// A context which matches structure only: no values are captured and no callbacks fire.
    pub(crate) fn completing(args: &[&str], expand_files: bool) -> Self {
        Self {
            dry_run: true,
            ..Self::new(args, expand_files)
        }
    }

    pub(crate) fn peek(&mut self, parser: &Parser) -> Result<Token, ParseError> {
        let scope = Scope {
            parser,
            chain: &self.chain,
        };
        self.tokens.peek(&scope)
    }

    pub(crate) fn next(&mut self, parser: &Parser) -> Result<Token, ParseError> {
        let scope = Scope {
            parser,
            chain: &self.chain,
        };
        self.tokens.next(&scope)
    }

    pub(crate) fn remaining(&mut self, parser: &Parser) -> Result<Vec<Token>, ParseError> {
        let scope = Scope {
            parser,
            chain: &self.chain,
        };
        self.tokens.remaining(&scope)
    }

    /// Descend into `command`, widening the flag scope.
    pub(crate) fn enter(&mut self, command: CommandId) {
        self.chain.push(command);
    }

    /// The innermost command entered so far.
    pub(crate) fn current(&self) -> CommandId {
        self.chain.last().copied().unwrap_or(ROOT)
    }

    /// Mark `flag` as matched; returns whether it had already been matched.
    pub(crate) fn touch(&mut self, flag: FlagId) -> bool {
        !self.touched.insert(flag)
    }

    pub(crate) fn push_element(
        &mut self,
        id: ElementId,
        name: impl Into<String>,
        value: Option<String>,
    ) {
        self.elements.push(ParseElement {
            id,
            name: name.into(),
            value,
        });
    }

    pub(crate) fn push_resolved(
        &mut self,
        id: ElementId,
        name: impl Into<String>,
        values: Vec<String>,
        source: ValueSource,
    ) {
        self.resolved.push(ResolvedValue {
            id,
            name: name.into(),
            values,
            source,
        });
    }

    pub(crate) fn request_help(&mut self) {
        self.help_requested = true;
    }

    pub(crate) fn request_version(&mut self) {
        self.version_requested = true;
    }

    pub(crate) fn matched(&self, id: ElementId) -> bool {
        self.elements.iter().any(|element| element.id == id)
    }

    /// The selected command path, space separated (ex: `"remote add"`); empty when only the root was selected.
    pub fn selected_command(&self) -> String {
        self.path.join(" ")
    }

    /// The canonical names of the selected commands, outermost first.
    pub fn selected_path(&self) -> &[String] {
        &self.path
    }

    /// Every clause matched on the command line, in order.
    pub fn elements(&self) -> &[ParseElement] {
        &self.elements
    }

    /// The first value of the flag/argument `name`, whatever its source.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.values_of(name).into_iter().next()
    }

    /// Every value of the flag/argument `name`.
    ///
    /// Command line values take precedence; otherwise the fallback values (environment, resolver or default) apply.
    pub fn values_of(&self, name: &str) -> Vec<&str> {
        let explicit: Vec<&str> = self
            .elements
            .iter()
            .filter(|element| element.kind() != ClauseKind::Command && element.name == name)
            .filter_map(|element| element.value())
            .collect();

        if !explicit.is_empty() {
            return explicit;
        }

        self.resolved
            .iter()
            .find(|resolved| resolved.name == name)
            .map(|resolved| resolved.values.iter().map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    /// Where the value of flag/argument `name` came from, if it has one.
    pub fn source_of(&self, name: &str) -> Option<ValueSource> {
        let explicit = self
            .elements
            .iter()
            .any(|element| element.kind() != ClauseKind::Command && element.name == name);

        if explicit {
            return Some(ValueSource::Explicit);
        }

        self.resolved
            .iter()
            .find(|resolved| resolved.name == name)
            .map(|resolved| resolved.source)
    }

    /// Whether help was requested, via `--help` or the `help` command.
    pub fn help_requested(&self) -> bool {
        self.help_requested
    }

    /// The completion candidates, when this context came from a `--completion-bash` request.
    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }
}
