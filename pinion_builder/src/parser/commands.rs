use crate::parser::{
    Builtin, CommandId, ElementId, ParseContext, ParseError, Parser, Phase,
};
use crate::tokens::TokenKind;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

impl<'a> Parser<'a> {
    /// Resolve `command` and (recursively) the sub-command selected beneath it.
    ///
    /// Returns the canonical names of the selected sub-commands, outermost first.
    pub(crate) fn resolve_command(
        &mut self,
        context: &mut ParseContext,
        command: CommandId,
    ) -> Result<Vec<String>, ParseError> {
        context.enter(command);
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Resolving command '{}'.", self.commands[command].name);
        }

        if self.commands[command].children.is_empty() {
            self.resolve_flags(context, true)?;
            self.resolve_arguments(context, command)?;
            self.resolve_flags(context, false)?;
            let remaining = context.remaining(self)?;

            if !remaining.is_empty() {
                return Err(ParseError::UnexpectedArguments(
                    remaining.iter().map(|token| token.to_string()).collect(),
                ));
            }

            return Ok(Vec::default());
        }

        self.resolve_flags(context, true)?;
        let token = context.peek(self)?;
        let child = match token.kind {
            TokenKind::Positional => match self.child_named(command, &token.text) {
                Some(child) => {
                    context.next(self)?;
                    child
                }
                None => self
                    .default_child(command)
                    .ok_or(ParseError::UnknownCommand(token.text))?,
            },
            _ => self
                .default_child(command)
                .ok_or(ParseError::MissingCommand)?,
        };

        let node = &self.commands[child];
        context.push_element(ElementId::Command(child), node.name.clone(), None);

        if node.builtin == Some(Builtin::Help) {
            context.request_help();
        }

        let mut path = self.resolve_command(context, child)?;
        path.insert(0, self.commands[child].name.clone());
        Ok(path)
    }

    /// Run the callbacks of the selected path: pre-actions, then validators, then actions.
    pub(crate) fn run_callbacks(&mut self, context: &ParseContext) -> Result<(), ParseError> {
        self.run_phase(context, Phase::Before)?;

        for &command in &context.chain {
            for validator in self.commands[command].validators.iter_mut() {
                validator(context).map_err(ParseError::Action)?;
            }
        }

        self.run_phase(context, Phase::After)
    }

    fn run_phase(&mut self, context: &ParseContext, phase: Phase) -> Result<(), ParseError> {
        for &command in &context.chain {
            for callback in self.commands[command].callbacks(phase).iter_mut() {
                callback(context).map_err(ParseError::Action)?;
            }

            for &flag in &self.commands[command].flags.order {
                if context.matched(ElementId::Flag(flag)) {
                    for callback in self.flags[flag].callbacks(phase).iter_mut() {
                        callback(context).map_err(ParseError::Action)?;
                    }
                }
            }

            for &argument in &self.commands[command].arguments {
                if context.matched(ElementId::Argument(argument)) {
                    for callback in self.arguments[argument].callbacks(phase).iter_mut() {
                        callback(context).map_err(ParseError::Action)?;
                    }
                }
            }
        }

        Ok(())
    }
}
