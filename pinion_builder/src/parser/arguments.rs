use crate::parser::{ArgumentId, CommandId, ElementId, ParseContext, ParseError, Parser};
use crate::tokens::TokenKind;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

impl<'a> Parser<'a> {
    /// Match the positionals of the stream against `command`'s arguments, in order.
    pub(crate) fn resolve_arguments(
        &mut self,
        context: &mut ParseContext,
        command: CommandId,
    ) -> Result<(), ParseError> {
        let arguments = self.commands[command].arguments.clone();
        let mut index = 0;
        let mut absorbed = false;

        while index < arguments.len() {
            let argument = arguments[index];
            self.consume_flags(context)?;
            let token = context.peek(self)?;

            if token.kind == TokenKind::Positional {
                context.next(self)?;
                self.apply_argument(context, argument, token.text)?;

                if !self.settings.interspersed {
                    context.tokens.stop_flags();
                }

                if self.arguments[argument].is_cumulative() {
                    absorbed = true;
                } else {
                    index += 1;
                }

                continue;
            }

            if !absorbed && !context.dry_run {
                match self.fallback(context, &self.arguments[argument])? {
                    Some((values, source)) => Self::apply_fallback(
                        &mut self.arguments[argument],
                        context,
                        ElementId::Argument(argument),
                        values,
                        source,
                    )?,
                    None if self.arguments[argument].required && !context.help_requested => {
                        return Err(ParseError::MissingRequiredArgument(
                            self.arguments[argument].name.clone(),
                        ));
                    }
                    None => {}
                }
            }

            absorbed = false;
            index += 1;
        }

        Ok(())
    }

    fn apply_argument(
        &mut self,
        context: &mut ParseContext,
        argument: ArgumentId,
        value: String,
    ) -> Result<(), ParseError> {
        let node = &mut self.arguments[argument];
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Matched argument '{}' with '{value}'.", node.name);
        }

        if !context.dry_run {
            node.value
                .capture(&value)
                .map_err(|source| ParseError::InvalidValue {
                    clause: node.display_name(),
                    source,
                })?;
        }

        context.push_element(ElementId::Argument(argument), node.name.clone(), Some(value));

        if !context.dry_run {
            if let Some(dispatch) = node.dispatch.as_mut() {
                dispatch(context).map_err(ParseError::Action)?;
            }
        }

        Ok(())
    }
}
