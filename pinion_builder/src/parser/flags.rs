use crate::api::{envar_transform, lookup_envar, split_envar};
use crate::constant::NEGATION_PREFIX;
use crate::model::{ClauseKind, ValueSource};
use crate::parser::{
    Builtin, ClauseNode, CommandId, ElementId, FlagId, ParseContext, ParseError, Parser,
};
use crate::tokens::TokenKind;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

pub(crate) type Fallback = (Vec<String>, ValueSource);

impl<'a> Parser<'a> {
    /// Consume the flag tokens at the head of the stream.
    /// Unless `ignore_required`, then settle every untouched flag in scope through its fallbacks.
    pub(crate) fn resolve_flags(
        &mut self,
        context: &mut ParseContext,
        ignore_required: bool,
    ) -> Result<(), ParseError> {
        self.consume_flags(context)?;

        if !ignore_required && !context.dry_run {
            self.apply_flag_fallbacks(context)?;
        }

        Ok(())
    }

    pub(crate) fn consume_flags(&mut self, context: &mut ParseContext) -> Result<(), ParseError> {
        loop {
            let token = context.peek(self)?;
            let (flag, inverted) = match token.kind {
                TokenKind::LongFlag => {
                    context.next(self)?;
                    self.lookup_long(&context.chain, &token.text)?
                }
                TokenKind::ShortFlag => {
                    context.next(self)?;
                    let short = token
                        .text
                        .chars()
                        .next()
                        .ok_or(ParseError::MalformedShortFlag)?;
                    let flag = self
                        .find_short(&context.chain, short)
                        .ok_or(ParseError::UnknownShortFlag(short))?;
                    (flag, false)
                }
                TokenKind::Positional | TokenKind::EndOfInput => return Ok(()),
            };

            let value = if self.flags[flag].is_boolean() {
                (!inverted).to_string()
            } else {
                let next = context.next(self)?;

                if next.kind != TokenKind::Positional {
                    return Err(ParseError::ExpectedFlagArgument(token.to_string()));
                }

                next.text
            };

            self.apply_flag(context, flag, value)?;
        }
    }

    fn lookup_long(&self, chain: &[CommandId], name: &str) -> Result<(FlagId, bool), ParseError> {
        if let Some(flag) = self.find_flag(chain, name) {
            return Ok((flag, false));
        }

        if let Some(stripped) = name.strip_prefix(NEGATION_PREFIX) {
            if !stripped.starts_with(NEGATION_PREFIX) {
                if let Some(flag) = self.find_flag(chain, stripped) {
                    if !self.flags[flag].is_boolean() {
                        return Err(ParseError::NonNegatable(stripped.to_string()));
                    }

                    return Ok((flag, true));
                }
            }
        }

        Err(ParseError::UnknownLongFlag(name.to_string()))
    }

    fn apply_flag(
        &mut self,
        context: &mut ParseContext,
        flag: FlagId,
        value: String,
    ) -> Result<(), ParseError> {
        let node = &mut self.flags[flag];
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Matched flag '--{}' with '{value}'.", node.name);
        }

        if context.touch(flag) && !node.is_cumulative() {
            return Err(ParseError::RepeatedFlag(node.name.clone()));
        }

        match node.builtin {
            Some(Builtin::Help) => context.request_help(),
            Some(Builtin::Version) => context.request_version(),
            None => {}
        }

        if !context.dry_run {
            node.value
                .capture(&value)
                .map_err(|source| ParseError::InvalidValue {
                    clause: node.display_name(),
                    source,
                })?;
        }

        context.push_element(ElementId::Flag(flag), node.name.clone(), Some(value));

        if !context.dry_run {
            if let Some(dispatch) = node.dispatch.as_mut() {
                dispatch(context).map_err(ParseError::Action)?;
            }
        }

        Ok(())
    }

    fn apply_flag_fallbacks(&mut self, context: &mut ParseContext) -> Result<(), ParseError> {
        let mut pending = Vec::default();
        let mut missing = Vec::default();

        for &command in &context.chain {
            for &flag in &self.commands[command].flags.order {
                let node = &self.flags[flag];

                if context.touched.contains(&flag) || node.builtin.is_some() {
                    continue;
                }

                match self.fallback(context, node)? {
                    Some(fallback) => pending.push((flag, fallback)),
                    None if node.required => missing.push(node.name.clone()),
                    None => {}
                }
            }
        }

        if !missing.is_empty() && !context.help_requested {
            return Err(ParseError::MissingRequiredFlags(missing));
        }

        for (flag, (values, source)) in pending {
            Self::apply_fallback(
                &mut self.flags[flag],
                context,
                ElementId::Flag(flag),
                values,
                source,
            )?;
        }

        Ok(())
    }

    /// Capture fallback `values` into `clause`, recording where they came from.
    pub(crate) fn apply_fallback(
        clause: &mut ClauseNode<'a>,
        context: &mut ParseContext,
        id: ElementId,
        values: Vec<String>,
        source: ValueSource,
    ) -> Result<(), ParseError> {
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Falling back to {source} for '{}': {values:?}.", clause.name);
        }

        if values.len() > 1 && !clause.is_cumulative() {
            return Err(ParseError::MultipleValues {
                clause: clause.display_name(),
                origin: source,
                count: values.len(),
            });
        }

        for value in &values {
            clause
                .value
                .capture(value)
                .map_err(|error| ParseError::InvalidFallbackValue {
                    clause: clause.display_name(),
                    origin: source,
                    source: error,
                })?;
        }

        context.push_resolved(id, clause.name.clone(), values, source);
        Ok(())
    }

    /// The first of: environment variable, resolvers (in registration order), static defaults.
    pub(crate) fn fallback(
        &self,
        context: &ParseContext,
        clause: &ClauseNode<'a>,
    ) -> Result<Option<Fallback>, ParseError> {
        if let Some(name) = self.envar_name(clause) {
            if let Some(value) = lookup_envar(&name) {
                let values = if clause.is_cumulative() {
                    split_envar(&value)
                } else {
                    vec![value]
                };

                return Ok(Some((values, ValueSource::Envar)));
            }
        }

        for resolver in &self.resolvers {
            match resolver.resolve(&clause.name, context) {
                Ok(Some(values)) if !values.is_empty() => {
                    return Ok(Some((values, ValueSource::Resolver)));
                }
                Ok(_) => {}
                Err(source) => {
                    return Err(ParseError::Resolver {
                        key: clause.name.clone(),
                        source,
                    });
                }
            }
        }

        if !clause.defaults.is_empty() {
            return Ok(Some((clause.defaults.clone(), ValueSource::Default)));
        }

        Ok(None)
    }

    /// The environment variable consulted for `clause`, if any.
    pub(crate) fn envar_name(&self, clause: &ClauseNode<'a>) -> Option<String> {
        if clause.no_envar {
            return None;
        }

        let prefixes: String = self
            .lineage(clause.owner)
            .into_iter()
            .filter_map(|command| self.commands[command].envar_prefix.as_ref())
            .map(|prefix| format!("{prefix}_"))
            .collect();

        match &clause.envar {
            Some(name) => Some(format!("{prefixes}{name}")),
            None if self.settings.default_envars && clause.kind == ClauseKind::Flag => Some(format!(
                "{}_{prefixes}{}",
                envar_transform(&self.program),
                envar_transform(&clause.name)
            )),
            None => None,
        }
    }
}
