use crate::constant::TERMINATOR;
use crate::model::Completion;
use crate::parser::{ElementId, ParseContext, Parser, ROOT};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

impl<'a> Parser<'a> {
    /// Work out the completion candidates for the partially typed command line `args`.
    ///
    /// The structure of `args` is matched without capturing values or running callbacks.
    /// Parse errors are expected (the input is incomplete by nature) and ignored.
    pub(crate) fn resolve_completions(&mut self, args: &[&str]) -> (ParseContext, Completion) {
        let mut context = ParseContext::completing(args, self.settings.expand_files);

        match self.resolve_command(&mut context, ROOT) {
            Ok(path) => context.path = path,
            Err(_error) => {
                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Completing through a partial parse: {_error}.");
                }
                context.path = self.path_of(context.current());
            }
        }

        let completion = self.complete(&context, args);
        (context, completion)
    }

    fn complete(&self, context: &ParseContext, args: &[&str]) -> Completion {
        let current = args.last().copied().unwrap_or_default();
        let previous = match args.len() {
            0 | 1 => "",
            n => args[n - 2],
        };
        let args_only = args
            .split_last()
            .map(|(_, before)| before.contains(&TERMINATOR))
            .unwrap_or(false);

        if !(current.starts_with("--") || previous.starts_with("--")) {
            return self.complete_command(context);
        }

        if args_only {
            return Completion::default();
        }

        let (name, value) = match current.strip_prefix("--") {
            Some(name) => (name, None),
            None => (&previous[2..], Some(current)),
        };

        match self.find_flag(&context.chain, name) {
            Some(flag) => {
                let completion = self.flags[flag].completion();

                if completion.is_empty() {
                    return self.complete_command(context);
                }

                match value {
                    Some(value) if is_exact(&completion.words, value) => {
                        self.complete_command(context)
                    }
                    _ => completion,
                }
            }
            None => Completion::words(
                context
                    .chain
                    .iter()
                    .flat_map(|&command| self.commands[command].flags.order.iter())
                    .map(|&flag| &self.flags[flag])
                    .filter(|flag| !flag.hidden)
                    .map(|flag| format!("--{}", flag.name))
                    .collect(),
            ),
        }
    }

    /// Complete the next argument of the selected command, or else its sub-commands.
    fn complete_command(&self, context: &ParseContext) -> Completion {
        let target = context.current();
        let arguments = &self.commands[target].arguments;
        let mut satisfied = 0;
        let mut all_satisfied = false;
        let mut options: Vec<String> = Vec::default();

        for element in &context.elements {
            let ElementId::Argument(id) = element.id else {
                continue;
            };

            if self.arguments[id].owner != target {
                continue;
            }

            all_satisfied = false;
            options.clear();

            let value = match element.value() {
                Some(value) if !value.is_empty() => value,
                _ => continue,
            };
            let Some(&argument) = arguments.get(satisfied) else {
                continue;
            };
            let argument = &self.arguments[argument];
            let candidates = argument.completion().words;

            if candidates.iter().any(|candidate| candidate == value) {
                satisfied += 1;
                continue;
            }

            options = candidates
                .into_iter()
                .filter(|candidate| candidate.starts_with(value))
                .collect();

            if options.is_empty() && !argument.is_cumulative() {
                satisfied += 1;
                all_satisfied = true;
            }
        }

        if satisfied < arguments.len() && !all_satisfied {
            if options.is_empty() {
                return self.arguments[arguments[satisfied]].completion();
            }

            return Completion::words(options);
        }

        Completion::words(
            self.commands[target]
                .children
                .iter()
                .map(|&child| &self.commands[child])
                .filter(|child| !child.hidden)
                .map(|child| child.name.clone())
                .collect(),
        )
    }
}

/// Whether `value` is a candidate, and not merely the prefix of another.
fn is_exact(words: &[String], value: &str) -> bool {
    words.iter().any(|word| word == value)
        && !words
            .iter()
            .any(|word| word != value && word.starts_with(value))
}
