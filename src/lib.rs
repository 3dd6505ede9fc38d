//! `pinion` is a command line parser for Rust, organized around nested commands.
//!
//! A `pinion` Cli is a tree: the program is the root command, each command owns its flags and (either) positional arguments or sub-commands.
//! Values are bound straight into your variables, and anything missing from the command line may be filled in from the environment, a chain of resolvers, or a static default.
//! `pinion` prioritizes the following design concerns:
//! * *Type safe argument parsing*:
//! The user should not call any `&str -> T` conversion functions directly.
//! * *Nested commands*:
//! Flags declared on a command are visible to every command beneath it, so `git -v remote add` and `git remote add -v` mean the same thing.
//! * *Explicit fallbacks*:
//! A value not on the command line is looked up in a fixed order (see **Value Precedence**), and the parse remembers where each value came from.
//! * *Shell completion*:
//! The same parse that binds values answers "what could come next?" for a partially typed command line.
//!
//! # Usage
//! This page includes a few demos on using `pinion`.
//! More examples are outlined in [the source](https://github.com/pinion-rs/pinion/tree/main/demos).
//!
//! ```no_run
#![doc = include_str!("../demos/summer.rs")]
//! ```
//!
//! ```console
//! $ summer -h
//! usage: summer [-h] ITEM [...]
//!
//! Add up a list of numbers.
//!
//! positional arguments:
//!  ITEM         The items to sum.
//!
//! options:
//!  -h, --help   Show this help message and exit.
//!
//! $ summer 1 2 3
//! Sum: 6
//!
//! $ summer
//! summer: error: required argument 'item' not provided
//!
//! $ summer 1 blah
//! summer: error: invalid value for 'item': cannot convert 'blah' to u32
//! ```
//!
//! # Builder Api
//! Configure `pinion` by starting with a [`CommandLineParser`] and `add`ing parameters.
//! There are two classes of parameters: [`Parameter::flag`] and [`Parameter::argument`].
//!
//! Each parameter takes a *field* which binds the parameter to a variable:
//! * [`Scalar`]: a single value, overwritten on each capture.
//! * [`Switch`]: a boolean flag; `--name` sets `true` and `--no-name` sets `false`.
//! * [`Counter`]: a repeatable boolean flag counting its occurrences (ex: `-vvv`).
//! * [`Optional`]: an `Option<T>`, set to `Some` on capture.
//! * [`Choice`]: a single value restricted to an enumerated set, which doubles as its completion candidates.
//! * [`Collection`]: accumulates every value, for any type implementing [Collectable](./prelude/trait.Collectable.html) (`Vec<T>` and `HashSet<T>` out of the box).
//! As an argument, a collection consumes the remaining positional input, so it must come last.
//!
//! All type `T` parsing in `pinion` is controlled by [`std::str::FromStr`].
//! For spans of time, [`Duration`] reads the familiar `"1h30m"`, `"1.5s"` and `"300ms"` forms.
//!
//! ### Commands
//! Commands are set up via [`CommandLineParser::command`], which takes the command name and a `impl FnOnce(Command) -> Command` to configure it.
//! Commands nest arbitrarily, via [`Command::command`].
//! A command holds either positional arguments or sub-commands, never both.
//! At most one sibling may be marked [`Command::default`]; it is selected when no sibling is named.
//! Once any command exists, `pinion` adds a `help [command...]` command as well.
//!
//! ```no_run
#![doc = include_str!("../demos/deploy.rs")]
//! ```
//!
//! ```console
//! $ deploy -vv rollout web 1.4.2 -s canary
//! command: rollout
//! verbosity: 2
//! dry-run: false
//! region: us-east-1 (from resolver)
//! timeout: 5m0s
//! rolling out web:1.4.2 (canary)
//!
//! $ DEPLOY_DRY_RUN=true deploy hosts
//! command: hosts list
//! verbosity: 0
//! dry-run: true
//! region: us-east-1 (from resolver)
//! timeout: 5m0s
//! hosts: web-1, web-2, worker-1
//! ```
//!
//! ### Value Precedence
//! When a flag or argument is absent from the command line, its value is settled by the first of:
//! 1. The environment variable set with [`Parameter::envar`] (combined with the [`Command::envar_prefix`] of each enclosing command).
//! Under [`CommandLineParser::default_envars`], flags without an explicit variable get `PROGRAM_FLAG_NAME`.
//! An empty variable counts as unset.
//! 2. The registered [`Resolver`]s, in registration order; the first with a value wins.
//! 3. The static [`Parameter::default`].
//!
//! Required flags/arguments are only reported missing once this chain comes up empty.
//! A required parameter may not declare a default, since the default could never apply.
//! [`ParseContext::source_of`] tells which link of the chain provided a value.
//!
//! ### Callbacks
//! After a successful parse, callbacks run over the selected command path in three phases: pre-actions, then validators, then actions.
//! Within a phase, each command runs its own callbacks, followed by those of its matched flags, then its matched arguments.
//! A [`Parameter::dispatch`] callback runs earlier, the moment its parameter is matched.
//!
//! # Cli Semantics
//! `pinion` parses the Cli tokens according to the following set of rules.
//!
//! * `--name value` and `--name=value` are equivalent; only the first `=` separates.
//! * Short flags combine: `-ab` is `-a -b` when both are booleans, and `-tvalue` is `-t value` when `-t` takes a value.
//! * A boolean `--name` may be negated as `--no-name`; negating a flag which takes a value is an error.
//! * A single valued flag may be given once; cumulative flags (`Collection`, `Counter`) may repeat.
//! * Flags may appear between positional arguments, unless [`CommandLineParser::interspersed`] is turned off.
//! * `--` ends flag parsing: every token after it is positional.
//! * `@path` is replaced by the lines of the file at `path` (see [`CommandLineParser::file_expansion`]).
//!
//! # Shell Completion
//! Invoking the program with `--completion-bash` as its first token prints the candidates for the tokens that follow, one per line.
//! The candidates are sub-command names, flag names (after `--`), or values offered by [`Choice`] fields, [`Parameter::hint_options`] and [`Parameter::hint_action`].
//! [`GeneralParser::complete`] returns the same candidates programmatically.
//!
//! # Unit Testing
//! The `unit_test` feature exposes [`Command::test_dummy`], to test a command's setup function in isolation.
//!
//! # Debugging
//! The `tracing_debug` feature emits [`tracing`](https://docs.rs/tracing) debug events from the parser.
pub use pinion_builder::*;
