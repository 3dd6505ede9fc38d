use std::collections::BTreeMap;
use terminal_size::{terminal_size, Width};

use crate::parser::interface::{Columns, UserInterface};
use crate::parser::{ClauseNode, CommandId, Parser};

pub(crate) struct OptionParameter {
    pub(crate) name: String,
    pub(crate) short: Option<char>,
    /// `None` for flags which take no value.
    pub(crate) placeholder: Option<String>,
    pub(crate) required: bool,
    pub(crate) cumulative: bool,
    pub(crate) help: Option<String>,
    pub(crate) choices: BTreeMap<String, String>,
}

impl OptionParameter {
    fn from_clause(clause: &ClauseNode) -> Self {
        Self {
            name: clause.name.clone(),
            short: clause.short,
            placeholder: if clause.is_boolean() {
                None
            } else {
                Some(flag_placeholder(clause))
            },
            required: clause.required,
            cumulative: clause.is_cumulative(),
            help: clause.help.clone(),
            choices: clause.choices.clone(),
        }
    }

    fn flag(&self) -> String {
        match self.short {
            Some(short) => format!("-{short}"),
            None => format!("--{}", self.name),
        }
    }

    fn value(&self) -> String {
        match &self.placeholder {
            Some(placeholder) => format!(" {placeholder}"),
            None => String::default(),
        }
    }

    fn summary(&self) -> String {
        let (flag, value) = (self.flag(), self.value());

        match (self.required, self.cumulative) {
            (true, true) => format!("{flag}{value} [...]"),
            (true, false) => format!("{flag}{value}"),
            (false, true) => format!("[{flag}{value} ...]"),
            (false, false) => format!("[{flag}{value}]"),
        }
    }

    fn row(&self) -> Row {
        let value = self.value();
        let left = match self.short {
            Some(short) => format!("-{short}{value}, --{n}{value}", n = self.name),
            None => format!("--{}{value}", self.name),
        };

        Row::new(left, &self.help, &self.choices)
    }
}

pub(crate) struct ArgumentParameter {
    pub(crate) placeholder: String,
    pub(crate) required: bool,
    pub(crate) cumulative: bool,
    pub(crate) help: Option<String>,
    pub(crate) choices: BTreeMap<String, String>,
}

impl ArgumentParameter {
    fn from_clause(clause: &ClauseNode) -> Self {
        Self {
            placeholder: placeholder(clause),
            required: clause.required,
            cumulative: clause.is_cumulative(),
            help: clause.help.clone(),
            choices: clause.choices.clone(),
        }
    }

    fn summary(&self) -> String {
        let name = &self.placeholder;

        match (self.required, self.cumulative) {
            (true, true) => format!("{name} [...]"),
            (true, false) => name.clone(),
            (false, true) => format!("[{name} ...]"),
            (false, false) => format!("[{name}]"),
        }
    }

    fn row(&self) -> Row {
        Row::new(self.placeholder.clone(), &self.help, &self.choices)
    }
}

pub(crate) struct CommandParameter {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) help: Option<String>,
}

impl CommandParameter {
    fn row(&self) -> Row {
        let left = std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .cloned()
            .collect::<Vec<String>>()
            .join(", ");

        Row::new(left, &self.help, &BTreeMap::default())
    }
}

/// A flag shows its default value in place of its name, unless it declares an explicit placeholder.
fn flag_placeholder(clause: &ClauseNode) -> String {
    let defaults = clause.defaults.join(",");

    match &clause.placeholder {
        None if !defaults.is_empty() => defaults,
        _ => placeholder(clause),
    }
}

fn placeholder(clause: &ClauseNode) -> String {
    match &clause.placeholder {
        Some(placeholder) => placeholder.clone(),
        None => clause.name.to_ascii_uppercase().replace('-', "_"),
    }
}

/// One entry of a help section: the left column, its description, and any documented choices below it.
struct Row {
    left: String,
    middle: String,
    choices: Vec<(String, String)>,
}

impl Row {
    fn new(left: String, help: &Option<String>, choices: &BTreeMap<String, String>) -> Self {
        let help = help.clone().unwrap_or_default();
        let middle = if choices.is_empty() {
            help
        } else {
            let keys: Vec<&str> = choices.keys().map(|key| key.as_str()).collect();
            format!("{{{}}} {help}", keys.join(", "))
        };

        Self {
            left,
            middle,
            choices: choices
                .iter()
                .map(|(choice, description)| (choice.clone(), description.clone()))
                .collect(),
        }
    }
}

pub(crate) struct Printer {
    program: String,
    about: Option<String>,
    options: Vec<OptionParameter>,
    arguments: Vec<ArgumentParameter>,
    commands: Vec<CommandParameter>,
    terminal_width: Option<usize>,
}

const PADDING_WIDTH: usize = 3;
const MAIN_INDENT: usize = 1;
const CHOICE_INDENT: usize = 2;
// Used when the output is not a terminal.
const DEFAULT_TOTAL_WIDTH: usize = 80;

impl Printer {
    pub(crate) fn terminal(
        program: String,
        about: Option<String>,
        options: Vec<OptionParameter>,
        arguments: Vec<ArgumentParameter>,
        commands: Vec<CommandParameter>,
    ) -> Self {
        let terminal_width = terminal_size().map(|(Width(width), _)| width as usize);
        Self::new(program, about, options, arguments, commands, terminal_width)
    }

    pub(crate) fn new(
        program: String,
        about: Option<String>,
        options: Vec<OptionParameter>,
        arguments: Vec<ArgumentParameter>,
        commands: Vec<CommandParameter>,
        terminal_width: Option<usize>,
    ) -> Self {
        Self {
            program,
            about,
            options,
            arguments,
            commands,
            terminal_width,
        }
    }

    fn usage(&self) -> String {
        let mut parts = vec!["usage:".to_string(), self.program.clone()];
        parts.extend(self.options.iter().map(|option| option.summary()));
        parts.extend(self.arguments.iter().map(|argument| argument.summary()));

        if !self.commands.is_empty() {
            parts.push("COMMAND ...".to_string());
        }

        parts.join(" ")
    }

    pub(crate) fn print_help(&self, user_interface: &(impl UserInterface + ?Sized)) {
        let sections = [
            (
                "positional arguments:",
                self.arguments.iter().map(|a| a.row()).collect::<Vec<Row>>(),
            ),
            (
                "commands:",
                self.commands.iter().map(|c| c.row()).collect(),
            ),
            (
                "options:",
                self.options.iter().map(|o| o.row()).collect(),
            ),
        ];
        let columns = self.columns(sections.iter().flat_map(|(_, rows)| rows.iter()));

        user_interface.print(self.usage());

        if let Some(about) = &self.about {
            user_interface.print(String::default());
            user_interface.print(about.clone());
        }

        for (title, rows) in &sections {
            if rows.is_empty() {
                continue;
            }

            user_interface.print(String::default());
            user_interface.print(title.to_string());

            for row in rows {
                for line in columns.render(MAIN_INDENT, &row.left, &row.middle) {
                    user_interface.print(line);
                }

                for (choice, description) in &row.choices {
                    for line in columns.render(MAIN_INDENT + CHOICE_INDENT, choice, description) {
                        user_interface.print(line);
                    }
                }
            }
        }
    }

    fn columns<'r>(&self, rows: impl Iterator<Item = &'r Row>) -> Columns {
        let mut left = 1;
        let mut middle = 0;

        for row in rows {
            left = left.max(row.left.chars().count());
            middle = middle.max(row.middle.chars().count() + MAIN_INDENT);

            for (choice, description) in &row.choices {
                left = left.max(choice.chars().count() + CHOICE_INDENT);
                middle = middle.max(description.chars().count() + MAIN_INDENT);
            }
        }

        Columns::fit(
            PADDING_WIDTH,
            left,
            middle,
            self.terminal_width.unwrap_or(DEFAULT_TOTAL_WIDTH),
        )
    }
}

impl<'a> Parser<'a> {
    /// The help printer for `target`: its arguments and sub-commands, and the flags of every command down to it.
    pub(crate) fn help_printer(&self, target: CommandId) -> Printer {
        let program = std::iter::once(self.program.clone())
            .chain(self.path_of(target))
            .collect::<Vec<String>>()
            .join(" ");
        let command = &self.commands[target];
        let options = self
            .lineage(target)
            .into_iter()
            .flat_map(|id| self.commands[id].flags.order.iter())
            .map(|&flag| &self.flags[flag])
            .filter(|flag| !flag.hidden)
            .map(OptionParameter::from_clause)
            .collect();
        let arguments = command
            .arguments
            .iter()
            .map(|&argument| &self.arguments[argument])
            .filter(|argument| !argument.hidden)
            .map(ArgumentParameter::from_clause)
            .collect();
        let commands = command
            .children
            .iter()
            .map(|&child| &self.commands[child])
            .filter(|child| !child.hidden)
            .map(|child| CommandParameter {
                name: child.name.clone(),
                aliases: child.aliases.clone(),
                help: child.help.clone(),
            })
            .collect();

        Printer::terminal(program, command.help.clone(), options, arguments, commands)
    }
}
