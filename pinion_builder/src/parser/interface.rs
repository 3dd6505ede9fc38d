use crate::parser::ParseError;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// Lays out a two column table (ex: a flag and its description), wrapping the right hand column.
#[derive(Debug)]
pub(crate) struct Columns {
    padding: usize,
    left: usize,
    middle: usize,
}

// Leave a little slack at the edge of the terminal.
const TARGET_TOTAL_FACTOR: f64 = 0.95;

// Room for 3 average length words (5 characters each) and the spaces between them.
pub(crate) const MINIMUM_MIDDLE_WIDTH: usize = 17;

impl Columns {
    pub(crate) fn new(padding: usize, left: usize, middle: usize) -> Self {
        assert!(padding >= 1);
        // The description must fit at least one character plus its hyphen.
        assert!(middle >= 2);
        Self {
            padding,
            left,
            middle,
        }
    }

    /// Choose the description width from the widest description and the total width available.
    pub(crate) fn fit(padding: usize, left: usize, widest: usize, total: usize) -> Self {
        let fixed = left + padding;
        let target = (total as f64 * TARGET_TOTAL_FACTOR) as usize;
        let preferred = std::cmp::max(widest, MINIMUM_MIDDLE_WIDTH);
        let middle = if preferred + fixed <= target {
            preferred
        } else if fixed < total {
            std::cmp::max(total - fixed, MINIMUM_MIDDLE_WIDTH)
        } else {
            MINIMUM_MIDDLE_WIDTH
        };
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Fitting columns {left}+{padding} into {total}: description width {middle}.");
        }

        Self::new(padding, left, middle)
    }

    pub(crate) fn render(&self, indent: usize, left: &str, middle: &str) -> Vec<String> {
        assert!(left.chars().count() <= self.left);
        let width = self.left;
        let padding = self.padding;
        let lines = wrap(middle, self.middle - indent);

        if lines.is_empty() {
            return vec![format!("{:indent$}{left}", "")];
        }

        lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let left = if i == 0 { left } else { "" };
                format!("{:indent$}{left:width$}{:padding$}{line}", "", "")
            })
            .collect()
    }
}

/// Break `paragraph` into lines of at most `width` characters, hyphenating words that cannot fit on a line of their own.
fn wrap(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::default();
    let mut current = String::default();

    for word in paragraph.split_whitespace() {
        let length = word.chars().count();

        if !current.is_empty() && current.chars().count() + 1 + length <= width {
            current.push(' ');
            current.push_str(word);
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        let mut characters: Vec<char> = word.chars().collect();

        while characters.len() > width {
            let rest = characters.split_off(width - 1);
            let mut piece: String = characters.into_iter().collect();
            piece.push('-');
            lines.push(piece);
            characters = rest;
        }

        current = characters.into_iter().collect();
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

pub(crate) trait UserInterface {
    fn print(&self, message: String);
    fn print_error(&self, program: &str, error: &ParseError);
}

#[derive(Default)]
pub(crate) struct ConsoleInterface {}

impl UserInterface for ConsoleInterface {
    fn print(&self, message: String) {
        println!("{message}");
    }

    fn print_error(&self, program: &str, error: &ParseError) {
        eprintln!("{program}: error: {error}");
    }
}
