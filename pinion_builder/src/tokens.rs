use std::collections::VecDeque;

use crate::constant::TERMINATOR;
use crate::parser::ParseError;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    ShortFlag,
    LongFlag,
    Positional,
    EndOfInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
}

impl Token {
    pub(crate) fn short(short: char) -> Self {
        Self {
            kind: TokenKind::ShortFlag,
            text: short.to_string(),
        }
    }

    pub(crate) fn long(name: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::LongFlag,
            text: name.into(),
        }
    }

    pub(crate) fn positional(value: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Positional,
            text: value.into(),
        }
    }

    pub(crate) fn end() -> Self {
        Self {
            kind: TokenKind::EndOfInput,
            text: String::default(),
        }
    }

    pub(crate) fn is_flag(&self) -> bool {
        matches!(self.kind, TokenKind::ShortFlag | TokenKind::LongFlag)
    }

    pub(crate) fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::ShortFlag => write!(f, "-{}", self.text),
            TokenKind::LongFlag => write!(f, "--{}", self.text),
            TokenKind::Positional => write!(f, "{}", self.text),
            TokenKind::EndOfInput => write!(f, "<end of input>"),
        }
    }
}

/// The short flags visible at the current resolution depth.
pub(crate) trait ShortFlags {
    /// Whether `short` names a known flag which expects a value.
    fn takes_value(&self, short: char) -> bool;
}

/// A raw argument string; `expanded` marks lines read out of an `@path` file, which are never expanded again.
#[derive(Debug)]
struct Raw {
    text: String,
    expanded: bool,
}

impl Raw {
    fn input(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expanded: false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct TokenStream {
    raw: VecDeque<Raw>,
    lookahead: Vec<Token>,
    args_only: bool,
    expand_files: bool,
}

impl TokenStream {
    pub(crate) fn new(args: &[&str], expand_files: bool) -> Self {
        Self {
            raw: args.iter().map(|arg| Raw::input(*arg)).collect(),
            lookahead: Vec::default(),
            args_only: false,
            expand_files,
        }
    }

    /// Whether the `--` terminator (or a non-interspersed positional) has switched off flag parsing.
    pub(crate) fn is_args_only(&self) -> bool {
        self.args_only
    }

    /// Stop recognizing flags; every later string is positional.
    pub(crate) fn stop_flags(&mut self) {
        self.args_only = true;
    }

    pub(crate) fn peek(&mut self, shorts: &impl ShortFlags) -> Result<Token, ParseError> {
        if let Some(token) = self.lookahead.last() {
            return Ok(token.clone());
        }

        let token = self.next(shorts)?;
        self.push_back(token.clone());
        Ok(token)
    }

    pub(crate) fn next(&mut self, shorts: &impl ShortFlags) -> Result<Token, ParseError> {
        if let Some(token) = self.lookahead.pop() {
            return Ok(token);
        }

        while let Some(Raw { text: arg, expanded }) = self.raw.pop_front() {
            if self.args_only {
                return Ok(Token::positional(arg));
            }

            if arg == TERMINATOR {
                self.args_only = true;
                continue;
            }

            if let Some(body) = arg.strip_prefix("--") {
                return match body.split_once('=') {
                    Some((name, value)) => {
                        self.lookahead.push(Token::positional(value));
                        Ok(Token::long(name))
                    }
                    None => Ok(Token::long(body)),
                };
            }

            if let Some(body) = arg.strip_prefix('-') {
                let mut chars = body.chars();
                let short = chars.next().ok_or(ParseError::MalformedShortFlag)?;
                let remainder = chars.as_str();

                if !remainder.is_empty() {
                    if shorts.takes_value(short) {
                        self.lookahead.push(Token::positional(remainder));
                    } else {
                        self.raw.push_front(Raw {
                            text: format!("-{remainder}"),
                            expanded,
                        });
                    }
                }

                return Ok(Token::short(short));
            }

            if self.expand_files && !expanded {
                if let Some(path) = arg.strip_prefix('@') {
                    self.expand(path)?;
                    continue;
                }
            }

            return Ok(Token::positional(arg));
        }

        Ok(Token::end())
    }

    /// Replay `token` before anything else; the end of input is never re-queued.
    pub(crate) fn push_back(&mut self, token: Token) {
        if !token.is_end() {
            self.lookahead.push(token);
        }
    }

    /// Drain every remaining token, for reporting.
    pub(crate) fn remaining(&mut self, shorts: &impl ShortFlags) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::default();

        loop {
            let token = self.next(shorts)?;

            if token.is_end() {
                return Ok(tokens);
            }

            tokens.push(token);
        }
    }

    fn expand(&mut self, path: &str) -> Result<(), ParseError> {
        let content = std::fs::read_to_string(path).map_err(|error| ParseError::ArgumentFile {
            path: path.to_string(),
            source: error,
        })?;
        let lines: Vec<&str> = content.lines().collect();
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Expanding '@{path}' into {} arguments.", lines.len());
        }

        for line in lines.into_iter().rev() {
            self.raw.push_front(Raw {
                text: line.to_string(),
                expanded: true,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::io::Write;

    impl ShortFlags for HashMap<char, bool> {
        fn takes_value(&self, short: char) -> bool {
            self.get(&short).copied().unwrap_or(false)
        }
    }

    fn shorts() -> HashMap<char, bool> {
        HashMap::from([('a', false), ('b', false), ('f', true)])
    }

    fn drain(stream: &mut TokenStream) -> Vec<Token> {
        stream.remaining(&shorts()).unwrap()
    }

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec!["x"], vec![Token::positional("x")])]
    #[case(vec!["--flag"], vec![Token::long("flag")])]
    #[case(vec!["--flag=value"], vec![Token::long("flag"), Token::positional("value")])]
    #[case(vec!["--flag=a=b"], vec![Token::long("flag"), Token::positional("a=b")])]
    #[case(vec!["--flag="], vec![Token::long("flag"), Token::positional("")])]
    #[case(vec!["-a"], vec![Token::short('a')])]
    #[case(vec!["-ab"], vec![Token::short('a'), Token::short('b')])]
    #[case(vec!["-abf"], vec![Token::short('a'), Token::short('b'), Token::short('f')])]
    #[case(vec!["-fvalue"], vec![Token::short('f'), Token::positional("value")])]
    #[case(vec!["-afvalue"], vec![Token::short('a'), Token::short('f'), Token::positional("value")])]
    #[case(vec!["-ä"], vec![Token::short('ä')])]
    #[case(vec!["-f", "value"], vec![Token::short('f'), Token::positional("value")])]
    #[case(vec!["--", "--flag", "-a"], vec![Token::positional("--flag"), Token::positional("-a")])]
    #[case(vec!["x", "--", "--", "y"], vec![Token::positional("x"), Token::positional("--"), Token::positional("y")])]
    #[case(vec!["--", "@file"], vec![Token::positional("@file")])]
    fn tokenize(#[case] args: Vec<&str>, #[case] expected: Vec<Token>) {
        // Setup
        let mut stream = TokenStream::new(args.as_slice(), true);

        // Execute
        let tokens = drain(&mut stream);

        // Verify
        assert_eq!(tokens, expected);
    }

    #[test]
    fn bare_dash() {
        // Setup
        let mut stream = TokenStream::new(&["-"], true);

        // Execute
        let result = stream.next(&shorts());

        // Verify
        assert_matches!(result, Err(ParseError::MalformedShortFlag));
    }

    #[test]
    fn end_of_input_forever() {
        // Setup
        let mut stream = TokenStream::new(empty::slice(), true);

        // Execute & Verify
        for _ in 0..3 {
            assert!(stream.peek(&shorts()).unwrap().is_end());
            assert!(stream.next(&shorts()).unwrap().is_end());
        }
    }

    #[test]
    fn peek_does_not_advance() {
        // Setup
        let mut stream = TokenStream::new(&["x", "y"], true);

        // Execute
        let first = stream.peek(&shorts()).unwrap();
        let second = stream.peek(&shorts()).unwrap();
        let next = stream.next(&shorts()).unwrap();

        // Verify
        assert_eq!(first, Token::positional("x"));
        assert_eq!(second, first);
        assert_eq!(next, first);
        assert_eq!(stream.next(&shorts()).unwrap(), Token::positional("y"));
    }

    #[test]
    fn push_back_replays_first() {
        // Setup
        let mut stream = TokenStream::new(&["x"], true);

        // Execute
        stream.push_back(Token::long("flag"));
        stream.push_back(Token::end());

        // Verify
        assert_eq!(stream.next(&shorts()).unwrap(), Token::long("flag"));
        assert_eq!(stream.next(&shorts()).unwrap(), Token::positional("x"));
        assert!(stream.next(&shorts()).unwrap().is_end());
    }

    #[test]
    fn stop_flags() {
        // Setup
        let mut stream = TokenStream::new(&["x", "--flag", "-a"], true);
        assert_eq!(stream.next(&shorts()).unwrap(), Token::positional("x"));

        // Execute
        stream.stop_flags();

        // Verify
        assert!(stream.is_args_only());
        assert_eq!(
            drain(&mut stream),
            vec![Token::positional("--flag"), Token::positional("-a")]
        );
    }

    #[test]
    fn expand_file() {
        // Setup
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "--flag=1\nvalue one\r\n-a\n").unwrap();
        let argument = format!("@{}", file.path().display());
        let mut stream = TokenStream::new(&["x", argument.as_str(), "y"], true);

        // Execute
        let tokens = drain(&mut stream);

        // Verify
        assert_eq!(
            tokens,
            vec![
                Token::positional("x"),
                Token::long("flag"),
                Token::positional("1"),
                Token::positional("value one"),
                Token::short('a'),
                Token::positional("y"),
            ]
        );
    }

    #[test]
    fn expand_file_lines_verbatim() {
        // Setup
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "@alice\n").unwrap();
        let argument = format!("@{}", file.path().display());
        let mut stream = TokenStream::new(&[argument.as_str()], true);

        // Execute
        let tokens = drain(&mut stream);

        // Verify
        assert_eq!(tokens, vec![Token::positional("@alice")]);
    }

    #[test]
    fn expand_file_self_reference() {
        // Setup
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let argument = format!("@{}", file.path().display());
        writeln!(file, "{argument}").unwrap();
        let mut stream = TokenStream::new(&[argument.as_str(), "x"], true);

        // Execute
        let tokens = drain(&mut stream);

        // Verify
        assert_eq!(
            tokens,
            vec![Token::positional(argument.as_str()), Token::positional("x")]
        );
    }

    #[test]
    fn expand_file_disabled() {
        // Setup
        let mut stream = TokenStream::new(&["@missing"], false);

        // Execute
        let tokens = drain(&mut stream);

        // Verify
        assert_eq!(tokens, vec![Token::positional("@missing")]);
    }

    #[test]
    fn expand_file_missing() {
        // Setup
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("absent");
        let argument = format!("@{}", path.display());
        let mut stream = TokenStream::new(&[argument.as_str()], true);

        // Execute
        let result = stream.next(&shorts());

        // Verify
        assert_matches!(result, Err(ParseError::ArgumentFile { path: p, .. }) => {
            assert_eq!(p, path.display().to_string());
        });
    }

    #[test]
    fn display() {
        assert_eq!(Token::short('a').to_string(), "-a");
        assert_eq!(Token::long("flag").to_string(), "--flag");
        assert_eq!(Token::positional("x").to_string(), "x");
    }
}
