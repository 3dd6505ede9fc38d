use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::parser::ParseContext;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// The error type returned by a failing [`Resolver`].
pub type ResolverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An external source of values for flags/arguments not given on the command line.
///
/// Resolvers are consulted, in registration order, after the clause's environment variable and before its static default.
/// The first resolver to produce a value wins.
/// Resolvers must not have side effects on the parse; they only read the [`ParseContext`].
///
/// Closures of the right shape are resolvers:
/// ```
/// # use pinion_builder as pinion;
/// use pinion::{CommandLineParser, Parameter, ParseContext, ResolverError, Scalar};
///
/// let mut name: String = String::default();
/// let mut parser = CommandLineParser::new("program")
///     .add(Parameter::flag(Scalar::new(&mut name), "name", None))
///     .resolver(|key: &str, _: &ParseContext| -> Result<Option<Vec<String>>, ResolverError> {
///         Ok((key == "name").then(|| vec!["from-config".to_string()]))
///     })
///     .build();
///
/// parser.parse_tokens(empty::slice()).unwrap();
/// drop(parser);
/// assert_eq!(name, "from-config");
/// ```
pub trait Resolver {
    /// Look up the values for `key`, or `None` when this resolver has nothing to say.
    fn resolve(
        &self,
        key: &str,
        context: &ParseContext,
    ) -> Result<Option<Vec<String>>, ResolverError>;
}

impl<F> Resolver for F
where
    F: Fn(&str, &ParseContext) -> Result<Option<Vec<String>>, ResolverError>,
{
    fn resolve(
        &self,
        key: &str,
        context: &ParseContext,
    ) -> Result<Option<Vec<String>>, ResolverError> {
        self(key, context)
    }
}

/// Resolves from a fixed key to values map.
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    values: HashMap<String, Vec<String>>,
}

impl MapResolver {
    /// Create an empty map resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `key` to `values`.
    /// If repeated for the same `key`, only the final values apply.
    pub fn with(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.values
            .insert(key.into(), values.into_iter().map(|v| v.into()).collect());
        self
    }
}

impl Resolver for MapResolver {
    fn resolve(
        &self,
        key: &str,
        _context: &ParseContext,
    ) -> Result<Option<Vec<String>>, ResolverError> {
        Ok(self.values.get(key).cloned())
    }
}

/// Resolves `key` from the environment variable named by transforming `<prefix><key>`.
///
/// The name is transformed the same way as derived flag environment variables, so with a prefix of `APP_` the key `some-flag` reads `APP_SOME_FLAG`.
/// A non-empty `separator` splits the variable's value into multiple values (ex: `","` turns `"a,b"` into `["a", "b"]`).
#[derive(Debug, Clone)]
pub struct PrefixedEnvarResolver {
    prefix: String,
    separator: String,
}

impl PrefixedEnvarResolver {
    /// Create an environment resolver for variables starting with `prefix`, whose values are split on `separator`.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }
}

impl Resolver for PrefixedEnvarResolver {
    fn resolve(
        &self,
        key: &str,
        _context: &ParseContext,
    ) -> Result<Option<Vec<String>>, ResolverError> {
        let variable = envar_transform(&format!("{}{key}", self.prefix));
        Ok(lookup_envar(&variable).map(|value| split_separated(&value, &self.separator)))
    }
}

/// The ways JSON configuration can fail to load.
#[derive(Debug, Error)]
pub enum JsonError {
    /// The configuration file could not be read.
    #[error("cannot read '{path}': {source}")]
    Read {
        /// The configuration file.
        path: String,
        /// The underlying failure.
        source: std::io::Error,
    },
    /// The configuration is not a JSON object.
    #[error(transparent)]
    Syntax(#[from] serde_json::Error),
    /// A configuration entry is neither a string, number, boolean, nor an array of those.
    #[error("unsupported JSON value for '{key}': {value}")]
    Unsupported {
        /// The configuration entry.
        key: String,
        /// The offending value.
        value: Value,
    },
}

/// Resolves from a JSON object, mapping each key to its values.
///
/// Strings, numbers and booleans become a single value; arrays are flattened into multiple values.
///
/// ### Example
/// ```
/// # use pinion_builder as pinion;
/// use pinion::{Collection, CommandLineParser, JsonResolver, Parameter, Scalar};
/// use std::str::FromStr;
///
/// let mut port: u16 = 0;
/// let mut hosts: Vec<String> = Vec::default();
/// let resolver = JsonResolver::from_str(r#"{"port": 8080, "hosts": ["a", "b"]}"#).unwrap();
/// let mut parser = CommandLineParser::new("program")
///     .add(Parameter::flag(Scalar::new(&mut port), "port", None))
///     .add(Parameter::flag(Collection::new(&mut hosts), "hosts", None))
///     .resolver(resolver)
///     .build();
///
/// parser.parse_tokens(empty::slice()).unwrap();
/// drop(parser);
/// assert_eq!(port, 8080);
/// assert_eq!(hosts, vec!["a", "b"]);
/// ```
#[derive(Debug, Clone)]
pub struct JsonResolver {
    values: MapResolver,
}

impl JsonResolver {
    /// Load the JSON object in the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, JsonError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| JsonError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&content)
    }
}

impl FromStr for JsonResolver {
    type Err = JsonError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let object: Map<String, Value> = serde_json::from_str(data)?;
        let mut values = MapResolver::new();

        for (key, value) in object {
            let mut decoded = Vec::default();
            json_values(&value, &mut decoded).map_err(|value| JsonError::Unsupported {
                key: key.clone(),
                value,
            })?;
            values = values.with(key, decoded);
        }

        Ok(Self { values })
    }
}

impl Resolver for JsonResolver {
    fn resolve(
        &self,
        key: &str,
        context: &ParseContext,
    ) -> Result<Option<Vec<String>>, ResolverError> {
        self.values.resolve(key, context)
    }
}

fn json_values(value: &Value, out: &mut Vec<String>) -> Result<(), Value> {
    match value {
        Value::String(text) => out.push(text.clone()),
        Value::Number(number) => out.push(number.to_string()),
        Value::Bool(flag) => out.push(flag.to_string()),
        Value::Array(items) => {
            for item in items {
                json_values(item, out)?;
            }
        }
        Value::Null | Value::Object(_) => return Err(value.clone()),
    }

    Ok(())
}

/// Resolves from the JSON file named by the value of the flag/argument `clause`.
///
/// The clause must be given on the command line (or settled before the clauses it configures).
/// Until it has a value, nothing is resolved.
///
/// ### Example
/// ```no_run
/// # use pinion_builder as pinion;
/// use pinion::{CommandLineParser, JsonConfigResolver, Parameter, Scalar};
///
/// let mut config: String = String::default();
/// let mut port: u16 = 0;
/// let parser = CommandLineParser::new("program")
///     .add(Parameter::flag(Scalar::new(&mut config), "config", None).help("A JSON configuration file."))
///     .add(Parameter::flag(Scalar::new(&mut port), "port", None))
///     .resolver(JsonConfigResolver::new("config"))
///     .build();
/// parser.parse();
/// ```
#[derive(Debug)]
pub struct JsonConfigResolver {
    clause: String,
    loaded: RefCell<Option<(String, JsonResolver)>>,
}

impl JsonConfigResolver {
    /// Create a resolver reading the configuration file named by `clause`.
    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            loaded: RefCell::new(None),
        }
    }
}

impl Resolver for JsonConfigResolver {
    fn resolve(
        &self,
        key: &str,
        context: &ParseContext,
    ) -> Result<Option<Vec<String>>, ResolverError> {
        if key == self.clause {
            return Ok(None);
        }

        let Some(path) = context.value_of(&self.clause) else {
            return Ok(None);
        };
        let mut loaded = self.loaded.borrow_mut();

        if !matches!(loaded.as_ref(), Some((loaded_path, _)) if loaded_path == path) {
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Loading JSON configuration '{path}'.");
            }
            let resolver = JsonResolver::from_path(path)?;
            loaded.replace((path.to_string(), resolver));
        }

        match loaded.as_ref() {
            Some((_, resolver)) => resolver.resolve(key, context),
            None => Ok(None),
        }
    }
}

/// Renames keys before handing them to the wrapped resolver.
pub struct RenamingResolver<R, F> {
    inner: R,
    rename: F,
}

impl<R, F> RenamingResolver<R, F>
where
    R: Resolver,
    F: Fn(&str) -> String,
{
    /// Wrap `inner`, asking it for `rename(key)` instead of `key`.
    pub fn new(inner: R, rename: F) -> Self {
        Self { inner, rename }
    }
}

impl<R, F> Resolver for RenamingResolver<R, F>
where
    R: Resolver,
    F: Fn(&str) -> String,
{
    fn resolve(
        &self,
        key: &str,
        context: &ParseContext,
    ) -> Result<Option<Vec<String>>, ResolverError> {
        self.inner.resolve(&(self.rename)(key), context)
    }
}

/// Hides a set of keys from the wrapped resolver.
pub struct DontResolve<R> {
    inner: R,
    keys: HashSet<String>,
}

impl<R: Resolver> DontResolve<R> {
    /// Wrap `inner`, never resolving any of `keys`.
    pub fn new(inner: R, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            inner,
            keys: keys.into_iter().map(|k| k.into()).collect(),
        }
    }
}

impl<R: Resolver> Resolver for DontResolve<R> {
    fn resolve(
        &self,
        key: &str,
        context: &ParseContext,
    ) -> Result<Option<Vec<String>>, ResolverError> {
        if self.keys.contains(key) {
            Ok(None)
        } else {
            self.inner.resolve(key, context)
        }
    }
}

/// Uppercase `name`, collapsing every run of characters outside `[A-Za-z0-9_]` into one `_`.
pub(crate) fn envar_transform(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c.to_ascii_uppercase());
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    out
}

/// The value of environment variable `name`; empty counts as unset.
pub(crate) fn lookup_envar(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

/// Split `value` on `separator`; an empty separator keeps the value whole.
pub(crate) fn split_separated(value: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return vec![value.to_string()];
    }

    value.split(separator).map(|item| item.to_string()).collect()
}

/// Split a multi-line environment value, one item per line.
pub(crate) fn split_envar(value: &str) -> Vec<String> {
    value
        .trim_end_matches(['\r', '\n'])
        .lines()
        .map(|line| line.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Collection, CommandLineParser, Parameter, Scalar, Switch};
    use crate::parser::ParseError;
    use rstest::rstest;
    use serial_test::serial;
    use std::io::Write;

    fn context() -> ParseContext {
        ParseContext::new(empty::slice(), false)
    }

    #[rstest]
    #[case("flag", "FLAG")]
    #[case("some-flag", "SOME_FLAG")]
    #[case("a-1-flag", "A_1_FLAG")]
    #[case("some app", "SOME_APP")]
    #[case("x--y", "X_Y")]
    #[case("under_score", "UNDER_SCORE")]
    fn transform(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(envar_transform(name), expected);
    }

    #[rstest]
    #[case("a", vec!["a"])]
    #[case("a\nb", vec!["a", "b"])]
    #[case("a\r\nb\r\n", vec!["a", "b"])]
    #[case("a\n\nb\n", vec!["a", "", "b"])]
    fn split(#[case] value: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_envar(value), expected);
    }

    #[test]
    fn map_resolver() {
        // Setup
        let resolver = MapResolver::new()
            .with("a", ["1"])
            .with("b", ["2", "3"])
            .with("a", ["4"]);

        // Execute & Verify
        assert_eq!(
            resolver.resolve("a", &context()).unwrap(),
            Some(vec!["4".to_string()])
        );
        assert_eq!(
            resolver.resolve("b", &context()).unwrap(),
            Some(vec!["2".to_string(), "3".to_string()])
        );
        assert_eq!(resolver.resolve("c", &context()).unwrap(), None);
    }

    #[rstest]
    #[case("a,b", ",", vec!["a", "b"])]
    #[case("a,b", "", vec!["a,b"])]
    #[case("a;;b", ";", vec!["a", "", "b"])]
    #[case("a", ";", vec!["a"])]
    fn separated(#[case] value: &str, #[case] separator: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_separated(value, separator), expected);
    }

    #[test]
    #[serial]
    fn prefixed_envar_resolver() {
        // Setup
        std::env::set_var("PINION_TEST_DRY_RUN", "true");
        std::env::set_var("PINION_TEST_HOSTS", "a;b");
        std::env::set_var("PINION_TEST_EMPTY", "");
        let resolver = PrefixedEnvarResolver::new("pinion-test-", ";");

        // Execute & Verify
        assert_eq!(
            resolver.resolve("dry-run", &context()).unwrap(),
            Some(vec!["true".to_string()])
        );
        assert_eq!(
            resolver.resolve("hosts", &context()).unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(resolver.resolve("empty", &context()).unwrap(), None);
        assert_eq!(resolver.resolve("absent", &context()).unwrap(), None);
        std::env::remove_var("PINION_TEST_DRY_RUN");
        std::env::remove_var("PINION_TEST_HOSTS");
        std::env::remove_var("PINION_TEST_EMPTY");
    }

    #[test]
    #[serial]
    fn prefixed_envar_resolver_cumulative() {
        // Setup
        std::env::set_var("APP_FOO", "a,b");
        let mut foo: Vec<String> = Vec::default();
        let mut parser = CommandLineParser::new("program")
            .add(Parameter::flag(Collection::new(&mut foo), "foo", None))
            .resolver(PrefixedEnvarResolver::new("APP_", ","))
            .build_parser()
            .unwrap();

        // Execute
        parser.parse_tokens(empty::slice()).unwrap();
        drop(parser);
        std::env::remove_var("APP_FOO");

        // Verify
        assert_eq!(foo, vec!["a", "b"]);
    }

    const CONFIG: &str = r#"{
        "str": "string",
        "num": 1234,
        "ratio": 0.5,
        "bool": true,
        "array": ["a", "b", [3]]
    }"#;

    #[test]
    fn json_resolver() {
        // Setup
        let resolver = JsonResolver::from_str(CONFIG).unwrap();

        // Execute & Verify
        assert_eq!(
            resolver.resolve("str", &context()).unwrap(),
            Some(vec!["string".to_string()])
        );
        assert_eq!(
            resolver.resolve("num", &context()).unwrap(),
            Some(vec!["1234".to_string()])
        );
        assert_eq!(
            resolver.resolve("ratio", &context()).unwrap(),
            Some(vec!["0.5".to_string()])
        );
        assert_eq!(
            resolver.resolve("bool", &context()).unwrap(),
            Some(vec!["true".to_string()])
        );
        assert_eq!(
            resolver.resolve("array", &context()).unwrap(),
            Some(vec!["a".to_string(), "b".to_string(), "3".to_string()])
        );
        assert_eq!(resolver.resolve("absent", &context()).unwrap(), None);
    }

    #[rstest]
    #[case(r#"["a"]"#)]
    #[case(r#"{"a": "#)]
    fn json_resolver_syntax(#[case] data: &str) {
        assert_matches!(JsonResolver::from_str(data), Err(JsonError::Syntax(_)));
    }

    #[rstest]
    #[case(r#"{"a": null}"#)]
    #[case(r#"{"a": {"b": 1}}"#)]
    #[case(r#"{"a": [1, null]}"#)]
    fn json_resolver_unsupported(#[case] data: &str) {
        assert_matches!(
            JsonResolver::from_str(data),
            Err(JsonError::Unsupported { key, .. }) if key == "a"
        );
    }

    #[test]
    fn json_resolver_parse() {
        // Setup
        let mut text: String = String::default();
        let mut num: u32 = 0;
        let mut flag: bool = false;
        let mut array: Vec<String> = Vec::default();
        let mut parser = CommandLineParser::new("program")
            .add(Parameter::flag(Scalar::new(&mut text), "str", None))
            .add(Parameter::flag(Scalar::new(&mut num), "num", None))
            .add(Parameter::flag(Switch::new(&mut flag), "bool", None))
            .add(Parameter::flag(Collection::new(&mut array), "array", None))
            .resolver(JsonResolver::from_str(CONFIG).unwrap())
            .build_parser()
            .unwrap();

        // Execute
        parser.parse_tokens(empty::slice()).unwrap();
        drop(parser);

        // Verify
        assert_eq!(text, "string");
        assert_eq!(num, 1234);
        assert!(flag);
        assert_eq!(array, vec!["a", "b", "3"]);
    }

    #[test]
    fn json_config_resolver() {
        // Setup
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{CONFIG}").unwrap();
        let path = file.path().display().to_string();
        let mut config: String = String::default();
        let mut text: String = String::default();
        let mut num: u32 = 0;
        let mut array: Vec<String> = Vec::default();
        let mut parser = CommandLineParser::new("program")
            .add(Parameter::flag(Scalar::new(&mut config), "config", None).required())
            .add(Parameter::flag(Scalar::new(&mut text), "str", None))
            .add(Parameter::flag(Scalar::new(&mut num), "num", None))
            .add(Parameter::flag(Collection::new(&mut array), "array", None))
            .resolver(JsonConfigResolver::new("config"))
            .build_parser()
            .unwrap();

        // Execute
        parser.parse_tokens(&["--config", path.as_str()]).unwrap();
        drop(parser);

        // Verify
        assert_eq!(config, path);
        assert_eq!(text, "string");
        assert_eq!(num, 1234);
        assert_eq!(array, vec!["a", "b", "3"]);
    }

    #[test]
    fn json_config_resolver_unset() {
        // Setup
        let resolver = JsonConfigResolver::new("config");

        // Execute & Verify
        assert_eq!(resolver.resolve("str", &context()).unwrap(), None);
    }

    #[test]
    fn json_config_resolver_missing_file() {
        // Setup
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("absent.json");
        let mut config: String = String::default();
        let mut text: String = String::default();
        let mut parser = CommandLineParser::new("program")
            .add(Parameter::flag(Scalar::new(&mut config), "config", None))
            .add(Parameter::flag(Scalar::new(&mut text), "str", None))
            .resolver(JsonConfigResolver::new("config"))
            .build_parser()
            .unwrap();

        // Execute
        let result = parser.try_parse_tokens(&["--config", path.to_str().unwrap()]);

        // Verify
        assert_matches!(result, Err(ParseError::Resolver { key, .. }) => {
            assert_eq!(key, "str");
        });
    }

    #[test]
    fn renaming_resolver() {
        // Setup
        let resolver = RenamingResolver::new(MapResolver::new().with("config.name", ["x"]), |key| {
            format!("config.{key}")
        });

        // Execute & Verify
        assert_eq!(
            resolver.resolve("name", &context()).unwrap(),
            Some(vec!["x".to_string()])
        );
        assert_eq!(resolver.resolve("config.name", &context()).unwrap(), None);
    }

    #[test]
    fn dont_resolve() {
        // Setup
        let resolver = DontResolve::new(MapResolver::new().with("a", ["1"]).with("b", ["2"]), ["a"]);

        // Execute & Verify
        assert_eq!(resolver.resolve("a", &context()).unwrap(), None);
        assert_eq!(
            resolver.resolve("b", &context()).unwrap(),
            Some(vec!["2".to_string()])
        );
    }

    #[test]
    fn closure_resolver() {
        // Setup
        let resolver = |key: &str, _: &ParseContext| -> Result<Option<Vec<String>>, ResolverError> {
            if key == "broken" {
                Err("config unreadable".into())
            } else {
                Ok(None)
            }
        };

        // Execute & Verify
        assert_eq!(resolver.resolve("fine", &context()).unwrap(), None);
        assert_eq!(
            resolver.resolve("broken", &context()).unwrap_err().to_string(),
            "config unreadable"
        );
    }
}
