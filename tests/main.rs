use pinion::prelude::*;
use pinion::{
    ActionError, Collection, CommandLineParser, ConfigError, Duration, GenericCapturable,
    MapResolver, ParseContext, ParseError, Parameter, ResolverError, Scalar, Switch, ValueSource,
};
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::str::FromStr;

const TTL_ENVAR: &str = "PINION_INTEGRATION_TTL";

#[test]
fn builder_compiles() {
    CommandLineParser::new("organization");
}

#[rstest]
#[case(Some("y"), Some("z"), "y", ValueSource::Envar)]
#[case(None, Some("z"), "z", ValueSource::Resolver)]
#[case(Some(""), Some("z"), "z", ValueSource::Resolver)]
#[case(None, None, "x", ValueSource::Default)]
#[serial]
fn precedence(
    #[case] envar: Option<&str>,
    #[case] resolved: Option<&'static str>,
    #[case] expected: &str,
    #[case] expected_source: ValueSource,
) {
    // Setup
    match envar {
        Some(value) => env::set_var(TTL_ENVAR, value),
        None => env::remove_var(TTL_ENVAR),
    }

    let mut ttl: String = String::default();
    let mut parser = CommandLineParser::new("program")
        .add(
            Parameter::flag(Scalar::new(&mut ttl), "ttl", None)
                .envar(TTL_ENVAR)
                .default("x".to_string()),
        )
        .resolver(
            move |key: &str, _: &ParseContext| -> Result<Option<Vec<String>>, ResolverError> {
                Ok(resolved
                    .filter(|_| key == "ttl")
                    .map(|value| vec![value.to_string()]))
            },
        )
        .build_parser()
        .unwrap();

    // Execute
    let context = parser.parse_tokens(empty::slice()).unwrap();
    drop(parser);
    env::remove_var(TTL_ENVAR);

    // Verify
    assert_eq!(ttl, expected);
    assert_eq!(context.source_of("ttl"), Some(expected_source));
}

#[test]
#[serial]
fn explicit_beats_envar() {
    // Setup
    env::set_var(TTL_ENVAR, "y");
    let mut ttl: String = String::default();
    let mut parser = CommandLineParser::new("program")
        .add(Parameter::flag(Scalar::new(&mut ttl), "ttl", None).envar(TTL_ENVAR))
        .build_parser()
        .unwrap();

    // Execute
    let context = parser.parse_tokens(&["--ttl", "w"]).unwrap();
    drop(parser);
    env::remove_var(TTL_ENVAR);

    // Verify
    assert_eq!(ttl, "w");
    assert_eq!(context.source_of("ttl"), Some(ValueSource::Explicit));
}

#[test]
fn first_resolver_wins() {
    // Setup
    let mut region: String = String::default();
    let mut parser = CommandLineParser::new("program")
        .add(Parameter::flag(Scalar::new(&mut region), "region", None))
        .resolver(MapResolver::new())
        .resolver(MapResolver::new().with("region", ["first"]))
        .resolver(MapResolver::new().with("region", ["second"]))
        .build_parser()
        .unwrap();

    // Execute
    parser.parse_tokens(empty::slice()).unwrap();
    drop(parser);

    // Verify
    assert_eq!(region, "first");
}

#[test]
fn required_after_optional() {
    // Setup
    let mut a: String = String::default();
    let mut b: String = String::default();
    let clp = CommandLineParser::new("program")
        .add(Parameter::argument(Scalar::new(&mut a), "a"))
        .add(Parameter::argument(Scalar::new(&mut b), "b").required());

    // Execute
    let result = clp.build_parser();

    // Verify
    assert!(matches!(result, Err(ConfigError::RequiredAfterOptional(name)) if name == "b"));
}

#[test]
fn remainder_not_last() {
    // Setup
    let mut rest: Vec<String> = Vec::default();
    let mut last: String = String::default();
    let clp = CommandLineParser::new("program")
        .add(Parameter::argument(Collection::new(&mut rest), "rest"))
        .add(Parameter::argument(Scalar::new(&mut last), "last"));

    // Execute
    let result = clp.build_parser();

    // Verify
    assert!(matches!(result, Err(ConfigError::RemainderNotLast(name)) if name == "rest"));
}

#[rstest]
#[case(vec!["--name=value"])]
#[case(vec!["--name", "value"])]
#[case(vec!["-nvalue"])]
#[case(vec!["-n", "value"])]
fn flag_value_forms(#[case] tokens: Vec<&str>) {
    // Setup
    let mut name: String = String::default();
    let mut parser = CommandLineParser::new("program")
        .add(Parameter::flag(Scalar::new(&mut name), "name", Some('n')))
        .build_parser()
        .unwrap();

    // Execute
    parser.parse_tokens(tokens.as_slice()).unwrap();
    drop(parser);

    // Verify
    assert_eq!(name, "value");
}

#[test]
fn switch_capture_idempotent() {
    // Setup
    let mut once: bool = false;
    let mut twice: bool = false;

    // Execute
    Switch::new(&mut once).capture("true").unwrap();
    let mut switch = Switch::new(&mut twice);
    switch.capture("true").unwrap();
    switch.capture("true").unwrap();
    drop(switch);

    // Verify
    assert_eq!(once, twice);
    assert!(twice);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
fn negated_non_boolean(#[case] extra_flags: usize) {
    // Setup
    let mut ttl: u32 = 0;
    let mut extras: Vec<bool> = vec![false; extra_flags];
    let names: Vec<String> = (0..extra_flags).map(|i| format!("extra-{i}")).collect();
    let mut clp =
        CommandLineParser::new("program").add(Parameter::flag(Scalar::new(&mut ttl), "ttl", None));

    for (extra, name) in extras.iter_mut().zip(names.iter()) {
        clp = clp.add(Parameter::flag(Switch::new(extra), name.as_str(), None));
    }

    let mut parser = clp.build_parser().unwrap();

    // Execute
    let result = parser.try_parse_tokens(&["--no-ttl"]);

    // Verify
    assert!(matches!(result, Err(ParseError::NonNegatable(name)) if name == "ttl"));
}

#[test]
fn nested_command_path() {
    // Setup
    let mut arg: String = String::default();
    let mut parser = CommandLineParser::new("program")
        .command("a", |a| {
            a.command("b", |b| {
                b.add(Parameter::argument(Scalar::new(&mut arg), "arg").required())
            })
        })
        .build_parser()
        .unwrap();

    // Execute
    let context = parser.parse_tokens(&["a", "b", "value"]).unwrap();
    let error = parser.try_parse_tokens(&["a", "b"]).unwrap_err();
    drop(parser);

    // Verify
    assert_eq!(context.selected_command(), "a b");
    assert_eq!(arg, "value");
    assert!(matches!(error, ParseError::MissingRequiredArgument(name) if name == "arg"));
}

#[rstest]
#[case(vec![], "5s")]
#[case(vec!["-t", "10s"], "10s")]
#[case(vec!["--ttl", "1h30m"], "1h30m0s")]
fn duration_flag(#[case] tokens: Vec<&str>, #[case] expected: &str) {
    // Setup
    let mut ttl: Duration = Duration::default();
    let mut parser = CommandLineParser::new("program")
        .add(
            Parameter::flag(Scalar::new(&mut ttl), "ttl", Some('t'))
                .default(Duration::from_str("5s").unwrap()),
        )
        .build_parser()
        .unwrap();

    // Execute
    parser.parse_tokens(tokens.as_slice()).unwrap();
    drop(parser);

    // Verify
    assert_eq!(ttl.to_string(), expected);
}

#[test]
fn duration_flag_invalid() {
    // Setup
    let mut ttl: Duration = Duration::default();
    let mut parser = CommandLineParser::new("program")
        .add(Parameter::flag(Scalar::new(&mut ttl), "ttl", Some('t')))
        .build_parser()
        .unwrap();

    // Execute
    let result = parser.try_parse_tokens(&["--ttl=notaduration"]);

    // Verify
    assert!(matches!(result, Err(ParseError::InvalidValue { clause, .. }) if clause == "--ttl"));
}

#[test]
fn required_with_default() {
    // Setup
    let mut ttl: Duration = Duration::default();
    let clp = CommandLineParser::new("program").add(
        Parameter::flag(Scalar::new(&mut ttl), "ttl", Some('t'))
            .required()
            .default(Duration::from_secs(5)),
    );

    // Execute
    let result = clp.build_parser();

    // Verify
    assert!(matches!(result, Err(ConfigError::RequiredWithDefault(name)) if name == "--ttl"));
}

#[test]
fn two_default_siblings() {
    // Setup
    let clp = CommandLineParser::new("program")
        .command("one", |one| one.default())
        .command("two", |two| two.default());

    // Execute
    let result = clp.build_parser();

    // Verify
    assert!(matches!(result, Err(ConfigError::MultipleDefaultCommands(_))));
}

#[rstest]
#[case(vec!["-ab"], true, true)]
#[case(vec!["-ba"], true, true)]
#[case(vec!["-a"], true, false)]
#[case(vec![], false, false)]
fn combined_short_booleans(
    #[case] tokens: Vec<&str>,
    #[case] expected_a: bool,
    #[case] expected_b: bool,
) {
    // Setup
    let mut a: bool = false;
    let mut b: bool = false;
    let mut parser = CommandLineParser::new("program")
        .add(Parameter::flag(Switch::new(&mut a), "apple", Some('a')))
        .add(Parameter::flag(Switch::new(&mut b), "banana", Some('b')))
        .build_parser()
        .unwrap();

    // Execute
    parser.parse_tokens(tokens.as_slice()).unwrap();
    drop(parser);

    // Verify
    assert_eq!(a, expected_a);
    assert_eq!(b, expected_b);
}

#[test]
fn argument_file() {
    // Setup
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "--name\nfrom file\n").unwrap();
    let argument = format!("@{}", file.path().display());
    let mut name: String = String::default();
    let mut items: Vec<u32> = Vec::default();
    let mut parser = CommandLineParser::new("program")
        .add(Parameter::flag(Scalar::new(&mut name), "name", None))
        .add(Parameter::argument(Collection::new(&mut items), "item"))
        .build_parser()
        .unwrap();

    // Execute
    parser.parse_tokens(&["1", argument.as_str(), "2"]).unwrap();
    drop(parser);

    // Verify
    assert_eq!(name, "from file");
    assert_eq!(items, vec![1, 2]);
}

#[test]
fn completion() {
    // Setup
    let mut region: String = String::default();
    let mut service: String = String::default();
    let mut parser = CommandLineParser::new("deploy")
        .add(
            Parameter::flag(Scalar::new(&mut region), "region", None)
                .choice("eu".to_string(), "Europe.")
                .choice("us".to_string(), "North America."),
        )
        .command("rollout", |rollout| {
            rollout.add(
                Parameter::argument(Scalar::new(&mut service), "service")
                    .hint_options(["api", "web"]),
            )
        })
        .command("status", |status| status.hidden())
        .build_parser()
        .unwrap();

    // Execute & Verify
    assert_eq!(parser.complete(&[""]).words, vec!["rollout", "help"]);
    assert_eq!(parser.complete(&["--"]).words, vec!["--help", "--region"]);
    assert_eq!(parser.complete(&["--region", ""]).words, vec!["eu", "us"]);
    assert_eq!(parser.complete(&["rollout", ""]).words, vec!["api", "web"]);
    drop(parser);
    assert_eq!(region, "");
}

#[test]
fn validator_error_surfaces_unchanged() {
    // Setup
    let mut parser = CommandLineParser::new("program")
        .validate(|_: &ParseContext| -> Result<(), ActionError> {
            Err("the stars are not aligned".into())
        })
        .build_parser()
        .unwrap();

    // Execute
    let error = parser.try_parse_tokens(empty::slice()).unwrap_err();

    // Verify
    assert_eq!(error.to_string(), "the stars are not aligned");
}
