use tasklane::application::parser::{ItemKind, tokenize};
use tasklane::domain::value::StreamSource;
use tasklane::{
    ArgumentSpec, Argv, CommandSpec, OptionSpec, ParseError, ParseResult, ParseSpec, Parser, Value,
    ValueType,
};

async fn parse_verified(spec: &ParseSpec, argv: impl Into<Argv>) -> Result<ParseResult, ParseError> {
    let parser = Parser::new(spec);
    let mut result = parser.parse(argv).await?;
    parser.fill_defaults(&mut result);
    parser.verify(&result)?;
    Ok(result)
}

fn strings(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::from(*s)).collect()
}

#[test]
fn test_tokenize_is_idempotent() {
    let first = tokenize(&Argv::from(r#"build --name "hello world" ---x 'a b'"#));
    assert_eq!(first, vec!["build", "--name", "hello world", "--x", "a b"]);
    let second = tokenize(&Argv::List(first.clone()));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_required_option_satisfied_by_alias() {
    let spec = ParseSpec {
        options: vec![
            OptionSpec::new("token")
                .alias("t")
                .kind(ValueType::String)
                .required(),
        ],
        ..ParseSpec::default()
    };

    let err = parse_verified(&spec, "").await.unwrap_err();
    assert!(matches!(
        &err,
        ParseError::Demand { kind: ItemKind::Option, item: Some(name), .. } if name == "token"
    ));
    assert_eq!(err.to_string(), "Option required: token");

    let result = parse_verified(&spec, "-t abc").await.unwrap();
    assert_eq!(result.options["token"], Value::from("abc"));
}

#[tokio::test]
async fn test_array_argument_arity() {
    let spec = ParseSpec {
        arguments: vec![ArgumentSpec::new("files").array().min(1).max(3)],
        ..ParseSpec::default()
    };

    let err = parse_verified(&spec, "").await.unwrap_err();
    assert!(matches!(err, ParseError::Count { actual: 0, expected: (1, 3), .. }));

    let one = parse_verified(&spec, "a").await.unwrap();
    assert_eq!(one.arguments["files"], Value::List(strings(&["a"])));

    let three = parse_verified(&spec, "a b c").await.unwrap();
    assert_eq!(three.arguments["files"], Value::List(strings(&["a", "b", "c"])));

    let err = parse_verified(&spec, "a b c d").await.unwrap_err();
    assert!(matches!(err, ParseError::Count { actual: 4, expected: (1, 3), .. }));
    assert_eq!(
        err.to_string(),
        "Too many values provided for argument files. Got 4, wanted between 1 and 3"
    );
}

#[tokio::test]
async fn test_boolean_negation_and_clusters() {
    let spec = ParseSpec {
        options: vec![
            OptionSpec::new("color"),
            OptionSpec::new("all").alias("a"),
            OptionSpec::new("brief").alias("b"),
        ],
        ..ParseSpec::default()
    };

    let result = parse_verified(&spec, "--no-color").await.unwrap();
    assert_eq!(result.options["color"], Value::Bool(false));

    let result = parse_verified(&spec, "--no-no-color").await.unwrap();
    assert_eq!(result.options["color"], Value::Bool(true));

    let result = parse_verified(&spec, "-ab").await.unwrap();
    assert_eq!(result.options["all"], Value::Bool(true));
    assert_eq!(result.options["brief"], Value::Bool(true));
    assert_eq!(result.options["color"], Value::Bool(false));
}

#[tokio::test]
async fn test_negative_number_needs_numeric_consumer() {
    let spec = ParseSpec {
        options: vec![OptionSpec::new("offset").kind(ValueType::Number)],
        ..ParseSpec::default()
    };

    let result = parse_verified(&spec, "--offset -5").await.unwrap();
    assert_eq!(result.options["offset"], Value::Number(-5.0));

    let err = parse_verified(&spec, "-5").await.unwrap_err();
    assert!(matches!(err, ParseError::Structural { .. }));
    assert!(err.pointer().unwrap().starts_with("Invalid input:\n  -5\n  ↑"));
}

#[tokio::test]
async fn test_unknown_option_and_bad_choice() {
    let spec = ParseSpec {
        options: vec![
            OptionSpec::new("mode")
                .kind(ValueType::String)
                .choices(["fast", "slow"]),
        ],
        ..ParseSpec::default()
    };

    let err = parse_verified(&spec, "--nope").await.unwrap_err();
    assert_eq!(err.to_string(), "No such option: nope");

    let err = parse_verified(&spec, "--mode medium").await.unwrap_err();
    assert!(matches!(err, ParseError::InvalidType { .. }));
    assert!(err.to_string().ends_with("Valid inputs: fast, slow"));

    let result = parse_verified(&spec, "--mode=slow").await.unwrap();
    assert_eq!(result.options["mode"], Value::from("slow"));
}

#[tokio::test]
async fn test_missing_value_after_equals() {
    let spec = ParseSpec {
        options: vec![OptionSpec::new("name").kind(ValueType::String)],
        ..ParseSpec::default()
    };
    let err = parse_verified(&spec, "--name=").await.unwrap_err();
    assert!(matches!(err, ParseError::Structural { ref reason, .. } if reason.starts_with("Missing value")));
}

#[tokio::test]
async fn test_command_descent_and_help_token() {
    let spec = ParseSpec {
        commands: vec![
            CommandSpec::new("config").alias("cfg").command(
                CommandSpec::new("set")
                    .argument(ArgumentSpec::new("name").required().order(1))
                    .argument(ArgumentSpec::new("value").order(2)),
            ),
        ],
        ..ParseSpec::default()
    };

    let result = parse_verified(&spec, "cfg set theme dark").await.unwrap();
    assert_eq!(result.command_path, vec!["config", "set"]);
    assert_eq!(result.arguments["name"], Value::from("theme"));
    assert_eq!(result.arguments["value"], Value::from("dark"));

    let result = Parser::new(&spec).parse("help config").await.unwrap();
    assert!(result.help);
    assert_eq!(result.command_path, vec!["config"]);

    let err = parse_verified(&spec, "conifg").await.unwrap_err();
    assert!(matches!(
        err,
        ParseError::NotFound { kind: ItemKind::Command, ref item, .. } if item == "conifg"
    ));
}

#[tokio::test]
async fn test_double_dash_ends_option_parsing() {
    let spec = ParseSpec {
        options: vec![OptionSpec::new("verbose")],
        arguments: vec![ArgumentSpec::new("rest").array()],
        ..ParseSpec::default()
    };

    let result = parse_verified(&spec, "--verbose -- --literal x").await.unwrap();
    assert_eq!(result.options["verbose"], Value::Bool(true));
    assert_eq!(result.arguments["rest"], Value::List(strings(&["--literal", "x"])));
}

#[tokio::test]
async fn test_array_option_collects_repeats() {
    let spec = ParseSpec {
        options: vec![OptionSpec::new("tag").kind(ValueType::String).array()],
        ..ParseSpec::default()
    };

    let result = parse_verified(&spec, "--tag a b --tag c").await.unwrap();
    assert_eq!(result.options["tag"], Value::List(strings(&["a", "b", "c"])));

    let result = parse_verified(&spec, "").await.unwrap();
    assert_eq!(result.options["tag"], Value::List(Vec::new()));
}

#[tokio::test]
async fn test_duplicate_scalar_option_is_count_error() {
    let spec = ParseSpec {
        options: vec![OptionSpec::new("name").kind(ValueType::String)],
        ..ParseSpec::default()
    };
    let err = parse_verified(&spec, "--name a --name b").await.unwrap_err();
    assert!(matches!(
        err,
        ParseError::Count { kind: ItemKind::Option, actual: 2, expected: (1, 1), .. }
    ));
}

#[tokio::test]
async fn test_stdin_dash_only_for_stream_items() {
    let spec = ParseSpec {
        options: vec![
            OptionSpec::new("input").kind(ValueType::Stream),
            OptionSpec::new("name").kind(ValueType::String),
        ],
        arguments: vec![
            ArgumentSpec::new("label").order(1),
            ArgumentSpec::new("source").kind(ValueType::Stream).order(2),
        ],
        ..ParseSpec::default()
    };

    let result = parse_verified(&spec, "--input -").await.unwrap();
    assert_eq!(result.options["input"], Value::Stream(StreamSource::Stdin));

    let result = parse_verified(&spec, "foo -").await.unwrap();
    assert_eq!(result.arguments["label"], Value::from("foo"));
    assert_eq!(result.arguments["source"], Value::Stream(StreamSource::Stdin));

    let err = parse_verified(&spec, "--name -").await.unwrap_err();
    assert!(matches!(err, ParseError::Structural { .. }));

    let err = parse_verified(&spec, "-").await.unwrap_err();
    assert!(matches!(err, ParseError::Structural { .. }));
}

#[tokio::test]
async fn test_boolean_option_falls_through_to_argument() {
    let spec = ParseSpec {
        options: vec![OptionSpec::new("verbose")],
        arguments: vec![ArgumentSpec::new("target").order(1)],
        ..ParseSpec::default()
    };

    let result = parse_verified(&spec, "--verbose foo").await.unwrap();
    assert_eq!(result.options["verbose"], Value::Bool(true));
    assert_eq!(result.arguments["target"], Value::from("foo"));
}
