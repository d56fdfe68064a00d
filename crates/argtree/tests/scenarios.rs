use argtree::{
    ArgumentBuilder, ArgumentResult, CommandBuilder, OptionBuilder, ParseErrorKind, Parser,
    ResultKind, Value, ValueDescriptor, ValueType,
};

#[test]
fn bool_and_string_options() {
    let tree = CommandBuilder::new("root")
        .option(
            OptionBuilder::new("--bool")
                .alias("-b")
                .argument(ArgumentBuilder::of(ValueType::Bool).zero_or_one()),
        )
        .option(
            OptionBuilder::new("--string")
                .alias("-s")
                .argument(ArgumentBuilder::of(ValueType::String).exactly_one()),
        )
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["--bool", "true", "-s", "test"]);

    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(
        result.try_get_value(&ValueDescriptor::new("--bool")),
        Some(Value::Bool(true))
    );
    assert_eq!(
        result.try_get_value(&ValueDescriptor::new("--string")),
        Some(Value::Str("test".to_string()))
    );
}

#[test]
fn disallowed_value_reports_missing_argument() {
    let tree = CommandBuilder::new("root")
        .option(
            OptionBuilder::new("-x")
                .argument(ArgumentBuilder::of(ValueType::String).from_among(["this", "that"])),
        )
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["-x", "none-of-those"]);

    assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
    let error = &result.errors()[0];
    assert_eq!(error.message(), "Required argument missing for option: -x");
    assert_eq!(
        error.kind(),
        &ParseErrorKind::DisallowedValue {
            value: "none-of-those".to_string(),
            allowed: vec!["this".to_string(), "that".to_string()],
        }
    );
    assert!(!error.can_retry_token());

    let x = result.get(error.result().unwrap());
    assert_eq!(x.kind(), ResultKind::Option);
    assert!(x.symbol().has_raw_alias("-x"));
    assert_eq!(x.outcome(), Some(&ArgumentResult::Unparsed));
}

#[test]
fn repeated_restricted_option_reports_the_overflow() {
    let tree = CommandBuilder::new("root")
        .option(
            OptionBuilder::new("-x")
                .argument(ArgumentBuilder::of(ValueType::String).from_among(["this", "that"])),
        )
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["-x", "this", "-x", "nope"]);

    assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
    assert_eq!(result.errors()[0].kind(), &ParseErrorKind::TooManyValues);
    assert_eq!(
        result.errors()[0].message(),
        "Option '-x' expects a single argument but 2 were provided."
    );
    let x = result.find_result_for("-x").unwrap();
    assert_eq!(x.values(), vec!["this", "nope"]);
    assert_eq!(x.outcome(), Some(&ArgumentResult::TooManyValues));
}

#[test]
fn missing_required_subcommand() {
    let tree = CommandBuilder::new("outer")
        .subcommand(
            CommandBuilder::new("inner")
                .argument(ArgumentBuilder::of(ValueType::String).one_or_more())
                .subcommand(CommandBuilder::new("three"))
                .subcommand_required(true),
        )
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["outer", "inner", "arg"]);

    assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
    let error = &result.errors()[0];
    assert_eq!(error.kind(), &ParseErrorKind::RequiredSubcommandMissing);
    assert_eq!(error.message(), "Required command was not provided.");
    let inner = result.get(error.result().unwrap());
    assert_eq!(inner.name(), "inner");
    assert_eq!(inner.values(), vec!["arg"]);
    assert!(!result.root().token().is_implicit());
}

#[test]
fn option_without_its_required_value() {
    let tree = CommandBuilder::new("root")
        .option(OptionBuilder::new("-x").argument(ArgumentBuilder::of(ValueType::String).exactly_one()))
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["-x"]);

    assert_eq!(result.errors().len(), 1);
    assert_eq!(
        result.errors()[0].message(),
        "Required argument missing for option: -x"
    );
    assert_eq!(
        result.errors()[0].kind(),
        &ParseErrorKind::MissingRequiredValue
    );
    let x = result.find_result_for("-x").unwrap();
    assert_eq!(x.outcome(), Some(&ArgumentResult::MissingRequiredValue));
    assert_eq!(x.value(), None);
    assert_eq!(result.get_value("-x"), None);
}

#[test]
fn nonexistent_file_fails_validation() {
    let missing = std::env::temp_dir().join(format!(
        "argtree-missing-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let missing = missing.to_string_lossy().into_owned();

    let tree = CommandBuilder::new("root")
        .argument(
            ArgumentBuilder::of(ValueType::Path)
                .name("input")
                .exactly_one()
                .existing_files_only(),
        )
        .build()
        .unwrap();
    let result = Parser::new(tree).parse([missing.clone()]);

    assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
    let error = &result.errors()[0];
    assert_eq!(error.kind(), &ParseErrorKind::CustomValidationFailed);
    assert_eq!(error.message(), format!("File does not exist: {missing}"));
    assert!(!error.can_retry_token());
    assert_eq!(result.root().value(), None);
    assert_eq!(result.get_value("input"), None);
}

#[test]
fn existing_file_passes_validation() {
    let tree = CommandBuilder::new("root")
        .argument(
            ArgumentBuilder::of(ValueType::Path)
                .name("input")
                .existing_files_only(),
        )
        .build()
        .unwrap();
    let here = env!("CARGO_MANIFEST_DIR");
    let result = Parser::new(tree).parse([here]);
    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(
        result.get_value("input"),
        Some(Value::Path(here.into()))
    );
}

#[test]
fn illegal_path_characters_are_rejected() {
    let tree = CommandBuilder::new("root")
        .argument(
            ArgumentBuilder::of(ValueType::Path)
                .name("output")
                .legal_file_paths_only(),
        )
        .build()
        .unwrap();
    let parser = Parser::new(tree);

    let result = parser.parse(["bad\0name"]);
    assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
    let error = &result.errors()[0];
    assert_eq!(error.kind(), &ParseErrorKind::CustomValidationFailed);
    assert!(
        error.message().starts_with("Character not allowed in a path"),
        "{}",
        error.message()
    );
    assert_eq!(result.get_value("output"), None);

    let result = parser.parse(["some/dir/file.txt"]);
    assert!(result.errors().is_empty(), "{:?}", result.errors());
}

#[test]
fn directory_existence_is_validated() {
    let tree = CommandBuilder::new("root")
        .argument(
            ArgumentBuilder::of(ValueType::Path)
                .name("dir")
                .existing_directories_only(),
        )
        .build()
        .unwrap();
    let parser = Parser::new(tree);

    let file = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
    let result = parser.parse([file]);
    assert_eq!(result.errors().len(), 1, "{:?}", result.errors());
    assert_eq!(
        result.errors()[0].kind(),
        &ParseErrorKind::CustomValidationFailed
    );
    assert_eq!(
        result.errors()[0].message(),
        format!("Directory does not exist: {file}")
    );

    let dir = std::env::temp_dir();
    let dir = dir.to_string_lossy().into_owned();
    let result = parser.parse([dir.clone()]);
    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(result.get_value("dir"), Some(Value::Path(dir.into())));
}

#[test]
fn too_many_values_for_a_repeated_option() {
    let tree = CommandBuilder::new("root")
        .option(OptionBuilder::new("--name").argument(ArgumentBuilder::of(ValueType::String)))
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["--name", "a", "--name", "b"]);

    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].kind(), &ParseErrorKind::TooManyValues);
    assert_eq!(
        result.errors()[0].message(),
        "Option '--name' expects a single argument but 2 were provided."
    );
    assert!(result.unmatched_tokens().is_empty());
}

#[test]
fn type_conversion_failure_carries_the_text() {
    let tree = CommandBuilder::new("root")
        .option(OptionBuilder::new("--port").argument(ArgumentBuilder::of(ValueType::Int)))
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["--port", "eighty"]);

    assert_eq!(result.errors().len(), 1);
    assert_eq!(
        result.errors()[0].message(),
        "Cannot parse argument 'eighty' as expected type int."
    );
    let port = result.find_result_for("port").unwrap();
    assert!(matches!(
        port.outcome(),
        Some(ArgumentResult::TypeConversionFailed(msg)) if msg.contains("eighty")
    ));
}

#[test]
fn custom_validator_sees_the_resolved_result() {
    let tree = CommandBuilder::new("root")
        .option(
            OptionBuilder::new("--even").argument(ArgumentBuilder::of(ValueType::Int).validator(
                |result: argtree::ResultRef<'_>| match result.value().and_then(Value::as_int) {
                    Some(n) if n % 2 != 0 => Some(format!("{n} is odd")),
                    _ => None,
                },
            )),
        )
        .build()
        .unwrap();
    let parser = Parser::new(tree);

    let result = parser.parse(["--even", "3"]);
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].kind(), &ParseErrorKind::CustomValidationFailed);
    assert_eq!(result.errors()[0].message(), "3 is odd");

    assert!(parser.parse(["--even", "4"]).errors().is_empty());
}

#[test]
fn unmatched_tokens_follow_the_innermost_command_policy() {
    let tree = CommandBuilder::new("root")
        .subcommand(CommandBuilder::new("run").treat_unmatched_tokens_as_errors(false))
        .subcommand_required(false)
        .build()
        .unwrap();
    let parser = Parser::new(tree);

    let result = parser.parse(["run", "extra"]);
    assert!(result.errors().is_empty());
    assert_eq!(result.unmatched_tokens().len(), 1);

    let result = parser.parse(["extra"]);
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].kind(), &ParseErrorKind::UnrecognizedToken);
    assert_eq!(
        result.errors()[0].message(),
        "Unrecognized command or argument 'extra'"
    );
}

#[test]
fn end_of_options_turns_everything_into_arguments() {
    let tree = CommandBuilder::new("root")
        .argument(ArgumentBuilder::of(ValueType::list_of(ValueType::String)))
        .option(OptionBuilder::new("--verbose"))
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["--verbose", "--", "--verbose", "x"]);

    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(result.root().values(), vec!["--verbose", "x"]);
    assert_eq!(result.root().children().count(), 1);
}

#[test]
fn negative_numbers_are_values() {
    let tree = CommandBuilder::new("root")
        .option(OptionBuilder::new("--offset").argument(ArgumentBuilder::of(ValueType::Int)))
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["--offset", "-5"]);
    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(result.value_for("--offset"), Some(&Value::Int(-5)));
}

#[test]
fn diagram_marks_errors_defaults_and_leftovers() {
    let tree = CommandBuilder::new("outer")
        .option(
            OptionBuilder::new("--level")
                .argument(ArgumentBuilder::of(ValueType::Int).default_value(Value::Int(1))),
        )
        .subcommand(
            CommandBuilder::new("inner")
                .argument(ArgumentBuilder::of(ValueType::String).exactly_one()),
        )
        .build()
        .unwrap();
    let parser = Parser::new(tree);

    let result = parser.parse(["outer", "inner", "arg", "extra"]);
    assert_eq!(
        result.diagram(),
        "[ outer [ inner <arg> ] *[ --level <1> ] ]   ???--> extra"
    );

    let result = parser.parse(["inner"]);
    assert_eq!(result.diagram(), "[ outer ![ inner ] *[ --level <1> ] ]");
}

#[test]
fn descriptors_bind_by_normalized_name() {
    let tree = CommandBuilder::new("root")
        .option(
            OptionBuilder::new("--string-option")
                .argument(ArgumentBuilder::of(ValueType::String)),
        )
        .option(OptionBuilder::new("--dry-run"))
        .option(OptionBuilder::new("--count").argument(ArgumentBuilder::of(ValueType::String)))
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["--string-option", "v", "--dry-run", "--count", "12"]);

    let bound = result.bind(&[
        ValueDescriptor::new("StringOption"),
        ValueDescriptor::new("dry_run").of_type(ValueType::Bool),
        ValueDescriptor::new("count").of_type(ValueType::Int),
        ValueDescriptor::new("absent"),
    ]);
    assert_eq!(bound.len(), 3);
    assert_eq!(bound["StringOption"], Value::Str("v".into()));
    assert_eq!(bound["dry_run"], Value::Bool(true));
    assert_eq!(bound["count"], Value::Int(12));
    assert_eq!(
        bound.keys().collect::<Vec<_>>(),
        vec!["StringOption", "dry_run", "count"]
    );
}

#[test]
fn arguments_bind_by_their_name_only_when_asked() {
    let tree = CommandBuilder::new("root")
        .argument(ArgumentBuilder::of(ValueType::Int).name("target"))
        .option(OptionBuilder::new("--target").argument(ArgumentBuilder::of(ValueType::Int)))
        .build()
        .unwrap();
    let result = Parser::new(tree).parse(["1", "--target", "2"]);

    assert_eq!(result.get_value("target"), Some(Value::Int(2)));
    assert_eq!(
        result.try_get_value(&ValueDescriptor::new("target").from_argument()),
        Some(Value::Int(1))
    );
    assert_eq!(
        result.try_get_value(&ValueDescriptor::new("target").from_option()),
        Some(Value::Int(2))
    );
}
