mod helpers;

use fbac::dialog::parser::{parse_behavior, parse_model};
use fbac::dialog::{parse_dialog, parse_dialog_file, Speaker, Turn};
use fbac::error::{DialogError, ValidationError};
use fbac::registry::JsonRegistry;
use helpers::{dialog_file, test_registry};
use tempfile::TempDir;

fn validation(result: Result<fbac::dialog::DialogDocument, DialogError>) -> ValidationError {
    match result {
        Err(DialogError::Validation(e)) => e,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn parses_minimal_dialog() {
    let tmp = TempDir::new().unwrap();
    let path = dialog_file(
        &tmp,
        "chat.txt",
        "model: gpt-4o\nbehavior: default\n\nHuman: Hi\n",
    );

    let document = parse_dialog_file(&path, &test_registry()).unwrap();
    assert_eq!(document.model, "gpt-4o");
    assert_eq!(document.temperature, 0.7);
    assert_eq!(document.behavior_description, "You are helpful.");
    assert_eq!(document.conversation, vec![Turn::new(Speaker::Human, "Hi")]);
    assert_eq!(document.pending_question(), Some("Hi"));
}

#[test]
fn reconstructs_turn_sequence_in_order() {
    let text = "model: gpt-4o\nbehavior: default\n\n\
                Human:   What is Rust?  \n\n\
                AI: A systems language.\nIt has no GC.\n\n\
                Human: And ownership?\n";

    let document = parse_dialog(text, &test_registry()).unwrap();
    assert_eq!(
        document.conversation,
        vec![
            Turn::new(Speaker::Human, "What is Rust?"),
            Turn::new(Speaker::Ai, "A systems language.\nIt has no GC."),
            Turn::new(Speaker::Human, "And ownership?"),
        ]
    );
}

#[test]
fn missing_model_line() {
    let err = validation(parse_dialog(
        "behavior: default\n\nHuman: Hi\n",
        &test_registry(),
    ));
    assert_eq!(err, ValidationError::MissingModel);
}

#[test]
fn missing_model_wins_over_missing_behavior() {
    let err = validation(parse_dialog("Human: Hi\n", &test_registry()));
    assert_eq!(err, ValidationError::MissingModel);
}

#[test]
fn missing_behavior_line() {
    let err = validation(parse_dialog(
        "model: gpt-4o\n\nHuman: Hi\n",
        &test_registry(),
    ));
    assert_eq!(err, ValidationError::MissingBehavior);
}

#[test]
fn unsupported_model_regardless_of_behavior() {
    for behavior in ["default", "no-such-behavior", "corrupt"] {
        let text = format!("model: gpt-9\nbehavior: {behavior}\n\nHuman: Hi\n");
        let err = validation(parse_dialog(&text, &test_registry()));
        assert_eq!(err, ValidationError::UnsupportedModel("gpt-9".into()));
    }
}

#[test]
fn unsupported_behavior() {
    let err = validation(parse_dialog(
        "model: gpt-4o\nbehavior: pirate\n\nHuman: Hi\n",
        &test_registry(),
    ));
    assert_eq!(err, ValidationError::UnsupportedBehavior("pirate".into()));
}

#[test]
fn corrupt_behavior_record() {
    let err = validation(parse_dialog(
        "model: gpt-4o\nbehavior: corrupt\n\nHuman: Hi\n",
        &test_registry(),
    ));
    assert_eq!(err, ValidationError::CorruptBehaviorData("corrupt".into()));
}

#[test]
fn last_turn_from_ai_fails() {
    let err = validation(parse_dialog(
        "model: gpt-4o\nbehavior: default\n\nHuman: Hi\n\nAI: Hello!\n",
        &test_registry(),
    ));
    assert_eq!(err, ValidationError::EmptyOrMissingFinalTurn);
}

#[test]
fn empty_last_human_turn_fails() {
    let err = validation(parse_dialog(
        "model: gpt-4o\nbehavior: default\n\nHuman: Hi\n\nAI: Hello!\n\nHuman: \n\n",
        &test_registry(),
    ));
    assert_eq!(err, ValidationError::EmptyOrMissingFinalTurn);
}

#[test]
fn fresh_skeleton_is_not_ready() {
    let err = validation(parse_dialog(
        "model: gpt-4o\nbehavior: default\n\nHuman: ",
        &test_registry(),
    ));
    assert_eq!(err, ValidationError::EmptyOrMissingFinalTurn);
}

#[test]
fn duplicate_headers_first_wins() {
    let text = "model: gpt-4o\nmodel: gpt-9\nbehavior: default\nbehavior: pirate\n\nHuman: Hi\n";
    let document = parse_dialog(text, &test_registry()).unwrap();
    assert_eq!(document.model, "gpt-4o");
    assert_eq!(document.temperature, 0.7);
}

#[test]
fn extraction_steps_are_independent() {
    let registry = test_registry();
    let text = "behavior: default\n";
    assert!(matches!(
        parse_model(text, &registry),
        Err(DialogError::Validation(ValidationError::MissingModel))
    ));
    assert_eq!(
        parse_behavior(text, &registry).unwrap(),
        ("You are helpful.".to_string(), 0.7)
    );
}

#[test]
fn missing_file_is_io_error() {
    let tmp = TempDir::new().unwrap();
    let result = parse_dialog_file(tmp.path().join("absent.txt"), &test_registry());
    assert!(matches!(result, Err(DialogError::Io { .. })));
}

#[test]
fn badly_typed_behavior_entry_is_corrupt_and_isolated() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("models.json"),
        r#"{"gpt-4o": {"api_key": "k"}}"#,
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("behavior_templates.json"),
        r#"{"default": {"description": "Be brief.", "temperature": 0.2},
            "pirate": {"description": "Arr", "temperature": "hot"}}"#,
    )
    .unwrap();
    let registry = JsonRegistry::from_dir(tmp.path());

    let document = parse_dialog(
        "model: gpt-4o\nbehavior: default\n\nHuman: Hi\n",
        &registry,
    )
    .unwrap();
    assert_eq!(document.temperature, 0.2);

    let err = validation(parse_dialog(
        "model: gpt-4o\nbehavior: pirate\n\nHuman: Hi\n",
        &registry,
    ));
    assert_eq!(err, ValidationError::CorruptBehaviorData("pirate".into()));
}
