use serde_json::json;
use techmate::error::ExtractionError;
use techmate::json_utils::extract;
use techmate::schema::{validate, validate_as, QuizQuestion, ReplyKind, RoadmapModule, Validated};

fn quiz_element(answer: serde_json::Value) -> serde_json::Value {
    json!({
        "id": 1,
        "question": "Which HTTP method is idempotent?",
        "options": ["POST", "PATCH", "PUT", "CONNECT"],
        "answer": answer,
        "explanation": "PUT replaces the resource."
    })
}

fn quiz(elements: Vec<serde_json::Value>) -> Result<Vec<QuizQuestion>, ExtractionError> {
    let text = serde_json::Value::Array(elements).to_string();
    match validate(&extract(&text)?, ReplyKind::Quiz)? {
        Validated::Quiz(questions) => Ok(questions),
        other => panic!("expected quiz, got {:?}", other),
    }
}

fn expect_schema<T: std::fmt::Debug>(result: Result<T, ExtractionError>) -> String {
    match result {
        Err(ExtractionError::Schema(msg)) => msg,
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn letter_answer_normalizes_to_index() {
    let questions = quiz(vec![quiz_element(json!(0)), quiz_element(json!("C"))]).unwrap();
    assert_eq!(questions[0].answer, 0);
    assert_eq!(questions[1].answer, 2);
}

#[test]
fn answer_key_variants() {
    for (key, expected) in [(json!("a"), 0), (json!(" d "), 3), (json!("1"), 1), (json!(3), 3)] {
        let questions = quiz(vec![quiz_element(key.clone())]).unwrap();
        assert_eq!(questions[0].answer, expected, "key {}", key);
    }
}

#[test]
fn unmappable_answer_is_schema_error() {
    for key in [json!("E"), json!("first"), json!(4), json!(-1), json!(null)] {
        expect_schema(quiz(vec![quiz_element(key)]));
    }
}

#[test]
fn missing_options_is_schema_error() {
    let mut element = quiz_element(json!(0));
    element.as_object_mut().unwrap().remove("options");
    let msg = expect_schema(quiz(vec![quiz_element(json!(1)), element]));
    assert!(msg.starts_with("element 1:"), "message was {}", msg);
}

#[test]
fn single_option_is_schema_error() {
    let mut element = quiz_element(json!(0));
    element["options"] = json!(["only"]);
    expect_schema(quiz(vec![element]));
}

#[test]
fn two_options_are_enough() {
    let mut element = quiz_element(json!("B"));
    element["options"] = json!(["true", "false"]);
    let questions = quiz(vec![element]).unwrap();
    assert_eq!(questions[0].answer, 1);
    assert!(questions[0].is_correct(1));
}

#[test]
fn invalid_json_is_parse_error() {
    assert!(matches!(validate_as::<RoadmapModule>("[{\"id\": 1,}]"), Err(ExtractionError::Parse(_))));
    assert!(matches!(validate_as::<QuizQuestion>("[nope]"), Err(ExtractionError::Parse(_))));
}

#[test]
fn non_array_is_schema_error() {
    expect_schema(validate_as::<RoadmapModule>(r#"{"id": 1}"#));
}

#[test]
fn empty_array_is_schema_error() {
    expect_schema(validate_as::<QuizQuestion>("[]"));
}

#[test]
fn roadmap_field_types_are_checked() {
    let text = json!([{
        "id": 1, "title": "T", "description": "D", "xp": -5, "duration": "1h", "topics": []
    }])
    .to_string();
    expect_schema(validate_as::<RoadmapModule>(&text));

    let text = json!([{ "id": 1, "title": "T", "description": "D", "xp": 5, "duration": "1h" }]).to_string();
    let msg = expect_schema(validate_as::<RoadmapModule>(&text));
    assert!(msg.contains("topics"), "message was {}", msg);
}

#[test]
fn roadmap_roundtrip_is_stable() {
    let text = json!([
        {"id": 1, "title": "Basics", "description": "Start here", "xp": 100, "duration": "2h 00m", "topics": ["a", "b", "c", "d"]},
        {"id": 2, "title": "Deeper", "description": "Then this", "xp": 250, "duration": "4h 15m", "topics": ["e", "f", "g", "h"]}
    ])
    .to_string();
    let first = validate_as::<RoadmapModule>(&text).unwrap();
    let reserialized = serde_json::to_string(&first).unwrap();
    let second = validate_as::<RoadmapModule>(&reserialized).unwrap();
    assert_eq!(first, second);
}

#[test]
fn normalized_quiz_reserializes_with_integer_answer() {
    let questions = quiz(vec![quiz_element(json!("c"))]).unwrap();
    let value = serde_json::to_value(&questions).unwrap();
    assert_eq!(value[0]["answer"], 2);

    let again = validate_as::<QuizQuestion>(&value.to_string()).unwrap();
    assert_eq!(questions, again);
}

#[test]
fn extra_fields_are_ignored() {
    let mut element = quiz_element(json!(2));
    element["difficulty"] = json!("easy");
    assert_eq!(quiz(vec![element]).unwrap().len(), 1);
}
