mod test_utils;

use techmate::error::ExtractionError;
use techmate::json_utils::{candidate_arrays, extract};
use techmate::schema::{validate, ReplyKind, RoadmapModule, Validated};
use techmate::{recover, QuizQuestion};
use test_utils::{QUIZ_REPLY, ROADMAP_REPLY};

const ARRAY: &str = r#"[{"id":1,"title":"T","description":"D","xp":100,"duration":"1h","topics":["a","b"]}]"#;

#[test]
fn extract_ignores_surrounding_text() {
    let wrappers = [
        ("", ""),
        ("Sure! ", ""),
        ("Sure! ```json\n", "\n```"),
        ("Here you go:\n```JSON\n", "\n```\nLet me know if you need more."),
        ("```\n", "\n```   \n\n"),
        ("  \n\t", " Hope this helps (it covers the basics)."),
    ];
    for (prefix, suffix) in wrappers {
        let raw = format!("{}{}{}", prefix, ARRAY, suffix);
        let extracted = extract(&raw).unwrap();
        assert_eq!(extracted.as_str(), ARRAY, "wrapper {:?} / {:?}", prefix, suffix);
    }
}

#[test]
fn extract_without_open_bracket_is_malformed() {
    for raw in ["", "I'm sorry, I can't help with that.", "{\"id\": 1}", "only a ] here"] {
        assert!(matches!(extract(raw), Err(ExtractionError::MalformedReply)), "input {:?}", raw);
    }
}

#[test]
fn extract_without_close_after_open_is_malformed() {
    assert!(matches!(extract("[1, 2, 3"), Err(ExtractionError::MalformedReply)));
}

#[test]
fn extract_is_idempotent() {
    let once = extract(ROADMAP_REPLY).unwrap();
    let twice = extract(once.as_str()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn fenced_roadmap_scenario() {
    let raw = "Sure! ```json\n[{\"id\":1,\"title\":\"T\",\"description\":\"D\",\"xp\":100,\"duration\":\"1h\",\"topics\":[\"a\",\"b\"]}]\n```";
    let extracted = extract(raw).unwrap();
    match validate(&extracted, ReplyKind::Roadmap).unwrap() {
        Validated::Roadmap(modules) => {
            assert_eq!(modules.len(), 1);
            assert_eq!(modules[0].xp, 100);
            assert_eq!(modules[0].topics, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("expected roadmap, got {:?}", other),
    }
}

#[test]
fn brackets_inside_strings_survive_extraction() {
    let questions: Vec<QuizQuestion> = recover(QUIZ_REPLY).unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].question, "What does arr[0] return?");
    assert_eq!(questions[0].answer, 0);
}

#[test]
fn stray_bracket_in_trailing_prose_widens_slice() {
    let raw = format!("{}\nNext, revisit step [2", ARRAY);
    // last `]` is inside the array, so the slice is exact
    assert_eq!(extract(&raw).unwrap().as_str(), ARRAY);

    let raw = format!("{}\nSee also [the docs].", ARRAY);
    let extracted = extract(&raw).unwrap();
    assert!(extracted.as_str().ends_with("[the docs]"));
    assert!(matches!(validate(&extracted, ReplyKind::Roadmap), Err(ExtractionError::Parse(_))));
}

#[test]
fn recover_falls_back_to_first_valid_array() {
    let raw = format!("Here's the plan: {}\nAfterwards practise (see step [2]).", ARRAY);
    let modules: Vec<RoadmapModule> = recover(&raw).unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].title, "T");
}

#[test]
fn recover_keeps_parse_error_when_nothing_validates() {
    let result: Result<Vec<RoadmapModule>, _> = recover("[oops] and [nope]");
    assert!(matches!(result, Err(ExtractionError::Parse(_))));
}

#[test]
fn recover_does_not_mask_schema_errors() {
    let raw = r#"```json
[{"id": 1, "title": "T", "description": "D", "duration": "1h", "topics": []}]
```"#;
    let result: Result<Vec<RoadmapModule>, _> = recover(raw);
    match result {
        Err(ExtractionError::Schema(msg)) => assert!(msg.contains("xp"), "message was {}", msg),
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn candidate_arrays_skip_objects_and_nested_arrays() {
    let raw = r#"{"note": [1]} then [1, [2, 3]] and "[not, prose]" [4]"#;
    let arrays = candidate_arrays(raw);
    assert_eq!(arrays, vec!["[1, [2, 3]]".to_string(), "[not, prose]".to_string(), "[4]".to_string()]);
}
