#![allow(dead_code)]

use std::sync::Arc;

use techmate::assistant::Assistant;
use techmate::clients::{MockClient, MockExecutor, MockHandle};
use techmate::config::TaskProfiles;
use techmate::core::ChatCompletionClient;
use techmate::fixtures::Fixtures;
use techmate::schema::QuizQuestion;
use techmate::server::AppState;

/// A roadmap reply the way models tend to write it: chatter, a fence, more chatter.
pub const ROADMAP_REPLY: &str = r#"Sure! Here is your roadmap:
```json
[
  {"id": 1, "title": "Foundations", "description": "Syntax and tooling", "xp": 100, "duration": "2h 00m", "topics": ["cargo", "variables", "functions", "control flow"]},
  {"id": 2, "title": "Ownership", "description": "Moves and borrows", "xp": 150, "duration": "3h 30m", "topics": ["moves", "borrows", "lifetimes", "slices"]}
]
```
Good luck on your journey!"#;

/// Two questions; the first uses a letter answer key and brackets inside strings.
pub const QUIZ_REPLY: &str = r#"Here's your quiz:

```json
[
  {"id": 1, "question": "What does arr[0] return?", "options": ["The first element", "The last element", "The length", "Nothing"], "answer": "A", "explanation": "Indexing [0] yields the first element."},
  {"id": 2, "question": "Which keyword declares a constant?", "options": ["let", "var", "const", "static mut"], "answer": 2, "explanation": "`const` declares a compile-time constant."}
]
```"#;

pub fn mock_assistant() -> (Assistant<MockClient>, Arc<MockHandle>) {
    let (client, handle) = MockClient::new();
    (Assistant::new(client, TaskProfiles::default()), handle)
}

pub fn mock_state(executor: Arc<MockExecutor>) -> (AppState, Arc<MockHandle>) {
    let (client, handle) = MockClient::new();
    let assistant = Assistant::new(Box::new(client) as Box<dyn ChatCompletionClient>, TaskProfiles::default());
    (AppState::new(assistant, executor, Fixtures::demo()), handle)
}

pub fn question(id: u32, answer: usize) -> QuizQuestion {
    QuizQuestion {
        id,
        question: format!("Question {}", id),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        answer,
        explanation: String::new(),
    }
}
