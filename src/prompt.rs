use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

pub const ROADMAP_MODULE_COUNT: usize = 5;
pub const ROADMAP_TOPICS_PER_MODULE: usize = 4;
pub const QUIZ_QUESTION_COUNT: usize = 10;
pub const QUIZ_OPTION_COUNT: usize = 4;

pub const CHAT_PERSONA: &str = "You are TechMate, a helpful, encouraging, and expert AI learning assistant. \
Explain concepts clearly, use bullet points, and provide code examples where relevant.";

pub const NOTES_PERSONA: &str = "You are an expert tutor who creates structured study notes.";

const ROADMAP_EXAMPLE: &str = r#"[
  {
    "id": 1,
    "title": "Module Title",
    "description": "Short description of what will be learned.",
    "xp": 500,
    "duration": "2h 00m",
    "topics": ["Concept 1", "Concept 2", "Concept 3", "Concept 4"]
  }
]"#;

const QUIZ_EXAMPLE: &str = r#"[
  {
    "id": 1,
    "question": "...",
    "options": ["A", "B", "C", "D"],
    "answer": 0,
    "explanation": "..."
  }
]"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A generation task and its user-supplied input.
#[derive(Debug, Clone)]
pub enum PromptTask {
    Roadmap { topic: String },
    Quiz { topic: String },
    Chat { messages: Vec<ChatMessage> },
    Notes { text: String },
}

/// Prompt ready to send: an optional system message followed by the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl Prompt {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(system) = self.system {
            out.push(ChatMessage::system(system));
        }
        out.extend(self.messages);
        out
    }

    /// Total characters across all message bodies.
    pub fn len(&self) -> usize {
        self.system.as_ref().map_or(0, String::len) + self.messages.iter().map(|m| m.content.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn build(task: PromptTask) -> Prompt {
    match task {
        PromptTask::Roadmap { topic } => Prompt {
            system: None,
            messages: vec![ChatMessage::user(roadmap_instructions(&topic))],
        },
        PromptTask::Quiz { topic } => Prompt {
            system: None,
            messages: vec![ChatMessage::user(quiz_instructions(&topic))],
        },
        // history goes through untouched; bounding its length is the caller's concern
        PromptTask::Chat { messages } => Prompt {
            system: Some(CHAT_PERSONA.to_string()),
            messages,
        },
        PromptTask::Notes { text } => Prompt {
            system: Some(NOTES_PERSONA.to_string()),
            messages: vec![ChatMessage::user(format!(
                "Produce structured study notes for the following material. \
Use headings, bullet points and a short summary of the key terms.\n\n{}",
                text
            ))],
        },
    }
}

fn roadmap_instructions(topic: &str) -> String {
    let body = format!(
        "Generate a {}-step learning roadmap to master \"{}\".\n\
Each module needs an id, title, description, xp, duration and exactly {} topics.\n\
Return ONLY a valid JSON array like this:\n{}",
        ROADMAP_MODULE_COUNT, topic, ROADMAP_TOPICS_PER_MODULE, ROADMAP_EXAMPLE
    );
    with_schema_guidance::<Vec<crate::schema::RoadmapModule>>(body)
}

fn quiz_instructions(topic: &str) -> String {
    let body = format!(
        "Generate {} multiple-choice quiz questions about \"{}\".\n\
Each question has exactly {} options; `answer` is the zero-based index of the correct option.\n\
Return ONLY a valid JSON array like this:\n{}",
        QUIZ_QUESTION_COUNT, topic, QUIZ_OPTION_COUNT, QUIZ_EXAMPLE
    );
    with_schema_guidance::<Vec<crate::schema::QuizQuestion>>(body)
}

/// Append the JSON schema of `T` to a prompt.
fn with_schema_guidance<T: JsonSchema>(prompt: String) -> String {
    let schema = schema_for!(T);
    let schema_json =
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "Schema serialization failed".to_string());

    format!(
        "{}\n\n## Response Format\nThe array must match this schema. Do not add any text before or after it:\n{}",
        prompt, schema_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_prepends_persona_and_keeps_order() {
        let history = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("explain closures"),
        ];
        let messages = build(PromptTask::Chat { messages: history.clone() }).into_messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system(CHAT_PERSONA));
        assert_eq!(&messages[1..], &history[..]);
    }

    #[test]
    fn quiz_prompt_names_topic_and_count() {
        let prompt = build(PromptTask::Quiz { topic: "Rust lifetimes".into() });
        assert!(prompt.system.is_none());
        let text = &prompt.messages[0].content;
        assert!(text.contains("\"Rust lifetimes\""));
        assert!(text.contains("Generate 10 multiple-choice"));
        assert!(text.contains("explanation"));
    }

    #[test]
    fn roadmap_prompt_carries_schema() {
        let prompt = build(PromptTask::Roadmap { topic: "Docker".into() });
        let text = &prompt.messages[0].content;
        assert!(text.contains("5-step learning roadmap"));
        assert!(text.contains("## Response Format"));
        assert!(text.contains("\"duration\""));
    }

    #[test]
    fn notes_wraps_source_text() {
        let prompt = build(PromptTask::Notes { text: "Ownership moves values.".into() });
        assert_eq!(prompt.system.as_deref(), Some(NOTES_PERSONA));
        assert!(prompt.messages[0].content.ends_with("Ownership moves values."));
    }
}
