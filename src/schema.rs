//! Typed records recovered from model replies, and the validator that builds them.
//!
//! Validation is a pure function over already-extracted array text. Every element
//! must carry every field; the quiz answer key is accepted as either an index or a
//! letter and normalised to an index on the way in.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::ExtractionError;
use crate::json_utils::ExtractedJson;

const ANSWER_LETTERS: [&str; 4] = ["A", "B", "C", "D"];
const MIN_OPTIONS: usize = 2;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    /// Answer options in display order
    pub options: Vec<String>,
    /// Zero-based index into `options` of the correct answer
    pub answer: usize,
    /// Why the correct answer is correct
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.answer
    }
}

/// One step of a learning roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoadmapModule {
    pub id: u32,
    pub title: String,
    /// Short description of what will be learned
    pub description: String,
    /// Experience points awarded on completion
    pub xp: u32,
    /// Human-readable estimate such as "2h 00m"
    pub duration: String,
    pub topics: Vec<String>,
}

/// Answer key as models actually emit it: `2`, `"C"`, or `"2"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    Index(i64),
    Text(String),
}

impl AnswerKey {
    /// Resolve to an index into a list of `option_count` options.
    pub fn normalize(&self, option_count: usize) -> Result<usize, ExtractionError> {
        let index = match self {
            Self::Index(i) => *i,
            Self::Text(s) => {
                let key = s.trim().to_uppercase();
                match ANSWER_LETTERS.iter().position(|l| *l == key) {
                    Some(pos) => pos as i64,
                    None => key.parse::<i64>().map_err(|_| {
                        ExtractionError::Schema(format!("answer key {:?} is neither a letter A-D nor a number", s))
                    })?,
                }
            }
        };

        usize::try_from(index)
            .ok()
            .filter(|i| *i < option_count)
            .ok_or_else(|| {
                ExtractionError::Schema(format!(
                    "answer index {} out of range for {} options",
                    index, option_count
                ))
            })
    }
}

#[derive(Debug, Deserialize)]
struct RawQuizQuestion {
    id: u32,
    question: String,
    options: Vec<String>,
    answer: AnswerKey,
    explanation: String,
}

/// Which record shape a reply is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Quiz,
    Roadmap,
}

/// A record type that can be recovered from one element of a reply array.
pub trait ReplyRecord: Sized + Serialize + DeserializeOwned + JsonSchema {
    const KIND: ReplyKind;

    /// Build the record from one array element, normalising where needed.
    fn from_element(value: Value) -> Result<Self, ExtractionError>;
}

impl ReplyRecord for QuizQuestion {
    const KIND: ReplyKind = ReplyKind::Quiz;

    fn from_element(value: Value) -> Result<Self, ExtractionError> {
        let raw: RawQuizQuestion =
            serde_json::from_value(value).map_err(|e| ExtractionError::Schema(e.to_string()))?;
        if raw.options.len() < MIN_OPTIONS {
            return Err(ExtractionError::Schema(format!(
                "question {} has {} options, need at least {}",
                raw.id,
                raw.options.len(),
                MIN_OPTIONS
            )));
        }
        let answer = raw.answer.normalize(raw.options.len())?;
        Ok(Self {
            id: raw.id,
            question: raw.question,
            options: raw.options,
            answer,
            explanation: raw.explanation,
        })
    }
}

impl ReplyRecord for RoadmapModule {
    const KIND: ReplyKind = ReplyKind::Roadmap;

    fn from_element(value: Value) -> Result<Self, ExtractionError> {
        serde_json::from_value(value).map_err(|e| ExtractionError::Schema(e.to_string()))
    }
}

/// Validated records of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    Quiz(Vec<QuizQuestion>),
    Roadmap(Vec<RoadmapModule>),
}

/// Parse `text` as a non-empty array of `T`.
#[instrument(target = "techmate::schema", skip(text), fields(kind = ?T::KIND, text_len = text.len()))]
pub fn validate_as<T: ReplyRecord>(text: &str) -> Result<Vec<T>, ExtractionError> {
    let value: Value = serde_json::from_str(text).map_err(ExtractionError::Parse)?;
    let Value::Array(elements) = value else {
        return Err(ExtractionError::Schema("expected a JSON array".to_string()));
    };
    if elements.is_empty() {
        return Err(ExtractionError::Schema("array holds no records".to_string()));
    }

    let records = elements
        .into_iter()
        .enumerate()
        .map(|(i, element)| {
            T::from_element(element).map_err(|e| match e {
                ExtractionError::Schema(msg) => ExtractionError::Schema(format!("element {}: {}", i, msg)),
                other => other,
            })
        })
        .collect::<Result<Vec<T>, _>>()?;

    debug!(target: "techmate::schema", count = records.len(), "validated records");
    Ok(records)
}

pub fn validate(json: &ExtractedJson, kind: ReplyKind) -> Result<Validated, ExtractionError> {
    match kind {
        ReplyKind::Quiz => validate_as::<QuizQuestion>(json.as_str()).map(Validated::Quiz),
        ReplyKind::Roadmap => validate_as::<RoadmapModule>(json.as_str()).map(Validated::Roadmap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_keys_are_case_insensitive() {
        assert_eq!(AnswerKey::Text(" b ".into()).normalize(4).unwrap(), 1);
    }

    #[test]
    fn numeric_string_key() {
        assert_eq!(AnswerKey::Text("3".into()).normalize(4).unwrap(), 3);
    }

    #[test]
    fn negative_index_rejected() {
        assert!(matches!(AnswerKey::Index(-1).normalize(4), Err(ExtractionError::Schema(_))));
    }

    #[test]
    fn letter_beyond_option_count_rejected() {
        assert!(matches!(AnswerKey::Text("D".into()).normalize(3), Err(ExtractionError::Schema(_))));
    }
}
