//! Generation pipeline: prompt → model → extraction → validation.
//!
//! One method per task. Structured tasks (roadmap, quiz) return typed records or
//! an error; no partially validated output ever leaves this module.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::{TaskProfile, TaskProfiles};
use crate::core::ChatCompletionClient;
use crate::error::{AssistantError, ExtractionError};
use crate::interceptors::Interceptor;
use crate::json_utils::{candidate_arrays, extract};
use crate::prompt::{self, ChatMessage, PromptTask};
use crate::schema::{validate_as, QuizQuestion, ReplyRecord, RoadmapModule};

#[derive(Clone, Debug)]
pub struct Assistant<C: ChatCompletionClient> {
    client: C,
    profiles: TaskProfiles,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl<C: ChatCompletionClient> Assistant<C> {
    pub fn new(client: C, profiles: TaskProfiles) -> Self {
        info!(chat_model = %profiles.chat.model, notes_model = %profiles.notes.model, "Creating new Assistant");
        Self { client, profiles, interceptor: None }
    }

    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn profiles(&self) -> &TaskProfiles {
        &self.profiles
    }

    #[instrument(target = "techmate::assistant", skip(self))]
    pub async fn generate_roadmap(&self, topic: &str) -> Result<Vec<RoadmapModule>, AssistantError> {
        let task = PromptTask::Roadmap { topic: topic.to_string() };
        self.structured("roadmap", task, &self.profiles.roadmap).await
    }

    #[instrument(target = "techmate::assistant", skip(self))]
    pub async fn generate_quiz(&self, topic: &str) -> Result<Vec<QuizQuestion>, AssistantError> {
        let task = PromptTask::Quiz { topic: topic.to_string() };
        self.structured("quiz", task, &self.profiles.quiz).await
    }

    #[instrument(target = "techmate::assistant", skip_all, fields(history_len = messages.len()))]
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, AssistantError> {
        self.ask("chat", PromptTask::Chat { messages }, &self.profiles.chat).await
    }

    #[instrument(target = "techmate::assistant", skip_all, fields(text_len = text.len()))]
    pub async fn notes(&self, text: &str) -> Result<String, AssistantError> {
        let task = PromptTask::Notes { text: text.to_string() };
        self.ask("notes", task, &self.profiles.notes).await
    }

    async fn structured<T: ReplyRecord>(
        &self,
        label: &'static str,
        task: PromptTask,
        profile: &TaskProfile,
    ) -> Result<Vec<T>, AssistantError> {
        let raw = self.ask(label, task, profile).await?;
        let records = recover::<T>(&raw)?;
        info!(target: "techmate::assistant", task = label, count = records.len(), "Recovered records from reply");
        Ok(records)
    }

    async fn ask(&self, label: &'static str, task: PromptTask, profile: &TaskProfile) -> Result<String, AssistantError> {
        let prompt = prompt::build(task);
        debug!(target: "techmate::assistant", task = label, prompt_len = prompt.len(), model = %profile.model, "Built prompt");

        let messages = prompt.into_messages();
        let transcript = self.interceptor.as_ref().map(|_| render_transcript(&messages));

        let reply = self.client.complete(&profile.model, messages, profile.max_tokens).await?;

        if let (Some(interceptor), Some(transcript)) = (&self.interceptor, transcript) {
            if let Err(e) = interceptor.save(label, &transcript, &reply).await {
                warn!(target: "techmate::assistant", error = %e, "Failed to capture reply");
            }
        }
        Ok(reply)
    }
}

/// Extract and validate records of type `T` from a raw model reply.
///
/// The first-`[`-to-last-`]` slice is tried first. If that slice is not valid
/// JSON (prose after the array holding a stray `]`, say), each root array found
/// by the string-aware scanner is tried in order. Schema failures are final.
pub fn recover<T: ReplyRecord>(raw: &str) -> Result<Vec<T>, ExtractionError> {
    let extracted = extract(raw)?;
    match validate_as::<T>(extracted.as_str()) {
        Err(ExtractionError::Parse(parse_err)) => {
            debug!(target: "techmate::assistant", error = %parse_err, "Bracket slice did not parse; scanning for arrays");
            candidate_arrays(raw)
                .iter()
                .find_map(|candidate| validate_as::<T>(candidate).ok())
                .ok_or(ExtractionError::Parse(parse_err))
        }
        other => other,
    }
}

fn render_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("**{:?}**: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
