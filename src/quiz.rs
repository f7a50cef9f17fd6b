//! Quiz session state machine.
//!
//! `transition` is pure: it takes the current phase and an event and returns the
//! next phase, or an error leaving the caller's state untouched. [`QuizRuntime`]
//! owns a phase and tells its driver when to start or cancel the countdown.

use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::schema::QuizQuestion;

/// Seconds allowed per question.
pub const QUESTION_TIME_LIMIT: u32 = 15;

pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate quiz. The AI might be overloaded. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionState {
    Unanswered,
    /// `selected` is `None` when the timer ran out.
    Answered { selected: Option<usize>, correct: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
    pub current: usize,
    pub state: QuestionState,
    pub score: usize,
    pub seconds_remaining: u32,
}

impl QuizSession {
    fn new(topic: String, questions: Vec<QuizQuestion>) -> Self {
        Self {
            topic,
            questions,
            current: 0,
            state: QuestionState::Unanswered,
            score: 0,
            seconds_remaining: QUESTION_TIME_LIMIT,
        }
    }

    pub fn question(&self) -> &QuizQuestion {
        &self.questions[self.current]
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    fn record(&mut self, selected: Option<usize>) {
        let correct = selected.is_some_and(|i| self.question().is_correct(i));
        if correct {
            self.score += 1;
        }
        self.state = QuestionState::Answered { selected, correct };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    pub topic: String,
    pub score: usize,
    pub total: usize,
}

impl QuizSummary {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.score as f64 * 100.0 / self.total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPhase {
    Setup { error: Option<String> },
    Generating { topic: String },
    Playing(QuizSession),
    Finished(QuizSummary),
}

impl Default for QuizPhase {
    fn default() -> Self {
        Self::Setup { error: None }
    }
}

impl QuizPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup { .. } => "setup",
            Self::Generating { .. } => "generating",
            Self::Playing(_) => "playing",
            Self::Finished(_) => "finished",
        }
    }

    /// True while a question is waiting for an answer, i.e. while the clock runs.
    pub fn timer_running(&self) -> bool {
        matches!(self, Self::Playing(s) if s.state == QuestionState::Unanswered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    SubmitTopic(String),
    Generated(Vec<QuizQuestion>),
    GenerationFailed(String),
    Select(usize),
    Tick,
    Advance,
    Restart,
}

impl QuizEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitTopic(_) => "submit_topic",
            Self::Generated(_) => "generated",
            Self::GenerationFailed(_) => "generation_failed",
            Self::Select(_) => "select",
            Self::Tick => "tick",
            Self::Advance => "advance",
            Self::Restart => "restart",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Topic must not be blank")]
    BlankTopic,
    #[error("Option {index} does not exist; question has {count} options")]
    NoSuchOption { index: usize, count: usize },
    #[error("Question already answered")]
    AlreadyAnswered,
    #[error("Question not answered yet")]
    NotAnswered,
    #[error("Event {event} is not valid in phase {phase}")]
    InvalidEvent { phase: &'static str, event: &'static str },
}

/// Compute the phase that follows `phase` on `event`.
pub fn transition(phase: &QuizPhase, event: QuizEvent) -> Result<QuizPhase, QuizError> {
    use QuizEvent as E;
    use QuizPhase as P;

    match (phase, event) {
        (_, E::Restart) => Ok(P::default()),

        (P::Setup { .. }, E::SubmitTopic(topic)) => {
            let topic = topic.trim();
            if topic.is_empty() {
                return Err(QuizError::BlankTopic);
            }
            Ok(P::Generating { topic: topic.to_string() })
        }

        (P::Generating { topic }, E::Generated(questions)) => {
            if questions.is_empty() {
                Ok(P::Setup { error: Some(GENERATION_FAILED_MESSAGE.to_string()) })
            } else {
                Ok(P::Playing(QuizSession::new(topic.clone(), questions)))
            }
        }
        (P::Generating { .. }, E::GenerationFailed(message)) => Ok(P::Setup { error: Some(message) }),

        (P::Playing(session), E::Select(index)) => {
            if session.state != QuestionState::Unanswered {
                return Err(QuizError::AlreadyAnswered);
            }
            let count = session.question().options.len();
            if index >= count {
                return Err(QuizError::NoSuchOption { index, count });
            }
            let mut next = session.clone();
            next.record(Some(index));
            Ok(P::Playing(next))
        }

        (P::Playing(session), E::Tick) if session.state == QuestionState::Unanswered => {
            let mut next = session.clone();
            next.seconds_remaining = next.seconds_remaining.saturating_sub(1);
            if next.seconds_remaining == 0 {
                next.record(None);
            }
            Ok(P::Playing(next))
        }
        // a tick that raced a cancel
        (current, E::Tick) => Ok(current.clone()),

        (P::Playing(session), E::Advance) => {
            if session.state == QuestionState::Unanswered {
                return Err(QuizError::NotAnswered);
            }
            if session.is_last() {
                return Ok(P::Finished(QuizSummary {
                    topic: session.topic.clone(),
                    score: session.score,
                    total: session.total(),
                }));
            }
            let mut next = session.clone();
            next.current += 1;
            next.state = QuestionState::Unanswered;
            next.seconds_remaining = QUESTION_TIME_LIMIT;
            Ok(P::Playing(next))
        }

        (current, event) => Err(QuizError::InvalidEvent { phase: current.name(), event: event.name() }),
    }
}

/// What the driver should do with its countdown after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Cancel,
    Keep,
}

/// A quiz phase plus the bookkeeping to drive a countdown alongside it.
#[derive(Debug, Clone, Default)]
pub struct QuizRuntime {
    phase: QuizPhase,
}

impl QuizRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn session(&self) -> Option<&QuizSession> {
        match &self.phase {
            QuizPhase::Playing(session) => Some(session),
            _ => None,
        }
    }

    /// Apply `event`; on error the phase is unchanged.
    pub fn apply(&mut self, event: QuizEvent) -> Result<TimerCommand, QuizError> {
        let event_name = event.name();
        let next = transition(&self.phase, event)?;

        let was_running = self.phase.timer_running();
        let now_running = next.timer_running();
        let question_changed = match (&self.phase, &next) {
            (QuizPhase::Playing(a), QuizPhase::Playing(b)) => a.current != b.current,
            _ => true,
        };

        let command = match (was_running, now_running) {
            (false, true) => TimerCommand::Start,
            (true, true) if question_changed => TimerCommand::Start,
            (true, false) => TimerCommand::Cancel,
            _ => TimerCommand::Keep,
        };

        trace!(target: "techmate::quiz", event = event_name, from = self.phase.name(), to = next.name(), ?command, "quiz transition");
        self.phase = next;
        Ok(command)
    }
}

/// Periodic `Tick` source for a single question. Dropping it cancels the task.
#[derive(Debug)]
pub struct Countdown {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Send `Tick` on `events` every `period` until cancelled or the receiver is gone.
    pub fn start(period: Duration, events: mpsc::Sender<QuizEvent>) -> Self {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticks.tick() => {
                        if events.send(QuizEvent::Tick).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(target: "techmate::quiz", "countdown stopped");
        });
        Self { token, handle: Some(handle) }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the task to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
