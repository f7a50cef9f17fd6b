use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute};
use serde_json::json;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use techmate::quiz::{
    Countdown, QuestionState, QuizEvent, QuizPhase, QuizRuntime, QuizSession, QuizSummary, TimerCommand,
    GENERATION_FAILED_MESSAGE,
};
use techmate::schema::QuizQuestion;
use techmate::server::handlers::QuizResponse;

const TICK: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(author, version, about = "Play a generated TechMate quiz in the terminal", long_about = None)]
struct Args {
    /// Topic to be quizzed on; asked interactively when omitted
    topic: Option<String>,

    /// Base URL of a running techmate-server
    #[arg(short, long, env = "TECHMATE_SERVER", default_value = "http://localhost:5000")]
    server: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Pick(usize),
    Next,
    Retry,
    Quit,
    Other,
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        match event.code {
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Key::Quit,
            KeyCode::Char('q') | KeyCode::Esc => Key::Quit,
            KeyCode::Char('r') => Key::Retry,
            KeyCode::Enter | KeyCode::Char('n') | KeyCode::Char(' ') => Key::Next,
            KeyCode::Char(c) => match c.to_ascii_uppercase() {
                l @ 'A'..='Z' => Key::Pick(usize::from(l as u8 - b'A')),
                d @ '1'..='9' => Key::Pick(usize::from(d as u8 - b'1')),
                _ => Key::Other,
            },
            _ => Key::Other,
        }
    }
}

/// Restores cooked mode on drop, including on early return.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Background thread forwarding key presses until dropped.
struct KeyReader {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl KeyReader {
    fn spawn(keys: mpsc::UnboundedSender<Key>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(_) => break,
                }
                let key = match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Key::from(key),
                    Ok(_) => continue,
                    Err(_) => break,
                };
                if keys.send(key).is_err() {
                    break;
                }
            }
        });
        Self { stop, handle: Some(handle) }
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let args = Args::parse();
    let http = reqwest::Client::new();
    let mut topic = match args.topic {
        Some(topic) => topic,
        None => prompt_topic()?,
    };
    let mut runtime = QuizRuntime::new();

    loop {
        if let Err(e) = runtime.apply(QuizEvent::SubmitTopic(topic.clone())) {
            eprintln!("{}", e);
            topic = prompt_topic()?;
            continue;
        }

        println!("Generating a quiz on \"{}\"...", topic.trim());
        let event = match fetch_quiz(&http, &args.server, topic.trim()).await {
            Ok(questions) => QuizEvent::Generated(questions),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Quiz request failed");
                QuizEvent::GenerationFailed(GENERATION_FAILED_MESSAGE.to_string())
            }
        };
        runtime.apply(event)?;
        if let QuizPhase::Setup { error: Some(message) } = runtime.phase() {
            eprintln!("{}", message);
            topic = prompt_topic()?;
            continue;
        }

        if !play(&mut runtime).await? {
            break;
        }
        runtime.apply(QuizEvent::Restart)?;
    }

    Ok(())
}

fn prompt_topic() -> Result<String> {
    print!("Quiz topic: ");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        bail!("no topic given");
    }
    Ok(input.trim().to_string())
}

async fn fetch_quiz(http: &reqwest::Client, server: &str, topic: &str) -> Result<Vec<QuizQuestion>> {
    let url = format!("{}/api/ai/quiz", server.trim_end_matches('/'));
    let response = http
        .post(&url)
        .json(&json!({ "topic": topic }))
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("server returned {}: {}", status, body);
    }

    let body: QuizResponse = response.json().await.context("unreadable quiz response")?;
    Ok(body.quiz)
}

/// Drive one round from the first question to the summary. Returns true when
/// the player asks to retry the same topic.
async fn play(runtime: &mut QuizRuntime) -> Result<bool> {
    let (tick_tx, mut ticks) = mpsc::channel(8);
    let (key_tx, mut keys) = mpsc::unbounded_channel();
    let _raw = RawMode::enable()?;
    let _reader = KeyReader::spawn(key_tx);

    let mut countdown = runtime.phase().timer_running().then(|| Countdown::start(TICK, tick_tx.clone()));
    render(runtime.phase(), false)?;

    loop {
        let event = tokio::select! {
            Some(event) = ticks.recv() => event,
            Some(key) = keys.recv() => match (key, runtime.phase()) {
                (Key::Quit, _) => return Ok(false),
                (Key::Retry, QuizPhase::Finished(_)) => return Ok(true),
                (_, QuizPhase::Finished(_)) => return Ok(false),
                (Key::Pick(index), _) => QuizEvent::Select(index),
                (Key::Next, _) => QuizEvent::Advance,
                _ => continue,
            },
            else => return Ok(false),
        };

        let tick_only = event == QuizEvent::Tick;
        let command = match runtime.apply(event) {
            Ok(command) => command,
            Err(e) => {
                debug!(error = %e, "Ignoring key");
                continue;
            }
        };

        if command != TimerCommand::Keep {
            if let Some(old) = countdown.take() {
                old.stop().await;
            }
            while ticks.try_recv().is_ok() {}
        }
        if command == TimerCommand::Start {
            countdown = Some(Countdown::start(TICK, tick_tx.clone()));
        }

        render(runtime.phase(), tick_only && command == TimerCommand::Keep)?;
    }
}

fn letter(index: usize) -> char {
    char::from_u32('A' as u32 + index as u32).unwrap_or('?')
}

fn render(phase: &QuizPhase, tick_only: bool) -> io::Result<()> {
    let mut out = io::stdout();
    match phase {
        QuizPhase::Playing(session) => match &session.state {
            QuestionState::Unanswered if tick_only => timer_line(&mut out, session.seconds_remaining)?,
            QuestionState::Unanswered => show_question(&mut out, session)?,
            QuestionState::Answered { selected, correct } => show_feedback(&mut out, session, *selected, *correct)?,
        },
        QuizPhase::Finished(summary) => show_summary(&mut out, summary)?,
        QuizPhase::Setup { .. } | QuizPhase::Generating { .. } => {}
    }
    out.flush()
}

fn timer_line(out: &mut impl Write, seconds: u32) -> io::Result<()> {
    write!(out, "\r  Time left: {:>2}s ", seconds)
}

fn show_question(out: &mut impl Write, session: &QuizSession) -> io::Result<()> {
    let question = session.question();
    execute!(out, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    write!(
        out,
        "{} quiz  |  Question {}/{}  |  Score {}\r\n\r\n",
        session.topic,
        session.current + 1,
        session.total(),
        session.score
    )?;
    write!(out, "{}\r\n\r\n", question.question)?;
    for (i, option) in question.options.iter().enumerate() {
        write!(out, "  {}. {}\r\n", letter(i), option)?;
    }
    let last = letter(question.options.len().saturating_sub(1));
    write!(out, "\r\n  Press A-{} to answer, q to quit.\r\n\r\n", last)?;
    timer_line(out, session.seconds_remaining)
}

fn show_feedback(out: &mut impl Write, session: &QuizSession, selected: Option<usize>, correct: bool) -> io::Result<()> {
    let question = session.question();
    let answer = format!(
        "{}. {}",
        letter(question.answer),
        question.options.get(question.answer).map(String::as_str).unwrap_or_default()
    );

    write!(out, "\r\n\r\n")?;
    match (selected, correct) {
        (_, true) => write!(out, "  Correct!\r\n")?,
        (Some(_), false) => write!(out, "  Incorrect. The answer was {}\r\n", answer)?,
        (None, false) => write!(out, "  Time's up! The answer was {}\r\n", answer)?,
    }
    if !question.explanation.is_empty() {
        write!(out, "  {}\r\n", question.explanation)?;
    }
    let next = if session.is_last() { "see your results" } else { "continue" };
    write!(out, "\r\n  Press Enter to {}, q to quit.\r\n", next)
}

fn show_summary(out: &mut impl Write, summary: &QuizSummary) -> io::Result<()> {
    execute!(out, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    write!(out, "{} quiz complete\r\n\r\n", summary.topic)?;
    write!(out, "  Score: {}/{} ({:.0}%)\r\n\r\n", summary.score, summary.total, summary.percentage())?;
    write!(out, "  Press r to retry this topic, any other key to quit.\r\n")
}
