use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_LLM_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_CODE_EXEC_URL: &str = "https://emkc.org/api/v2/piston";
pub const DEFAULT_CHAT_MODEL: &str = "meta-llama/Meta-Llama-3-8B-Instruct";
pub const DEFAULT_NOTES_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

/// Trait for types that can retrieve their configuration key from environment variables
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Find the API key by checking the environment, after loading `.env` if present
    fn find_key() -> Option<String> {
        let _ = dotenvy::dotenv();

        env::var(Self::KEY_NAME).ok().filter(|k| !k.trim().is_empty())
    }
}

/// Model and output budget for one generation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProfile {
    pub model: String,
    pub max_tokens: u32,
}

impl TaskProfile {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self { model: model.into(), max_tokens }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProfiles {
    pub roadmap: TaskProfile,
    pub quiz: TaskProfile,
    pub chat: TaskProfile,
    pub notes: TaskProfile,
}

impl Default for TaskProfiles {
    fn default() -> Self {
        Self {
            roadmap: TaskProfile::new(DEFAULT_CHAT_MODEL, 1500),
            // ten questions need the room or the array gets cut off
            quiz: TaskProfile::new(DEFAULT_CHAT_MODEL, 2500),
            chat: TaskProfile::new(DEFAULT_CHAT_MODEL, 800),
            notes: TaskProfile::new(DEFAULT_NOTES_MODEL, 500),
        }
    }
}

impl TaskProfiles {
    /// Use `model` for the roadmap, quiz and chat tasks.
    #[must_use]
    pub fn with_chat_model(mut self, model: &str) -> Self {
        for profile in [&mut self.roadmap, &mut self.quiz, &mut self.chat] {
            profile.model = model.to_string();
        }
        self
    }

    #[must_use]
    pub fn with_notes_model(mut self, model: &str) -> Self {
        self.notes.model = model.to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub llm_base_url: String,
    pub code_exec_url: String,
    pub llm_timeout: Option<Duration>,
    pub code_exec_timeout: Option<Duration>,
    pub cors_origins: Vec<String>,
    pub reply_capture_dir: Option<PathBuf>,
    pub fixtures_path: Option<PathBuf>,
    pub profiles: TaskProfiles,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            code_exec_url: DEFAULT_CODE_EXEC_URL.to_string(),
            llm_timeout: None,
            code_exec_timeout: None,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            reply_capture_dir: None,
            fixtures_path: None,
            profiles: TaskProfiles::default(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment (and `.env`), falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let mut profiles = defaults.profiles;
        if let Some(model) = var("LLM_MODEL") {
            profiles = profiles.with_chat_model(&model);
        }
        if let Some(model) = var("NOTES_MODEL") {
            profiles = profiles.with_notes_model(&model);
        }

        Ok(Self {
            host: parsed("HOST")?.unwrap_or(defaults.host),
            port: parsed("PORT")?.unwrap_or(defaults.port),
            llm_base_url: var("LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            code_exec_url: var("CODE_EXEC_URL").unwrap_or(defaults.code_exec_url),
            llm_timeout: parsed::<u64>("LLM_TIMEOUT_SECS")?.map(Duration::from_secs),
            code_exec_timeout: parsed::<u64>("CODE_EXEC_TIMEOUT_SECS")?.map(Duration::from_secs),
            cors_origins: var("CORS_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.cors_origins),
            reply_capture_dir: var("REPLY_CAPTURE_DIR").map(PathBuf::from),
            fixtures_path: var("FIXTURES_PATH").map(PathBuf::from),
            profiles,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidVar { name, reason: format!("{:?}: {}", raw, e) })
        })
        .transpose()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_model_override_leaves_notes_alone() {
        let profiles = TaskProfiles::default().with_chat_model("qwen/Qwen2.5-7B-Instruct");
        assert_eq!(profiles.quiz.model, "qwen/Qwen2.5-7B-Instruct");
        assert_eq!(profiles.quiz.max_tokens, 2500);
        assert_eq!(profiles.notes.model, DEFAULT_NOTES_MODEL);
    }

    #[test]
    fn origin_list_ignores_blanks() {
        assert_eq!(
            split_list(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn numeric_vars_reject_garbage() {
        std::env::set_var("TECHMATE_TEST_PORT", "eighty");
        let err = parsed::<u16>("TECHMATE_TEST_PORT").unwrap_err();
        assert!(
            matches!(&err, ConfigError::InvalidVar { name: "TECHMATE_TEST_PORT", reason } if reason.contains("\"eighty\"")),
            "got {:?}",
            err
        );

        std::env::set_var("TECHMATE_TEST_TIMEOUT", "-5");
        assert!(parsed::<u64>("TECHMATE_TEST_TIMEOUT").is_err());

        std::env::set_var("TECHMATE_TEST_TIMEOUT", " 30 ");
        assert_eq!(parsed::<u64>("TECHMATE_TEST_TIMEOUT").unwrap(), Some(30));

        std::env::remove_var("TECHMATE_TEST_PORT");
        assert_eq!(parsed::<u16>("TECHMATE_TEST_PORT").unwrap(), None);
    }
}
