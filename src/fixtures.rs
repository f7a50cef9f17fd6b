//! Demo data served by the dashboard and login endpoints.
//!
//! Loaded once at startup and shared read-only; nothing mutates it per request.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub level: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub date: String,
    pub score: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub day: String,
    pub hours: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub name: String,
    pub progress: u32,
    pub total: u32,
    pub completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub topics_learned: u32,
    pub quizzes_taken: u32,
    pub average_score: u32,
    pub streak: u32,
    pub recent_activity: Vec<Activity>,
    pub progress_data: Vec<DailyProgress>,
    pub courses: Vec<CourseProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoCredentials {
    pub email: String,
    pub password: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixtures {
    pub user: UserProfile,
    pub credentials: DemoCredentials,
    pub dashboard: DashboardStats,
}

impl Fixtures {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let err = |reason: String| ConfigError::Fixtures { path: path.display().to_string(), reason };
        let raw = std::fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| err(e.to_string()))
    }

    pub fn check_login(&self, email: &str, password: &str) -> bool {
        self.credentials.email == email && self.credentials.password == password
    }

    pub fn demo() -> Self {
        let activity = |kind: &str, title: &str, date: &str, score: Option<&str>| Activity {
            kind: kind.to_string(),
            title: title.to_string(),
            date: date.to_string(),
            score: score.map(str::to_string),
        };
        let day = |day: &str, hours: f32| DailyProgress { day: day.to_string(), hours };

        Self {
            user: UserProfile {
                id: 1,
                name: "Alex Johnson".to_string(),
                email: "student@demo.com".to_string(),
                role: "student".to_string(),
                level: "Intermediate Dev".to_string(),
                avatar: "https://i.pravatar.cc/150?u=a042581f4e29026704d".to_string(),
            },
            credentials: DemoCredentials {
                email: "student@demo.com".to_string(),
                password: "password".to_string(),
                token: "demo-session-token".to_string(),
            },
            dashboard: DashboardStats {
                topics_learned: 42,
                quizzes_taken: 15,
                average_score: 88,
                streak: 12,
                recent_activity: vec![
                    activity("quiz", "React Hooks Mastery", "2 hours ago", Some("9/10")),
                    activity("note", "Redux State Management", "5 hours ago", None),
                    activity("video", "Intro to Tailwind CSS", "1 day ago", None),
                ],
                progress_data: vec![
                    day("Mon", 2.5),
                    day("Tue", 4.0),
                    day("Wed", 3.2),
                    day("Thu", 5.5),
                    day("Fri", 1.8),
                ],
                courses: vec![
                    CourseProgress { name: "Advanced React Patterns".to_string(), progress: 75, total: 20, completed: 15 },
                    CourseProgress { name: "Node.js Backend API".to_string(), progress: 45, total: 32, completed: 14 },
                ],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_uses_camel_case_keys() {
        let value = serde_json::to_value(Fixtures::demo().dashboard).unwrap();
        assert_eq!(value["topicsLearned"], 42);
        assert_eq!(value["recentActivity"][0]["type"], "quiz");
        assert!(value["recentActivity"][1]["score"].is_null());
    }
}
