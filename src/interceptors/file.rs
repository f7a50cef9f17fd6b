use super::Interceptor;
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Writes each exchange to `<dir>/<task>_<timestamp>.md`, creating `dir` on first use.
/// Captures landing in the same millisecond get a `-1`, `-2`, ... suffix instead of
/// overwriting each other.
#[derive(Debug, Clone)]
pub struct FileInterceptor {
    dir: PathBuf,
}

impl FileInterceptor {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn capture_path(&self, task: &str, stamp: &str, attempt: u32) -> PathBuf {
        match attempt {
            0 => self.dir.join(format!("{}_{}.md", task, stamp)),
            n => self.dir.join(format!("{}_{}-{}.md", task, stamp, n)),
        }
    }

    async fn create_unique(&self, task: &str) -> std::io::Result<(PathBuf, fs::File)> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        self.create_unique_at(task, &stamp).await
    }

    async fn create_unique_at(&self, task: &str, stamp: &str) -> std::io::Result<(PathBuf, fs::File)> {
        let mut attempt = 0;
        loop {
            let path = self.capture_path(task, stamp, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Interceptor for FileInterceptor {
    async fn save(&self, task: &str, prompt: &str, reply: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let (path, mut file) = self.create_unique(task).await?;
        let document = format!(
            "# {} exchange\n\n## Prompt\n\n{}\n\n## Reply ({} bytes)\n\n{}\n",
            task,
            prompt,
            reply.len(),
            reply
        );
        file.write_all(document.as_bytes()).await?;
        file.flush().await?;

        debug!(target: "techmate::interceptors", path = %path.display(), "Captured model reply");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_prompt_and_reply() {
        let dir = std::env::temp_dir().join(format!("techmate-capture-{}", std::process::id()));
        let interceptor = FileInterceptor::new(dir.clone());
        interceptor.save("quiz", "make a quiz", "[]").await.unwrap();

        let mut entries = std::fs::read_dir(&dir).unwrap();
        let path = entries.next().unwrap().unwrap().path();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("quiz_"));
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("# quiz exchange"));
        assert!(body.contains("## Prompt\n\nmake a quiz"));
        assert!(body.contains("## Reply (2 bytes)\n\n[]"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn same_millisecond_captures_do_not_overwrite() {
        let dir = std::env::temp_dir().join(format!("techmate-capture-burst-{}", std::process::id()));
        let interceptor = FileInterceptor::new(dir.clone());
        for i in 0..5 {
            interceptor.save("notes", "summarise", &format!("reply {}", i)).await.unwrap();
        }

        let mut replies: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        replies.sort();
        assert_eq!(replies.len(), 5);
        for (i, body) in replies.iter().enumerate() {
            assert!(body.ends_with(&format!("reply {}\n", i)), "capture {} was {:?}", i, body);
        }

        let taken = FileInterceptor::new(dir.clone());
        let first = taken.capture_path("quiz", "20240101_000000_000", 0);
        std::fs::write(&first, "x").unwrap();
        let (path, _) = taken.create_unique_at("quiz", "20240101_000000_000").await.unwrap();
        assert_eq!(path.file_name().unwrap(), "quiz_20240101_000000_000-1.md");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
