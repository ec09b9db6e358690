//! Append-only chat log

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::application::errors::LoggingError;
use crate::domain::entities::{ChatMessage, LogRecord};

/// Appends one line per chat message to a shared file.
///
/// The file is opened and closed on every call. Writers serialize on an
/// internal mutex so a record is always written as a whole line.
pub struct MessageLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MessageLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn log(
        &self,
        channel_id: &str,
        author_id: &str,
        author_name: &str,
        content: &str,
    ) -> Result<(), LoggingError> {
        let record = LogRecord {
            channel_id,
            author_id,
            author_name,
            content,
        };
        self.append(&record).await
    }

    pub async fn log_message(&self, message: &ChatMessage) -> Result<(), LoggingError> {
        self.append(&LogRecord::from(message)).await
    }

    async fn append(&self, record: &LogRecord<'_>) -> Result<(), LoggingError> {
        let line = record.to_string();
        let path = self.path.display().to_string();

        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| LoggingError::Open { path: path.clone(), source })?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|source| LoggingError::Write { path: path.clone(), source })?;
        file.flush()
            .await
            .map_err(|source| LoggingError::Write { path, source })?;

        Ok(())
    }
}
