use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use shared::Message;

pub const DEFAULT_HISTORY_FILE: &str = "gemini-chat.json";

/// Local persistence for the conversation shown in the client.
pub trait HistoryStore {
    fn load(&self) -> Result<Vec<Message>>;
    fn save(&self, history: &[Message]) -> Result<()>;
}

/// History kept as a JSON array of messages in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Message>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn save(&self, history: &[Message]) -> Result<()> {
        let json = serde_json::to_string(history)?;
        fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))
    }
}
