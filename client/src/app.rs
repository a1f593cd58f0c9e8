use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use shared::{ChatRequest, ChatResponse, Message};

use crate::store::HistoryStore;

pub enum KeyAction {
    None,
    Quit,
    Send(ChatRequest),
}

pub struct App<S: HistoryStore> {
    pub messages: Vec<Message>,
    pub input: String,
    /// Base64 image that goes out with the next turn.
    pub pending_image: Option<String>,
    pub loading: bool,
    pub status: Option<String>,
    store: S,
}

impl<S: HistoryStore> App<S> {
    pub fn new(store: S) -> Self {
        let messages = store.load().unwrap_or_else(|e| {
            tracing::warn!("could not load history: {:#}", e);
            Vec::new()
        });
        Self {
            messages,
            input: String::new(),
            pending_image: None,
            loading: false,
            status: None,
            store,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.kind != KeyEventKind::Press {
            return KeyAction::None;
        }
        let chord = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return KeyAction::Quit
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => self.clear(),
            KeyCode::Char(c) if !chord => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                if let Some(request) = self.submit() {
                    return KeyAction::Send(request);
                }
            }
            _ => {}
        }
        KeyAction::None
    }

    /// Consumes the input line. Returns the request to send, if the line was a
    /// chat turn and no other turn is in flight.
    pub fn submit(&mut self) -> Option<ChatRequest> {
        if self.loading || self.input.trim().is_empty() {
            return None;
        }
        let line = self.input.drain(..).collect::<String>();

        if line.trim() == "/clear" {
            self.clear();
            return None;
        }
        if let Some(path) = line.trim().strip_prefix("/image ") {
            self.attach(Path::new(path.trim()));
            return None;
        }

        let history = self
            .messages
            .iter()
            .map(|m| Message {
                image: None,
                ..m.clone()
            })
            .collect();
        let image = self.pending_image.take();

        self.messages.push(Message::user(line.clone(), image.clone()));
        self.persist();
        self.loading = true;
        self.status = None;

        Some(ChatRequest {
            history,
            message: line,
            image,
        })
    }

    /// Records the outcome of the in-flight turn as a bot message.
    pub fn receive(&mut self, outcome: Result<ChatResponse, String>) {
        let text = match outcome {
            Ok(response) => match response.into_result() {
                Ok(reply) => reply,
                Err(error) => format!("Error: {}", error),
            },
            Err(e) => format!("Error: could not reach the chat gateway ({})", e),
        };
        self.messages.push(Message::bot(text));
        self.loading = false;
        self.persist();
    }

    /// Empties the conversation. Refused while a turn is in flight so the
    /// pending reply cannot land in the cleared history.
    pub fn clear(&mut self) {
        if self.loading {
            self.status = Some("wait for the reply before clearing".to_string());
            return;
        }
        self.messages.clear();
        self.pending_image = None;
        self.status = Some("history cleared".to_string());
        self.persist();
    }

    fn attach(&mut self, path: &Path) {
        match read_image(path) {
            Ok(data) => {
                self.pending_image = Some(data);
                self.status = Some(format!("attached {}", path.display()));
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                self.status = Some(format!("{:#}", e));
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.messages) {
            tracing::error!("could not save history: {:#}", e);
        }
    }
}

fn read_image(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(BASE64.encode(bytes))
}
