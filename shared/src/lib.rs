use serde::{Deserialize, Deserializer, Serialize};

/// Speaker of a chat turn. Anything other than `"user"` on the wire is the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    User,
    Bot,
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        if role == "user" {
            Role::User
        } else {
            Role::Bot
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Base64 PNG attached to a user turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            image: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `error` field of a failed [`ChatResponse`]: either a short message or a
/// provider error body passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    Message(String),
    Body(serde_json::Value),
}

impl std::fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorPayload::Message(message) => f.write_str(message),
            ErrorPayload::Body(body) => write!(f, "{}", body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl ChatResponse {
    pub fn reply(reply: impl Into<String>) -> Self {
        Self {
            success: true,
            reply: Some(reply.into()),
            error: None,
        }
    }

    pub fn failure(error: ErrorPayload) -> Self {
        Self {
            success: false,
            reply: None,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<String, ErrorPayload> {
        match (self.success, self.reply, self.error) {
            (true, Some(reply), _) => Ok(reply),
            (true, None, _) => Err(ErrorPayload::Message("missing reply".to_string())),
            (false, _, Some(error)) => Err(error),
            (false, _, None) => Err(ErrorPayload::Message("unknown error".to_string())),
        }
    }
}
