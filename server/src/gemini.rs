use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::GatewayError;

pub const API_KEY_HEADER: &str = "x-goog-api-key";
pub const IMAGE_MIME_TYPE: &str = "image/png";

#[derive(Serialize, Debug)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Serialize, Debug)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl GenerateContentRequest {
    /// One user content unit: the prompt, then the image if there is one.
    pub fn new(prompt: String, image: Option<String>) -> Self {
        let mut parts = vec![Part::Text { text: prompt }];
        if let Some(data) = image.filter(|data| !data.is_empty()) {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: IMAGE_MIME_TYPE.to_string(),
                    data,
                },
            });
        }

        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
        }
    }
}

/// `candidates[0].content.parts[0].text`, if every step exists and the text is non-empty.
pub fn reply_text(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Error for a non-2xx provider answer. A readable body becomes `details`;
/// a body that could not be read is folded into `message`.
fn upstream_failure<E: std::fmt::Display>(
    status: StatusCode,
    body: Result<String, E>,
) -> GatewayError {
    let text = match body {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("could not read provider error body: {}", e);
            return GatewayError::upstream(format!(
                "provider returned {} (body unreadable: {})",
                status, e
            ));
        }
    };

    let details = if text.trim().is_empty() {
        None
    } else {
        Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    };
    GatewayError::Upstream {
        message: format!("provider returned {}", status),
        details,
    }
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Sends one `generateContent` call and returns the raw JSON body.
    pub async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<Value, GatewayError> {
        let res = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(upstream_failure(status, res.text().await));
        }

        let text = res.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| GatewayError::upstream(format!("invalid provider response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_image_has_one_part() {
        let body = serde_json::to_value(GenerateContentRequest::new("User: hi\nBot:".into(), None)).unwrap();
        assert_eq!(
            body,
            json!({"contents": [{"role": "user", "parts": [{"text": "User: hi\nBot:"}]}]})
        );
    }

    #[test]
    fn image_becomes_inline_png_part() {
        let body = serde_json::to_value(GenerateContentRequest::new("p".into(), Some("iVBORw0K".into()))).unwrap();
        assert_eq!(
            body["contents"][0]["parts"][1],
            json!({"inlineData": {"mimeType": "image/png", "data": "iVBORw0K"}})
        );
    }

    #[test]
    fn empty_image_is_ignored() {
        let req = GenerateContentRequest::new("p".into(), Some(String::new()));
        assert_eq!(req.contents[0].parts.len(), 1);
    }

    #[test]
    fn reply_text_follows_candidate_path() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "hello"}, {"text": "ignored"}]}}]});
        assert_eq!(reply_text(&body).as_deref(), Some("hello"));
    }

    #[test]
    fn reply_text_is_none_on_missing_steps() {
        assert_eq!(reply_text(&json!({})), None);
        assert_eq!(reply_text(&json!({"candidates": []})), None);
        assert_eq!(reply_text(&json!({"candidates": [{"finishReason": "SAFETY"}]})), None);
        assert_eq!(reply_text(&json!({"candidates": [{"content": {"parts": [{}]}}]})), None);
        assert_eq!(reply_text(&json!({"candidates": "nope"})), None);
        assert_eq!(reply_text(&json!({"candidates": [{"content": {"parts": [{"text": ""}]}}]})), None);
    }

    #[test]
    fn unreadable_error_body_keeps_local_message() {
        let err = upstream_failure(StatusCode::BAD_GATEWAY, Err("connection reset by peer"));
        match err {
            GatewayError::Upstream { message, details } => {
                assert!(message.contains("502"));
                assert!(message.contains("connection reset by peer"));
                assert!(details.is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn readable_error_body_becomes_details() {
        let err = upstream_failure::<String>(StatusCode::TOO_MANY_REQUESTS, Ok(r#"{"message":"rate limited"}"#.into()));
        assert!(matches!(
            err,
            GatewayError::Upstream { details: Some(ref d), .. } if d == &json!({"message": "rate limited"})
        ));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = GeminiClient::new("http://localhost:1234/", "gemini-2.5-flash");
        assert_eq!(
            client.endpoint(),
            "http://localhost:1234/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
