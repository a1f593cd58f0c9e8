use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use shared::{ChatRequest, ChatResponse};

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    url: String,
}

impl GatewayClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    /// Posts one turn. Error statuses still carry the `{success:false, error}`
    /// envelope, so the body is decoded regardless of status.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let res = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .context("Failed to send request to chat gateway")?;

        let status = res.status();
        let text = res.text().await?;
        serde_json::from_str(&text).map_err(|_| anyhow!("gateway returned {}: {}", status, text))
    }
}
