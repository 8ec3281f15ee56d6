//! OpenAI chat-completions judge backend.

use super::{prompt, FormattedTranscript, Judge, JudgeResponse};
use crate::model::Criterion;
use async_trait::async_trait;
use serde_json::json;

pub struct OpenAiJudge {
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiJudge {
    pub fn new(model: String, api_key: String, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model,
            api_key,
            temperature,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Judge for OpenAiJudge {
    async fn evaluate(
        &self,
        transcript: &FormattedTranscript,
        criterion: &Criterion,
    ) -> anyhow::Result<JudgeResponse> {
        let url = "https://api.openai.com/v1/chat/completions";

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "developer", "content": prompt::developer_message() },
                { "role": "user", "content": prompt::user_message(transcript, criterion) },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_else(|_| String::new());
            anyhow::bail!("OpenAI chat API error (status {}): {}", status, error_text);
        }

        let payload: serde_json::Value = resp.json().await?;
        let text = payload
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API response missing content"))?
            .to_string();

        Ok(JudgeResponse {
            text,
            backend: "openai".to_string(),
            model: self.model.clone(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "openai"
    }
}
