use async_trait::async_trait;
use serde_json::json;

use super::{AnswerGateway, AssistError};
use crate::config::AssistConfig;

const SYSTEM_PROMPT: &str = "You answer questions about construction-industry business \
qualifications, licensing agencies, and renewal procedures. Answer briefly and in plain \
language; say so when you do not know.";

/// Chat-completions client over the configured provider. The request
/// timeout is explicit; the caller treats every failure as best-effort.
pub struct HttpAnswerGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpAnswerGateway {
    pub fn new(config: &AssistConfig) -> Result<Self, AssistError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| AssistError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl AnswerGateway for HttpAnswerGateway {
    async fn ask(&self, question: &str) -> Result<String, AssistError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistError::EmptyQuestion);
        }
        let api_key = self.api_key.as_deref().ok_or(AssistError::MissingCredential)?;

        let request = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": question },
            ],
            "max_tokens": 512,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(|err| AssistError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AssistError::Provider {
                status: status.as_u16(),
                detail,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|err| AssistError::Transport(err.to_string()))?;

        let answer = body
            .get("choices")
            .and_then(|choices| choices.as_array())
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string);

        answer.ok_or(AssistError::EmptyAnswer)
    }
}
