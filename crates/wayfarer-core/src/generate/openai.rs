//! OpenAI-compatible chat-completions backend for plan generation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{PlanGenerator, PlanPayload};

/// System prompt instructing the model to emit a plan payload as bare JSON.
///
/// The item_type vocabulary is deliberately restricted to the four kinds the
/// generator may emit; `Flight` only exists on manually constructed items.
const SYSTEM_PROMPT: &str = r#"你是一位专业的旅行规划专家。根据用户的自然语言需求生成一份详细的旅行计划。
每天的第一个行程项目应当是用户当日的出发地点（酒店、火车站、机场等）。
给出确定的住宿、餐厅名称；实在不知道时，给出附近的标志性地点作为代替。
每个项目的地址必须是确定的一个，不要给出多个候选。
严格按照以下 JSON 结构返回，只输出 JSON 对象本身，不要任何额外文本：
{
  "title": string,
  "description": string,
  "days": [
    {
      "date": "YYYY-MM-DD",
      "items": [
        {
          "item_type": "Activity" | "Meal" | "Transportation" | "Hotel",
          "description": string,
          "start_time": "YYYY-MM-DDTHH:MM:SS",
          "end_time": "YYYY-MM-DDTHH:MM:SS",
          "location": {"name": string, "city": string},
          "estimated_cost": number,
          "estimated_cost_currency": string
        }
      ]
    }
  ]
}"#;

/// Plan generator backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiGenerator {
    /// Build a generator against `base_url` (e.g. `https://api.deepseek.com/v1`)
    /// with an explicit request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::collaborator(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl PlanGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, query: &str) -> Result<PlanPayload> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": query},
            ],
            "response_format": {"type": "json_object"},
        });

        debug!(model = %self.model, "requesting plan generation");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::collaborator(format!("plan generation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, "plan generation returned an error status");
            return Err(Error::collaborator(format!(
                "plan generation returned status {status}: {detail}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::collaborator(format!("invalid chat-completions response: {e}")))?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| Error::collaborator("chat-completions response had no choices"))?;

        serde_json::from_str(content)
            .map_err(|e| Error::collaborator(format!("model did not return a plan payload: {e}")))
    }
}
