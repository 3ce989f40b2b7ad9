//! Structured-extraction client for an OpenAI-compatible chat endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use veridoc_core::{DocumentType, ExtractedRecord};

use crate::schema;
use crate::{Artifact, ExtractError, FieldExtractor};

/// Chat-completions client binding each extraction to a per-type JSON schema.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiExtractor {
    /// Create a client for the given endpoint.
    ///
    /// `base_url` should be like `https://api.openai.com` (no trailing slash).
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn user_content(document_type: DocumentType, artifact: &Artifact) -> Value {
        let instruction = schema::prompt(document_type);
        match artifact {
            Artifact::Image(frame) => json!([
                { "type": "text", "text": instruction },
                {
                    "type": "image_url",
                    "image_url": { "url": format!("data:image/jpeg;base64,{frame}") },
                },
            ]),
            Artifact::Text(text) => json!(format!("{instruction}\n\n{text}")),
        }
    }
}

#[async_trait]
impl FieldExtractor for OpenAiExtractor {
    async fn extract(
        &self,
        document_type: DocumentType,
        artifact: Artifact,
    ) -> Result<ExtractedRecord, ExtractError> {
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": Self::user_content(document_type, &artifact),
            }],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema::schema_name(document_type),
                    "strict": true,
                    "schema": schema::response_schema(document_type),
                },
            },
        });

        let url = format!("{}/v1/chat/completions", self.base_url);
        info!(%document_type, model = %self.model, "requesting field extraction");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExtractError::MalformedResponse("no message content".into()))?;

        schema::parse_record(document_type, &content)
    }
}
