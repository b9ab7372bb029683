use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::warn;

use super::{check_status, ClientError, Session};
use crate::config::{Config, LlmProvider};

const GEMINI_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
enum Provider {
    /// InvokeLLM integration of the managed backend.
    Backend { base_url: String, app_id: String },
    Gemini {
        base_url: String,
        api_key: String,
        model: String,
    },
}

/// Structured LLM invocation: a prompt plus a JSON schema in, a JSON object out.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    provider: Provider,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        let provider = match config.llm_provider {
            LlmProvider::Backend => Provider::Backend {
                base_url: config.backend_base_url.clone(),
                app_id: config.backend_app_id.clone(),
            },
            LlmProvider::Gemini => Provider::Gemini {
                base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
                api_key: config
                    .gemini_api_key
                    .clone()
                    .ok_or(ClientError::NotConfigured("GEMINI_API_KEY"))?,
                model: config.gemini_model.clone(),
            },
        };
        Ok(Self { http, provider })
    }

    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            Provider::Backend { .. } => "backend",
            Provider::Gemini { .. } => "gemini",
        }
    }

    pub async fn invoke(&self, session: &Session, prompt: &str, schema: &Value) -> Result<Value, ClientError> {
        match &self.provider {
            Provider::Backend { base_url, app_id } => {
                let url = format!("{base_url}/api/apps/{app_id}/integrations/Core/InvokeLLM");
                let mut req = self.http.post(url).json(&json!({
                    "prompt": prompt,
                    "response_json_schema": schema,
                }));
                if let Some(token) = session.token() {
                    req = req.bearer_auth(token);
                }
                let resp = check_status(req.send().await?).await?;
                resp.json::<Value>()
                    .await
                    .map_err(|e| ClientError::Decode(e.to_string()))
            }
            Provider::Gemini {
                base_url,
                api_key,
                model,
            } => self.invoke_gemini(base_url, api_key, model, prompt, schema).await,
        }
    }

    /// `invoke` decoded into `T`.
    pub async fn invoke_as<T: DeserializeOwned>(
        &self,
        session: &Session,
        prompt: &str,
        schema: &Value,
    ) -> Result<T, ClientError> {
        let value = self.invoke(session, prompt, schema).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn invoke_gemini(
        &self,
        base_url: &str,
        api_key: &str,
        model: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<Value, ClientError> {
        let body = build_gemini_request(prompt, schema);
        let endpoints = [
            format!("{base_url}/v1beta/models/{model}:generateContent"),
            format!("{base_url}/v1/models/{model}:generateContent"),
        ];

        let mut last_error = ClientError::Status {
            status: 404,
            body: "no generateContent endpoint".to_string(),
        };
        for endpoint in endpoints.iter() {
            let resp = self
                .http
                .post(endpoint)
                .header(GEMINI_KEY_HEADER, api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| ClientError::Http(e.without_url()))?;
            if resp.status().as_u16() == 404 {
                warn!("gemini model {} not found, trying next endpoint", model);
                continue;
            }
            match check_status(resp).await {
                Ok(resp) => {
                    let v: Value = resp
                        .json()
                        .await
                        .map_err(|e| ClientError::Decode(e.without_url().to_string()))?;
                    let text = extract_gemini_text(&v)
                        .ok_or_else(|| ClientError::Decode("gemini response has no text part".to_string()))?;
                    return serde_json::from_str(strip_code_fences(&text))
                        .map_err(|e| ClientError::Decode(e.to_string()));
                }
                Err(e) => {
                    last_error = e;
                    break;
                }
            }
        }
        Err(last_error)
    }
}

fn build_gemini_request(prompt: &str, schema: &Value) -> Value {
    let instructions = format!(
        "Respond with a single JSON object that conforms to this JSON schema:\n{schema}"
    );
    json!({
        "generationConfig": { "response_mime_type": "application/json" },
        "contents": [{
            "role": "user",
            "parts": [
                { "text": prompt },
                { "text": instructions }
            ]
        }]
    })
}

fn extract_gemini_text(v: &Value) -> Option<String> {
    let cands = v.get("candidates")?.as_array()?;
    let first = cands.first()?;
    let content = first.get("content")?;
    let parts = content.get("parts")?.as_array()?;
    for p in parts {
        if let Some(t) = p.get("text").and_then(|x| x.as_str()) {
            return Some(t.to_string());
        }
    }
    None
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
