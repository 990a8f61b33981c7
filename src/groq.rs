use crate::error::{Error, Result};
use crate::summary::TextGenerator;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde_json::json;
use std::time::Duration;

pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

const SYSTEM_PROMPT: &str = "You are a helpful stand-up summary assistant.";
const TEMPERATURE: f64 = 0.7;

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

/// Chat-completions client for Groq (or any OpenAI compatible endpoint).
pub struct GroqGenerator {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl GroqGenerator {
    pub fn new(url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<GroqGenerator> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(GroqGenerator {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

impl TextGenerator for GroqGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": TEMPERATURE
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(Error::Generation(format!("{}: {}", status, body)));
        }

        let body = resp.text()?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::MalformedResponse("no completion content".to_string()))
    }
}
