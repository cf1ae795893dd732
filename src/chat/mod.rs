//! Chat collaborator
//!
//! Thin glue around an OpenAI-compatible chat-completions endpoint, plus the
//! interactive terminal chat loop. The record/replay pipeline has no
//! dependency on anything in here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::utils::config::Config;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Seam for the hosted model, so the loop and the agent fallback can be
/// exercised against a stub.
#[async_trait]
pub trait ChatProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    /// Build a client from the loaded configuration. Fails when no API key
    /// is configured; chat is the only feature that needs one.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .chat_api_key
            .clone()
            .context("no chat_api_key configured; add it to config.json")?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.chat_endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.chat_model.clone(),
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl ChatProvider for ChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("chat endpoint returned {}: {}", status, text);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("chat endpoint returned an unexpected payload")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("chat endpoint returned no choices")
    }
}

/// Interactive chat loop: each turn sends the full transcript so the model
/// keeps context. `exit`/`quit` or EOF leaves the loop.
pub async fn run_chat(provider: &dyn ChatProvider) -> Result<()> {
    println!("\n{}", "=== flowpilot chat ===".bold().green());
    println!("Type a message, or 'exit' to leave.\n");

    let mut history = vec![ChatMessage::system("You are a helpful assistant.")];
    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("{} ", "you>".blue().bold());
        io::stdout().flush().ok();

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        history.push(ChatMessage::user(line));
        match provider.complete(&history).await {
            Ok(reply) => {
                println!("{} {}\n", "bot>".magenta().bold(), reply);
                history.push(ChatMessage::assistant(reply));
            }
            Err(e) => {
                // drop the failed turn so a transient error does not poison
                // the transcript
                history.pop();
                println!("{} {}\n", "❌".red(), e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = Config::default();
        assert!(ChatClient::from_config(&config).is_err());
    }

    #[test]
    fn test_response_payload_shape() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hi");
    }
}
