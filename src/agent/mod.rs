//! Autonomous-agent fallback
//!
//! When no stored process matches a task above the similarity threshold (or
//! the operator declines the match), the task is handed off here. The
//! pipeline itself only knows "no match found"; this module asks the
//! configured chat model for a concrete step-by-step browsing plan and shows
//! it to the operator, standing in for a fully autonomous browsing agent.

use anyhow::Result;
use colored::Colorize;

use crate::chat::{ChatClient, ChatMessage, ChatProvider};
use crate::utils::config::Config;

const PLANNER_PROMPT: &str = "You are a web-browsing assistant. The user describes \
a task they want performed in a browser. Reply with a numbered list of concrete \
browser steps (URLs to open, elements to click, text to type) that accomplishes \
the task. Be brief and practical.";

/// Hand `task` to the fallback collaborator.
pub async fn run_fallback(task: &str, config: &Config) -> Result<()> {
    println!(
        "{} No stored process fits this task; asking the model for a plan...",
        "🤖".blue()
    );

    let client = ChatClient::from_config(config)?;
    let messages = [ChatMessage::system(PLANNER_PROMPT), ChatMessage::user(task)];
    let plan = client.complete(&messages).await?;

    println!("\n{}\n{}\n", "Suggested plan:".bold(), plan);
    Ok(())
}
