//! Workflow replay
//!
//! The replayer executes a recorded action sequence against a fresh browser
//! session, strictly in order, re-locating each target element through the
//! locator chain. Failures are isolated per step: an element that cannot be
//! resolved, or an action that errors while executing, is logged and skipped
//! so the rest of the sequence still runs. Only failing to acquire the
//! session is fatal, and that happens before this module is reached.

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::time::Duration;

use crate::action::{Action, ActionKind};
use crate::locator;
use crate::session::BrowserSession;

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Settle delay after a navigation.
    pub settle_navigate_ms: u64,
    /// Settle delay after a click, input or scroll.
    pub settle_action_ms: u64,
    /// Fixed pause between consecutive actions.
    pub step_delay_ms: u64,
    /// Per-strategy budget handed to the locator chain.
    pub locate_timeout_ms: u64,
    /// Pause before releasing the session, so the final page state is
    /// visible for inspection.
    pub trailing_delay_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            settle_navigate_ms: 3000,
            settle_action_ms: 2000,
            step_delay_ms: 1000,
            locate_timeout_ms: 6000,
            trailing_delay_ms: 5000,
        }
    }
}

/// Outcome counts for one replay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub completed: usize,
    /// Steps skipped because no locator strategy found the element.
    pub unresolved: usize,
    /// Steps that errored while executing.
    pub failed: usize,
}

pub struct Replayer {
    config: ReplayConfig,
}

impl Replayer {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Execute `actions` in order on `session`.
    ///
    /// The session is released unconditionally at the end of the run,
    /// whatever happened to individual steps.
    pub async fn replay(&self, session: BrowserSession, actions: &[Action]) -> ReplaySummary {
        println!(
            "{} Replaying {} action(s)...",
            "▶".green().bold(),
            actions.len()
        );

        let mut summary = ReplaySummary::default();
        for (index, action) in actions.iter().enumerate() {
            match self.execute(&session, action).await {
                Ok(true) => summary.completed += 1,
                Ok(false) => {
                    summary.unresolved += 1;
                    println!(
                        "  {} step {}: no element found for {}",
                        "⚠".yellow(),
                        index + 1,
                        action.describe()
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    println!(
                        "  {} step {} failed: {} ({:?})",
                        "❌".red(),
                        index + 1,
                        e,
                        action
                    );
                }
            }
            tokio::time::sleep(Duration::from_millis(self.config.step_delay_ms)).await;
        }

        println!(
            "{} Replay done: {} completed, {} unresolved, {} failed",
            "✅".green().bold(),
            summary.completed,
            summary.unresolved,
            summary.failed
        );

        tokio::time::sleep(Duration::from_millis(self.config.trailing_delay_ms)).await;
        session.close().await;
        summary
    }

    /// Run one action. `Ok(false)` reports an unresolved element, which the
    /// caller treats as a skip rather than a failure.
    async fn execute(&self, session: &BrowserSession, action: &Action) -> Result<bool> {
        match action.kind {
            ActionKind::Navigate => {
                session.goto(&action.value).await?;
                println!("  {} {}", "🧭".cyan(), action.describe());
                self.settle(self.config.settle_navigate_ms).await;
            }
            ActionKind::Click => {
                let hints = action.hints();
                let Some(element) =
                    locator::resolve(session, &hints, self.config.locate_timeout_ms).await
                else {
                    return Ok(false);
                };
                element.click_builder().click().await?;
                println!("  {} {}", "👆".cyan(), action.describe());
                self.settle(self.config.settle_action_ms).await;
            }
            ActionKind::Input => {
                let hints = action.hints();
                let Some(element) =
                    locator::resolve(session, &hints, self.config.locate_timeout_ms).await
                else {
                    return Ok(false);
                };
                // fill replaces the field content: clear plus type in one step
                element.fill_builder(&action.value).fill().await?;
                println!("  {} {}", "⌨".cyan(), action.describe());
                self.settle(self.config.settle_action_ms).await;
            }
            ActionKind::Scroll => {
                let delta: f64 = action
                    .value
                    .parse()
                    .map_err(|_| anyhow!("invalid scroll delta {:?}", action.value))?;
                let hints = action.hints();
                let Some(element) =
                    locator::resolve(session, &hints, self.config.locate_timeout_ms).await
                else {
                    return Ok(false);
                };
                session.scroll_element(element, delta).await?;
                println!("  {} {}", "🖱".cyan(), action.describe());
                self.settle(self.config.settle_action_ms).await;
            }
        }
        Ok(true)
    }

    async fn settle(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
