//! Workflow recording
//!
//! The recorder drives a live browser session the operator interacts with.
//! A page-level script is injected into every document; it listens for
//! `click`, `wheel` and `input` events and appends what it saw to a
//! well-known page-global queue, because the host talks to the page by
//! polling, not through a push channel. Each poll drains the whole queue in
//! one evaluation; the drain is the acknowledgment, so an event is never
//! read twice and rapid events are never lost between polls. The loop also
//! watches for new tabs and navigations, and ends when the operator closes
//! the browser window.

use anyhow::Result;
use colored::Colorize;
use std::time::Duration;

use crate::action::{Action, ActionKind};
use crate::session::BrowserSession;

/// Injected into every document the operator can interact with.
///
/// `pathTo` prefers an id shortcut and otherwise walks up through
/// parent/sibling-index pairs. Events are appended to the
/// `window.__flowpilotQueue` slot in the order they fired; the
/// `__flowpilotArmed` flag keeps re-injection from stacking duplicate
/// listeners on a document that already has them (a fresh document after a
/// navigation has no flag, so it re-arms there).
const LISTENER_SCRIPT: &str = r#"
(() => {
    if (window.__flowpilotArmed) { return; }
    window.__flowpilotArmed = true;
    window.__flowpilotQueue = [];

    function pathTo(element) {
        if (element.id !== '') {
            return '//*[@id="' + element.id + '"]';
        }
        if (element === document.body) {
            return '/html/body';
        }
        if (!element.parentNode || element.parentNode.nodeType !== 1) {
            return '//' + element.tagName.toLowerCase();
        }
        var ix = 0;
        var siblings = element.parentNode.childNodes;
        for (var i = 0; i < siblings.length; i++) {
            var sibling = siblings[i];
            if (sibling === element) {
                return pathTo(element.parentNode) + '/' +
                    element.tagName.toLowerCase() + '[' + (ix + 1) + ']';
            }
            if (sibling.nodeType === 1 && sibling.tagName === element.tagName) {
                ix++;
            }
        }
        return '//' + element.tagName.toLowerCase();
    }

    function push(entry) {
        window.__flowpilotQueue.push(entry);
    }

    document.addEventListener('click', function (event) {
        push({
            kind: 'click',
            selector: pathTo(event.target),
            text: (event.target.textContent || '').trim(),
            className: typeof event.target.className === 'string' ? event.target.className : '',
            id: event.target.id || ''
        });
    }, true);

    document.addEventListener('wheel', function (event) {
        push({
            kind: 'wheel',
            selector: pathTo(event.target),
            delta: event.deltaY
        });
    }, true);

    document.addEventListener('input', function (event) {
        push({
            kind: 'input',
            selector: pathTo(event.target),
            value: event.target.value || ''
        });
    }, true);
})()
"#;

/// Hands back everything captured since the last poll and clears the queue
/// in the same evaluation, so the read doubles as the acknowledgment.
const DRAIN_SCRIPT: &str =
    "() => { const q = window.__flowpilotQueue || []; window.__flowpilotQueue = []; return q; }";

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Page the recording starts on; the navigation to it is the first
    /// recorded action.
    pub start_url: String,
    pub poll_interval_ms: u64,
}

pub struct Recorder {
    config: RecorderConfig,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self { config }
    }

    /// Record operator interactions until the browser window is closed.
    ///
    /// The session failure caused by the operator closing the window is the
    /// normal end-of-recording signal, not an error: whatever actions were
    /// accumulated up to that point are returned. The session is released on
    /// every path.
    pub async fn record(&self, mut session: BrowserSession) -> Vec<Action> {
        println!(
            "{} Browser is up. Perform the workflow, then close the window to finish recording.",
            "🔴".red().bold()
        );

        let mut actions = Vec::new();
        if let Err(e) = self.capture_loop(&mut session, &mut actions).await {
            println!("{} Recording finished: {}", "⏹".yellow(), e);
        }
        session.close().await;

        println!(
            "{} Captured {} action(s)",
            "✅".green().bold(),
            actions.len()
        );
        actions
    }

    async fn capture_loop(
        &self,
        session: &mut BrowserSession,
        actions: &mut Vec<Action>,
    ) -> Result<()> {
        actions.push(Action::navigate(&self.config.start_url));
        session.goto(&self.config.start_url).await?;
        session.inject(LISTENER_SCRIPT).await?;

        let mut known_pages = session.pages().len().max(1);
        let mut last_url = self.config.start_url.clone();

        loop {
            // New windows/tabs have no listeners yet: arm each one and make
            // the newest the active page.
            let pages = session.pages();
            let total = pages.len();
            if total > known_pages {
                for page in pages.into_iter().skip(known_pages) {
                    session.activate(page).await;
                    session.inject(LISTENER_SCRIPT).await?;
                }
                known_pages = total;
            }

            // A navigation drops page script state: record it and re-arm.
            let url = session.current_url().await?;
            if url != last_url {
                println!("  {} navigate: {}", "🧭".cyan(), url);
                actions.push(Action::navigate(&url));
                session.inject(LISTENER_SCRIPT).await?;
                last_url = url;
            }

            let drained = session.eval_json(DRAIN_SCRIPT).await?;
            if let Some(entries) = drained.as_array() {
                for entry in entries {
                    append_event(actions, entry);
                }
            }

            tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }
    }
}

/// Fold one captured event into the action list.
///
/// Keystroke bursts arrive as one `input` event per character and wheel
/// gestures as many small deltas; consecutive events on the same element are
/// coalesced (inputs keep the latest value, scroll deltas sum) so a typed
/// field or a scroll gesture becomes a single action.
fn append_event(actions: &mut Vec<Action>, entry: &serde_json::Value) {
    let kind = entry["kind"].as_str().unwrap_or_default();
    let selector = entry["selector"].as_str().unwrap_or_default();
    if selector.is_empty() {
        return;
    }

    match kind {
        "click" => {
            let text = entry["text"].as_str().unwrap_or_default();
            let class_name = entry["className"].as_str().unwrap_or_default();
            let id = entry["id"].as_str().unwrap_or_default();
            println!("  {} click: {}", "👆".cyan(), selector);
            actions.push(Action::click(selector, text, class_name, id));
        }
        "wheel" => {
            let delta = entry["delta"].as_f64().unwrap_or(0.0);
            // a zero-delta wheel event carries no movement worth replaying
            if delta == 0.0 {
                return;
            }
            if let Some(last) = actions.last_mut() {
                if last.kind == ActionKind::Scroll && last.selector == selector {
                    let total = last.value.parse::<f64>().unwrap_or(0.0) + delta;
                    last.value = total.to_string();
                    return;
                }
            }
            println!("  {} scroll: {} by {}", "🖱".cyan(), selector, delta);
            actions.push(Action::scroll(selector, delta.to_string()));
        }
        "input" => {
            let value = entry["value"].as_str().unwrap_or_default();
            // an empty value means the field was merely focused or cleared,
            // not typed into
            if value.is_empty() {
                return;
            }
            if let Some(last) = actions.last_mut() {
                if last.kind == ActionKind::Input && last.selector == selector {
                    last.value = value.to_string();
                    return;
                }
            }
            println!("  {} input: {}", "⌨".cyan(), selector);
            actions.push(Action::input(selector, value));
        }
        other => {
            log::debug!("ignoring unknown event kind {:?}", other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listener_script_uses_the_shared_queue() {
        assert!(LISTENER_SCRIPT.contains("__flowpilotQueue"));
        assert!(DRAIN_SCRIPT.contains("__flowpilotQueue"));
        assert!(LISTENER_SCRIPT.contains("__flowpilotArmed"));
    }

    #[test]
    fn test_click_event_keeps_all_hints() {
        let mut actions = Vec::new();
        append_event(
            &mut actions,
            &json!({
                "kind": "click",
                "selector": "//*[@id=\"go\"]",
                "text": "Go",
                "className": "btn primary",
                "id": "go"
            }),
        );
        assert_eq!(
            actions,
            vec![Action::click("//*[@id=\"go\"]", "Go", "btn primary", "go")]
        );
    }

    #[test]
    fn test_hintless_click_still_yields_structural_action() {
        let mut actions = Vec::new();
        append_event(
            &mut actions,
            &json!({
                "kind": "click",
                "selector": "/html/body/div[3]/span[1]",
                "text": "",
                "className": "",
                "id": ""
            }),
        );
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].selector, "/html/body/div[3]/span[1]");
    }

    #[test]
    fn test_empty_input_value_is_not_recorded() {
        let mut actions = Vec::new();
        append_event(
            &mut actions,
            &json!({"kind": "input", "selector": "//input[1]", "value": ""}),
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn test_zero_wheel_delta_is_not_recorded() {
        let mut actions = Vec::new();
        append_event(
            &mut actions,
            &json!({"kind": "wheel", "selector": "/html/body", "delta": 0.0}),
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn test_keystroke_burst_coalesces_to_final_value() {
        let mut actions = Vec::new();
        for value in ["h", "he", "hel", "hell", "hello"] {
            append_event(
                &mut actions,
                &json!({"kind": "input", "selector": "//input[1]", "value": value}),
            );
        }
        assert_eq!(actions, vec![Action::input("//input[1]", "hello")]);
    }

    #[test]
    fn test_input_on_different_element_starts_a_new_action() {
        let mut actions = Vec::new();
        append_event(
            &mut actions,
            &json!({"kind": "input", "selector": "//input[1]", "value": "user"}),
        );
        append_event(
            &mut actions,
            &json!({"kind": "input", "selector": "//input[2]", "value": "pass"}),
        );
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_scroll_run_sums_deltas() {
        let mut actions = Vec::new();
        for _ in 0..3 {
            append_event(
                &mut actions,
                &json!({"kind": "wheel", "selector": "/html/body", "delta": 120.0}),
            );
        }
        assert_eq!(actions, vec![Action::scroll("/html/body", "360")]);
    }

    #[test]
    fn test_click_between_scrolls_breaks_the_run() {
        let mut actions = Vec::new();
        append_event(
            &mut actions,
            &json!({"kind": "wheel", "selector": "/html/body", "delta": 100.0}),
        );
        append_event(
            &mut actions,
            &json!({
                "kind": "click", "selector": "//*[@id=\"more\"]",
                "text": "More", "className": "", "id": "more"
            }),
        );
        append_event(
            &mut actions,
            &json!({"kind": "wheel", "selector": "/html/body", "delta": 100.0}),
        );
        assert_eq!(actions.len(), 3);
    }
}
