//! Recorded browser actions
//!
//! An [`Action`] is the atomic unit of a recorded workflow: one navigation,
//! click, text input or scroll, together with the locator hints captured at
//! record time. Actions are immutable once recorded; replay never mutates
//! them.

use serde::{Deserialize, Serialize};

/// What kind of interaction an action represents.
///
/// The kind determines which of the other fields carry meaning: `value` is a
/// URL for `Navigate`, the typed text for `Input` and the scroll delta for
/// `Scroll`; the locator hints are only meaningful for element-targeting
/// kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Navigate,
    Click,
    Input,
    /// Serialized as `wheel` for compatibility with existing process files.
    #[serde(rename = "wheel")]
    Scroll,
}

/// One recorded, replayable step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "action")]
    pub kind: ActionKind,
    /// Structural path to the target element, captured at record time.
    /// Empty for `Navigate`.
    pub selector: String,
    /// URL, input text or scroll delta depending on `kind`.
    pub value: String,
    /// Trimmed visible text of the element at record time.
    #[serde(default)]
    pub text: String,
    /// `class` attribute of the element at record time.
    #[serde(default)]
    pub class_name: String,
    /// `id` attribute of the element at record time.
    #[serde(default)]
    pub id: String,
}

impl Action {
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Navigate,
            selector: String::new(),
            value: url.into(),
            text: String::new(),
            class_name: String::new(),
            id: String::new(),
        }
    }

    pub fn click(
        selector: impl Into<String>,
        text: impl Into<String>,
        class_name: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            kind: ActionKind::Click,
            selector: selector.into(),
            value: String::new(),
            text: text.into(),
            class_name: class_name.into(),
            id: id.into(),
        }
    }

    pub fn input(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Input,
            selector: selector.into(),
            value: value.into(),
            text: String::new(),
            class_name: String::new(),
            id: String::new(),
        }
    }

    pub fn scroll(selector: impl Into<String>, delta: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Scroll,
            selector: selector.into(),
            value: delta.into(),
            text: String::new(),
            class_name: String::new(),
            id: String::new(),
        }
    }

    /// Locator hints for re-resolving this action's target element.
    pub fn hints(&self) -> crate::locator::Hints<'_> {
        crate::locator::Hints {
            selector: &self.selector,
            text: &self.text,
            class_name: &self.class_name,
            id: &self.id,
        }
    }

    /// Short human-readable form used in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            ActionKind::Navigate => format!("navigate to {}", self.value),
            ActionKind::Click => format!("click {}", self.selector),
            ActionKind::Input => format!("input \"{}\" into {}", self.value, self.selector),
            ActionKind::Scroll => format!("scroll {} by {}", self.selector, self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_field_names() {
        let action = Action::click("//*[@id=\"go\"]", "Go", "btn primary", "go");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "click");
        assert_eq!(json["selector"], "//*[@id=\"go\"]");
        assert_eq!(json["text"], "Go");
        assert_eq!(json["class_name"], "btn primary");
        assert_eq!(json["id"], "go");
    }

    #[test]
    fn test_scroll_serializes_as_wheel() {
        let action = Action::scroll("/html/body/div[1]", "120");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "wheel");

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind, ActionKind::Scroll);
    }

    #[test]
    fn test_hint_fields_default_when_absent() {
        let raw = r#"{"action":"navigate","selector":"","value":"https://example.com"}"#;
        let action: Action = serde_json::from_str(raw).unwrap();
        assert_eq!(action.kind, ActionKind::Navigate);
        assert!(action.text.is_empty());
        assert!(action.class_name.is_empty());
        assert!(action.id.is_empty());
    }
}
